pub mod chart;
pub mod credential;
pub mod menu;
pub mod progress;
pub mod progress_bar;
pub mod quiz;
pub mod results;
pub mod study;
