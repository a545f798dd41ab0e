use crate::session::mistakes::{HARD_MISTAKE_THRESHOLD, MistakeLog};
use crate::session::result::ExamResult;

/// Points the newest score must move by before the trend leaves `Stable`.
const TREND_MARGIN: i64 = 5;
const TREND_WINDOW: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Stable,
    NeedsFocus,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Improving => "Improving",
            Trend::Stable => "Stable",
            Trend::NeedsFocus => "Needs Focus",
        }
    }
}

pub fn average_score(history: &[ExamResult]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let total: f64 = history.iter().map(ExamResult::percentage).sum();
    total / history.len() as f64
}

/// Average percentage as shown on the progress card, halves rounded up.
pub fn rounded_average(history: &[ExamResult]) -> u32 {
    average_score(history).round() as u32
}

/// Compare the newest exam against the earliest of the last three.
pub fn trend(history: &[ExamResult]) -> Trend {
    if history.len() < 2 {
        return Trend::Stable;
    }
    let window = &history[history.len().saturating_sub(TREND_WINDOW)..];
    let (first_points, first_total) = as_fraction(&window[0]);
    let (last_points, last_total) = as_fraction(&window[window.len() - 1]);
    // Cross-multiplied so a change of exactly the margin stays `Stable`.
    let delta = last_points * first_total - first_points * last_total;
    let margin = TREND_MARGIN * first_total * last_total;
    if delta > margin {
        Trend::Improving
    } else if delta < -margin {
        Trend::NeedsFocus
    } else {
        Trend::Stable
    }
}

/// Percentage as `points / total`, with an empty exam counting as 0 of 1.
fn as_fraction(result: &ExamResult) -> (i64, i64) {
    if result.total == 0 {
        (0, 1)
    } else {
        (result.score as i64 * 100, result.total as i64)
    }
}

pub fn mistake_count(log: &MistakeLog) -> usize {
    log.len()
}

pub fn hard_mistake_count(log: &MistakeLog) -> usize {
    log.values()
        .filter(|r| r.error_count >= HARD_MISTAKE_THRESHOLD)
        .count()
}

/// (exam number, percentage) points for the progress chart.
pub fn score_series(history: &[ExamResult]) -> Vec<(f64, f64)> {
    history
        .iter()
        .enumerate()
        .map(|(i, r)| ((i + 1) as f64, r.percentage()))
        .collect()
}
