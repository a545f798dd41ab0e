use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, Paragraph, Widget};

use crate::session::MASTERY_THRESHOLD;
use crate::ui::theme::Theme;

/// Exam percentage over time, with the pass line drawn across.
pub struct ScoreChart<'a> {
    pub data: &'a [(f64, f64)],
    pub theme: &'a Theme,
}

impl<'a> ScoreChart<'a> {
    pub fn new(data: &'a [(f64, f64)], theme: &'a Theme) -> Self {
        Self { data, theme }
    }
}

impl Widget for ScoreChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" Scores Over Time ")
            .border_style(Style::default().fg(colors.border()));

        if self.data.len() < 2 {
            let inner = block.inner(area);
            block.render(area, buf);
            Paragraph::new("  Take at least two exams to see a trend.")
                .style(Style::default().fg(colors.muted()))
                .render(inner, buf);
            return;
        }

        let max_x = self.data.last().map(|(x, _)| *x).unwrap_or(1.0);
        let pass_line = [(1.0, MASTERY_THRESHOLD), (max_x, MASTERY_THRESHOLD)];

        let scores = Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(colors.accent()))
            .data(self.data);
        let threshold = Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(colors.success()))
            .data(&pass_line);

        Chart::new(vec![threshold, scores])
            .block(block)
            .x_axis(
                Axis::default()
                    .title("Exam #")
                    .style(Style::default().fg(colors.muted()))
                    .bounds([1.0, max_x]),
            )
            .y_axis(
                Axis::default()
                    .title("%")
                    .style(Style::default().fg(colors.muted()))
                    .labels(["0", "50", "100"])
                    .bounds([0.0, 100.0]),
            )
            .render(area, buf);
    }
}
