use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::mistakes::MistakeLog;
use crate::session::result::ExamResult;
use crate::session::stats::{self, Trend};
use crate::session::MASTERY_THRESHOLD;
use crate::ui::components::chart::ScoreChart;
use crate::ui::layout::LayoutTier;
use crate::ui::theme::Theme;

/// Progress overview: headline numbers, score chart, exam history and the
/// AI study plan.
pub struct ProgressDashboard<'a> {
    history: &'a [ExamResult],
    mistakes: &'a MistakeLog,
    study_plan: Option<&'a str>,
    plan_loading: bool,
    scroll: usize,
    tier: LayoutTier,
    theme: &'a Theme,
}

impl<'a> ProgressDashboard<'a> {
    pub fn new(
        history: &'a [ExamResult],
        mistakes: &'a MistakeLog,
        theme: &'a Theme,
    ) -> Self {
        Self {
            history,
            mistakes,
            study_plan: None,
            plan_loading: false,
            scroll: 0,
            tier: LayoutTier::Narrow,
            theme,
        }
    }

    pub fn study_plan(mut self, plan: Option<&'a str>, loading: bool) -> Self {
        self.study_plan = plan;
        self.plan_loading = loading;
        self
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn tier(mut self, tier: LayoutTier) -> Self {
        self.tier = tier;
        self
    }

    fn render_stat(&self, label: &str, value: &str, value_style: Style, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Paragraph::new(vec![
            Line::from(Span::styled(value.to_string(), value_style.add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(label.to_string(), Style::default().fg(colors.muted()))),
        ])
        .block(Block::bordered().border_style(Style::default().fg(colors.border())))
        .render(area, buf);
    }

    fn render_history(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(format!(" Exam History ({}) ", self.history.len()))
            .border_style(Style::default().fg(colors.border()));

        if self.history.is_empty() {
            Paragraph::new(Span::styled(
                "  No exams taken yet.",
                Style::default().fg(colors.muted()),
            ))
            .block(block)
            .render(area, buf);
            return;
        }

        let lines: Vec<Line> = self
            .history
            .iter()
            .rev()
            .skip(self.scroll)
            .map(|r| {
                let pct = r.percentage();
                let color = if pct >= MASTERY_THRESHOLD {
                    colors.success()
                } else if pct >= 50.0 {
                    colors.warning()
                } else {
                    colors.error()
                };
                Line::from(vec![
                    Span::styled(
                        format!(" {} ", r.date.format("%Y-%m-%d %H:%M")),
                        Style::default().fg(colors.muted()),
                    ),
                    Span::styled(format!("{:<22}", r.test_title), Style::default().fg(colors.fg())),
                    Span::styled(
                        format!("{:>3}/{:<3} {:>4.0}%", r.score, r.total, pct),
                        Style::default().fg(color),
                    ),
                ])
            })
            .collect();
        Paragraph::new(lines).block(block).render(area, buf);
    }

    fn render_plan(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" AI Study Plan ")
            .border_style(Style::default().fg(colors.border_focused()));

        let text: Vec<Line> = if self.plan_loading {
            vec![Line::from(Span::styled(
                "  Analysing your mistakes...",
                Style::default().fg(colors.accent_dim()),
            ))]
        } else if let Some(plan) = self.study_plan {
            plan.lines()
                .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(colors.fg()))))
                .collect()
        } else {
            vec![Line::from(Span::styled(
                "  Press [g] to generate a plan from your mistake log.",
                Style::default().fg(colors.muted()),
            ))]
        };
        Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

impl Widget for ProgressDashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Percentage(35),
            ])
            .split(area);

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(rows[0]);

        let average = stats::rounded_average(self.history);
        let trend = stats::trend(self.history);
        let trend_color = match trend {
            Trend::Improving => colors.success(),
            Trend::Stable => colors.fg(),
            Trend::NeedsFocus => colors.warning(),
        };
        let avg_text = if self.history.is_empty() {
            "-".to_string()
        } else {
            format!("{average}%")
        };
        self.render_stat("Average score", &avg_text, Style::default().fg(colors.accent()), cards[0], buf);
        self.render_stat("Trend", trend.label(), Style::default().fg(trend_color), cards[1], buf);
        self.render_stat(
            "Mistakes to review",
            &stats::mistake_count(self.mistakes).to_string(),
            Style::default().fg(colors.incorrect()),
            cards[2],
            buf,
        );
        self.render_stat(
            "Hard mistakes",
            &stats::hard_mistake_count(self.mistakes).to_string(),
            Style::default().fg(colors.error()),
            cards[3],
            buf,
        );

        let series = stats::score_series(self.history);
        match self.tier {
            LayoutTier::Wide => {
                let middle = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(rows[1]);
                ScoreChart::new(&series, self.theme).render(middle[0], buf);
                self.render_history(middle[1], buf);
            }
            LayoutTier::Narrow => self.render_history(rows[1], buf),
        }

        self.render_plan(rows[2], buf);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn exam(title: &str, score: usize) -> ExamResult {
        ExamResult {
            id: title.to_string(),
            date: Utc::now(),
            test_title: title.to_string(),
            score,
            total: 10,
        }
    }

    fn render_text(dashboard: ProgressDashboard, area: Rect) -> String {
        let mut buf = Buffer::empty(area);
        dashboard.render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn empty_progress_shows_placeholders() {
        let theme = Theme::default();
        let log = MistakeLog::new();
        let text = render_text(
            ProgressDashboard::new(&[], &log, &theme),
            Rect::new(0, 0, 90, 30),
        );
        assert!(text.contains("No exams taken yet."));
        assert!(text.contains("Stable"));
        assert!(text.contains("Press [g]"));
    }

    #[test]
    fn history_lists_newest_first() {
        let theme = Theme::default();
        let log = MistakeLog::new();
        let history = vec![exam("Healthcare", 4), exam("Education", 9)];
        let text = render_text(
            ProgressDashboard::new(&history, &log, &theme)
                .study_plan(Some("- Focus on healthcare"), false)
                .tier(LayoutTier::Wide),
            Rect::new(0, 0, 120, 30),
        );
        let newest = text.find("Education").unwrap();
        let oldest = text.find("Healthcare").unwrap();
        assert!(newest < oldest);
        assert!(text.contains("65%"));
        assert!(text.contains("- Focus on healthcare"));
    }
}
