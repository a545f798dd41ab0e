use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::app::{DeepDive, ReviewView};
use crate::session::question::Question;
use crate::session::result::{feedback_message, percentage};
use crate::session::{MASTERY_THRESHOLD, SessionState};
use crate::ui::components::quiz::OPTION_LETTERS;
use crate::ui::layout::wrapped_line_count;
use crate::ui::theme::Theme;

const INDENT: &str = "      ";

/// Score summary followed by one expandable card per question.
pub struct ResultsView<'a> {
    session: &'a SessionState,
    questions: &'a [&'a Question],
    review: &'a ReviewView,
    deep_dives: &'a HashMap<String, DeepDive>,
    english: bool,
    theme: &'a Theme,
}

impl<'a> ResultsView<'a> {
    pub fn new(
        session: &'a SessionState,
        questions: &'a [&'a Question],
        review: &'a ReviewView,
        deep_dives: &'a HashMap<String, DeepDive>,
        english: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            session,
            questions,
            review,
            deep_dives,
            english,
            theme,
        }
    }

    fn summary_lines(&self) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let score = self.session.score();
        let total = self.session.questions.len();
        let pct = percentage(score, total);
        let pct_color = if pct >= MASTERY_THRESHOLD {
            colors.success()
        } else if pct >= 50.0 {
            colors.warning()
        } else {
            colors.error()
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    format!("{score}/{total}  "),
                    Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{pct:.0}%"),
                    Style::default().fg(pct_color).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                feedback_message(pct),
                Style::default().fg(colors.accent()),
            )),
        ];

        let note = match self.session.active.as_ref() {
            Some(variant) if variant.is_mistake_review() => {
                Some("Each correct answer removes one strike from your mistake log.".to_string())
            }
            Some(variant) => variant.video_id().map(|id| {
                if self.session.is_mastered(id) {
                    "Video mastered.".to_string()
                } else {
                    format!("Score {MASTERY_THRESHOLD:.0}% or more to master this video.")
                }
            }),
            None => None,
        };
        if let Some(note) = note {
            lines.push(Line::from(Span::styled(
                note,
                Style::default().fg(colors.muted()),
            )));
        }
        lines
    }

    /// All card lines plus the index of the first line of the selected card.
    fn card_lines(&self) -> (Vec<Line<'static>>, usize) {
        let colors = &self.theme.colors;
        let mut lines: Vec<Line<'static>> = Vec::new();
        let mut selected_start = 0;

        for (i, question) in self.questions.iter().enumerate() {
            let answer = self.session.answer_for(&question.id);
            let correct = question.is_correct(answer);
            let is_selected = i == self.review.selected;
            if is_selected {
                selected_start = lines.len();
            }

            let number = self
                .session
                .questions
                .iter()
                .position(|q| q.id == question.id)
                .map(|p| p + 1)
                .unwrap_or(i + 1);
            let (mark, mark_color) = if correct {
                ("✓", colors.correct())
            } else {
                ("✗", colors.incorrect())
            };
            let mut header_style = Style::default().fg(colors.fg());
            if is_selected {
                header_style = header_style
                    .bg(colors.selected_bg())
                    .add_modifier(Modifier::BOLD);
            }
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} {mark} ", if is_selected { ">" } else { " " }),
                    header_style.fg(mark_color),
                ),
                Span::styled(
                    format!("{number}. {}", question.text(self.english)),
                    header_style,
                ),
            ]));

            if self.review.expanded.contains(&question.id) {
                self.push_details(&mut lines, question, answer);
            }
            lines.push(Line::from(""));
        }
        (lines, selected_start)
    }

    fn push_details(&self, lines: &mut Vec<Line<'static>>, question: &Question, answer: Option<usize>) {
        let colors = &self.theme.colors;

        for (idx, letter) in OPTION_LETTERS.iter().enumerate() {
            let Some(text) = question.option(idx, self.english) else {
                break;
            };
            let mut spans = vec![Span::styled(
                format!("{INDENT}{letter}. {text}"),
                Style::default().fg(colors.fg()),
            )];
            if idx == question.correct_option_index {
                spans.push(Span::styled(
                    "  ✓ correct",
                    Style::default().fg(colors.correct()),
                ));
            } else if answer == Some(idx) {
                spans.push(Span::styled(
                    "  ✗ your answer",
                    Style::default().fg(colors.incorrect()),
                ));
            }
            lines.push(Line::from(spans));
        }
        if answer.is_none() {
            lines.push(Line::from(Span::styled(
                format!("{INDENT}Not answered"),
                Style::default().fg(colors.warning()),
            )));
        }

        lines.push(Line::from(Span::styled(
            format!("{INDENT}{}", question.explanation(self.english)),
            Style::default()
                .fg(colors.muted())
                .add_modifier(Modifier::ITALIC),
        )));

        match self.deep_dives.get(&question.id) {
            Some(DeepDive::Loading) => lines.push(Line::from(Span::styled(
                format!("{INDENT}Cultural context: loading..."),
                Style::default().fg(colors.accent_dim()),
            ))),
            Some(DeepDive::Ready(text)) => {
                lines.push(Line::from(Span::styled(
                    format!("{INDENT}Cultural context:"),
                    Style::default().fg(colors.accent()),
                )));
                lines.extend(text.lines().map(|l| {
                    Line::from(Span::styled(
                        format!("{INDENT}{l}"),
                        Style::default().fg(colors.fg()),
                    ))
                }));
            }
            None => {}
        }
    }
}

impl Widget for ResultsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let summary = self.summary_lines();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(summary.len() as u16 + 2),
                Constraint::Min(3),
            ])
            .split(area);

        let summary_block = Block::bordered()
            .title(format!(" {} ", self.session.title()))
            .border_style(Style::default().fg(colors.border_focused()));
        Paragraph::new(summary)
            .block(summary_block)
            .render(layout[0], buf);

        let filter = if self.review.only_incorrect {
            " Answers (incorrect only) "
        } else {
            " Answers "
        };
        let block = Block::bordered()
            .title(filter)
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(layout[1]);
        block.render(layout[1], buf);

        if self.questions.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "  No incorrect answers. Goed gedaan!",
                Style::default().fg(colors.success()),
            )))
            .render(inner, buf);
            return;
        }

        let (lines, selected_start) = self.card_lines();
        let width = inner.width as usize;
        let selected_row: usize = lines[..selected_start]
            .iter()
            .map(|l| wrapped_line_count(&line_text(l), width))
            .sum();
        let scroll = selected_row.saturating_sub(inner.height as usize / 3);

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll.min(u16::MAX as usize) as u16, 0))
            .render(inner, buf);
    }
}

fn line_text(line: &Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}
