use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::SessionState;
use crate::ui::components::progress_bar::ProgressBar;
use crate::ui::theme::Theme;

pub const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// The question being answered, its options and a strip of question numbers.
pub struct QuizView<'a> {
    session: &'a SessionState,
    english: bool,
    theme: &'a Theme,
}

impl<'a> QuizView<'a> {
    pub fn new(session: &'a SessionState, english: bool, theme: &'a Theme) -> Self {
        Self {
            session,
            english,
            theme,
        }
    }

    fn number_strip(&self) -> Line<'static> {
        let colors = &self.theme.colors;
        let spans: Vec<Span> = self
            .session
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let answered = self.session.answer_for(&q.id).is_some();
                let mut style = if answered {
                    Style::default().fg(colors.bg()).bg(colors.accent_dim())
                } else {
                    Style::default().fg(colors.muted())
                };
                if i == self.session.current_index {
                    style = style
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                }
                Span::styled(format!("{:>3}", i + 1), style)
            })
            .collect();
        Line::from(spans)
    }
}

impl Widget for QuizView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let Some(question) = self.session.current_question() else {
            return;
        };
        let total = self.session.questions.len();
        let answered = self.session.answers.len();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(2),
            ])
            .split(area);

        ProgressBar::new(
            "Answered",
            answered as f64 / total.max(1) as f64,
            self.theme,
        )
        .caption(format!("{answered}/{total}"))
        .render(layout[0], buf);

        let block = Block::bordered()
            .title(format!(
                " Question {}/{} · {} ",
                self.session.current_index + 1,
                total,
                question.topic_label()
            ))
            .border_style(Style::default().fg(colors.border_focused()));
        let inner = block.inner(layout[1]);
        block.render(layout[1], buf);

        let chosen = self.session.answer_for(&question.id);
        let mut lines = vec![
            Line::from(Span::styled(
                question.text(self.english).to_string(),
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (idx, letter) in OPTION_LETTERS.iter().enumerate() {
            let Some(text) = question.option(idx, self.english) else {
                break;
            };
            let selected = chosen == Some(idx);
            let style = if selected {
                Style::default()
                    .fg(colors.accent())
                    .bg(colors.selected_bg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            let marker = if selected { ">" } else { " " };
            lines.push(Line::from(Span::styled(
                format!(" {marker} {letter}. {text}"),
                style,
            )));
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);

        Paragraph::new(self.number_strip()).render(layout[2], buf);
    }
}
