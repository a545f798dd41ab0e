use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::catalog::TESTS;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    StartTest(&'static str),
    MistakeReview,
    Study,
    Progress,
    ResetKey,
    Quit,
}

pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub description: String,
    pub action: MenuAction,
}

pub struct Menu<'a> {
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> Menu<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        let mut items: Vec<MenuItem> = TESTS
            .iter()
            .enumerate()
            .map(|(i, test)| MenuItem {
                key: (i + 1).to_string(),
                label: test.title.to_string(),
                description: test.description.to_string(),
                action: MenuAction::StartTest(test.id),
            })
            .collect();

        let extras = [
            (
                "m",
                "Mistake Review",
                "Retry the questions you got wrong, hardest first",
                MenuAction::MistakeReview,
            ),
            (
                "v",
                "Study Videos",
                "Watch a lesson, then take its short quest",
                MenuAction::Study,
            ),
            (
                "p",
                "Progress",
                "Scores, trend and an AI study plan",
                MenuAction::Progress,
            ),
            (
                "x",
                "Reset API Key",
                "Forget the stored Gemini key",
                MenuAction::ResetKey,
            ),
            ("q", "Quit", "Leave the trainer", MenuAction::Quit),
        ];
        items.extend(
            extras
                .into_iter()
                .map(|(key, label, description, action)| MenuItem {
                    key: key.to_string(),
                    label: label.to_string(),
                    description: description.to_string(),
                    action,
                }),
        );

        Self {
            items,
            selected: 0,
            theme,
        }
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }

    pub fn selected_action(&self) -> Option<MenuAction> {
        self.items.get(self.selected).map(|item| item.action)
    }

    /// Action bound to a shortcut key, if any.
    pub fn action_for_key(&self, ch: char) -> Option<MenuAction> {
        let key = ch.to_string();
        self.items
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.action)
    }
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "KNM Trainer",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Kennis van de Nederlandse Maatschappij",
                Style::default().fg(colors.fg()),
            )),
        ];
        Paragraph::new(title_lines)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        // A blank row separates the exams from the other actions.
        let mut lines: Vec<Line> = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            if i == TESTS.len() {
                lines.push(Line::from(""));
            }
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };
            let label_text = format!(" {indicator} [{}] {}", item.key, item.label);
            let style = if is_selected {
                Style::default()
                    .fg(colors.accent())
                    .bg(colors.selected_bg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            lines.push(Line::from(Span::styled(label_text, style)));
        }
        Paragraph::new(lines).render(layout[1], buf);

        if let Some(item) = self.items.get(self.selected) {
            Paragraph::new(Line::from(Span::styled(
                format!("   {}", item.description),
                Style::default().fg(colors.muted()),
            )))
            .wrap(Wrap { trim: false })
            .render(layout[2], buf);
        }
    }
}
