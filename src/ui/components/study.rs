use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::catalog::{StudyMaterial, VIDEO_QUEST_QUESTION_COUNT};
use crate::session::MasteryMap;
use crate::ui::theme::Theme;

/// Video list with mastery badges and the selected video's details.
pub struct StudyList<'a> {
    materials: &'a [StudyMaterial],
    mastery: &'a MasteryMap,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> StudyList<'a> {
    pub fn new(
        materials: &'a [StudyMaterial],
        mastery: &'a MasteryMap,
        selected: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            materials,
            mastery,
            selected,
            theme,
        }
    }

    fn is_mastered(&self, id: &str) -> bool {
        self.mastery.get(id).copied().unwrap_or(false)
    }
}

impl Widget for StudyList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(self.materials.len() as u16 + 2),
                Constraint::Min(4),
            ])
            .split(area);

        let mastered = self
            .materials
            .iter()
            .filter(|m| self.is_mastered(m.id))
            .count();
        let list_block = Block::bordered()
            .title(format!(
                " Study Videos ({mastered}/{} mastered) ",
                self.materials.len()
            ))
            .border_style(Style::default().fg(colors.border()));

        let lines: Vec<Line> = self
            .materials
            .iter()
            .enumerate()
            .map(|(i, video)| {
                let is_selected = i == self.selected;
                let badge = if self.is_mastered(video.id) {
                    Span::styled(" ★ ", Style::default().fg(colors.success()))
                } else {
                    Span::styled(" · ", Style::default().fg(colors.muted()))
                };
                let style = if is_selected {
                    Style::default()
                        .fg(colors.accent())
                        .bg(colors.selected_bg())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                Line::from(vec![
                    Span::styled(if is_selected { " >" } else { "  " }, style),
                    badge,
                    Span::styled(video.title, style),
                ])
            })
            .collect();
        Paragraph::new(lines)
            .block(list_block)
            .render(layout[0], buf);

        let Some(video) = self.materials.get(self.selected) else {
            return;
        };
        let status = if self.is_mastered(video.id) {
            Span::styled("Mastered", Style::default().fg(colors.success()))
        } else {
            Span::styled("Not mastered yet", Style::default().fg(colors.warning()))
        };
        let details = vec![
            Line::from(Span::styled(
                video.description,
                Style::default().fg(colors.fg()),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Watch: ", Style::default().fg(colors.muted())),
                Span::styled(
                    video.watch_url(),
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ]),
            Line::from(vec![
                Span::styled("Status: ", Style::default().fg(colors.muted())),
                status,
            ]),
            Line::from(Span::styled(
                format!(
                    "Press Enter for a {VIDEO_QUEST_QUESTION_COUNT}-question quest on this video."
                ),
                Style::default().fg(colors.muted()),
            )),
        ];
        Paragraph::new(details)
            .block(
                Block::bordered()
                    .title(format!(" {} ", video.title))
                    .border_style(Style::default().fg(colors.border_focused())),
            )
            .wrap(Wrap { trim: false })
            .render(layout[1], buf);
    }
}
