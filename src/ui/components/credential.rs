use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// Characters of the key left visible at the end of the masked field.
const REVEALED_TAIL: usize = 4;

/// First-run prompt asking for the Gemini API key.
pub struct CredentialPrompt<'a> {
    input: &'a LineInput,
    theme: &'a Theme,
}

impl<'a> CredentialPrompt<'a> {
    pub fn new(input: &'a LineInput, theme: &'a Theme) -> Self {
        Self { input, theme }
    }
}

impl Widget for CredentialPrompt<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let (before, cursor, after) = self.input.masked_parts('•', REVEALED_TAIL);
        let cursor_style = Style::default().fg(colors.bg()).bg(colors.accent());

        let mut field = vec![
            Span::styled("  > ", Style::default().fg(colors.accent())),
            Span::styled(before, Style::default().fg(colors.fg())),
        ];
        match cursor {
            Some(ch) => field.push(Span::styled(ch.to_string(), cursor_style)),
            None => field.push(Span::styled(" ", cursor_style)),
        }
        field.push(Span::styled(after, Style::default().fg(colors.fg())));

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Welcome to the KNM Trainer",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "  Questions are generated by Google Gemini. Paste your API key \
                 to get started. It is stored only on this machine.",
                Style::default().fg(colors.fg()),
            )),
            Line::from(Span::styled(
                "  Get a free key at https://aistudio.google.com/app/apikey",
                Style::default().fg(colors.muted()),
            )),
            Line::from(""),
            Line::from(field),
            Line::from(""),
            Line::from(Span::styled(
                "  [Enter] Save  [Esc] Quit",
                Style::default().fg(colors.muted()),
            )),
        ];

        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .title(" API Key ")
                    .border_style(Style::default().fg(colors.border_focused()))
                    .style(Style::default().bg(colors.bg())),
            )
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
