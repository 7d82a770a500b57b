//! Header widget for the TUI.
//!
//! Displays the application name, version, and the session target.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Header bar widget.
pub struct Header<'a> {
    connection_info: &'a str,
    busy: bool,
}

impl<'a> Header<'a> {
    /// Creates a new header widget.
    pub fn new(connection_info: &'a str, busy: bool) -> Self {
        Self {
            connection_info,
            busy,
        }
    }

    fn title() -> String {
        format!(" ❄ Snowpane v{}", env!("CARGO_PKG_VERSION"))
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left_span = Span::styled(Self::title(), style);
        buf.set_span(area.x, area.y, &left_span, area.width);

        if self.busy {
            let text = "running…";
            let busy_style = style.fg(Color::Yellow);
            let width = text.chars().count() as u16;
            let x = area.x + area.width.saturating_sub(width) / 2;
            buf.set_string(x, area.y, text, busy_style);
        }

        let right_text = format!(" {} ", self.connection_info);
        let right_width = right_text.chars().count() as u16;
        if right_width + 20 < area.width {
            let right_x = area.right().saturating_sub(right_width);
            buf.set_string(right_x, area.y, &right_text, style);
        }
    }
}
