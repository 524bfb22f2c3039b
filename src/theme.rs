use ratatui::style::{Color, Modifier, Style};

/// Colours used by the browse and review screens.
#[derive(Debug, Clone)]
pub struct Theme {
    pub border: Style,
    pub removed_border: Style,
    pub added_border: Style,
    pub removed_title: Style,
    pub added_title: Style,
    pub footer: Style,
    pub line_number: Style,
    pub removed_line: Style,
    pub added_line: Style,
    pub unchanged_line: Style,
    pub secret_name: Style,
    pub version: Style,
    pub latest_badge: Style,
    pub warning: Style,
}

const PURPLE: Color = Color::Rgb(0x7d, 0x56, 0xf4);
const RED: Color = Color::Rgb(0xef, 0x44, 0x44);
const GREEN: Color = Color::Rgb(0x10, 0xb9, 0x81);
const GRAY: Color = Color::Rgb(0x6b, 0x72, 0x80);
const AMBER: Color = Color::Rgb(0xfb, 0xbf, 0x24);

impl Default for Theme {
    fn default() -> Self {
        Self {
            border: Style::default().fg(PURPLE),
            removed_border: Style::default().fg(RED),
            added_border: Style::default().fg(GREEN),
            removed_title: Style::default().fg(RED).add_modifier(Modifier::BOLD),
            added_title: Style::default().fg(GREEN).add_modifier(Modifier::BOLD),
            footer: Style::default().fg(GRAY),
            line_number: Style::default().fg(GRAY),
            removed_line: Style::default()
                .fg(Color::Rgb(0xff, 0x6b, 0x6b))
                .bg(Color::Rgb(0x3d, 0x1e, 0x1e)),
            added_line: Style::default()
                .fg(Color::Rgb(0x69, 0xdb, 0x7c))
                .bg(Color::Rgb(0x1e, 0x3d, 0x1e)),
            unchanged_line: Style::default().fg(Color::Rgb(0xf3, 0xf4, 0xf6)),
            secret_name: Style::default().fg(AMBER).add_modifier(Modifier::BOLD),
            version: Style::default().fg(PURPLE),
            latest_badge: Style::default().fg(GREEN).add_modifier(Modifier::BOLD),
            warning: Style::default().fg(AMBER),
        }
    }
}
