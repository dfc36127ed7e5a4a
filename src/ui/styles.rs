use ratatui::style::{Color, Modifier, Style};

/// Styles derived from the configured display colour.
pub struct DashboardStyles {
    pub border: Style,
    pub title: Style,
    pub label: Style,
    pub error: Style,
    pub key: Style,
    pub text: Style,
}

impl DashboardStyles {
    pub fn new(accent: Color) -> Self {
        Self {
            border: Style::default().fg(accent),
            title: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            label: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            error: Style::default().fg(Color::Indexed(1)),
            key: Style::default().fg(accent),
            text: Style::default(),
        }
    }

    /// Build from a colour name, `#rrggbb` or 0-255 index. Unparseable
    /// values fall back to green.
    pub fn from_config(color: &str) -> Self {
        let accent = color.trim().parse::<Color>().unwrap_or_else(|_| {
            tracing::warn!(color, "unrecognised color, using green");
            Color::Green
        });
        Self::new(accent)
    }
}

impl Default for DashboardStyles {
    fn default() -> Self {
        Self::new(Color::Indexed(2))
    }
}
