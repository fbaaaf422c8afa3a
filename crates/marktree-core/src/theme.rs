use ratatui::style::Color;
use ratatui::style::Style;

/// Base styles a document view paints with. Per-label overrides (the `color` property, inline
/// bold/italic runs) are patched on top of these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Theme {
    pub text_primary: Style,
    pub text_muted: Style,
    pub accent: Style,
    pub link: Style,
    pub code_inline: Style,
    pub code_block: Style,
    pub quote_border: Style,
    pub rule: Style,
    pub placeholder: Style,
}

impl Theme {
    /// Background used behind fenced code unless the view options override it.
    pub fn code_background(&self) -> Color {
        self.code_block.bg.unwrap_or(Color::Reset)
    }
}

impl Default for Theme {
    fn default() -> Self {
        use ratatui::style::Stylize;

        Self {
            text_primary: Style::default(),
            text_muted: Style::default().dark_gray(),
            accent: Style::default().cyan(),
            link: Style::default().blue(),
            code_inline: Style::default().cyan(),
            code_block: Style::default().on_black(),
            quote_border: Style::default().dark_gray(),
            rule: Style::default().dark_gray(),
            placeholder: Style::default().dark_gray().italic(),
        }
    }
}
