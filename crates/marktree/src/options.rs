use crate::error::ConfigError;
use marktree_core::theme::Theme;
use ratatui::style::Color;

/// Font-size multipliers for heading levels 1 through 6.
pub const DEFAULT_HEADING_SCALE: [f32; 6] = [2.0, 1.5, 1.25, 1.1, 1.0, 0.9];

/// Nesting depth (lists and block quotes) past which content is replaced by a placeholder.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Construction-time settings of a [`crate::view::MarkdownTree`].
///
/// These are fixed for the lifetime of a tree; per-instance properties that can change at
/// runtime live in [`crate::props::Props`].
#[derive(Clone, Debug)]
pub struct MarkdownTreeOptions {
    pub heading_scale: [f32; 6],
    pub max_depth: usize,
    /// Extra indentation per list nesting level, in cells.
    pub list_indent: u16,
    /// Upper bound on accumulated list indentation, in cells.
    pub max_list_indent: u16,
    pub blockquote_padding: u16,
    /// Font identifier forced onto code labels.
    pub code_font_name: String,
    /// Overrides the theme's code block background.
    pub code_background: Option<Color>,
    /// Rows reserved for an image while it loads or once loaded.
    pub image_rows: u16,
    pub bullet: String,
    pub truncation_marker: String,
    pub theme: Theme,
}

impl Default for MarkdownTreeOptions {
    fn default() -> Self {
        Self {
            heading_scale: DEFAULT_HEADING_SCALE,
            max_depth: DEFAULT_MAX_DEPTH,
            list_indent: 2,
            max_list_indent: 12,
            blockquote_padding: 2,
            code_font_name: "monospace".to_string(),
            code_background: None,
            image_rows: 3,
            bullet: "•".to_string(),
            truncation_marker: "…".to_string(),
            theme: Theme::default(),
        }
    }
}

impl MarkdownTreeOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, &value) in self.heading_scale.iter().enumerate() {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NonPositiveHeadingScale {
                    level: i + 1,
                    value,
                });
            }
        }
        for (i, pair) in self.heading_scale.windows(2).enumerate() {
            if pair[1] > pair[0] {
                return Err(ConfigError::HeadingScaleNotMonotonic { level: i + 1 });
            }
        }
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.code_font_name.trim().is_empty() {
            return Err(ConfigError::EmptyCodeFont);
        }
        Ok(())
    }

    pub fn heading_scale(&self, level: u8) -> f32 {
        let idx = usize::from(level.clamp(1, 6)) - 1;
        self.heading_scale[idx]
    }

    pub fn code_background(&self) -> Color {
        self.code_background
            .unwrap_or_else(|| self.theme.code_background())
    }
}
