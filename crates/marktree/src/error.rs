use thiserror::Error;

/// The lexer produced an event stream the document builder could not balance.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("end of {tag} with no matching start")]
    UnexpectedEnd { tag: String },

    #[error("{open} element(s) still open at end of input")]
    Unclosed { open: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("no document attached; set text or an AST before rebuilding")]
    NoDocument,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("heading scale for level {level} must be positive, got {value}")]
    NonPositiveHeadingScale { level: usize, value: f32 },

    #[error("heading scale must not grow after level {level}")]
    HeadingScaleNotMonotonic { level: usize },

    #[error("max_depth must be at least 1")]
    ZeroDepth,

    #[error("code font name must not be empty")]
    EmptyCodeFont,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
