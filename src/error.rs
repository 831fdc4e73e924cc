use std::io;

/// Errors surfaced by the emblem library.
///
/// Most failures in this crate are decorative and never leave the component
/// that saw them; these are the ones a caller can act on.
#[derive(Debug, thiserror::Error)]
pub enum EmblemError {
    #[error("setting `{name}` must be finite and positive, got {value}")]
    InvalidSetting { name: &'static str, value: f64 },

    #[error("glyph path could not be parsed: {0}")]
    GlyphPath(String),

    #[error("could not open {url}")]
    LinkOpen {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EmblemError>;
