use thiserror::Error;

/// Errors raised by the drawing engine and its raster surface
#[derive(Debug, Error)]
pub enum EngineError {
    /// A surface cannot have a zero-sized axis
    #[error("invalid surface dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The supplied artwork could not be decoded
    #[error("failed to decode image: {0}")]
    ImageDecode(#[source] image::ImageError),

    /// The surface could not be encoded for export
    #[error("failed to encode surface: {0}")]
    ImageEncode(#[source] image::ImageError),

    /// The decode worker went away without reporting a result
    #[error("image decode ended without a result")]
    DecodeCancelled,
}

/// Errors raised while editing the styled text document
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextError {
    #[error("position {block}:{offset} is outside the document")]
    PositionOutOfRange { block: usize, offset: usize },

    /// The range spans block boundaries, so its runs cannot be restyled in place
    #[error("range {start_block}..{end_block} crosses block boundaries")]
    CannotIsolate { start_block: usize, end_block: usize },

    /// Blocks end at line breaks, so run text never holds one
    #[error("inserted text contains a line break")]
    LineBreakInText,

    #[error(transparent)]
    Markup(#[from] MarkupError),
}

/// Errors raised while parsing styled markup back into runs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unexpected text outside a span at byte {0}")]
    TextOutsideSpan(usize),

    #[error("unterminated element starting at byte {0}")]
    Unterminated(usize),

    #[error("unsupported element at byte {0}")]
    UnsupportedElement(usize),

    #[error("span at byte {0} has no style attribute")]
    MissingStyle(usize),

    #[error("malformed style declaration `{0}`")]
    BadDeclaration(String),

    #[error("span is missing the `{0}` property")]
    MissingProperty(&'static str),

    #[error("invalid colour literal `{0}`")]
    BadColor(String),

    #[error("unknown entity `&{0};`")]
    UnknownEntity(String),
}

/// Errors raised while loading [`crate::config::Settings`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Json(#[from] serde_json::Error),
}
