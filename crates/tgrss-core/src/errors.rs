/// Core error type for the feed gateway.
///
/// Adapter crates map their specific failures into this type so the HTTP
/// layer can translate errors into status codes consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("unsupported range unit: {0}")]
    UnsupportedRangeUnit(String),

    #[error("invalid range spec: {0}")]
    InvalidRangeSpec(String),

    #[error("multiple ranges are not supported")]
    MultiRangeRejected,

    #[error("media token decode failed: {0}")]
    TokenDecode(String),

    #[error("thumbnail unavailable")]
    ThumbnailUnavailable,

    #[error("unsupported media class: {0}")]
    UnsupportedMediaClass(String),

    #[error("upstream session not ready")]
    UpstreamNotReady,

    #[error("session error: {0}")]
    Session(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
