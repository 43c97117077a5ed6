use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("lookup service returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("no profile found for @{0}")]
    NotFound(String),

    #[error("malformed lookup response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("handle is empty")]
    EmptyHandle,
}

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("could not read avatar file: {0}")]
    Io(#[from] std::io::Error),

    #[error("avatar download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("avatar host returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("not a supported image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid data URI: {0}")]
    DataUri(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("avatar cannot be drawn: {0}")]
    Avatar(#[from] AvatarError),

    #[error("PNG encoding failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("could not write {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("capture worker stopped: {0}")]
    Worker(String),
}
