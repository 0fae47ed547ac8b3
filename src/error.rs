#[derive(Debug, thiserror::Error)]
pub enum SpiderError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::error::Error),

    #[error("Request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid date-time {value:?}")]
    InvalidDateTime { value: String },

    #[error("Missing mandatory field `{0}`")]
    MissingField(&'static str),

    #[error("Cannot decode {what}: {reason}")]
    DecodeError { what: &'static str, reason: String },

    #[error("Found {rows} rows but {scripts} scripts")]
    MisalignedRows { rows: usize, scripts: usize },
}
