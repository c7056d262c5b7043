use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeminiError>;

#[derive(Debug, Error)]
pub enum GeminiError {
    /// Quota or rate limit exhausted (HTTP 429). Callers should not retry
    /// immediately.
    #[error("Gemini rate limit exhausted")]
    RateLimited,

    /// The request itself was malformed (HTTP 400). Retrying cannot help.
    #[error("Invalid Gemini request: {0}")]
    InvalidRequest(String),

    /// The model answered but produced no text.
    #[error("Gemini returned an empty response")]
    Empty,

    #[error("Gemini API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        GeminiError::Network(err.to_string())
    }
}
