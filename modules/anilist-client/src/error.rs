use thiserror::Error;

pub type Result<T> = std::result::Result<T, AniListError>;

#[derive(Debug, Error)]
pub enum AniListError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for AniListError {
    fn from(err: reqwest::Error) -> Self {
        AniListError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AniListError {
    fn from(err: serde_json::Error) -> Self {
        AniListError::Parse(err.to_string())
    }
}
