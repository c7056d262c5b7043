//! Collaborator traits for the roast pipeline.
//!
//! The orchestrator depends on these seams rather than concrete clients so
//! tests can script metadata, reviews, and generations without touching the
//! network.

use async_trait::async_trait;
use thiserror::Error;

use anilist_client::AniListClient;
use gemini_client::{GeminiClient, GeminiError};

use crate::types::{AnimeMetadata, Review, SourceMaterial};

/// Failure modes of a generation attempt, from the orchestrator's point of
/// view. How each variant affects the retry budget lives with the
/// orchestrator.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation timed out")]
    Timeout,
    #[error("generator returned no usable text")]
    Empty,
    #[error("generator rate limit exceeded")]
    RateLimited,
    #[error("generator rejected the request: {0}")]
    InvalidRequest(String),
    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn get_metadata(&self, anime_id: i64) -> anyhow::Result<Option<AnimeMetadata>>;
}

#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn get_reviews(&self, anime_id: i64, max: u32) -> anyhow::Result<Vec<Review>>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

#[async_trait]
impl MetadataProvider for AniListClient {
    async fn get_metadata(&self, anime_id: i64) -> anyhow::Result<Option<AnimeMetadata>> {
        let Some(details) = self.get_by_id(anime_id).await? else {
            return Ok(None);
        };
        let cover_image = details
            .cover_image
            .extra_large
            .or(details.cover_image.large)
            .or(details.cover_image.medium);
        Ok(Some(AnimeMetadata {
            id: details.id,
            display_title: details.title.display().to_string(),
            year: details.year,
            episodes: details.episodes,
            format: details.format,
            studios: details.studios,
            genres: details.genres,
            score: details.score.map(|s| s.clamp(0, 100) as u32),
            source: details.source.as_deref().map(SourceMaterial::parse),
            controversy_score: details.controversy_score,
            cover_image,
        }))
    }
}

#[async_trait]
impl ReviewSource for AniListClient {
    async fn get_reviews(&self, anime_id: i64, max: u32) -> anyhow::Result<Vec<Review>> {
        let reviews = AniListClient::get_reviews(self, anime_id, max).await?;
        Ok(reviews
            .into_iter()
            .map(|r| Review {
                body: r.body,
                summary: r.summary,
                rating: r.rating,
                score: r.score,
                author: r.user_name,
                created_at: r.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        GeminiClient::generate(self, prompt).await.map_err(|e| match e {
            GeminiError::RateLimited => GenerateError::RateLimited,
            GeminiError::InvalidRequest(msg) => GenerateError::InvalidRequest(msg),
            GeminiError::Empty => GenerateError::Empty,
            GeminiError::Api { status, message } => {
                GenerateError::Unavailable(format!("api error {status}: {message}"))
            }
            GeminiError::Network(msg) => GenerateError::Unavailable(msg),
        })
    }
}
