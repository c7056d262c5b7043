//! Scripted collaborator doubles for pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::traits::{GenerateError, MetadataProvider, ReviewSource, TextGenerator};
use crate::types::{AnimeMetadata, Review};

#[derive(Default)]
pub struct MockMetadataProvider {
    entries: HashMap<i64, AnimeMetadata>,
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anime(mut self, metadata: AnimeMetadata) -> Self {
        self.entries.insert(metadata.id, metadata);
        self
    }
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    async fn get_metadata(&self, anime_id: i64) -> anyhow::Result<Option<AnimeMetadata>> {
        Ok(self.entries.get(&anime_id).cloned())
    }
}

#[derive(Default)]
pub struct MockReviewSource {
    entries: HashMap<i64, Vec<Review>>,
    fail: bool,
}

impl MockReviewSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reviews(mut self, anime_id: i64, reviews: Vec<Review>) -> Self {
        self.entries.insert(anime_id, reviews);
        self
    }

    /// Make every fetch fail, for degradation tests.
    pub fn failing() -> Self {
        Self {
            entries: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl ReviewSource for MockReviewSource {
    async fn get_reviews(&self, anime_id: i64, max: u32) -> anyhow::Result<Vec<Review>> {
        if self.fail {
            anyhow::bail!("review source offline");
        }
        let mut reviews = self.entries.get(&anime_id).cloned().unwrap_or_default();
        reviews.truncate(max as usize);
        Ok(reviews)
    }
}

/// Generator that replays a fixed script of responses in order. Panics in
/// tests when the script runs dry, which is always a test bug.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerateError>>>,
    calls: AtomicU32,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, GenerateError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// A generator that always answers with the same text.
    pub fn always(text: &str) -> Self {
        Self::new((0..8).map(|_| Ok(text.to_string())).collect())
    }

    /// Number of generate calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(GenerateError::Empty))
    }
}

pub fn sample_metadata(id: i64) -> AnimeMetadata {
    AnimeMetadata {
        id,
        display_title: "Sample Anime".to_string(),
        year: Some(2021),
        episodes: Some(12),
        format: Some("TV".to_string()),
        studios: vec!["Sample Studio".to_string()],
        genres: vec!["Action".to_string()],
        score: Some(68),
        source: Some(crate::types::SourceMaterial::Manga),
        controversy_score: 10,
        cover_image: Some("https://img.example/cover.png".to_string()),
    }
}

pub fn sample_review(body: &str, rating: Option<i32>) -> Review {
    Review {
        body: body.to_string(),
        summary: String::new(),
        rating,
        score: rating.map(|r| r * 10),
        author: "reviewer".to_string(),
        created_at: Some(1_700_000_000),
    }
}
