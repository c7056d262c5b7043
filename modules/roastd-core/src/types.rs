//! Domain types shared across the roast pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::criticism::CriticismCategory;

/// A community review as fetched from the metadata source. Immutable input;
/// never persisted by the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Review {
    pub body: String,
    pub summary: String,
    /// Reviewer's rating on the 0-10 scale, when given.
    pub rating: Option<i32>,
    /// Community score of the review itself.
    pub score: Option<i32>,
    pub author: String,
    /// Unix timestamp.
    pub created_at: Option<i64>,
}

impl Review {
    /// The text to analyze: body when present, summary otherwise.
    pub fn text(&self) -> &str {
        if !self.body.is_empty() {
            &self.body
        } else {
            &self.summary
        }
    }
}

/// Source material the anime was adapted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMaterial {
    Manga,
    LightNovel,
    VisualNovel,
    WebNovel,
    Original,
    Other,
}

impl SourceMaterial {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "MANGA" => SourceMaterial::Manga,
            "LIGHT_NOVEL" => SourceMaterial::LightNovel,
            "VISUAL_NOVEL" => SourceMaterial::VisualNovel,
            "WEB_NOVEL" => SourceMaterial::WebNovel,
            "ORIGINAL" => SourceMaterial::Original,
            _ => SourceMaterial::Other,
        }
    }
}

/// Factual anime metadata from the upstream catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeMetadata {
    pub id: i64,
    pub display_title: String,
    pub year: Option<i32>,
    pub episodes: Option<i32>,
    pub format: Option<String>,
    pub studios: Vec<String>,
    pub genres: Vec<String>,
    /// Average score on the 0-100 scale.
    pub score: Option<u32>,
    pub source: Option<SourceMaterial>,
    /// 0-100 polarization measure.
    pub controversy_score: u32,
    pub cover_image: Option<String>,
}

impl AnimeMetadata {
    /// Average score converted to the 0-10 scale.
    pub fn score_out_of_10(&self) -> Option<f32> {
        self.score.map(|s| s as f32 / 10.0)
    }
}

/// Sentiment label produced by the lexical classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Mixed,
    Neutral,
}

/// A criticism corroborated across multiple reviews.
///
/// Invariant: `review_count >= MIN_CORROBORATING_REVIEWS`; single-review
/// anecdotes never become verified complaints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedComplaint {
    pub category: CriticismCategory,
    /// Mean confidence across contributing reviews, in [0, 1].
    pub confidence: f32,
    /// Distinct reviews that raised this complaint.
    pub review_count: u32,
    /// Up to 3 deduplicated example sentences.
    pub example_quotes: Vec<String>,
}

/// Positive/mixed/negative totals over the analyzed reviews.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: u32,
    pub mixed: u32,
    pub negative: u32,
    pub total: u32,
    pub positive_pct: f32,
    pub negative_pct: f32,
}

/// Aggregated review evidence passed downstream to the context builder,
/// validator and cache key. Serialized form feeds the cache key hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewContext {
    pub review_count: usize,
    pub verified_complaints: Vec<VerifiedComplaint>,
    pub sentiment: SentimentBreakdown,
    /// Meme phrases seen in at least 2 distinct reviews, with counts.
    pub meme_phrases: Vec<(String, u32)>,
    /// Catalog average score on the 0-10 scale.
    pub score_out_of_10: Option<f32>,
    pub is_controversial: bool,
    pub controversy_score: u32,
}

impl ReviewContext {
    pub fn has_verified(&self, category: CriticismCategory) -> bool {
        self.verified_complaints.iter().any(|c| c.category == category)
    }
}

/// The six gamified statistics, each clamped to [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoastStats {
    pub horniness_level: u8,
    pub plot_armor_thickness: u8,
    pub filler_hell: u8,
    pub power_creep: u8,
    pub cringe_factor: u8,
    pub fan_toxicity: u8,
}

impl Default for RoastStats {
    /// Neutral midpoint used whenever the generator omits or mangles stats.
    fn default() -> Self {
        Self {
            horniness_level: 50,
            plot_armor_thickness: 50,
            filler_hell: 50,
            power_creep: 50,
            cringe_factor: 50,
            fan_toxicity: 50,
        }
    }
}

/// Final result of one roast request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoastOutcome {
    pub anime_name: String,
    pub roast: String,
    pub stats: RoastStats,
    /// Advisory validator findings; empty on a clean pass.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub issues: Vec<String>,
    pub cover_image: Option<String>,
    pub anime_id: Option<i64>,
}

/// The cacheable part of an outcome (validator issues are recomputed cheaply
/// and advisory, so they are cached along with the text they describe).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRoast {
    pub anime_name: String,
    pub roast: String,
    pub stats: RoastStats,
    #[serde(default)]
    pub issues: Vec<String>,
}
