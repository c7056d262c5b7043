use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimeTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

impl AnimeTitle {
    /// Best display title: English, then romaji, then native.
    pub fn display(&self) -> &str {
        self.english
            .as_deref()
            .or(self.romaji.as_deref())
            .or(self.native.as_deref())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverImage {
    pub large: Option<String>,
    pub medium: Option<String>,
    #[serde(rename = "extraLarge")]
    pub extra_large: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeSearchResult {
    pub id: i64,
    pub title: AnimeTitle,
    pub cover_image: CoverImage,
    pub episodes: Option<i32>,
    pub year: Option<i32>,
    /// AniList average score on the 0-100 scale.
    pub score: Option<i32>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeDetails {
    pub id: i64,
    pub title: AnimeTitle,
    pub cover_image: CoverImage,
    pub episodes: Option<i32>,
    pub year: Option<i32>,
    /// AniList average score on the 0-100 scale.
    pub score: Option<i32>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
    /// AniList source enum: MANGA, LIGHT_NOVEL, ORIGINAL, ...
    pub source: Option<String>,
    /// 0-100 polarization score derived from the score distribution.
    pub controversy_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub summary: String,
    pub body: String,
    /// Reviewer's own rating, 0-10.
    pub rating: Option<i32>,
    /// Community score of the review itself.
    pub score: Option<i32>,
    pub user_name: String,
    /// Unix timestamp.
    pub created_at: Option<i64>,
}

// ---------------------------------------------------------------------------
// Raw GraphQL wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse {
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMedia {
    pub id: i64,
    #[serde(default)]
    pub title: AnimeTitle,
    #[serde(rename = "coverImage", default)]
    pub cover_image: CoverImage,
    pub episodes: Option<i32>,
    #[serde(rename = "seasonYear")]
    pub season_year: Option<i32>,
    #[serde(rename = "averageScore")]
    pub average_score: Option<i32>,
    pub format: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub source: Option<String>,
    pub studios: Option<RawStudios>,
    pub stats: Option<RawStats>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStudios {
    #[serde(default)]
    pub nodes: Vec<RawStudio>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStudio {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStats {
    #[serde(rename = "scoreDistribution", default)]
    pub score_distribution: Vec<RawScoreBucket>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawScoreBucket {
    pub score: i32,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawReview {
    pub id: i64,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub rating: Option<i32>,
    pub score: Option<i32>,
    pub user: Option<RawUser>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUser {
    pub name: Option<String>,
}
