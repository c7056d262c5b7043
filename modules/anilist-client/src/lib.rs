pub mod error;
pub mod types;

pub use error::{AniListError, Result};
pub use types::{AnimeDetails, AnimeSearchResult, AnimeTitle, CoverImage, Review};

use std::time::{Duration, Instant};

use serde_json::json;
use tokio::sync::Mutex;
use types::{GraphQlResponse, RawMedia, RawReview};

const ANILIST_API_URL: &str = "https://graphql.anilist.co";

/// AniList allows ~90 requests/minute; pace outgoing calls accordingly.
const MIN_REQUEST_DELAY: Duration = Duration::from_millis(700);

const SEARCH_ANIME_QUERY: &str = r#"
query ($search: String, $page: Int, $perPage: Int) {
  Page(page: $page, perPage: $perPage) {
    media(search: $search, type: ANIME, sort: POPULARITY_DESC) {
      id
      title { romaji english native }
      coverImage { large medium }
      episodes
      seasonYear
      averageScore
      format
    }
  }
}
"#;

const GET_ANIME_QUERY: &str = r#"
query ($id: Int) {
  Media(id: $id, type: ANIME) {
    id
    title { romaji english native }
    coverImage { large medium extraLarge }
    episodes
    seasonYear
    averageScore
    format
    description
    genres
    source
    studios { nodes { name } }
    stats { scoreDistribution { score amount } }
  }
}
"#;

const GET_REVIEWS_QUERY: &str = r#"
query ($mediaId: Int, $page: Int, $perPage: Int) {
  Page(page: $page, perPage: $perPage) {
    reviews(mediaId: $mediaId, sort: RATING_DESC) {
      id
      summary
      body
      rating
      score
      user { name }
      createdAt
    }
  }
}
"#;

pub struct AniListClient {
    http: reqwest::Client,
    base_url: String,
    last_request: Mutex<Option<Instant>>,
}

impl Default for AniListClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AniListClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .connect_timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            base_url: ANILIST_API_URL.to_string(),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    async fn request(&self, query: &str, variables: serde_json::Value) -> Result<serde_json::Value> {
        // Pace requests so bursts of concurrent roasts stay under the API limit.
        {
            let mut last = self.last_request.lock().await;
            if let Some(prev) = *last {
                let elapsed = prev.elapsed();
                if elapsed < MIN_REQUEST_DELAY {
                    tokio::time::sleep(MIN_REQUEST_DELAY - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        let resp = self
            .http
            .post(&self.base_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AniListError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: GraphQlResponse = resp.json().await?;
        if let Some(err) = parsed.errors.first() {
            return Err(AniListError::GraphQl(err.message.clone()));
        }
        parsed
            .data
            .ok_or_else(|| AniListError::Parse("response missing data".to_string()))
    }

    /// Search anime by title, most popular first.
    pub async fn search(&self, query: &str, per_page: u32) -> Result<Vec<AnimeSearchResult>> {
        let query = query.trim();
        if query.len() < 2 {
            return Ok(Vec::new());
        }

        let data = self
            .request(
                SEARCH_ANIME_QUERY,
                json!({ "search": query, "page": 1, "perPage": per_page.min(50) }),
            )
            .await?;

        let media: Vec<RawMedia> =
            serde_json::from_value(data["Page"]["media"].clone()).unwrap_or_default();

        tracing::debug!(query, count = media.len(), "AniList search results");

        Ok(media
            .into_iter()
            .map(|m| AnimeSearchResult {
                id: m.id,
                title: m.title,
                cover_image: m.cover_image,
                episodes: m.episodes,
                year: m.season_year,
                score: m.average_score,
                format: m.format,
            })
            .collect())
    }

    /// Fetch full details for one anime. Returns `None` when the ID is unknown.
    pub async fn get_by_id(&self, anime_id: i64) -> Result<Option<AnimeDetails>> {
        let data = match self.request(GET_ANIME_QUERY, json!({ "id": anime_id })).await {
            Ok(data) => data,
            // AniList answers unknown IDs with a 404-status GraphQL error.
            Err(AniListError::Api { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        if data["Media"].is_null() {
            return Ok(None);
        }
        let media: RawMedia = serde_json::from_value(data["Media"].clone())?;

        let controversy_score = media
            .stats
            .as_ref()
            .map(|s| controversy_from_distribution(&s.score_distribution))
            .unwrap_or(0);

        let studios = media
            .studios
            .map(|s| s.nodes.into_iter().filter_map(|n| n.name).collect())
            .unwrap_or_default();

        Ok(Some(AnimeDetails {
            id: media.id,
            title: media.title,
            cover_image: media.cover_image,
            episodes: media.episodes,
            year: media.season_year,
            score: media.average_score,
            format: media.format,
            description: media.description,
            genres: media.genres,
            studios,
            source: media.source,
            controversy_score,
        }))
    }

    /// Fetch community reviews for an anime, highest-rated first.
    pub async fn get_reviews(&self, anime_id: i64, per_page: u32) -> Result<Vec<Review>> {
        let data = self
            .request(
                GET_REVIEWS_QUERY,
                json!({ "mediaId": anime_id, "page": 1, "perPage": per_page.min(25) }),
            )
            .await?;

        let raw: Vec<RawReview> =
            serde_json::from_value(data["Page"]["reviews"].clone()).unwrap_or_default();

        tracing::debug!(anime_id, count = raw.len(), "Fetched AniList reviews");

        Ok(raw
            .into_iter()
            .map(|r| Review {
                id: r.id,
                summary: r.summary.unwrap_or_default(),
                body: r.body.unwrap_or_default(),
                rating: r.rating,
                score: r.score,
                user_name: r
                    .user
                    .and_then(|u| u.name)
                    .unwrap_or_else(|| "Anonymous".to_string()),
                created_at: r.created_at,
            })
            .collect())
    }
}

/// Polarization heuristic over the 10-bucket score distribution: how much of
/// the vote sits in *both* tails (<=30 and >=90). A title everyone rates 5/10
/// is mediocre, not controversial; one rated 2/10 and 10/10 in equal measure
/// scores near 100.
pub(crate) fn controversy_from_distribution(buckets: &[types::RawScoreBucket]) -> u32 {
    let total: i64 = buckets.iter().map(|b| b.amount).sum();
    if total == 0 {
        return 0;
    }
    let low: i64 = buckets.iter().filter(|b| b.score <= 30).map(|b| b.amount).sum();
    let high: i64 = buckets.iter().filter(|b| b.score >= 90).map(|b| b.amount).sum();
    let tail = 2 * low.min(high);
    ((tail * 100) / total).min(100) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::RawScoreBucket;

    fn bucket(score: i32, amount: i64) -> RawScoreBucket {
        RawScoreBucket { score, amount }
    }

    #[test]
    fn controversy_zero_for_empty_distribution() {
        assert_eq!(controversy_from_distribution(&[]), 0);
    }

    #[test]
    fn controversy_zero_without_both_tails() {
        // Uniformly loved: one fat tail is not polarization.
        let buckets = vec![bucket(90, 500), bucket(100, 500)];
        assert_eq!(controversy_from_distribution(&buckets), 0);
    }

    #[test]
    fn controversy_high_for_bimodal_votes() {
        let buckets = vec![bucket(10, 400), bucket(100, 400), bucket(60, 200)];
        assert_eq!(controversy_from_distribution(&buckets), 80);
    }

    #[test]
    fn display_title_prefers_english() {
        let title = AnimeTitle {
            romaji: Some("Shingeki no Kyojin".into()),
            english: Some("Attack on Titan".into()),
            native: None,
        };
        assert_eq!(title.display(), "Attack on Titan");
    }

    #[test]
    fn display_title_falls_back_to_romaji() {
        let title = AnimeTitle {
            romaji: Some("Shingeki no Kyojin".into()),
            english: None,
            native: Some("進撃の巨人".into()),
        };
        assert_eq!(title.display(), "Shingeki no Kyojin");
    }
}
