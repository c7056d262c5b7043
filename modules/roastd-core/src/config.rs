use std::env;

// ---------------------------------------------------------------------------
// Review analysis
// ---------------------------------------------------------------------------

/// Minimum reviews before review-derived claims may enter the prompt context.
/// Below this the sample is too thin to represent community consensus.
pub const MIN_REVIEWS_FOR_ANALYSIS: usize = 10;

/// Maximum reviews fetched per anime.
pub const MAX_REVIEWS_TO_FETCH: u32 = 25;

/// Maximum verified complaints retained after ranking.
pub const MAX_VERIFIED_COMPLAINTS: usize = 5;

/// Minimum classifier confidence for a complaint to count toward verification.
pub const MIN_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// A complaint category must be corroborated by at least this many distinct
/// reviews before it is treated as community consensus.
pub const MIN_CORROBORATING_REVIEWS: u32 = 2;

/// Controversy score (0-100) above which reception is labeled polarizing.
pub const CONTROVERSY_THRESHOLD: u32 = 30;

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Extra generation attempts after the first (2 retries → at most 3 calls).
pub const MAX_ROAST_RETRIES: u32 = 2;

/// Wall-clock budget for one generator call.
pub const GENERATOR_TIMEOUT_SECONDS: u64 = 30;

/// Maximum accepted anime name length.
pub const MAX_ANIME_NAME_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// Response cache
// ---------------------------------------------------------------------------

pub const CACHE_TTL_SECONDS: u64 = 3600;
pub const MAX_CACHE_SIZE: usize = 1000;
pub const CACHE_CLEANUP_INTERVAL_SECONDS: u64 = 300;

// ---------------------------------------------------------------------------
// HTTP surface
// ---------------------------------------------------------------------------

pub const ROAST_RATE_LIMIT_PER_MINUTE: usize = 10;
pub const SEARCH_RATE_LIMIT_PER_MINUTE: usize = 30;
pub const MIN_SEARCH_QUERY_LENGTH: usize = 2;
pub const DEFAULT_SEARCH_RESULTS: u32 = 10;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: required_env("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .expect("PORT must be a number"),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
