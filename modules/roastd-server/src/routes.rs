use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

use anilist_client::AniListClient;
use roastd_core::config::{
    Config, DEFAULT_SEARCH_RESULTS, MIN_SEARCH_QUERY_LENGTH, ROAST_RATE_LIMIT_PER_MINUTE,
    SEARCH_RATE_LIMIT_PER_MINUTE,
};
use roastd_core::{RoastError, RoastService};

pub struct AppState {
    pub service: RoastService,
    pub anilist: Arc<AniListClient>,
    /// Per-IP sliding windows, one per endpoint class.
    pub rate_limiter: Mutex<HashMap<(IpAddr, &'static str), Vec<Instant>>>,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
    error_code: &'static str,
}

fn error_response(status: StatusCode, error_code: &'static str, detail: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
            error_code,
        }),
    )
        .into_response()
}

/// Check a sliding-window rate limit. Returns true if the request is allowed.
/// Prunes expired entries and records the new request if allowed.
pub fn check_rate_limit(
    entries: &mut Vec<Instant>,
    now: Instant,
    max_per_window: usize,
    window: Duration,
) -> bool {
    // checked_sub: the monotonic clock can be younger than the window right
    // after boot, in which case nothing has expired yet
    if let Some(cutoff) = now.checked_sub(window) {
        entries.retain(|t| *t > cutoff);
    }
    if entries.len() >= max_per_window {
        return false;
    }
    entries.push(now);
    true
}

/// Short stable digest of an IP for log correlation without storing the
/// address itself.
fn hash_ip(ip: IpAddr) -> String {
    let digest = Sha256::digest(ip.to_string().as_bytes());
    hex::encode(&digest[..8])
}

async fn enforce_rate_limit(
    state: &AppState,
    ip: IpAddr,
    endpoint: &'static str,
    max_per_minute: usize,
) -> bool {
    let mut limiter = state.rate_limiter.lock().await;
    // Bound the map so one scan of the IPv6 space cannot hold memory forever.
    if limiter.len() > 10_000 {
        limiter.retain(|_, entries| !entries.is_empty());
    }
    let entries = limiter.entry((ip, endpoint)).or_default();
    check_rate_limit(entries, Instant::now(), max_per_minute, Duration::from_secs(60))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cache = state.service.cache_stats().await;
    Json(serde_json::json!({
        "status": "ok",
        "cache": {
            "entries": cache.entries,
            "hits": cache.hits,
            "misses": cache.misses,
        },
    }))
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
    limit: Option<u32>,
}

#[derive(Serialize)]
struct ApiAnime {
    id: i64,
    title: String,
    cover_image: Option<String>,
    episodes: Option<i32>,
    year: Option<i32>,
    score: Option<i32>,
    format: Option<String>,
}

async fn api_search(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = params.q.trim();
    if query.chars().count() < MIN_SEARCH_QUERY_LENGTH {
        return error_response(
            StatusCode::BAD_REQUEST,
            "query_too_short",
            format!("search query must be at least {MIN_SEARCH_QUERY_LENGTH} characters"),
        );
    }

    let ip = addr.ip();
    if !enforce_rate_limit(&state, ip, "search", SEARCH_RATE_LIMIT_PER_MINUTE).await {
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "too many searches, slow down",
        );
    }

    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_RESULTS);
    match state.anilist.search(query, limit).await {
        Ok(results) => {
            let results: Vec<ApiAnime> = results
                .into_iter()
                .map(|r| ApiAnime {
                    id: r.id,
                    title: r.title.display().to_string(),
                    cover_image: r.cover_image.large.or(r.cover_image.medium),
                    episodes: r.episodes,
                    year: r.year,
                    score: r.score,
                    format: r.format,
                })
                .collect();
            Json(serde_json::json!({ "results": results })).into_response()
        }
        Err(e) => {
            warn!(client = %hash_ip(ip), error = %e, "anime search failed");
            error_response(
                StatusCode::BAD_GATEWAY,
                "upstream_unavailable",
                "anime catalog is unavailable right now",
            )
        }
    }
}

async fn api_anime_detail(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    Path(anime_id): Path<i64>,
) -> impl IntoResponse {
    if !enforce_rate_limit(&state, addr.ip(), "details", SEARCH_RATE_LIMIT_PER_MINUTE).await {
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "too many lookups, slow down",
        );
    }

    match state.anilist.get_by_id(anime_id).await {
        Ok(Some(details)) => Json(details).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "not_found", "unknown anime id"),
        Err(e) => {
            warn!(anime_id, error = %e, "anime detail fetch failed");
            error_response(
                StatusCode::BAD_GATEWAY,
                "upstream_unavailable",
                "anime catalog is unavailable right now",
            )
        }
    }
}

#[derive(Deserialize)]
struct RoastRequest {
    anime_name: String,
    anime_id: Option<i64>,
}

fn roast_error_response(err: RoastError) -> axum::response::Response {
    let (status, error_code) = match &err {
        RoastError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        RoastError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        RoastError::GenerationTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "generation_timeout"),
        RoastError::GenerationFailed { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "generation_failed")
        }
        RoastError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
    };
    error_response(status, error_code, err.to_string())
}

async fn api_roast(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    Json(body): Json<RoastRequest>,
) -> impl IntoResponse {
    let ip = addr.ip();
    if !enforce_rate_limit(&state, ip, "roast", ROAST_RATE_LIMIT_PER_MINUTE).await {
        info!(client = %hash_ip(ip), "roast rate limit hit");
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "too many roasts, give the writers a minute",
        );
    }

    match state.service.generate_roast(&body.anime_name, body.anime_id).await {
        Ok(outcome) => {
            info!(client = %hash_ip(ip), anime = %outcome.anime_name, "roast served");
            Json(outcome).into_response()
        }
        Err(err) => {
            warn!(client = %hash_ip(ip), error = %err, "roast request failed");
            roast_error_response(err)
        }
    }
}

/// Build the application router with CORS, security headers, and request
/// tracing.
pub fn router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.allowed_origins.is_empty() {
        tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        tower_http::cors::CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    };

    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/health", get(health))
        .route("/api/search", get(api_search))
        .route("/api/anime/{id}", get(api_anime_detail))
        .route("/api/roast", post(api_roast))
        .with_state(state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        // Logging layer: method + path + status + latency only (no query params, no IP)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_allows_up_to_max() {
        let mut entries = Vec::new();
        let now = Instant::now();
        for _ in 0..10 {
            assert!(check_rate_limit(&mut entries, now, 10, Duration::from_secs(60)));
        }
        assert_eq!(entries.len(), 10);
    }

    #[test]
    fn rate_limit_rejects_past_max() {
        let mut entries = Vec::new();
        let now = Instant::now();
        for _ in 0..10 {
            assert!(check_rate_limit(&mut entries, now, 10, Duration::from_secs(60)));
        }
        assert!(!check_rate_limit(&mut entries, now, 10, Duration::from_secs(60)));
        // entries must not grow past the cap
        assert_eq!(entries.len(), 10);
    }

    #[test]
    fn rate_limit_prunes_expired_entries() {
        let now = Instant::now();
        let mut entries = vec![now - Duration::from_secs(120); 10];
        assert!(check_rate_limit(&mut entries, now, 10, Duration::from_secs(60)));
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn rate_limit_survives_a_window_longer_than_clock_uptime() {
        // a window the monotonic clock cannot reach back through must not
        // panic; nothing has expired in that case
        let mut entries = Vec::new();
        let now = Instant::now();
        let window = Duration::from_secs(u64::MAX);
        assert!(check_rate_limit(&mut entries, now, 10, window));
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn ip_hash_is_stable_and_short() {
        let ip: IpAddr = "203.0.113.9".parse().unwrap();
        let a = hash_ip(ip);
        let b = hash_ip(ip);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(hash_ip("203.0.113.10".parse().unwrap()), a);
    }

    #[test]
    fn roast_errors_map_to_expected_status_codes() {
        let cases = [
            (RoastError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (RoastError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                RoastError::GenerationTimeout { attempts: 3 },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                RoastError::GenerationFailed { attempts: 3 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RoastError::UpstreamUnavailable("down".into()),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(roast_error_response(err).status(), expected);
        }
    }
}
