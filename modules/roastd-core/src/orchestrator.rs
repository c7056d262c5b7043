//! Roast generation orchestration.
//!
//! Ties the pipeline together: sanitize the name, gather evidence, build the
//! prompt, and drive the generator through a bounded retry loop. Each retry
//! attempt is an immutable record; moving to the next attempt creates a new
//! one rather than mutating state in place.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cache::{response_cache_key, CacheStats, TtlCache};
use crate::clean::{clean_roast, has_statistics};
use crate::config::{GENERATOR_TIMEOUT_SECONDS, MAX_REVIEWS_TO_FETCH, MAX_ROAST_RETRIES};
use crate::context::{build_constraints, build_context};
use crate::error::{RoastError, RoastResult};
use crate::parse::{parse_response, StatsSource};
use crate::prompt::{self, NO_STATISTICS_INSTRUCTION};
use crate::sanitize::sanitize_anime_name;
use crate::traits::{GenerateError, MetadataProvider, ReviewSource, TextGenerator};
use crate::types::{AnimeMetadata, CachedRoast, ReviewContext, RoastOutcome};
use crate::validate::validate_and_fix;
use crate::{aggregate, validate};

/// One generation attempt. Immutable: retries build the next attempt from
/// the previous one instead of mutating it.
#[derive(Debug, Clone)]
struct Attempt {
    number: u32,
    corrective: Vec<String>,
}

impl Attempt {
    fn first() -> Self {
        Self {
            number: 1,
            corrective: Vec::new(),
        }
    }

    fn next(&self) -> Self {
        Self {
            number: self.number + 1,
            corrective: self.corrective.clone(),
        }
    }

    fn next_with_instruction(&self, instruction: &str) -> Self {
        let mut next = self.next();
        if !next.corrective.iter().any(|i| i == instruction) {
            next.corrective.push(instruction.to_string());
        }
        next
    }
}

/// The roast pipeline behind every `/api/roast` request.
///
/// Collaborators come in through trait objects so tests can swap in scripted
/// doubles. One instance is shared across requests; all state lives in the
/// cache.
pub struct RoastService {
    metadata: Arc<dyn MetadataProvider>,
    reviews: Arc<dyn ReviewSource>,
    generator: Arc<dyn TextGenerator>,
    cache: TtlCache<CachedRoast>,
    generation_timeout: Duration,
    max_attempts: u32,
}

impl RoastService {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        reviews: Arc<dyn ReviewSource>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            metadata,
            reviews,
            generator,
            cache: TtlCache::new(),
            generation_timeout: Duration::from_secs(GENERATOR_TIMEOUT_SECONDS),
            max_attempts: MAX_ROAST_RETRIES + 1,
        }
    }

    /// Shrink the per-attempt wall clock budget, mainly for tests.
    pub fn with_generation_timeout(mut self, budget: Duration) -> Self {
        self.generation_timeout = budget;
        self
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Produce a roast for the given anime.
    ///
    /// Metadata and review fetch failures degrade gracefully to a thinner
    /// prompt; only name validation and generator failures surface as errors.
    pub async fn generate_roast(
        &self,
        raw_name: &str,
        anime_id: Option<i64>,
    ) -> RoastResult<RoastOutcome> {
        let name = sanitize_anime_name(raw_name)?;

        let metadata = self.fetch_metadata(anime_id).await;
        let review_ctx = self.fetch_review_context(anime_id, metadata.as_ref()).await;

        let cache_key = response_cache_key(&name, review_ctx.as_ref());
        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!(anime = %name, "roast cache hit");
            return Ok(outcome_from_cached(cached, metadata.as_ref(), anime_id));
        }

        let context = match metadata.as_ref() {
            Some(meta) => build_context(meta, review_ctx.as_ref()),
            None => format!("Anime: {name}"),
        };
        let constraints = build_constraints();

        let mut attempt = Attempt::first();
        loop {
            let prompt = prompt::assemble(&name, &context, constraints, &attempt.corrective);
            debug!(anime = %name, attempt = attempt.number, "generating roast");

            let generated = match timeout(self.generation_timeout, self.generator.generate(&prompt))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(GenerateError::Timeout),
            };

            match generated {
                Ok(text) => {
                    let parsed = parse_response(&text);
                    if parsed.stats_source == StatsSource::Fallback {
                        warn!(anime = %name, "generator output missed the stats contract, using defaults");
                    }

                    let cleaned = clean_roast(&parsed.roast);
                    if has_statistics(&cleaned) && attempt.number < self.max_attempts {
                        info!(anime = %name, attempt = attempt.number, "statistics survived cleaning, retrying");
                        attempt = attempt.next_with_instruction(NO_STATISTICS_INSTRUCTION);
                        continue;
                    }

                    let (roast, issues) =
                        validate_and_fix(&cleaned, metadata.as_ref(), review_ctx.as_ref());
                    for issue in &issues {
                        info!(anime = %name, %issue, "roast validation issue");
                    }
                    let issues: Vec<String> =
                        issues.iter().map(validate::ValidationIssue::to_string).collect();

                    let cached = CachedRoast {
                        anime_name: name.clone(),
                        roast,
                        stats: parsed.stats,
                        issues,
                    };
                    self.cache.set(cache_key, cached.clone()).await;

                    info!(anime = %name, attempts = attempt.number, "roast generated");
                    return Ok(outcome_from_cached(cached, metadata.as_ref(), anime_id));
                }
                Err(GenerateError::RateLimited) => {
                    warn!(anime = %name, "generator rate limited");
                    return Err(RoastError::RateLimited);
                }
                Err(GenerateError::InvalidRequest(msg)) => {
                    warn!(anime = %name, error = %msg, "generator rejected the prompt");
                    return Err(RoastError::GenerationFailed {
                        attempts: attempt.number,
                    });
                }
                Err(GenerateError::Timeout) => {
                    warn!(anime = %name, attempt = attempt.number, "generation attempt timed out");
                    if attempt.number >= self.max_attempts {
                        return Err(RoastError::GenerationTimeout {
                            attempts: attempt.number,
                        });
                    }
                    attempt = attempt.next();
                }
                Err(err @ (GenerateError::Empty | GenerateError::Unavailable(_))) => {
                    warn!(anime = %name, attempt = attempt.number, error = %err, "generation attempt failed");
                    if attempt.number >= self.max_attempts {
                        return Err(RoastError::GenerationFailed {
                            attempts: attempt.number,
                        });
                    }
                    attempt = attempt.next();
                }
            }
        }
    }

    async fn fetch_metadata(&self, anime_id: Option<i64>) -> Option<AnimeMetadata> {
        let id = anime_id?;
        match self.metadata.get_metadata(id).await {
            Ok(meta) => meta,
            Err(err) => {
                warn!(anime_id = id, error = %err, "metadata fetch failed, degrading to name-only context");
                None
            }
        }
    }

    async fn fetch_review_context(
        &self,
        anime_id: Option<i64>,
        metadata: Option<&AnimeMetadata>,
    ) -> Option<ReviewContext> {
        let id = anime_id?;
        let meta = metadata?;
        let reviews = match self.reviews.get_reviews(id, MAX_REVIEWS_TO_FETCH).await {
            Ok(reviews) => reviews,
            Err(err) => {
                warn!(anime_id = id, error = %err, "review fetch failed, degrading to metadata-only context");
                return None;
            }
        };
        if reviews.is_empty() {
            return None;
        }
        Some(aggregate::build_review_context(&reviews, meta))
    }
}

fn outcome_from_cached(
    cached: CachedRoast,
    metadata: Option<&AnimeMetadata>,
    anime_id: Option<i64>,
) -> RoastOutcome {
    RoastOutcome {
        anime_name: cached.anime_name,
        roast: cached.roast,
        stats: cached.stats,
        issues: cached.issues,
        cover_image: metadata.and_then(|m| m.cover_image.clone()),
        anime_id: metadata.map(|m| m.id).or(anime_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        sample_metadata, sample_review, MockMetadataProvider, MockReviewSource, ScriptedGenerator,
    };

    const GOOD_RESPONSE: &str = "ROAST: Your favorite show is a powerpoint with a soundtrack.\n\
        STATS: {\"horniness_level\": 20, \"plot_armor_thickness\": 90, \"filler_hell\": 70, \
        \"power_creep\": 60, \"cringe_factor\": 40, \"fan_toxicity\": 80}";

    fn service(generator: ScriptedGenerator) -> (RoastService, Arc<ScriptedGenerator>) {
        let generator = Arc::new(generator);
        let service = RoastService::new(
            Arc::new(MockMetadataProvider::new().with_anime(sample_metadata(42))),
            Arc::new(MockReviewSource::new().with_reviews(
                42,
                vec![
                    sample_review("Honestly the pacing drags and it gets boring fast here.", Some(4)),
                    sample_review("I think the pacing drags in every single arc too.", Some(5)),
                ],
            )),
            generator.clone(),
        );
        (service, generator)
    }

    #[tokio::test]
    async fn happy_path_produces_outcome() {
        let (service, generator) = service(ScriptedGenerator::always(GOOD_RESPONSE));
        let outcome = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        assert_eq!(generator.calls(), 1);
        assert_eq!(outcome.roast, "Your favorite show is a powerpoint with a soundtrack.");
        assert_eq!(outcome.stats.plot_armor_thickness, 90);
        assert_eq!(outcome.anime_id, Some(42));
        assert!(outcome.cover_image.is_some());
    }

    #[tokio::test]
    async fn invalid_name_fails_before_any_generation() {
        let (service, generator) = service(ScriptedGenerator::always(GOOD_RESPONSE));
        let err = service.generate_roast("   ", None).await.unwrap_err();
        assert!(matches!(err, RoastError::Validation(_)));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn cleanable_statistics_never_trigger_a_retry() {
        let leaky = "ROAST: 95% of viewers agree it stinks.\nSTATS: {\"filler_hell\": 70}";
        let (service, generator) = service(ScriptedGenerator::always(leaky));
        let outcome = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        // cleaning strips the percentage, so one call suffices
        assert_eq!(generator.calls(), 1);
        assert!(!crate::clean::has_statistics(&outcome.roast));
    }

    #[tokio::test]
    async fn surviving_statistics_trigger_a_retry() {
        // "Reviews" dodges the case-sensitive removal pattern but not the
        // case-insensitive detector.
        let leaky = "ROAST: All 95 Reviews agree it stinks.\nSTATS: {\"filler_hell\": 70}";
        let (service, generator) = service(ScriptedGenerator::new(vec![
            Ok(leaky.to_string()),
            Ok(GOOD_RESPONSE.to_string()),
        ]));
        let outcome = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        assert_eq!(generator.calls(), 2);
        assert!(!crate::clean::has_statistics(&outcome.roast));
    }

    #[tokio::test]
    async fn surviving_statistics_on_final_attempt_are_accepted() {
        let leaky = "ROAST: All 95 Reviews agree it stinks.\nSTATS: {\"filler_hell\": 70}";
        let (service, generator) = service(ScriptedGenerator::new(vec![
            Ok(leaky.to_string()),
            Ok(leaky.to_string()),
            Ok(leaky.to_string()),
        ]));
        let outcome = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        // first call plus two statistic retries exhausts the budget
        assert_eq!(generator.calls(), 3);
        assert!(!outcome.roast.is_empty());
    }

    #[tokio::test]
    async fn rate_limit_is_never_retried() {
        let (service, generator) =
            service(ScriptedGenerator::new(vec![Err(GenerateError::RateLimited)]));
        let err = service.generate_roast("Sample Anime", Some(42)).await.unwrap_err();
        assert!(matches!(err, RoastError::RateLimited));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_request_fails_without_retry() {
        let (service, generator) = service(ScriptedGenerator::new(vec![Err(
            GenerateError::InvalidRequest("bad prompt".to_string()),
        )]));
        let err = service.generate_roast("Sample Anime", Some(42)).await.unwrap_err();
        assert!(matches!(err, RoastError::GenerationFailed { attempts: 1 }));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn empty_responses_exhaust_the_attempt_budget() {
        let (service, generator) = service(ScriptedGenerator::new(vec![
            Err(GenerateError::Empty),
            Err(GenerateError::Empty),
            Err(GenerateError::Empty),
        ]));
        let err = service.generate_roast("Sample Anime", Some(42)).await.unwrap_err();
        assert!(matches!(err, RoastError::GenerationFailed { attempts: 3 }));
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn transient_failure_then_success_recovers() {
        let (service, generator) = service(ScriptedGenerator::new(vec![
            Err(GenerateError::Unavailable("502".to_string())),
            Ok(GOOD_RESPONSE.to_string()),
        ]));
        let outcome = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        assert_eq!(generator.calls(), 2);
        assert!(!outcome.roast.is_empty());
    }

    #[tokio::test]
    async fn second_identical_request_is_served_from_cache() {
        let (service, generator) = service(ScriptedGenerator::always(GOOD_RESPONSE));
        let first = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        let second = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        assert_eq!(generator.calls(), 1);
        assert_eq!(first.roast, second.roast);
        assert_eq!(service.cache_stats().await.hits, 1);
    }

    #[tokio::test]
    async fn review_fetch_failure_degrades_to_metadata_only() {
        let generator = Arc::new(ScriptedGenerator::always(GOOD_RESPONSE));
        let service = RoastService::new(
            Arc::new(MockMetadataProvider::new().with_anime(sample_metadata(42))),
            Arc::new(MockReviewSource::failing()),
            generator.clone(),
        );
        let outcome = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        assert_eq!(generator.calls(), 1);
        assert!(!outcome.roast.is_empty());
    }

    #[tokio::test]
    async fn unknown_anime_degrades_to_name_only_context() {
        let generator = Arc::new(ScriptedGenerator::always(GOOD_RESPONSE));
        let service = RoastService::new(
            Arc::new(MockMetadataProvider::new()),
            Arc::new(MockReviewSource::new()),
            generator.clone(),
        );
        let outcome = service.generate_roast("Totally Obscure Show", Some(999)).await.unwrap();
        assert_eq!(outcome.anime_id, Some(999));
        assert!(outcome.cover_image.is_none());
    }

    #[tokio::test]
    async fn malformed_response_falls_back_to_default_stats() {
        let (service, _) = service(ScriptedGenerator::always("no structure whatsoever"));
        let outcome = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        assert_eq!(outcome.stats, crate::types::RoastStats::default());
    }

    #[tokio::test]
    async fn fabricated_rating_is_corrected_against_real_score() {
        // sample_metadata carries a real score of 68, so 6.8 out of 10
        let raw = "ROAST: Fans call it a 10/10 experience. It is not.\nSTATS: {\"filler_hell\": 10}";
        let (service, _) = service(ScriptedGenerator::always(raw));
        let outcome = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        assert!(outcome.roast.contains("6.8/10"), "roast: {}", outcome.roast);
        assert!(!outcome.issues.is_empty());
    }

    #[tokio::test]
    async fn fabricated_rating_is_corrected_even_without_reviews() {
        // no reviews means no review context, but the catalog score still
        // grounds the rating check
        let raw = "ROAST: Fans call it a 10/10 experience. It is not.\nSTATS: {\"filler_hell\": 10}";
        let generator = Arc::new(ScriptedGenerator::always(raw));
        let service = RoastService::new(
            Arc::new(MockMetadataProvider::new().with_anime(sample_metadata(42))),
            Arc::new(MockReviewSource::new()),
            generator.clone(),
        );
        let outcome = service.generate_roast("Sample Anime", Some(42)).await.unwrap();
        assert!(outcome.roast.contains("6.8/10"), "roast: {}", outcome.roast);
        assert!(!outcome.roast.contains("10/10"));
        assert!(!outcome.issues.is_empty());
    }

    #[tokio::test]
    async fn hanging_generator_times_out() {
        struct HangingGenerator;
        #[async_trait::async_trait]
        impl TextGenerator for HangingGenerator {
            async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                unreachable!()
            }
        }
        let service = RoastService::new(
            Arc::new(MockMetadataProvider::new()),
            Arc::new(MockReviewSource::new()),
            Arc::new(HangingGenerator),
        )
        .with_generation_timeout(Duration::from_millis(20));
        let err = service.generate_roast("Sample Anime", None).await.unwrap_err();
        assert!(matches!(err, RoastError::GenerationTimeout { attempts: 3 }));
    }
}
