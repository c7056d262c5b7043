//! Roast validation against the evidence that backed it.
//!
//! The generator occasionally invents ratings or complaints no review made.
//! Validation catches those, rewrites or softens the offending text, and
//! reports every issue found.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::criticism::CriticismCategory;
use crate::types::{AnimeMetadata, ReviewContext};

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    /// A cited rating contradicts the real aggregate score.
    FakeRating { claimed: f32, actual: f32 },
    /// A rating was cited but no real score exists to check it against.
    SuspiciousRating { claimed: f32 },
    /// A complaint category no corroborated review backs.
    UnverifiedClaim { category: CriticismCategory },
    /// Too much meme vocabulary crowding out actual criticism.
    MemeOveruse { count: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::FakeRating { claimed, actual } => {
                write!(f, "replaced fabricated rating {claimed:.1}/10 with actual {actual:.1}/10")
            }
            ValidationIssue::SuspiciousRating { claimed } => {
                write!(f, "removed unverifiable rating {claimed:.1}/10")
            }
            ValidationIssue::UnverifiedClaim { category } => {
                write!(f, "softened unverified {category} complaint")
            }
            ValidationIssue::MemeOveruse { count } => {
                write!(f, "excessive meme language ({count} phrases)")
            }
        }
    }
}

static RATING_CLAIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)/10\b").unwrap());
static RATING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\b\d+(?:\.\d+)?/10\b").unwrap());

/// Keywords that signal the roast leans on a category, paired with the
/// softeners applied when that category is unverified.
struct UnverifiedRule {
    category: CriticismCategory,
    keywords: &'static [&'static str],
    softeners: &'static [(&'static str, &'static str)],
}

static UNVERIFIED_RULES: LazyLock<Vec<(UnverifiedRule, Vec<Regex>)>> = LazyLock::new(|| {
    let rules = [
        UnverifiedRule {
            category: CriticismCategory::Pacing,
            keywords: &["pacing", "slow", "dragging", "rushed"],
            softeners: &[
                (r"(?i)(?:the )?pacing (?:is|was) (?:terrible|awful|bad)", "the pacing isn't for everyone"),
                (r"(?i)painfully slow", "deliberately paced"),
                (r"(?i)drags? (?:on )?endlessly", "takes its time"),
            ],
        },
        UnverifiedRule {
            category: CriticismCategory::Characters,
            keywords: &["character", "protagonist", "unlikable", "shallow"],
            softeners: &[
                (r"(?i)(?:the )?characters (?:are|were) (?:terrible|awful|unlikable|shallow)", "the characters are divisive"),
                (r"(?i)one-dimensional cast", "a cast that splits opinion"),
            ],
        },
        UnverifiedRule {
            category: CriticismCategory::Ending,
            keywords: &["ending", "finale", "conclusion", "fell off"],
            softeners: &[
                (r"(?i)(?:the )?ending (?:is|was) (?:terrible|awful|bad|a disaster)", "the ending divides people"),
                (r"(?i)completely fell off", "shifted gears"),
            ],
        },
    ];

    rules
        .into_iter()
        .map(|rule| {
            let compiled = rule
                .softeners
                .iter()
                .map(|(pattern, _)| Regex::new(pattern).unwrap())
                .collect();
            (rule, compiled)
        })
        .collect()
});

const MEME_VOCABULARY: &[&str] = &["cope", "copium", "mid", "fell off", "peaked", "carried by"];
const MEME_OVERUSE_THRESHOLD: usize = 3;

/// Check a roast against what is actually known about the anime, fixing what
/// can be fixed.
///
/// The real score comes from catalog metadata so rating checks still work
/// when the review fetch failed. Claim softening needs review evidence to
/// judge against, so a `None` context leaves category claims alone.
pub fn validate_and_fix(
    roast: &str,
    metadata: Option<&AnimeMetadata>,
    context: Option<&ReviewContext>,
) -> (String, Vec<ValidationIssue>) {
    let mut text = roast.to_string();
    let mut issues = Vec::new();

    check_ratings(&mut text, metadata.and_then(AnimeMetadata::score_out_of_10), &mut issues);
    soften_unverified_claims(&mut text, context, &mut issues);
    check_meme_overuse(&text, &mut issues);

    (text, issues)
}

fn check_ratings(text: &mut String, real_score: Option<f32>, issues: &mut Vec<ValidationIssue>) {
    let claims: Vec<f32> = RATING_CLAIM
        .captures_iter(text)
        .filter_map(|capture| capture[1].parse().ok())
        .collect();
    if claims.is_empty() {
        return;
    }

    match real_score {
        Some(actual) => {
            let fabricated: Vec<f32> = claims
                .into_iter()
                .filter(|claimed| (claimed - actual).abs() > 1.0)
                .collect();
            if fabricated.is_empty() {
                return;
            }
            for claimed in fabricated {
                issues.push(ValidationIssue::FakeRating { claimed, actual });
            }
            let replacement = format!("{actual:.1}/10");
            *text = RATING_CLAIM.replace_all(text, replacement.as_str()).into_owned();
        }
        None => {
            for claimed in claims {
                issues.push(ValidationIssue::SuspiciousRating { claimed });
            }
            *text = RATING_TOKEN.replace_all(text, "").into_owned();
        }
    }
}

fn soften_unverified_claims(
    text: &mut String,
    context: Option<&ReviewContext>,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(ctx) = context else {
        return;
    };

    for (rule, patterns) in UNVERIFIED_RULES.iter() {
        if ctx.has_verified(rule.category) {
            continue;
        }

        let lower = text.to_lowercase();
        if !rule.keywords.iter().any(|k| lower.contains(k)) {
            continue;
        }

        let mut softened = false;
        for (pattern, (_, replacement)) in patterns.iter().zip(rule.softeners.iter()) {
            if pattern.is_match(text) {
                *text = pattern.replace_all(text, *replacement).into_owned();
                softened = true;
            }
        }
        if softened {
            issues.push(ValidationIssue::UnverifiedClaim { category: rule.category });
        }
    }
}

fn check_meme_overuse(text: &str, issues: &mut Vec<ValidationIssue>) {
    let lower = text.to_lowercase();
    let count: usize = MEME_VOCABULARY
        .iter()
        .map(|phrase| lower.matches(phrase).count())
        .sum();
    if count >= MEME_OVERUSE_THRESHOLD {
        issues.push(ValidationIssue::MemeOveruse { count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SentimentBreakdown;
    use crate::types::VerifiedComplaint;

    fn meta_with_score(score: Option<u32>) -> AnimeMetadata {
        AnimeMetadata {
            id: 1,
            display_title: "Test Anime".to_string(),
            year: None,
            episodes: None,
            format: None,
            studios: vec![],
            genres: vec![],
            score,
            source: None,
            controversy_score: 0,
            cover_image: None,
        }
    }

    fn ctx() -> ReviewContext {
        ReviewContext {
            review_count: 12,
            verified_complaints: vec![],
            sentiment: SentimentBreakdown::default(),
            meme_phrases: vec![],
            score_out_of_10: Some(6.0),
            is_controversial: false,
            controversy_score: 0,
        }
    }

    #[test]
    fn fabricated_rating_is_replaced_with_actual() {
        let meta = meta_with_score(Some(51));
        let (fixed, issues) = validate_and_fix(
            "Fans swear it deserves its 9.9/10 but they are lying.",
            Some(&meta),
            Some(&ctx()),
        );
        assert!(fixed.contains("5.1/10"));
        assert!(!fixed.contains("9.9/10"));
        assert_eq!(issues, vec![ValidationIssue::FakeRating { claimed: 9.9, actual: 5.1 }]);
    }

    #[test]
    fn rating_within_tolerance_is_untouched() {
        let meta = meta_with_score(Some(78));
        let (fixed, issues) = validate_and_fix("A solid 8/10 if you squint.", Some(&meta), None);
        assert_eq!(fixed, "A solid 8/10 if you squint.");
        assert!(issues.is_empty());
    }

    #[test]
    fn rating_without_real_score_is_stripped() {
        let meta = meta_with_score(None);
        let (fixed, issues) =
            validate_and_fix("Critics gave it 2.0/10, apparently.", Some(&meta), None);
        assert!(!fixed.contains("/10"));
        assert_eq!(issues, vec![ValidationIssue::SuspiciousRating { claimed: 2.0 }]);
    }

    #[test]
    fn metadata_score_corrects_ratings_without_review_context() {
        // review fetch failure leaves no context, but the catalog score is
        // still the ground truth for cited ratings
        let meta = meta_with_score(Some(68));
        let (fixed, issues) =
            validate_and_fix("Fans insist it is a 9.9/10 classic. It is not.", Some(&meta), None);
        assert!(fixed.contains("6.8/10"), "roast: {fixed}");
        assert!(!fixed.contains("9.9/10"));
        assert_eq!(issues, vec![ValidationIssue::FakeRating { claimed: 9.9, actual: 6.8 }]);
    }

    #[test]
    fn every_rating_token_is_checked_not_just_the_first() {
        let meta = meta_with_score(Some(68));
        let (fixed, issues) = validate_and_fix(
            "A fair 6.5/10 show, though fans scream 10/10 daily.",
            Some(&meta),
            None,
        );
        assert!(!fixed.contains("10/10"), "fabricated rating survived: {fixed}");
        assert!(fixed.contains("6.8/10"));
        assert_eq!(issues, vec![ValidationIssue::FakeRating { claimed: 10.0, actual: 6.8 }]);
    }

    #[test]
    fn unverified_pacing_claim_is_softened() {
        let (fixed, issues) =
            validate_and_fix("The pacing is terrible, full stop.", None, Some(&ctx()));
        assert!(fixed.contains("the pacing isn't for everyone"));
        assert_eq!(
            issues,
            vec![ValidationIssue::UnverifiedClaim { category: CriticismCategory::Pacing }]
        );
    }

    #[test]
    fn verified_category_keeps_its_claim() {
        let mut ctx = ctx();
        ctx.verified_complaints.push(VerifiedComplaint {
            category: CriticismCategory::Pacing,
            confidence: 0.8,
            review_count: 3,
            example_quotes: vec![],
        });
        let (fixed, issues) =
            validate_and_fix("The pacing is terrible, full stop.", None, Some(&ctx));
        assert_eq!(fixed, "The pacing is terrible, full stop.");
        assert!(issues.is_empty());
    }

    #[test]
    fn no_review_context_leaves_claims_alone() {
        // with no review evidence either way there is nothing to judge
        // category claims against, so the joke stands
        let (fixed, issues) = validate_and_fix("The ending was a disaster.", None, None);
        assert_eq!(fixed, "The ending was a disaster.");
        assert!(issues.is_empty());
    }

    #[test]
    fn meme_overuse_is_flagged_but_not_rewritten() {
        let roast = "Pure copium. It peaked early, fell off hard, and stayed mid.";
        let (fixed, issues) = validate_and_fix(roast, None, None);
        assert_eq!(fixed, roast);
        assert!(issues.iter().any(|i| matches!(i, ValidationIssue::MemeOveruse { count } if *count >= 3)));
    }

    #[test]
    fn light_meme_use_passes() {
        let (_, issues) = validate_and_fix("It's mid and that is all.", None, Some(&ctx()));
        assert!(issues.is_empty());
    }
}
