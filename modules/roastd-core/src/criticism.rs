//! Lexical criticism classifier.
//!
//! Deliberately cheap keyword heuristics instead of a sentiment model: every
//! confidence score must trace back to explicit phrase matches, and
//! classification runs synchronously per request with no external calls.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::Sentiment;

/// Closed set of criticism categories the pipeline recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticismCategory {
    Pacing,
    Plot,
    Characters,
    Animation,
    Ending,
    PowerScaling,
    Adaptation,
    FanService,
}

impl CriticismCategory {
    pub const ALL: [CriticismCategory; 8] = [
        CriticismCategory::Pacing,
        CriticismCategory::Plot,
        CriticismCategory::Characters,
        CriticismCategory::Animation,
        CriticismCategory::Ending,
        CriticismCategory::PowerScaling,
        CriticismCategory::Adaptation,
        CriticismCategory::FanService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CriticismCategory::Pacing => "pacing",
            CriticismCategory::Plot => "plot",
            CriticismCategory::Characters => "characters",
            CriticismCategory::Animation => "animation",
            CriticismCategory::Ending => "ending",
            CriticismCategory::PowerScaling => "power_scaling",
            CriticismCategory::Adaptation => "adaptation",
            CriticismCategory::FanService => "fan_service",
        }
    }

    /// Human-facing label for prompt context ("Power Scaling", not
    /// "power_scaling").
    pub fn label(&self) -> &'static str {
        match self {
            CriticismCategory::Pacing => "Pacing",
            CriticismCategory::Plot => "Plot",
            CriticismCategory::Characters => "Characters",
            CriticismCategory::Animation => "Animation",
            CriticismCategory::Ending => "Ending",
            CriticismCategory::PowerScaling => "Power Scaling",
            CriticismCategory::Adaptation => "Adaptation",
            CriticismCategory::FanService => "Fan Service",
        }
    }

    pub(crate) fn patterns(&self) -> &'static CategoryPatterns {
        match self {
            CriticismCategory::Pacing => &PACING,
            CriticismCategory::Plot => &PLOT,
            CriticismCategory::Characters => &CHARACTERS,
            CriticismCategory::Animation => &ANIMATION,
            CriticismCategory::Ending => &ENDING,
            CriticismCategory::PowerScaling => &POWER_SCALING,
            CriticismCategory::Adaptation => &ADAPTATION,
            CriticismCategory::FanService => &FAN_SERVICE,
        }
    }
}

impl std::fmt::Display for CriticismCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static detection vocabulary for one category. All phrases lowercase;
/// matching is case-insensitive substring containment.
pub(crate) struct CategoryPatterns {
    pub keywords: &'static [&'static str],
    pub positive: &'static [&'static str],
    pub negative: &'static [&'static str],
}

static PACING: CategoryPatterns = CategoryPatterns {
    keywords: &[
        "pacing", "slow", "rushed", "dragging", "filler", "boring", "pace", "too long", "bloated",
    ],
    positive: &["perfect pacing", "well-paced", "never drags", "great pacing"],
    negative: &["too slow", "drags", "rushed", "boring", "filler hell", "padding"],
};

static PLOT: CategoryPatterns = CategoryPatterns {
    keywords: &[
        "plot holes",
        "inconsistent",
        "makes no sense",
        "confusing",
        "predictable",
        "cliche",
        "trope",
        "formulaic",
        "asspull",
    ],
    positive: &["great story", "masterpiece", "well written", "engaging plot"],
    negative: &["plot holes", "makes no sense", "asspull", "convenient", "lazy writing"],
};

static CHARACTERS: CategoryPatterns = CategoryPatterns {
    keywords: &[
        "character development",
        "shallow",
        "one-dimensional",
        "annoying",
        "unlikable",
        "bland",
        "mary sue",
        "gary stu",
        "generic protagonist",
    ],
    positive: &[
        "great characters",
        "character development",
        "complex",
        "relatable",
        "memorable",
    ],
    negative: &["shallow", "annoying", "bland", "no development", "generic"],
};

static ANIMATION: CategoryPatterns = CategoryPatterns {
    keywords: &[
        "animation", "art", "budget", "quality drop", "off-model", "still frames", "cgi", "sakuga",
    ],
    positive: &["beautiful animation", "stunning", "sakuga", "great art"],
    negative: &["quality drop", "budget cuts", "off-model", "still frames", "bad cgi"],
};

static ENDING: CategoryPatterns = CategoryPatterns {
    keywords: &[
        "ending",
        "finale",
        "conclusion",
        "rushed ending",
        "disappointing ending",
        "last episode",
    ],
    positive: &["satisfying ending", "perfect conclusion", "great finale"],
    negative: &["rushed ending", "disappointing", "bad ending", "fell apart"],
};

static POWER_SCALING: CategoryPatterns = CategoryPatterns {
    keywords: &[
        "power creep",
        "asspull",
        "plot armor",
        "convenient",
        "deus ex machina",
        "power scaling",
    ],
    positive: &["well explained", "consistent powers", "logical progression"],
    negative: &["power creep", "plot armor", "asspull", "inconsistent"],
};

static ADAPTATION: CategoryPatterns = CategoryPatterns {
    keywords: &[
        "adaptation",
        "read the manga",
        "skipped",
        "cut content",
        "rushed adaptation",
        "anime original",
    ],
    positive: &["great adaptation", "faithful", "improved"],
    negative: &["butchered", "rushed adaptation", "skipped arcs", "read the manga"],
};

static FAN_SERVICE: CategoryPatterns = CategoryPatterns {
    keywords: &["fan service", "ecchi", "harem", "unnecessary scenes", "sexualization"],
    positive: &["tasteful", "subtle", "rare"],
    negative: &["too much fan service", "unnecessary", "creepy", "uncomfortable"],
};

/// Markers of first-person, reasoned commentary as opposed to drive-by memes.
/// Their presence earns a flat confidence bonus.
const GENUINE_OPINION_MARKERS: &[&str] = &[
    "personally",
    "for me",
    "i felt",
    "i think",
    "in my opinion",
    "the reason",
    "because",
    "the problem is",
    "while",
    "although",
];

const GENUINE_OPINION_BONUS: f32 = 0.1;

/// Sentence length bounds: rejects fragments and essay-length digressions.
const MIN_SENTENCE_LEN: usize = 15;
const MAX_SENTENCE_LEN: usize = 200;

static SENTENCE_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Score a sentence's sentiment toward one criticism category.
///
/// Counts positive- and negative-indicator phrase matches; the majority side
/// wins with confidence `0.5 + majority/total * 0.5` (capped at 1.0), a tie
/// is `Mixed` at 0.5, and no matches at all is `Neutral` at 0.0.
pub fn classify(sentence: &str, category: CriticismCategory) -> (Sentiment, f32) {
    if sentence.is_empty() {
        return (Sentiment::Neutral, 0.0);
    }

    let text = sentence.to_lowercase();
    let patterns = category.patterns();

    let pos = patterns.positive.iter().filter(|p| text.contains(*p)).count();
    let neg = patterns.negative.iter().filter(|p| text.contains(*p)).count();
    let total = pos + neg;
    if total == 0 {
        return (Sentiment::Neutral, 0.0);
    }

    let (sentiment, mut confidence) = if neg > pos {
        (Sentiment::Negative, (0.5 + (neg as f32 / total as f32) * 0.5).min(1.0))
    } else if pos > neg {
        (Sentiment::Positive, (0.5 + (pos as f32 / total as f32) * 0.5).min(1.0))
    } else {
        (Sentiment::Mixed, 0.5)
    };

    if GENUINE_OPINION_MARKERS.iter().any(|m| text.contains(m)) {
        confidence = (confidence + GENUINE_OPINION_BONUS).min(1.0);
    }

    (sentiment, confidence)
}

/// Find the first sentence in a review that raises the given category.
///
/// Sentences are split on `.!?` runs and only inspected when their trimmed
/// length falls within [15, 200] characters.
pub fn find_complaint_sentence(text: &str, category: CriticismCategory) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    let keywords = category.patterns().keywords;

    for raw in SENTENCE_SPLIT.split(text) {
        let sentence = raw.trim();
        if sentence.len() < MIN_SENTENCE_LEN || sentence.len() > MAX_SENTENCE_LEN {
            continue;
        }
        let lower = sentence.to_lowercase();
        if keywords.iter().any(|k| lower.contains(k)) {
            return Some(sentence.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_when_no_indicators_match() {
        let (sentiment, confidence) =
            classify("the weather outside is frightful today", CriticismCategory::Pacing);
        assert_eq!(sentiment, Sentiment::Neutral);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn negative_majority_wins() {
        let (sentiment, confidence) = classify(
            "it drags so much and the filler hell never ends",
            CriticismCategory::Pacing,
        );
        assert_eq!(sentiment, Sentiment::Negative);
        // 2 negative / 0 positive → 0.5 + 1.0 * 0.5 = 1.0
        assert!((confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn tie_is_mixed_at_half() {
        let (sentiment, confidence) = classify(
            "great pacing at first but later it drags",
            CriticismCategory::Pacing,
        );
        assert_eq!(sentiment, Sentiment::Mixed);
        assert!((confidence - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn genuine_marker_adds_bonus() {
        let (_, base) = classify("the show drags badly", CriticismCategory::Pacing);
        let (_, boosted) = classify("personally i found the show drags badly", CriticismCategory::Pacing);
        assert!((boosted - (base + 0.1).min(1.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn confidence_always_in_unit_interval() {
        let samples = [
            "personally i think it drags, is rushed, boring, padding, filler hell, too slow",
            "perfect pacing, well-paced, never drags, great pacing, i felt it because",
            "",
            "mid",
        ];
        for text in samples {
            for category in CriticismCategory::ALL {
                let (_, confidence) = classify(text, category);
                assert!((0.0..=1.0).contains(&confidence), "{text} / {category}");
            }
        }
    }

    #[test]
    fn finds_keyword_sentence_within_bounds() {
        let text = "Great show overall. The pacing in the middle arc is dreadful though. Loved it.";
        let found = find_complaint_sentence(text, CriticismCategory::Pacing);
        assert_eq!(
            found.as_deref(),
            Some("The pacing in the middle arc is dreadful though")
        );
    }

    #[test]
    fn skips_short_fragments() {
        // "slow." alone is under the 15-char floor.
        assert!(find_complaint_sentence("slow.", CriticismCategory::Pacing).is_none());
    }

    #[test]
    fn skips_overlong_sentences() {
        let long = format!("the pacing is bad {}", "really ".repeat(40));
        assert!(find_complaint_sentence(&long, CriticismCategory::Pacing).is_none());
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let found = find_complaint_sentence(
            "The PACING here is absolutely terrible",
            CriticismCategory::Pacing,
        );
        assert!(found.is_some());
    }
}
