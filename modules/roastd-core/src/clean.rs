//! Roast text cleanup.
//!
//! Removes leaked statistics and overused hype phrases, then repairs the
//! whitespace and punctuation damage the removals leave behind. Cleaning is
//! idempotent: running it twice yields the same text.

use std::sync::LazyLock;

use regex::Regex;

/// Removal patterns, applied in order. Broader numeric patterns come before
/// narrower ones so partial overlaps cannot leave fragments.
static REMOVAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d+%",
        r"\b\d+ percent",
        r"(?i)\bout of \d+ reviews?\b",
        r"\b\d+ reviews?\b",
        r"\b\d+\.\d+/10\b",
        r"\bscored \d+",
        r"(?i)\brating of \d+",
        r"(?i)\baccording to (the )?data\b",
        r"(?i)\bstatistics show\b",
        r"(?i)\bdata indicates\b",
        r"(?i)\bcoming in at\b",
        r"(?i)\ban earth-shattering\b",
        r"(?i)\bglorious\b",
        r"(?i)\bearth-shattering\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,!?])").unwrap());
/// Doubled-punctuation repairs, one pattern per mark. The `regex` crate has
/// no backreferences, so the same-mark pairs are spelled out.
static DOUBLED_PUNCT: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\.\s*\.", "."),
        (r",\s*,", ","),
        (r"!\s*!", "!"),
        (r"\?\s*\?", "?"),
    ]
    .iter()
    .map(|(p, rep)| (Regex::new(p).unwrap(), *rep))
    .collect()
});
static EMPTY_PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\s*\)").unwrap());
static EMPTY_BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\s*\]").unwrap());

/// Detection patterns for the retry decision. A subset of the removal list:
/// only the leaks worth burning another generation attempt on.
static STATISTIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d+%",
        r"(?i)\b\d+ reviews?\b",
        r"\b\d+\.\d+/10\b",
        r"(?i)\b(according to (the )?data|statistics show|data indicates)\b",
        r"(?i)\bcoming in at\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Strip statistics and hype phrases from a roast, repairing punctuation
/// afterwards.
pub fn clean_roast(text: &str) -> String {
    let mut out = text.to_string();

    for pattern in REMOVAL_PATTERNS.iter() {
        out = pattern.replace_all(&out, "").into_owned();
    }

    // drop emptied brackets before collapsing whitespace so the gap they
    // leave gets folded too
    out = EMPTY_PARENS.replace_all(&out, "").into_owned();
    out = EMPTY_BRACKETS.replace_all(&out, "").into_owned();
    out = WHITESPACE_RUN.replace_all(&out, " ").into_owned();
    out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1").into_owned();
    for (pattern, replacement) in DOUBLED_PUNCT.iter() {
        // loop to a fixpoint so runs longer than two collapse fully
        while pattern.is_match(&out) {
            out = pattern.replace_all(&out, *replacement).into_owned();
        }
    }

    out.trim().to_string()
}

/// Whether statistic leaks remain in a roast. Checked after cleaning to
/// decide whether another generation attempt is worth spending.
pub fn has_statistics(text: &str) -> bool {
    STATISTIC_PATTERNS.iter().any(|p| p.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_percentages() {
        assert_eq!(clean_roast("a whopping 73% of viewers dropped it"), "a whopping of viewers dropped it");
    }

    #[test]
    fn removes_review_counts_and_ratings() {
        let cleaned = clean_roast("Across 140 reviews it holds a dire 4.2/10, allegedly.");
        assert!(!cleaned.contains("140"));
        assert!(!cleaned.contains("4.2/10"));
    }

    #[test]
    fn removes_statistical_phrasing() {
        let cleaned = clean_roast("According to the data, statistics show this is mid.");
        assert!(!cleaned.to_lowercase().contains("according to"));
        assert!(!cleaned.to_lowercase().contains("statistics show"));
    }

    #[test]
    fn removes_hype_words() {
        let cleaned = clean_roast("An earth-shattering disappointment, truly Glorious failure.");
        assert!(!cleaned.to_lowercase().contains("earth-shattering"));
        assert!(!cleaned.to_lowercase().contains("glorious"));
    }

    #[test]
    fn repairs_punctuation_after_removal() {
        let cleaned = clean_roast("It scored 3 , coming in at , dead last.");
        assert!(!cleaned.contains(" ,"));
        assert!(!cleaned.contains(",,"));
    }

    #[test]
    fn collapses_doubled_punctuation() {
        assert_eq!(clean_roast("So bad.. Really bad!!"), "So bad. Really bad!");
        assert_eq!(clean_roast("Why!!!!"), "Why!");
        // mixed marks are deliberate emphasis, not removal damage
        assert_eq!(clean_roast("Wait?! What"), "Wait?! What");
    }

    #[test]
    fn removes_emptied_parentheticals() {
        let cleaned = clean_roast("A flop (4.2/10) by any measure [87%] honestly.");
        assert!(!cleaned.contains("()"));
        assert!(!cleaned.contains("[]"));
        assert!(!cleaned.contains("( )"));
    }

    #[test]
    fn cleaning_is_idempotent() {
        let samples = [
            "A 90% masterpiece according to the data, 12 reviews agree, 9.9/10.",
            "Plain text with no numbers at all.",
            "Coming in at an earth-shattering position (73%) overall!",
        ];
        for sample in samples {
            let once = clean_roast(sample);
            assert_eq!(clean_roast(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn clean_output_passes_statistics_check() {
        let dirty = "Statistics show 42% of its 300 reviews rate it 2.1/10, coming in at rock bottom.";
        assert!(has_statistics(dirty));
        assert!(!has_statistics(&clean_roast(dirty)));
    }

    #[test]
    fn plain_prose_has_no_statistics() {
        assert!(!has_statistics("The pacing is glacial and the hero is cardboard."));
    }
}
