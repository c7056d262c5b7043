//! Input sanitization for user-supplied anime names.
//!
//! Anime names flow straight into LLM prompts, so this is the one place
//! untrusted text gets scrubbed before it can steer the generator.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::MAX_ANIME_NAME_LENGTH;
use crate::error::{RoastError, RoastResult};

/// Instruction-override phrasings commonly used to hijack a prompt.
static INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)ignore\s+(all\s+)?(previous|prior|above)\s+instructions?",
        r"(?i)disregard\s+(all\s+)?(previous|prior|above)",
        r"(?i)forget\s+(everything|all|your\s+instructions?)",
        r"(?i)you\s+are\s+now\s+",
        r"(?i)system\s*prompt",
        r"(?i)new\s+instructions?:",
        r"(?i)act\s+as\s+(a|an)\s+",
        r"(?i)</?\s*(system|assistant|user)\s*>",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Validate and normalize an anime name.
///
/// Strips control characters, removes injection phrasings, collapses
/// whitespace, and enforces the length cap. Returns `Validation` errors
/// suitable for a 400 response.
pub fn sanitize_anime_name(raw: &str) -> RoastResult<String> {
    // tabs and newlines are control characters too, but deleting them would
    // glue the surrounding words together; leave them for the collapse step
    let mut name: String = raw
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    for pattern in INJECTION_PATTERNS.iter() {
        name = pattern.replace_all(&name, " ").into_owned();
    }

    let name = WHITESPACE_RUN.replace_all(name.trim(), " ").into_owned();

    if name.is_empty() {
        return Err(RoastError::Validation("anime name must not be empty".into()));
    }
    if name.chars().count() > MAX_ANIME_NAME_LENGTH {
        return Err(RoastError::Validation(format!(
            "anime name must be at most {MAX_ANIME_NAME_LENGTH} characters"
        )));
    }

    Ok(name)
}

/// Neutralize untrusted text before it is embedded in a prompt.
///
/// Unlike [`sanitize_anime_name`] this never rejects: review excerpts get
/// quoted as-is otherwise, so injection phrasings are marked `[removed]`,
/// control characters dropped, and braces flattened to parentheses.
pub fn sanitize_for_prompt(text: &str) -> String {
    let mut out: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect();

    for pattern in INJECTION_PATTERNS.iter() {
        out = pattern.replace_all(&out, "[removed]").into_owned();
    }

    out.chars()
        .map(|c| match c {
            '{' => '(',
            '}' => ')',
            _ => c,
        })
        .collect()
}
