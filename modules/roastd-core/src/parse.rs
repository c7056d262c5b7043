//! Generator response parsing.
//!
//! The parser never fails: malformed output degrades to the full text with
//! default stats, tagged so callers can tell a parsed response from a
//! fallback.

use serde::Deserialize;

use crate::types::RoastStats;

/// Whether the stats came out of the model's output or from defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    Parsed,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub roast: String,
    pub stats: RoastStats,
    pub stats_source: StatsSource,
}

/// Loosely-typed stats as the model actually emits them. Missing keys and
/// out-of-range values are tolerated and normalized later.
#[derive(Debug, Default, Deserialize)]
struct RawRoastStats {
    #[serde(default)]
    horniness_level: Option<i64>,
    #[serde(default)]
    plot_armor_thickness: Option<i64>,
    #[serde(default)]
    filler_hell: Option<i64>,
    #[serde(default)]
    power_creep: Option<i64>,
    #[serde(default)]
    cringe_factor: Option<i64>,
    #[serde(default)]
    fan_toxicity: Option<i64>,
}

impl RawRoastStats {
    fn normalize(self) -> RoastStats {
        fn clamp(value: Option<i64>) -> u8 {
            value.map_or(50, |v| v.clamp(0, 100) as u8)
        }
        RoastStats {
            horniness_level: clamp(self.horniness_level),
            plot_armor_thickness: clamp(self.plot_armor_thickness),
            filler_hell: clamp(self.filler_hell),
            power_creep: clamp(self.power_creep),
            cringe_factor: clamp(self.cringe_factor),
            fan_toxicity: clamp(self.fan_toxicity),
        }
    }
}

/// Split a raw model response into roast text and stats.
///
/// Looks for a `STATS:` marker, strips an optional leading `ROAST:` label,
/// and parses the first balanced JSON object after the marker. Any failure
/// falls back to the whole trimmed text with default stats.
pub fn parse_response(raw: &str) -> ParsedResponse {
    if let Some((roast_part, stats_part)) = raw.split_once("STATS:") {
        let roast = strip_roast_label(roast_part);
        if !roast.is_empty() {
            if let Some(json) = first_json_object(stats_part) {
                if let Ok(stats) = serde_json::from_str::<RawRoastStats>(json) {
                    return ParsedResponse {
                        roast,
                        stats: stats.normalize(),
                        stats_source: StatsSource::Parsed,
                    };
                }
            }
        }
    }

    ParsedResponse {
        roast: strip_roast_label(raw),
        stats: RoastStats::default(),
        stats_source: StatsSource::Fallback,
    }
}

fn strip_roast_label(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("ROAST:")
        .map(str::trim)
        .unwrap_or(trimmed)
        .to_string()
}

/// Extract the first balanced `{...}` span, ignoring braces inside string
/// literals.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
