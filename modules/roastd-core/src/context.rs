//! Prompt context assembly.
//!
//! Turns metadata and aggregated review signal into qualitative prose for
//! the generator. Numbers stay out of the context on purpose: the model
//! cannot leak a statistic it never saw.

use crate::config::MIN_REVIEWS_FOR_ANALYSIS;
use crate::sanitize::sanitize_for_prompt;
use crate::types::{AnimeMetadata, ReviewContext, SourceMaterial};

/// Build the full context block handed to the generator.
///
/// Sections are joined with blank lines: basic facts, a qualitative
/// reception summary, common review themes (only once enough reviews back
/// them), and source-material framing.
pub fn build_context(metadata: &AnimeMetadata, reviews: Option<&ReviewContext>) -> String {
    let mut sections = vec![basic_info(metadata)];

    if let Some(ctx) = reviews {
        if let Some(reception) = reception_summary(ctx) {
            sections.push(reception);
        }
        if ctx.review_count >= MIN_REVIEWS_FOR_ANALYSIS {
            if let Some(themes) = common_themes(ctx) {
                sections.push(themes);
            }
        }
    }

    if let Some(source) = metadata.source.and_then(source_context) {
        sections.push(source.to_string());
    }

    sections.join("\n\n")
}

fn basic_info(metadata: &AnimeMetadata) -> String {
    let mut lines = vec![format!("Anime: {}", metadata.display_title)];
    if let Some(year) = metadata.year {
        lines.push(format!("Year: {year}"));
    }
    if let Some(episodes) = metadata.episodes {
        lines.push(format!("Episodes: {episodes}"));
    }
    if let Some(format) = &metadata.format {
        lines.push(format!("Format: {format}"));
    }
    if !metadata.studios.is_empty() {
        let studios: Vec<&str> = metadata.studios.iter().take(2).map(String::as_str).collect();
        lines.push(format!("Studio: {}", studios.join(", ")));
    }
    lines.join("\n")
}

/// Map the aggregate score into a qualitative band. Never emits the number
/// itself.
fn reception_summary(ctx: &ReviewContext) -> Option<String> {
    let score = ctx.score_out_of_10?;
    let mut summary = if score >= 8.0 {
        "Reception: Highly rated by the community".to_string()
    } else if score >= 7.0 {
        "Reception: Generally well-received".to_string()
    } else if score >= 6.0 {
        "Reception: Mixed reception with both fans and critics".to_string()
    } else if score >= 5.0 {
        "Reception: Below average reception".to_string()
    } else {
        "Reception: Poorly received by the community".to_string()
    };

    if ctx.is_controversial {
        summary.push_str(" - polarizing opinions");
    }
    Some(summary)
}

fn common_themes(ctx: &ReviewContext) -> Option<String> {
    if ctx.verified_complaints.is_empty() {
        return None;
    }

    let mut lines = vec!["=== COMMON THEMES IN REVIEWS ===".to_string()];
    for complaint in ctx.verified_complaints.iter().take(4) {
        let mut entry = complaint.category.label().to_string();
        entry.push(':');
        if let Some(quote) = representative_quote(&complaint.example_quotes) {
            // review text is untrusted; neutralize it before it enters the prompt
            entry.push_str(&format!("\n  \"{}\"", sanitize_for_prompt(quote)));
        }
        lines.push(entry);
    }
    Some(lines.join("\n"))
}

/// Pick the quote closest to 80 characters: long enough to carry substance,
/// short enough to quote verbatim.
fn representative_quote(quotes: &[String]) -> Option<&String> {
    quotes
        .iter()
        .min_by_key(|q| (q.len() as i64 - 80).unsigned_abs())
}

fn source_context(source: SourceMaterial) -> Option<&'static str> {
    match source {
        SourceMaterial::Manga => {
            Some("Source: Adapted from a manga, so manga readers will have opinions about what got cut.")
        }
        SourceMaterial::LightNovel => {
            Some("Source: Adapted from a light novel, with all the exposition dumps that implies.")
        }
        SourceMaterial::VisualNovel => {
            Some("Source: Adapted from a visual novel, so entire routes likely got flattened into one story.")
        }
        SourceMaterial::WebNovel => {
            Some("Source: Adapted from a web novel, where guaranteed chapters meet uneven quality.")
        }
        SourceMaterial::Original => {
            Some("Source: An anime-original story, so nobody can say the adaptation ruined it.")
        }
        SourceMaterial::Other => None,
    }
}

/// Hard rules appended to every prompt. The generator must speak like a
/// person, not a spreadsheet.
pub fn build_constraints() -> &'static str {
    "RULES:\n\
     - Never cite percentages, review counts, exact ratings, or any numeric statistics.\n\
     - Never use statistical language like \"data shows\", \"reviews indicate\", or \"according to\".\n\
     - Speak naturally, like a friend roasting another friend's taste.\n\
     - Only reference complaints that appear in the provided context.\n\
     - Keep it playful, not genuinely cruel."
}
