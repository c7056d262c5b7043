//! Roast prompt assembly.

/// Corrective instruction appended when a previous attempt leaked numbers
/// past the cleaner.
pub const NO_STATISTICS_INSTRUCTION: &str =
    "IMPORTANT: Your previous attempt included numeric statistics. Do not mention any \
     numbers, percentages, ratings, or review counts this time.";

/// Build the full generation prompt.
///
/// `corrective` carries retry instructions accumulated across attempts; it
/// is empty on the first try.
pub fn assemble(anime_name: &str, context: &str, constraints: &str, corrective: &[String]) -> String {
    let mut prompt = format!(
        "You are a sharp-tongued anime critic. Write a funny, biting roast of \"{anime_name}\".\n\n\
         CONTEXT:\n{context}\n\n\
         {constraints}\n\n\
         OUTPUT FORMAT:\n\
         ROAST: <100-150 words of roast>\n\
         STATS: <a single JSON object with integer values 0-100 for exactly these keys: \
         \"horniness_level\", \"plot_armor_thickness\", \"filler_hell\", \"power_creep\", \
         \"cringe_factor\", \"fan_toxicity\">"
    );

    for instruction in corrective {
        prompt.push_str("\n\n");
        prompt.push_str(instruction);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_name_and_context() {
        let prompt = assemble("Berserk", "Anime: Berserk", "RULES: none", &[]);
        assert!(prompt.contains("\"Berserk\""));
        assert!(prompt.contains("CONTEXT:\nAnime: Berserk"));
        assert!(prompt.contains("ROAST:"));
        assert!(prompt.contains("STATS:"));
    }

    #[test]
    fn appends_corrective_instructions() {
        let prompt = assemble(
            "Berserk",
            "ctx",
            "rules",
            &[NO_STATISTICS_INSTRUCTION.to_string()],
        );
        assert!(prompt.ends_with(NO_STATISTICS_INSTRUCTION));
    }
}
