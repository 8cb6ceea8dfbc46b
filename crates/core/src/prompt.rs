//! Prompt enhancement rules: the instruction sent to the language model and
//! the cleanup applied to its answer.

use std::sync::LazyLock;

use regex::Regex;

use crate::request::WorkflowMode;

/// Style used in the instruction when the caller names none.
pub const DEFAULT_STYLE: &str = "modern";

/// Maximum keywords kept from a mask-focused answer.
pub const MAX_MASK_KEYWORDS: usize = 5;

/// Short words never re-added from the user's prompt.
const STOP_WORDS: &[&str] = &["and", "the", "with", "for"];

/// Trailing note sent after the mask image.
pub const MASK_NOTE: &str = "The second image is a mask where RED areas indicate specific elements \
to be replaced. Focus ONLY on describing what should replace these exact red areas - nothing else.";

static PREAMBLE_COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\n:,]*:\s*").expect("valid regex"));
static QUOTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^["']|["']$"#).expect("valid regex"));
static COMMA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").expect("valid regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static TRAILING_PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.$").expect("valid regex"));
static HERES_PROMPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^here'?s?\s+(?:an?\s+)?(?:enhanced\s+)?(?:architectural\s+)?(?:prompt\s*:?\s*)?",
    )
    .expect("valid regex")
});
static TERM_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,]+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Instruction
// ---------------------------------------------------------------------------

/// Build the text instruction for the enhancement model.
pub fn build_enhancement_instruction(
    current_prompt: &str,
    style: &str,
    mode: WorkflowMode,
    has_mask: bool,
) -> String {
    let style = if style.trim().is_empty() {
        DEFAULT_STYLE
    } else {
        style.trim()
    };
    let interior = mode != WorkflowMode::Exterior;

    let mut text = if has_mask {
        String::from(
            "Focus EXCLUSIVELY on the RED AREAS in the mask image. \
             These red regions show specific elements to be replaced. ",
        )
    } else {
        String::from("Analyze the entire image. ")
    };

    if !current_prompt.trim().is_empty() {
        text.push_str(&format!(
            "Consider the user's prompt \"{}\" while ",
            current_prompt.trim()
        ));
    }

    if has_mask {
        text.push_str(&format!(
            "Provide EXACTLY 3-4 specific keywords describing ONLY what should replace the red masked area. Your response must:\n\
             1. ONLY describe the exact object/element in the red region (e.g., if a table is masked, only describe the table)\n\
             2. Match the {style} style aesthetic\n\
             3. Include specific materials and finishes\n\
             4. Be extremely concise\n\n\
             Format: ONLY return 3-4 comma-separated keywords like 'oval marble dining table, brass-finished base, cream-veined surface'"
        ));
    } else {
        let (subject, fixtures, example) = if interior {
            (
                "Room type and purpose",
                "Furniture and fixtures",
                "luxurious modern, spacious living room, leather sectional sofa, marble accent wall, warm lighting, sophisticated atmosphere",
            )
        } else {
            (
                "Facade characteristics",
                "Architectural features",
                "modern facade, reflective glass panels, steel framework, grand entrance, ambient lighting, imposing presence",
            )
        };
        text.push_str(&format!(
            "Return ONLY a comma-separated list of descriptive tags (no introductory text or explanations) that includes:\n\
             - Primary {style} style elements\n\
             - {subject}\n\
             - {fixtures}\n\
             - Materials and textures\n\
             - Color palette\n\
             - Lighting elements\n\
             - Atmosphere and mood\n\n\
             Example format: {example}"
        ));
    }

    text
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

/// Normalize a model answer into a comma-separated tag list.
///
/// Important terms from `current_prompt` (longer than three characters and
/// not stop-words) that the answer dropped are prepended.
pub fn clean_enhanced_prompt(raw: &str, current_prompt: &str, has_mask: bool) -> String {
    let mut text = PREAMBLE_COLON_RE.replace(raw.trim(), "").into_owned();

    if has_mask {
        text = text
            .split(',')
            .take(MAX_MASK_KEYWORDS)
            .collect::<Vec<_>>()
            .join(",");
    }

    let text = QUOTES_RE.replace_all(&text, "");
    let text = COMMA_RE.replace_all(&text, ", ");
    let text = SPACE_RE.replace_all(&text, " ");
    let text = TRAILING_PERIOD_RE.replace(&text, "");
    let text = HERES_PROMPT_RE.replace(&text, "");
    let mut cleaned = text.trim().to_string();

    for term in important_terms(current_prompt) {
        if !cleaned.to_lowercase().contains(&term) {
            cleaned = format!("{term}, {cleaned}");
        }
    }

    cleaned
}

/// Lowercased user terms worth preserving, in prompt order.
fn important_terms(prompt: &str) -> Vec<String> {
    let lower = prompt.to_lowercase();
    TERM_SPLIT_RE
        .split(&lower)
        .filter(|term| term.chars().count() > 3 && !STOP_WORDS.contains(term))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_for_interior_without_mask() {
        let text = build_enhancement_instruction("", "", WorkflowMode::Interior, false);
        assert!(text.starts_with("Analyze the entire image. Return ONLY"));
        assert!(text.contains("Primary modern style elements"));
        assert!(text.contains("Room type and purpose"));
        assert!(!text.contains("Consider the user's prompt"));
    }

    #[test]
    fn instruction_for_facade_mentions_architecture() {
        let text = build_enhancement_instruction("glass", "brutalist", WorkflowMode::Exterior, false);
        assert!(text.contains("Consider the user's prompt \"glass\" while "));
        assert!(text.contains("Primary brutalist style elements"));
        assert!(text.contains("Architectural features"));
    }

    #[test]
    fn instruction_with_mask_is_keyword_focused() {
        let text = build_enhancement_instruction("", "scandi", WorkflowMode::Interior, true);
        assert!(text.starts_with("Focus EXCLUSIVELY on the RED AREAS"));
        assert!(text.contains("Match the scandi style aesthetic"));
    }

    #[test]
    fn strips_preamble_quotes_and_period() {
        let cleaned = clean_enhanced_prompt(
            "Here are your tags: \"modern ,cozy   living room, oak floor.\"",
            "",
            false,
        );
        assert_eq!(cleaned, "modern, cozy living room, oak floor");
    }

    #[test]
    fn strips_heres_prompt_prefix() {
        let cleaned = clean_enhanced_prompt("Here's an enhanced prompt modern loft, brick", "", false);
        assert_eq!(cleaned, "modern loft, brick");
    }

    #[test]
    fn keeps_leading_words_of_first_tag() {
        let cleaned = clean_enhanced_prompt("oval marble dining table, brass base", "", true);
        assert_eq!(cleaned, "oval marble dining table, brass base");
    }

    #[test]
    fn mask_answers_keep_five_keywords() {
        let cleaned = clean_enhanced_prompt("a, b, c, d, e, f, g", "", true);
        assert_eq!(cleaned, "a, b, c, d, e");
    }

    #[test]
    fn missing_user_terms_are_prepended() {
        let cleaned = clean_enhanced_prompt("warm lighting, oak floor", "Velvet sofa and the rug", false);
        assert_eq!(cleaned, "sofa, velvet, warm lighting, oak floor");
    }

    #[test]
    fn present_user_terms_are_not_duplicated() {
        let cleaned = clean_enhanced_prompt("velvet sofa, oak floor", "velvet sofa", false);
        assert_eq!(cleaned, "velvet sofa, oak floor");
    }
}
