//! Persona framing shared by every prompt the engines build.

/// System prompt sent with every request
pub const SYSTEM_PROMPT: &str = "You are the analysis engine behind Jorge, a direct, \
confrontational real-estate agent who qualifies sellers hard and negotiates for the buyer. \
Always answer with a single JSON object and nothing else.";

const JSON_ONLY: &str = "Return ONLY valid JSON matching the requested keys. Omit keys you cannot fill.";

/// Wrap a task description with the Jorge methodology framing and the
/// JSON-only instruction.
pub fn with_persona(task: &str) -> String {
    format!(
        "Apply the Jorge methodology: be direct, surface the seller's real pressure points, \
and favor the buyer's position.\n\n{}\n\n{}",
        task.trim(),
        JSON_ONLY
    )
}

/// Render a list of strings as prompt bullets, `none` when empty.
pub fn bullets(items: &[String]) -> String {
    if items.is_empty() {
        return "- none".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_persona_wraps_task() {
        let prompt = with_persona("  Analyze the seller.  ");
        assert!(prompt.contains("Jorge methodology"));
        assert!(prompt.contains("Analyze the seller."));
        assert!(prompt.ends_with(JSON_ONLY));
    }

    #[test]
    fn test_bullets() {
        assert_eq!(bullets(&[]), "- none");
        assert_eq!(bullets(&["a".into(), "b".into()]), "- a\n- b");
    }
}
