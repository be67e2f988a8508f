//! Prompt rendering for the note-processing call.
//!
//! A template (the built-in default or the user's custom one) must carry
//! the content placeholder exactly once; rendering substitutes the note
//! text into it. A template without the placeholder would silently send a
//! prompt with no note content, so it is rejected instead.

use mindsift_core::{Error, Result};

/// The literal placeholder a template must contain exactly once.
pub const NOTE_CONTENT_PLACEHOLDER: &str = "{{NOTE_CONTENT}}";

/// Built-in processing prompt used when the user has no custom template.
pub const DEFAULT_PROCESSING_PROMPT: &str = r#"You are an expert at analyzing and categorizing captured notes. Your task is to analyze a raw note and decide whether it contains an idea worth keeping.

INPUT:
Note: """
{{NOTE_CONTENT}}
"""

INSTRUCTIONS:
1. Read the note and decide whether it contains a potentially useful idea (business, technology, finance, life wisdom, a practical tip).
2. If the note does NOT contain an idea (e.g. a shopping list, a reminder, a personal note with no lasting value), return JSON with "skip": true.
3. If the note DOES contain an idea, analyze it and return structured JSON.

OUTPUT (JSON):
{
  "skip": boolean,           // true when there is no idea to extract
  "title": string,           // short name for the idea (max 100 characters)
  "description": string,     // description of the idea (2-5 sentences)
  "category": string,        // one of: "business", "ai", "finance", "thought"
  "potential": string,       // one of: "high", "medium", "low"
  "type": string,            // one of: "platform", "product", "service", "tool", "concept", "insight", "wisdom", "tip"
  "tags": string[],          // 2-5 relevant tags
  "next_steps": string[]     // 2-3 concrete next steps (when applicable)
}

Respond with ONLY the valid JSON object, no other text."#;

/// Combine a note's title and content into the text the model sees.
pub fn note_payload(title: Option<&str>, content: &str) -> String {
    match title {
        Some(title) => format!("Title: {}\n\n{}", title, content),
        None => content.to_string(),
    }
}

/// Render a template by substituting the note payload into the placeholder.
///
/// The placeholder must occur exactly once; zero occurrences would drop
/// the note content entirely and more than one would duplicate it, both
/// rejected as [`Error::InvalidTemplate`].
pub fn render_prompt(template: &str, title: Option<&str>, content: &str) -> Result<String> {
    match template.matches(NOTE_CONTENT_PLACEHOLDER).count() {
        1 => Ok(template.replacen(NOTE_CONTENT_PLACEHOLDER, &note_payload(title, content), 1)),
        0 => Err(Error::InvalidTemplate(format!(
            "template does not contain the {} placeholder",
            NOTE_CONTENT_PLACEHOLDER
        ))),
        n => Err(Error::InvalidTemplate(format!(
            "template contains the {} placeholder {} times, expected exactly once",
            NOTE_CONTENT_PLACEHOLDER, n
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_has_single_placeholder() {
        assert_eq!(
            DEFAULT_PROCESSING_PROMPT
                .matches(NOTE_CONTENT_PLACEHOLDER)
                .count(),
            1
        );
    }

    #[test]
    fn test_payload_with_title() {
        assert_eq!(
            note_payload(Some("My Title"), "body text"),
            "Title: My Title\n\nbody text"
        );
    }

    #[test]
    fn test_payload_without_title() {
        assert_eq!(note_payload(None, "body text"), "body text");
    }

    #[test]
    fn test_render_substitutes_content() {
        let rendered = render_prompt("before {{NOTE_CONTENT}} after", None, "the note").unwrap();
        assert_eq!(rendered, "before the note after");
    }

    #[test]
    fn test_render_default_prompt() {
        let rendered =
            render_prompt(DEFAULT_PROCESSING_PROMPT, Some("Invoices"), "track them").unwrap();
        assert!(rendered.contains("Title: Invoices\n\ntrack them"));
        assert!(!rendered.contains(NOTE_CONTENT_PLACEHOLDER));
    }

    #[test]
    fn test_render_rejects_missing_placeholder() {
        let err = render_prompt("no placeholder here", None, "content").unwrap_err();
        assert!(matches!(err, mindsift_core::Error::InvalidTemplate(_)));
    }

    #[test]
    fn test_render_rejects_duplicate_placeholder() {
        let err =
            render_prompt("{{NOTE_CONTENT}} {{NOTE_CONTENT}}", None, "content").unwrap_err();
        assert!(matches!(err, mindsift_core::Error::InvalidTemplate(_)));
    }
}
