//! Result parsing and normalization.
//!
//! Model output is free-form text expected to contain exactly one JSON
//! object, possibly wrapped in extraneous prose. The parser scans for the
//! outermost braces, decodes the substring, and normalizes the advisory
//! enum fields into canonical values. The enum vocabulary accepts both the
//! canonical English tokens and the Czech vocabulary the deployed prompt
//! variants elicit; unknown tokens fall back to documented defaults
//! because the fields are advisory, not safety-critical.

use serde::Deserialize;

use mindsift_core::{Error, IdeaCategory, IdeaPotential, IdeaType, Result};

/// Outcome of decoding one model response.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The model judged the note to contain no actionable idea.
    Skip,
    /// Structured fields for a new idea.
    Extracted(ExtractedIdea),
}

/// Normalized fields extracted from a note.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedIdea {
    pub title: String,
    pub description: String,
    pub category: IdeaCategory,
    pub potential: IdeaPotential,
    pub kind: IdeaType,
    /// Trimmed, deduplicated, in response order.
    pub tags: Vec<String>,
    pub next_steps: Vec<String>,
}

/// Raw wire shape of the model's JSON object.
#[derive(Debug, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    skip: bool,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    potential: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    next_steps: Vec<String>,
}

/// Locate the outermost JSON object in free-form text.
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

fn normalize_category(token: Option<&str>) -> IdeaCategory {
    match token.map(|t| t.trim().to_lowercase()).as_deref() {
        Some("business") => IdeaCategory::Business,
        Some("ai") => IdeaCategory::Ai,
        Some("finance") => IdeaCategory::Finance,
        Some("thought") | Some("myšlenka") => IdeaCategory::Thought,
        _ => IdeaCategory::default(),
    }
}

fn normalize_potential(token: Option<&str>) -> IdeaPotential {
    match token.map(|t| t.trim().to_lowercase()).as_deref() {
        Some("high") | Some("vysoký") => IdeaPotential::High,
        Some("medium") | Some("střední") => IdeaPotential::Medium,
        Some("low") | Some("nízký") => IdeaPotential::Low,
        _ => IdeaPotential::default(),
    }
}

fn normalize_type(token: Option<&str>) -> IdeaType {
    match token.map(|t| t.trim().to_lowercase()).as_deref() {
        Some("platform") | Some("platforma") => IdeaType::Platform,
        Some("product") | Some("produkt") => IdeaType::Product,
        Some("service") | Some("služba") => IdeaType::Service,
        Some("tool") | Some("nástroj") => IdeaType::Tool,
        Some("concept") | Some("koncept") => IdeaType::Concept,
        Some("insight") | Some("postřeh") => IdeaType::Insight,
        Some("wisdom") | Some("moudrost") => IdeaType::Wisdom,
        Some("tip") => IdeaType::Tip,
        _ => IdeaType::default(),
    }
}

/// Trim, drop empties, and deduplicate while preserving order.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Decode one model response into a tagged [`Extraction`].
///
/// Fails with [`Error::UnparsableResponse`] when no JSON object can be
/// located or the located substring does not decode.
pub fn parse_extraction(raw: &str) -> Result<Extraction> {
    let json = extract_json(raw).ok_or(Error::UnparsableResponse)?;
    let decoded: RawExtraction =
        serde_json::from_str(json).map_err(|_| Error::UnparsableResponse)?;

    if decoded.skip {
        return Ok(Extraction::Skip);
    }

    Ok(Extraction::Extracted(ExtractedIdea {
        title: decoded
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Untitled".to_string()),
        description: decoded.description.unwrap_or_default(),
        category: normalize_category(decoded.category.as_deref()),
        potential: normalize_potential(decoded.potential.as_deref()),
        kind: normalize_type(decoded.kind.as_deref()),
        tags: clean_tags(decoded.tags),
        next_steps: decoded.next_steps,
    }))
}
