//! Parser for the delimiter-tagged model response.
//!
//! The model answers in free text with `<<<SECTION>>>` openers instead of JSON.
//! Extraction is lenient: a missing section is an empty string, and only the
//! absence of both the report and the proven facts makes a response unusable.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{ConclusionItem, ConclusionType, UNIDENTIFIED_PARTY};

pub const TAG_REPORT: &str = "<<<RELATORIO>>>";
pub const TAG_PROVEN_FACTS: &str = "<<<FACTOS_PROVADOS>>>";
pub const TAG_UNPROVEN_FACTS: &str = "<<<FACTOS_NAO_PROVADOS>>>";
pub const TAG_DECISION: &str = "<<<DECISAO_PRIMEIRA_INSTANCIA>>>";
pub const TAG_CONCLUSIONS: &str = "<<<CONCLUSOES_RECURSOS>>>";
pub const ITEM_SEPARATOR: &str = "---SEPARADOR_ITEM---";

const SECTION_OPENER: &str = "<<<";

static TYPE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TIPO:([^\n]*)(?:\n|$)").expect("type pattern is valid"));
static SOURCE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"FONTE:([^\n]*)(?:\n|$)").expect("source pattern is valid"));
static CONTENT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CONTE[UÚ]DO:\s*").expect("content pattern is valid"));

/// Sections pulled out of one model response. Empty strings mean "not found".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    pub report: String,
    pub proven_facts: String,
    pub unproven_facts: String,
    pub decision_first_instance: String,
    pub conclusions: Vec<ConclusionItem>,
}

impl ParsedResponse {
    /// A response is usable unless both the report and the proven facts are missing.
    pub fn is_usable(&self) -> bool {
        !(self.report.is_empty() && self.proven_facts.is_empty())
    }
}

/// Parse a raw model response into its sections.
pub fn parse(raw: &str) -> ParsedResponse {
    ParsedResponse {
        report: extract_section(raw, TAG_REPORT),
        proven_facts: extract_section(raw, TAG_PROVEN_FACTS),
        unproven_facts: extract_section(raw, TAG_UNPROVEN_FACTS),
        decision_first_instance: extract_section(raw, TAG_DECISION),
        conclusions: parse_conclusions(&extract_section(raw, TAG_CONCLUSIONS)),
    }
}

/// Text between the first occurrence of `tag` and the next `<<<` (or end), trimmed.
pub fn extract_section(raw: &str, tag: &str) -> String {
    let Some(start) = raw.find(tag) else {
        return String::new();
    };
    let body = &raw[start + tag.len()..];
    let end = body.find(SECTION_OPENER).unwrap_or(body.len());
    body[..end].trim().to_string()
}

/// Split the conclusions section into items. Blank blocks are dropped.
pub fn parse_conclusions(section: &str) -> Vec<ConclusionItem> {
    if section.is_empty() {
        return Vec::new();
    }

    section
        .split(ITEM_SEPARATOR)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(parse_item)
        .collect()
}

fn parse_item(block: &str) -> ConclusionItem {
    let item_type = TYPE_LINE
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| ConclusionType::from_label(m.as_str()))
        .unwrap_or(ConclusionType::Recurso);

    let source = SOURCE_LINE
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNIDENTIFIED_PARTY.to_string());

    let content = TYPE_LINE.replace(block, "");
    let content = SOURCE_LINE.replace(&content, "");
    let content = CONTENT_MARKER.replace(&content, "");

    ConclusionItem {
        item_type,
        source,
        content: content.trim().to_string(),
    }
}
