//! Composes the draft ruling from reviewed case data.
//!
//! The output is a flat list of styled blocks. Turning it into a file is the
//! renderer's job; nothing here knows about the container format.

use serde::Serialize;

use crate::schema::{CaseData, ConclusionItem, ConclusionType, UNPROVEN_FACTS_PLACEHOLDER};
use crate::segmenter::{self, Block};
use crate::table::TableBlock;

pub const TITLE: &str = "PROJETO DE ACÓRDÃO";
pub const HEADING_REPORT: &str = "I - RELATÓRIO";
pub const HEADING_FACTS: &str = "II - FUNDAMENTAÇÃO DE FACTO";
pub const HEADING_LAW: &str = "III - FUNDAMENTAÇÃO DE DIREITO";
pub const HEADING_DECISION: &str = "IV - DECISÃO";

const DECISION_LEAD_IN: &str = "A sentença recorrida decidiu nos seguintes termos:";
const CONCLUSIONS_LEAD_IN: &str = "As conclusões das alegações de recurso são as seguintes:";
const PROVEN_FACTS_LEAD_IN: &str = "A 1ª instância considerou provados os seguintes factos:";
const UNPROVEN_FACTS_LABEL: &str = "Factos não provados:";
const LAW_PLACEHOLDER: &str = "[Inserir fundamentação jurídica aqui]";
const CLOSING_PLACEHOLDER: &str = "Pelo exposto, acordam os juízes desta secção em...";

const PLACEHOLDER_COLOR: &str = "808080";
/// Left indent for list items, in twentieths of a point.
const LIST_INDENT: i32 = 360;
/// 1.5 line spacing, in 240ths of a line.
const BODY_LINE_SPACING: i32 = 360;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Justified,
}

/// Presentation hints for one paragraph. Spacing values are in twentieths of a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphStyle {
    /// Heading level 1-3, or `None` for body text.
    pub heading: Option<u8>,
    pub bold: bool,
    pub italic: bool,
    pub alignment: Alignment,
    pub indent_left: Option<i32>,
    pub spacing_before: u32,
    pub spacing_after: u32,
    pub line_spacing: Option<i32>,
    pub color: Option<&'static str>,
    pub keep_with_next: bool,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            heading: None,
            bold: false,
            italic: false,
            alignment: Alignment::Left,
            indent_left: None,
            spacing_before: 0,
            spacing_after: 0,
            line_spacing: None,
            color: None,
            keep_with_next: false,
        }
    }
}

impl ParagraphStyle {
    fn heading(level: u8) -> Self {
        Self {
            heading: Some(level),
            bold: true,
            ..Self::default()
        }
    }

    fn spacing(mut self, before: u32, after: u32) -> Self {
        self.spacing_before = before;
        self.spacing_after = after;
        self
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    fn color(mut self, color: &'static str) -> Self {
        self.color = Some(color);
        self
    }

    fn keep_with_next(mut self) -> Self {
        self.keep_with_next = true;
        self
    }

    /// Justified body text. Empty paragraphs carry no trailing space.
    fn body(text: &str, is_list_item: bool) -> Self {
        Self {
            alignment: Alignment::Justified,
            indent_left: is_list_item.then_some(LIST_INDENT),
            spacing_after: if text.is_empty() { 0 } else { 120 },
            line_spacing: Some(BODY_LINE_SPACING),
            ..Self::default()
        }
    }
}

/// One element of the composed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentBlock {
    Paragraph { text: String, style: ParagraphStyle },
    Table { rows: Vec<Vec<String>> },
}

impl DocumentBlock {
    fn paragraph(text: impl Into<String>, style: ParagraphStyle) -> Self {
        Self::Paragraph {
            text: text.into(),
            style,
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Paragraph { text, .. } => Some(text),
            Self::Table { .. } => None,
        }
    }
}

/// Build the full draft from `data`. Pure; never fails.
pub fn compose(data: &CaseData) -> Vec<DocumentBlock> {
    let mut doc = Vec::new();

    doc.push(DocumentBlock::paragraph(
        TITLE,
        ParagraphStyle::heading(1)
            .align(Alignment::Center)
            .spacing(0, 400),
    ));

    doc.push(section_heading(HEADING_REPORT));
    doc.extend(content_blocks(&data.report));
    doc.push(DocumentBlock::paragraph(
        DECISION_LEAD_IN,
        ParagraphStyle::default().italic().spacing(200, 100),
    ));
    doc.extend(content_blocks(&data.decision_first_instance));

    doc.push(DocumentBlock::paragraph(
        CONCLUSIONS_LEAD_IN,
        ParagraphStyle::default().italic().spacing(200, 100),
    ));
    doc.extend(conclusion_blocks(&data.appeal_conclusions));

    doc.push(section_heading(HEADING_FACTS));
    doc.push(DocumentBlock::paragraph(
        PROVEN_FACTS_LEAD_IN,
        ParagraphStyle::default().spacing(0, 200),
    ));
    doc.extend(content_blocks(&data.proven_facts));
    doc.push(DocumentBlock::paragraph(
        UNPROVEN_FACTS_LABEL,
        ParagraphStyle::default().bold().spacing(200, 100),
    ));
    let unproven = if data.unproven_facts.trim().is_empty() {
        UNPROVEN_FACTS_PLACEHOLDER
    } else {
        data.unproven_facts.as_str()
    };
    doc.extend(content_blocks(unproven));

    doc.push(section_heading(HEADING_LAW));
    doc.push(DocumentBlock::paragraph(
        LAW_PLACEHOLDER,
        ParagraphStyle::default().italic().color(PLACEHOLDER_COLOR),
    ));

    doc.push(section_heading(HEADING_DECISION));
    doc.push(DocumentBlock::paragraph(
        CLOSING_PLACEHOLDER,
        ParagraphStyle::default().italic(),
    ));

    doc
}

fn section_heading(text: &str) -> DocumentBlock {
    DocumentBlock::paragraph(text, ParagraphStyle::heading(2).spacing(400, 200))
}

/// Appeal items open a numbered sub-heading; responses sit under the last one.
fn conclusion_blocks(items: &[ConclusionItem]) -> Vec<DocumentBlock> {
    let mut blocks = Vec::new();
    let mut appeal_number = 0;

    for item in items {
        if item.item_type == ConclusionType::Recurso {
            appeal_number += 1;
            blocks.push(DocumentBlock::paragraph(
                format!("Recurso {}", appeal_number),
                ParagraphStyle::heading(3).spacing(400, 100).keep_with_next(),
            ));
        }

        blocks.push(DocumentBlock::paragraph(
            item.source.clone(),
            ParagraphStyle::default().bold().spacing(200, 0).keep_with_next(),
        ));
        blocks.extend(content_blocks(&item.content));
    }

    blocks
}

/// Segment free text and attach body styles.
pub fn content_blocks(text: &str) -> Vec<DocumentBlock> {
    segmenter::segment(text)
        .into_iter()
        .map(|block| match block {
            Block::Paragraph { text, is_list_item } => {
                let style = ParagraphStyle::body(&text, is_list_item);
                DocumentBlock::Paragraph { text, style }
            }
            Block::Table(TableBlock { rows }) => DocumentBlock::Table { rows },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(item_type: ConclusionType, source: &str, content: &str) -> ConclusionItem {
        ConclusionItem {
            item_type,
            source: source.to_string(),
            content: content.to_string(),
        }
    }

    fn sample() -> CaseData {
        CaseData {
            report: "O arguido foi condenado.\n\nRecorreu.".to_string(),
            proven_facts: "1. Facto um.\n| Ano | Valor |\n|---|---|\n| 2020 | 5 |\n2. Facto dois."
                .to_string(),
            unproven_facts: "Nada a consignar.".to_string(),
            decision_first_instance: "Condena o arguido.".to_string(),
            appeal_conclusions: vec![
                item(ConclusionType::Recurso, "Recorrente: A", "1. a"),
                item(ConclusionType::Resposta, "Recorrido: MP", "1. b"),
                item(ConclusionType::Recurso, "Recorrente: C", "1. c"),
                item(ConclusionType::Resposta, "Recorrido: MP", "1. d"),
            ],
        }
    }

    fn headings(blocks: &[DocumentBlock], level: u8) -> Vec<String> {
        blocks
            .iter()
            .filter_map(|b| match b {
                DocumentBlock::Paragraph { text, style } if style.heading == Some(level) => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    fn position(blocks: &[DocumentBlock], text: &str) -> usize {
        blocks
            .iter()
            .position(|b| b.text() == Some(text))
            .unwrap_or_else(|| panic!("{:?} not found", text))
    }

    #[test]
    fn test_skeleton_order() {
        let blocks = compose(&sample());
        assert_eq!(blocks[0].text(), Some(TITLE));
        assert_eq!(
            headings(&blocks, 2),
            vec![HEADING_REPORT, HEADING_FACTS, HEADING_LAW, HEADING_DECISION]
        );

        let order = [
            position(&blocks, HEADING_REPORT),
            position(&blocks, "O arguido foi condenado."),
            position(&blocks, DECISION_LEAD_IN),
            position(&blocks, "Condena o arguido."),
            position(&blocks, CONCLUSIONS_LEAD_IN),
            position(&blocks, "Recurso 1"),
            position(&blocks, HEADING_FACTS),
            position(&blocks, PROVEN_FACTS_LEAD_IN),
            position(&blocks, "1. Facto um."),
            position(&blocks, UNPROVEN_FACTS_LABEL),
            position(&blocks, HEADING_LAW),
            position(&blocks, LAW_PLACEHOLDER),
            position(&blocks, HEADING_DECISION),
            position(&blocks, CLOSING_PLACEHOLDER),
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]), "out of order: {:?}", order);
        assert_eq!(blocks.last().unwrap().text(), Some(CLOSING_PLACEHOLDER));
    }

    #[test]
    fn test_appeal_numbering_skips_responses() {
        let blocks = compose(&sample());
        assert_eq!(headings(&blocks, 3), vec!["Recurso 1", "Recurso 2"]);

        let conclusions = conclusion_blocks(&sample().appeal_conclusions);
        let texts: Vec<&str> = conclusions.iter().filter_map(|b| b.text()).collect();
        assert_eq!(
            texts,
            vec![
                "Recurso 1",
                "Recorrente: A",
                "1. a",
                "Recorrido: MP",
                "1. b",
                "Recurso 2",
                "Recorrente: C",
                "1. c",
                "Recorrido: MP",
                "1. d",
            ]
        );
    }

    #[test]
    fn test_leading_response_has_no_heading() {
        let blocks = conclusion_blocks(&[
            item(ConclusionType::Resposta, "Recorrido", "x"),
            item(ConclusionType::Recurso, "Recorrente", "y"),
        ]);
        assert_eq!(blocks[0].text(), Some("Recorrido"));
        assert_eq!(blocks[2].text(), Some("Recurso 1"));
    }

    #[test]
    fn test_source_line_is_bold() {
        let blocks = conclusion_blocks(&[item(ConclusionType::Recurso, "Recorrente", "y")]);
        match &blocks[1] {
            DocumentBlock::Paragraph { text, style } => {
                assert_eq!(text, "Recorrente");
                assert!(style.bold);
                assert!(style.keep_with_next);
                assert_eq!(style.heading, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_content_matches_direct_segmentation() {
        let data = sample();
        let blocks = compose(&data);

        let start = position(&blocks, PROVEN_FACTS_LEAD_IN) + 1;
        let end = position(&blocks, UNPROVEN_FACTS_LABEL);
        let composed = &blocks[start..end];
        let direct = segmenter::segment(&data.proven_facts);
        assert_eq!(composed.len(), direct.len());

        for (c, d) in composed.iter().zip(direct.iter()) {
            match (c, d) {
                (DocumentBlock::Table { rows }, Block::Table(table)) => assert_eq!(rows, &table.rows),
                (DocumentBlock::Paragraph { text, .. }, Block::Paragraph { text: t, .. }) => {
                    assert_eq!(text, t)
                }
                other => panic!("block kinds differ: {:?}", other),
            }
        }
    }

    #[test]
    fn test_list_items_indented_and_justified() {
        let blocks = content_blocks("Intro\n1. Primeiro");
        match (&blocks[0], &blocks[1]) {
            (
                DocumentBlock::Paragraph { style: intro, .. },
                DocumentBlock::Paragraph { style: listed, .. },
            ) => {
                assert_eq!(intro.indent_left, None);
                assert_eq!(listed.indent_left, Some(LIST_INDENT));
                assert_eq!(listed.alignment, Alignment::Justified);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_fields_still_emit_blocks() {
        let data = CaseData {
            report: String::new(),
            proven_facts: String::new(),
            unproven_facts: String::new(),
            decision_first_instance: String::new(),
            appeal_conclusions: vec![item(ConclusionType::Recurso, "S", "")],
        };
        let blocks = compose(&data);
        let after_report = &blocks[position(&blocks, HEADING_REPORT) + 1];
        assert_eq!(after_report.text(), Some(""));
        assert!(blocks.iter().any(|b| b.text() == Some(UNPROVEN_FACTS_PLACEHOLDER)));
    }
}
