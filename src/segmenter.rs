//! Splits extracted free text into paragraphs and tables.
//!
//! Lines hard-wrapped by the source document (or by the model) are joined back
//! into a single paragraph. Blank lines, list items and table runs start new
//! blocks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::table::{self, TableBlock};

/// `1. `, `12) `, `a. `, `B) `, `- `, `* `, `• `
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+[.)]\s|[A-Za-z][.)]\s|[-*•]\s)").expect("list item pattern is valid")
});

/// Block-level element produced by [`segment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph { text: String, is_list_item: bool },
    Table(TableBlock),
}

impl Block {
    fn empty_paragraph() -> Self {
        Block::Paragraph {
            text: String::new(),
            is_list_item: false,
        }
    }
}

pub fn is_list_item(line: &str) -> bool {
    LIST_ITEM.is_match(line.trim())
}

/// Segment `text` into blocks. Never returns an empty vector.
pub fn segment(text: &str) -> Vec<Block> {
    let mut state = Segmenter::default();

    for line in text.lines() {
        let trimmed = line.trim();

        if table::is_table_line(trimmed) {
            state.flush_text();
            state.table.push(trimmed.to_string());
            continue;
        }

        state.flush_table();

        if trimmed.is_empty() {
            state.flush_text();
            continue;
        }

        if is_list_item(trimmed) {
            state.flush_text();
            state.list_item = true;
        }

        state.text.push(trimmed.to_string());
    }

    state.finish()
}

#[derive(Default)]
struct Segmenter {
    blocks: Vec<Block>,
    text: Vec<String>,
    list_item: bool,
    table: Vec<String>,
}

impl Segmenter {
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.blocks.push(Block::Paragraph {
                text: self.text.join(" "),
                is_list_item: self.list_item,
            });
            self.text.clear();
        }
        self.list_item = false;
    }

    fn flush_table(&mut self) {
        if !self.table.is_empty() {
            let lines = std::mem::take(&mut self.table);
            self.blocks.push(Block::Table(table::materialize(&lines)));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_table();
        self.flush_text();
        if self.blocks.is_empty() {
            self.blocks.push(Block::empty_paragraph());
        }
        self.blocks
    }
}
