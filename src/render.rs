//! Serializes composed blocks into a Word document.

use std::io::Cursor;

use anyhow::{anyhow, Result};
use docx_rs::{
    AlignmentType, Docx, LineSpacing, Paragraph, Run, Style, StyleType, Table, TableCell,
    TableRow,
};

use crate::composer::{Alignment, DocumentBlock, ParagraphStyle};
use crate::table;

/// Name offered to the browser for the exported draft.
pub const EXPORT_FILENAME: &str = "Projeto_Acordao.docx";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Usable text width of an A4 page with default margins, in twips.
const TEXT_WIDTH: usize = 9000;

/// Render blocks into `.docx` bytes.
pub fn to_docx(blocks: &[DocumentBlock]) -> Result<Vec<u8>> {
    let mut docx = Docx::new()
        .add_style(heading_style(1, 32))
        .add_style(heading_style(2, 28))
        .add_style(heading_style(3, 24));

    for block in blocks {
        docx = match block {
            DocumentBlock::Paragraph { text, style } => docx.add_paragraph(paragraph(text, style)),
            DocumentBlock::Table { rows } => match table(rows) {
                Some(grid) => docx.add_table(grid),
                None => docx.add_paragraph(Paragraph::new()),
            },
        };
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| anyhow!("Failed to pack docx: {}", e))?;
    Ok(buffer.into_inner())
}

fn heading_style(level: u8, half_points: usize) -> Style {
    Style::new(&format!("Heading{}", level), StyleType::Paragraph)
        .name(&format!("Heading {}", level))
        .size(half_points)
        .bold()
}

fn paragraph(text: &str, style: &ParagraphStyle) -> Paragraph {
    let mut run = Run::new().add_text(text);
    if style.bold {
        run = run.bold();
    }
    if style.italic {
        run = run.italic();
    }
    if let Some(color) = style.color {
        run = run.color(color);
    }

    let mut spacing = LineSpacing::new()
        .before(style.spacing_before)
        .after(style.spacing_after);
    if let Some(line) = style.line_spacing {
        spacing = spacing.line(line);
    }

    let mut paragraph = Paragraph::new()
        .add_run(run)
        .align(alignment(style.alignment))
        .line_spacing(spacing);

    if let Some(level) = style.heading {
        paragraph = paragraph.style(&format!("Heading{}", level));
    }
    if style.indent_left.is_some() {
        paragraph = paragraph.indent(style.indent_left, None, None, None);
    }
    if style.keep_with_next {
        paragraph = paragraph.keep_next(true);
    }
    paragraph
}

fn alignment(alignment: Alignment) -> AlignmentType {
    match alignment {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Justified => AlignmentType::Both,
    }
}

/// Rows keep their own cell count; the grid is sized for the widest row.
fn table(rows: &[Vec<String>]) -> Option<Table> {
    let columns = table::max_columns(rows);
    if columns == 0 {
        return None;
    }

    let rows = rows
        .iter()
        .map(|row| {
            TableRow::new(
                row.iter()
                    .map(|cell| {
                        TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(cell)))
                    })
                    .collect(),
            )
        })
        .collect();

    Some(Table::new(rows).set_grid(vec![TEXT_WIDTH / columns; columns]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use crate::schema::{CaseData, ConclusionItem};

    fn is_zip(bytes: &[u8]) -> bool {
        bytes.starts_with(b"PK")
    }

    #[test]
    fn test_full_draft_renders() {
        let data = CaseData {
            report: "Relatório.".to_string(),
            proven_facts: "| A | B | C |\n|---|---|---|\n| 1 | 2 |\n| só |".to_string(),
            unproven_facts: "Nada a consignar.".to_string(),
            decision_first_instance: "Absolve.".to_string(),
            appeal_conclusions: vec![ConclusionItem::placeholder()],
        };
        let bytes = to_docx(&compose(&data)).unwrap();
        assert!(is_zip(&bytes));
    }

    #[test]
    fn test_empty_table_becomes_paragraph() {
        assert!(table(&[]).is_none());
        assert!(table(&[vec![]]).is_none());
        let bytes = to_docx(&[DocumentBlock::Table { rows: vec![] }]).unwrap();
        assert!(is_zip(&bytes));
    }
}
