//! Pipe-delimited pseudo-table materialization.
//!
//! Models render tables as markdown rows (`| a | b |`). Rows are kept jagged:
//! each row has as many cells as it was written with.

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator rows such as `|---|:--:|` or `| --- | ---: |`.
static SEPARATOR_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|?\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|?$").expect("separator pattern is valid")
});

/// Rows of cell text, in source order. Rows may differ in length.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TableBlock {
    pub rows: Vec<Vec<String>>,
}

/// Widest row, for renderers that need a column grid.
pub fn max_columns(rows: &[Vec<String>]) -> usize {
    rows.iter().map(Vec::len).max().unwrap_or(0)
}

/// Returns true if the line is a table line: trimmed, it starts and ends with `|`.
pub fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|')
}

pub fn is_separator_row(line: &str) -> bool {
    SEPARATOR_ROW.is_match(line.trim())
}

/// Convert a contiguous run of table lines into a [`TableBlock`].
pub fn materialize<S: AsRef<str>>(lines: &[S]) -> TableBlock {
    let rows = lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !is_separator_row(line))
        .map(split_row)
        .collect();

    TableBlock { rows }
}

/// Strip one leading and one trailing pipe, then split into trimmed cells.
fn split_row(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_drops_separator() {
        let table = materialize(&["| A | B |", "|---|---|", "| 1 | 2 |"]);
        assert_eq!(
            table.rows,
            vec![vec!["A".to_string(), "B".to_string()], vec!["1".to_string(), "2".to_string()]]
        );
    }

    #[test]
    fn test_separator_variants() {
        assert!(is_separator_row("|---|:--:|"));
        assert!(is_separator_row("  | --- | :---: | ---: |  "));
        assert!(is_separator_row("|:-|"));
        assert!(!is_separator_row("| - item |"));
        assert!(!is_separator_row("| 1 | 2 |"));
        assert!(!is_separator_row("||"));
    }

    #[test]
    fn test_jagged_rows_are_kept() {
        let table = materialize(&["| Data | Valor | Nota |", "| 2020 | 10 |", "| só uma |"]);
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.rows[1].len(), 2);
        assert_eq!(table.rows[2], vec!["só uma".to_string()]);
        assert_eq!(max_columns(&table.rows), 3);
    }

    #[test]
    fn test_only_outer_pipes_stripped() {
        let table = materialize(&["|| a ||"]);
        assert_eq!(table.rows[0], vec!["", "a", ""]);
    }

    #[test]
    fn test_empty_cells_preserved() {
        let table = materialize(&["| a |  | c |"]);
        assert_eq!(table.rows[0], vec!["a", "", "c"]);
    }

    #[test]
    fn test_is_table_line() {
        assert!(is_table_line("  | a | b |  "));
        assert!(is_table_line("|"));
        assert!(!is_table_line("| a | b"));
        assert!(!is_table_line("a | b |"));
    }

    #[test]
    fn test_only_separators_yield_empty_table() {
        let table = materialize(&["|---|---|"]);
        assert!(table.rows.is_empty());
        assert_eq!(max_columns(&table.rows), 0);
    }
}
