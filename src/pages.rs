use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EhfError, Result};

pub type Row = Vec<Option<String>>;
pub type Table = Vec<Row>;

/// One page as produced by the external page extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based position in the document.
    pub number: usize,
    pub text: String,
    pub tables: Vec<Table>,
}

/// A table grid tagged with the page it came from (`index` is 1-based within the page).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTable {
    pub page: usize,
    pub index: usize,
    pub rows: Table,
}

impl PageText {
    pub fn page_tables(&self) -> impl Iterator<Item = PageTable> + '_ {
        self.tables.iter().enumerate().map(|(j, rows)| PageTable {
            page: self.number,
            index: j + 1,
            rows: rows.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    tables: Vec<Table>,
}

/// Parse a page dump (JSON array of `{text, tables}` objects in document order).
pub fn parse_pages(json: &str) -> serde_json::Result<Vec<PageText>> {
    let raw: Vec<RawPage> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, p)| PageText {
            number: i + 1,
            text: p.text.unwrap_or_default(),
            tables: p.tables,
        })
        .collect())
}

pub fn load_pages(path: &Path) -> Result<Vec<PageText>> {
    let display = path.display().to_string();
    let json = std::fs::read_to_string(path).map_err(|source| EhfError::Io {
        path: display.clone(),
        source,
    })?;
    let pages = parse_pages(&json).map_err(|source| EhfError::PageDump {
        path: display.clone(),
        source,
    })?;
    if pages.is_empty() {
        return Err(EhfError::EmptyDocument(display));
    }
    Ok(pages)
}

/// Trimmed, non-empty cell text.
pub fn cell_text(row: &[Option<String>], idx: usize) -> Option<&str> {
    row.get(idx)
        .and_then(|c| c.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Trimmed cell text with the `-` placeholder treated as absent.
pub fn cell_value(row: &[Option<String>], idx: usize) -> Option<&str> {
    cell_text(row, idx).filter(|s| *s != "-")
}

pub fn table_contains(table: &Table, needle: &str) -> bool {
    table.iter().any(|row| row_contains(row, needle))
}

/// Case-insensitive substring test over every cell of a row.
pub fn row_contains(row: &Row, needle: &str) -> bool {
    row.iter()
        .flatten()
        .any(|cell| cell.to_lowercase().contains(needle))
}
