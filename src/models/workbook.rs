use serde::{Deserialize, Serialize};

/// Tabular schedule source handed over by the spreadsheet-reading
/// collaborator. Cell mechanics (merged ranges, formulas, styling) are
/// resolved before this point; what remains is sheets of plain cells
/// plus any named ranges the workbook declares.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    #[serde(default)]
    pub named_ranges: Vec<NamedRange>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    /// Row-major cell grid; rows may be ragged.
    pub rows: Vec<Vec<Cell>>,
}

/// A named region of one sheet, rows are 0-based and inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRange {
    pub name: String,
    pub sheet: String,
    pub start_row: usize,
    pub end_row: usize,
}

/// One resolved cell value. Dates may arrive either as native dates or
/// as 1900-system serial numbers; the extractor normalizes both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// ISO `YYYY-MM-DD`.
    Date(String),
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Header-row view of the cell: text as-is, anything else via its
    /// display form, empty for `Empty`.
    pub fn as_header(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(n) => format!("{n}"),
            Cell::Date(date) => date.clone(),
        }
    }
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn named_range(&self, name: &str) -> Option<&NamedRange> {
        self.named_ranges.iter().find(|r| r.name == name)
    }
}
