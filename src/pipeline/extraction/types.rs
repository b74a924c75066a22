use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ExtractionError;

/// One cell of a table-like source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// Build a text cell; blank strings become `Empty`.
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Cell rendered as text. Whole numbers print without a fractional part
    /// so that numeric item codes ("1") keep their shape.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Empty => String::new(),
        }
    }
}

/// One row of the ingested row stream.
///
/// For spreadsheets the cells are real cells; for PDFs the row holds a single
/// cell with the whole reconstructed line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// 0-based position in the row stream.
    pub index: usize,
    pub cells: Vec<CellValue>,
}

impl RawRow {
    pub fn new(index: usize, cells: Vec<CellValue>) -> Self {
        Self { index, cells }
    }

    pub fn cell(&self, column: usize) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Text of the given column, empty when the column is absent or blank.
    pub fn text_at(&self, column: Option<usize>) -> String {
        column
            .and_then(|c| self.cell(c))
            .map(CellValue::as_text)
            .unwrap_or_default()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }

    pub fn first_non_empty(&self) -> Option<&CellValue> {
        self.cells.iter().find(|c| !c.is_empty())
    }
}

/// Semantic field → 0-based column index, built once per document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub item_code: Option<usize>,
    #[serde(rename = "type")]
    pub item_type: Option<usize>,
    pub subtype: Option<usize>,
    pub zone: Option<usize>,
    pub description: Option<usize>,
    pub unit: Option<usize>,
    pub quantity: Option<usize>,
    pub unit_price: Option<usize>,
    pub total_price: Option<usize>,
    pub percent_complete: Option<usize>,
    pub status: Option<usize>,
}

/// Execution status of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    InProgress,
    Done,
}

impl ItemStatus {
    /// Status implied by a completion percentage.
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            100..=u8::MAX => Self::Done,
            1..=99 => Self::InProgress,
            0 => Self::Pending,
        }
    }
}

/// The unit of output: one priced work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    pub category: String,
    pub subtype: Option<String>,
    pub zone: String,
    pub code: Option<String>,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: Option<f64>,
    pub total_price: Option<f64>,
    pub percent_complete: u8,
    pub status: ItemStatus,
    /// Index of the row or line this item was read from.
    pub source_row: usize,
}

impl ExtractedItem {
    /// Fill whichever of unit/total price can be derived from the other.
    pub fn derive_prices(&mut self) {
        match (self.unit_price, self.total_price) {
            (Some(unit), None) => self.total_price = Some(unit * self.quantity),
            (None, Some(total)) if self.quantity != 0.0 => {
                self.unit_price = Some(total / self.quantity)
            }
            _ => {}
        }
    }
}

/// Which pipeline produced the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    StructuredSpreadsheet,
    PdfHeuristic,
    GenericFallback,
}

/// Non-fatal observations about an extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExtractionWarning {
    /// Spreadsheet had no recognizable header row.
    NoHeaderRow,
    /// No PDF line matched the item patterns.
    PdfHeuristicFoundNothing,
    /// A monetary/quantity cell could not be read as a number.
    UnparsedAmount { row: usize, token: String },
    /// A workbook sheet without any non-blank row was passed over.
    EmptySheetSkipped { sheet: String },
}

/// A zone inside a trade category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zona {
    pub name: String,
    /// Indices into `ExtractionResult::items`.
    pub item_indices: Vec<usize>,
}

impl Zona {
    pub fn total(&self, items: &[ExtractedItem]) -> f64 {
        self.item_indices
            .iter()
            .filter_map(|&i| items.get(i).and_then(|item| item.total_price))
            .sum()
    }
}

/// A trade category (Especialidade) with its zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Especialidade {
    pub name: String,
    pub zonas: Vec<Zona>,
}

impl Especialidade {
    pub fn total(&self, items: &[ExtractedItem]) -> f64 {
        self.zonas.iter().map(|z| z.total(items)).sum()
    }

    pub fn item_count(&self) -> usize {
        self.zonas.iter().map(|z| z.item_indices.len()).sum()
    }
}

/// Especialidade → Zona → item tree of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetTree {
    pub especialidades: Vec<Especialidade>,
}

impl BudgetTree {
    pub fn find(&self, name: &str) -> Option<&Especialidade> {
        let key = name.to_lowercase();
        self.especialidades
            .iter()
            .find(|e| e.name.to_lowercase() == key)
    }

    pub fn total(&self, items: &[ExtractedItem]) -> f64 {
        self.especialidades.iter().map(|e| e.total(items)).sum()
    }
}

/// Result of extracting one uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// UUID v5 of the input bytes; identical uploads share an id.
    pub document_id: Uuid,
    pub items: Vec<ExtractedItem>,
    pub raw_text: String,
    pub strategy_used: ExtractionStrategy,
    pub hierarchy: BudgetTree,
    pub warnings: Vec<ExtractionWarning>,
}

/// A positioned run of text from a PDF text layer.
/// Coordinates are in PDF user space (origin bottom-left).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphRun {
    /// 1-based page number.
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// PDF glyph-run extraction abstraction (allows mocking for tests)
pub trait GlyphRunSource {
    fn glyph_runs(&self, pdf_bytes: &[u8]) -> Result<Vec<GlyphRun>, ExtractionError>;
}

/// Main extraction orchestrator trait
pub trait BudgetExtractor {
    fn extract(&self, file_bytes: &[u8], file_name: &str)
        -> Result<ExtractionResult, ExtractionError>;
}
