//! Row classification shared by every strategy, and the structured
//! (header-mapped) strategy itself.
//!
//! Budgets number trade categories with bare integers ("1 ESTRUTURAS") and
//! their items with dotted codes ("1.1", "1.2"). That convention is the only
//! structural signal that survives export, so the predicates below key on it.

use super::numeric::{parse_percent, try_parse_locale_number};
use super::sanitize::fold_accents;
use super::types::{CellValue, ColumnMap, ItemStatus, RawRow};

/// What a single row turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    /// Sets the current category; carries the label.
    Category(String),
    Item(ItemDraft),
    Noise,
}

/// Fields read from one item row before defaults and derivations apply.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemDraft {
    pub code: Option<String>,
    pub description: String,
    pub subtype: Option<String>,
    pub zone: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total_price: Option<f64>,
    pub percent_complete: Option<u8>,
    pub status: Option<ItemStatus>,
    pub source_row: usize,
    /// Tokens found in numeric columns that could not be read as numbers.
    pub rejected_amounts: Vec<String>,
}

impl ItemDraft {
    pub fn new(description: impl Into<String>, source_row: usize) -> Self {
        Self {
            description: description.into(),
            source_row,
            ..Self::default()
        }
    }
}

/// Bare integer-style code: non-empty and no dot ("1", "2", "A").
pub fn is_category_code(code: &str) -> bool {
    let code = code.trim();
    !code.is_empty() && !code.contains('.')
}

/// Item-style code ("1.1", "2.3.4").
pub fn is_dotted_code(code: &str) -> bool {
    code.contains('.')
}

pub fn has_description(description: &str) -> bool {
    description.trim().chars().count() >= 2
}

/// "Total", "Subtotal", "Total Geral": summary lines repeated by the sheet.
pub fn is_summary_label(description: &str) -> bool {
    let folded = fold_accents(description.trim());
    folded.starts_with("total") || folded.starts_with("subtotal") || folded.starts_with("sub-total")
}

/// Recognize a status cell. Unknown wording yields `None`, and the status is
/// then inferred from the completion percentage.
pub fn parse_status_token(token: &str) -> Option<ItemStatus> {
    let folded = fold_accents(token.trim());
    if folded.is_empty() {
        return None;
    }
    if ["conclu", "done", "complet", "feito", "terminad"]
        .iter()
        .any(|s| folded.contains(s))
    {
        return Some(ItemStatus::Done);
    }
    if ["curso", "andamento", "progress", "execucao", "iniciado"]
        .iter()
        .any(|s| folded.contains(s))
        && !folded.contains("nao iniciado")
        && !folded.contains("por iniciar")
    {
        return Some(ItemStatus::InProgress);
    }
    if ["pendente", "pending", "por iniciar", "nao iniciado"]
        .iter()
        .any(|s| folded.contains(s))
    {
        return Some(ItemStatus::Pending);
    }
    None
}

/// Classify a row below the header using its column map.
pub fn classify_structured(row: &RawRow, columns: &ColumnMap) -> RowKind {
    let code = row.text_at(columns.item_code);
    let description = row.text_at(columns.description);

    // A missing type column reads as an empty type cell.
    let label = row.text_at(columns.item_type);
    if is_category_code(&code) && !label.is_empty() {
        return RowKind::Category(label);
    }

    let code_is_dotted = is_dotted_code(&code);
    if !code_is_dotted && !has_description(&description) {
        return RowKind::Noise;
    }
    if code.is_empty() && is_summary_label(&description) {
        return RowKind::Noise;
    }
    if description.is_empty() {
        // A dotted code with nothing to describe it is not reviewable.
        return RowKind::Noise;
    }

    let mut draft = ItemDraft::new(description, row.index);
    draft.code = non_empty(code);
    draft.subtype = non_empty(row.text_at(columns.subtype));
    draft.zone = non_empty(row.text_at(columns.zone));
    draft.unit = non_empty(row.text_at(columns.unit));
    draft.quantity = read_amount(row, columns.quantity, &mut draft.rejected_amounts);
    draft.unit_price = read_amount(row, columns.unit_price, &mut draft.rejected_amounts);
    draft.total_price = read_amount(row, columns.total_price, &mut draft.rejected_amounts);
    draft.percent_complete =
        read_percent(row, columns.percent_complete, &mut draft.rejected_amounts);
    draft.status = columns
        .status
        .and_then(|_| parse_status_token(&row.text_at(columns.status)));

    RowKind::Item(draft)
}

fn non_empty(text: String) -> Option<String> {
    (!text.trim().is_empty()).then_some(text)
}

/// Numeric cells are taken as-is; text cells go through the locale parser.
fn read_amount(row: &RawRow, column: Option<usize>, rejected: &mut Vec<String>) -> Option<f64> {
    match column.and_then(|c| row.cell(c))? {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(t) => {
            let parsed = try_parse_locale_number(t);
            if parsed.is_none() && !is_placeholder(t) {
                rejected.push(t.clone());
            }
            parsed
        }
        CellValue::Empty => None,
    }
}

/// Fractional numeric percent cells below 1 are ratios (Excel percent
/// format); whole numbers are already percentages.
fn read_percent(row: &RawRow, column: Option<usize>, rejected: &mut Vec<String>) -> Option<u8> {
    match column.and_then(|c| row.cell(c))? {
        CellValue::Number(n) => {
            let is_ratio = n.fract() != 0.0 && n.abs() < 1.0;
            let percent = if is_ratio { n * 100.0 } else { *n };
            Some(percent.round().clamp(0.0, 100.0) as u8)
        }
        CellValue::Text(t) => {
            let parsed = parse_percent(t);
            if parsed.is_none() && !is_placeholder(t) {
                rejected.push(t.clone());
            }
            parsed
        }
        CellValue::Empty => None,
    }
}

/// Dashes and similar fillers mean "no value", not "unreadable value".
fn is_placeholder(token: &str) -> bool {
    token
        .trim()
        .chars()
        .all(|c| matches!(c, '-' | '–' | '—' | '/' | '*' | '.'))
}
