//! Line patterns for budgets exported to PDF.
//!
//! Each reconstructed line is tried against, in order: a category line
//! ("3 PINTURAS"), a full item line with unit and price columns, and a simple
//! item line carrying one amount. Anything else is noise; headers, footers and
//! totals rows are expected to fall through.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::classify::{ItemDraft, RowKind};
use super::numeric::try_parse_locale_number;
use super::sanitize::sanitize_cell_text;

/// Integer code followed by an upper-case label and nothing else.
static CATEGORY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.?\s+(\p{Lu}[\p{Lu}\s&/,.'()\-]*)$").unwrap()
});

/// `<dotted-code> <description> [<unit>] <quantity> [<unit-price>] [<total-price>]`
static FULL_ITEM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<code>\d+(?:\.\d+)+)\.?\s+(?P<desc>.+?)\s+(?:(?P<unit>conj|cj|un|vg|m2|m3|ml|kg|pç|pc|h)\s+)?(?P<qty>\d[\d.,]*)(?:\s+(?P<up>\d[\d.,]*))?(?:\s+(?P<tot>\d[\d.,]*))?$",
    )
    .unwrap()
});

/// `<dotted-code> <description> <value>`
static SIMPLE_ITEM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<code>\d+(?:\.\d+)+)\.?\s+(?P<desc>.+?)\s+(?P<value>\d[\d.,]*)$").unwrap()
});

static CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"€|\bEUR\b|\bEuros?\b").unwrap());

const MIN_SIMPLE_DESCRIPTION: usize = 5;

/// Classify one reconstructed PDF line.
pub fn classify_pdf_line(line: &str, source_row: usize) -> RowKind {
    let line = normalize_line(line);
    if line.is_empty() {
        return RowKind::Noise;
    }

    if let Some(label) = category_label(&line) {
        return RowKind::Category(label);
    }
    if let Some(draft) = full_item(&line, source_row) {
        return RowKind::Item(draft);
    }
    if let Some(draft) = simple_item(&line, source_row) {
        return RowKind::Item(draft);
    }
    RowKind::Noise
}

/// Sanitized line with currency markers removed.
fn normalize_line(line: &str) -> String {
    let clean = sanitize_cell_text(line);
    sanitize_cell_text(&CURRENCY.replace_all(&clean, " "))
}

pub fn category_label(line: &str) -> Option<String> {
    CATEGORY_LINE
        .captures(line)
        .map(|caps| caps[1].trim().to_string())
        .filter(|label| label.chars().any(char::is_alphabetic))
}

/// Full item pattern. Accepted only when the line carries a unit or at least
/// one price column; a lone number is left to [`simple_item`].
pub fn full_item(line: &str, source_row: usize) -> Option<ItemDraft> {
    let caps = FULL_ITEM_LINE.captures(line)?;
    let unit = caps.name("unit").map(|m| m.as_str().to_lowercase());
    let has_price = caps.name("up").is_some() || caps.name("tot").is_some();
    if unit.is_none() && !has_price {
        return None;
    }

    let mut draft = ItemDraft::new(caps["desc"].trim(), source_row);
    draft.code = Some(caps["code"].to_string());
    draft.unit = unit;
    draft.quantity = amount(&caps, "qty", &mut draft.rejected_amounts);
    draft.unit_price = amount(&caps, "up", &mut draft.rejected_amounts);
    draft.total_price = amount(&caps, "tot", &mut draft.rejected_amounts);
    Some(draft)
}

/// Simple item pattern: the single amount is the line total.
pub fn simple_item(line: &str, source_row: usize) -> Option<ItemDraft> {
    let caps = SIMPLE_ITEM_LINE.captures(line)?;
    let description = caps["desc"].trim();
    if description.chars().count() < MIN_SIMPLE_DESCRIPTION {
        return None;
    }
    let value = try_parse_locale_number(&caps["value"])?;
    if value <= 0.0 {
        return None;
    }

    let mut draft = ItemDraft::new(description, source_row);
    draft.code = Some(caps["code"].to_string());
    draft.quantity = Some(1.0);
    draft.total_price = Some(value);
    Some(draft)
}

fn amount(caps: &Captures<'_>, group: &str, rejected: &mut Vec<String>) -> Option<f64> {
    let token = caps.name(group)?.as_str();
    let parsed = try_parse_locale_number(token);
    if parsed.is_none() {
        rejected.push(token.to_string());
    }
    parsed
}
