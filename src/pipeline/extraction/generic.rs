//! Last-resort classification when no header row and no document-specific
//! structure was found. Imprecise on purpose: any row with enough free text
//! becomes a reviewable item.

use std::sync::LazyLock;

use regex::Regex;

use super::classify::{ItemDraft, RowKind};
use super::sanitize::fold_accents;
use super::types::{CellValue, RawRow};

/// A leading number directly followed by an upper-case letter.
static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.?\s*\p{Lu}").unwrap());

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.?\s*").unwrap());

/// Trade names seen as chapter headings in construction budgets (folded).
const TRADE_VOCABULARY: &[&str] = &[
    "estaleiro",
    "demolicoes",
    "movimento de terras",
    "fundacoes",
    "estruturas",
    "alvenarias",
    "coberturas",
    "impermeabilizacoes",
    "isolamentos",
    "revestimentos",
    "pavimentos",
    "tectos",
    "tetos",
    "carpintarias",
    "serralharias",
    "caixilharias",
    "pinturas",
    "canalizacoes",
    "redes de aguas",
    "esgotos",
    "eletricidade",
    "electricidade",
    "instalacoes electricas",
    "instalacoes eletricas",
    "avac",
    "climatizacao",
    "equipamentos",
    "arranjos exteriores",
];

/// Headings are short; longer text mentioning a trade is an item.
const MAX_HEADING_CHARS: usize = 40;

/// Free text longer than this becomes an item description.
const MIN_ITEM_CHARS: usize = 10;

/// Classify a row without any column knowledge.
pub fn classify_generic(row: &RawRow) -> RowKind {
    let Some(first) = row.first_non_empty() else {
        return RowKind::Noise;
    };
    let first = first.as_text();

    if let Some(label) = heading_label(&first) {
        return RowKind::Category(label);
    }

    row.cells
        .iter()
        .find_map(|cell| match cell {
            CellValue::Text(text) if text.chars().count() > MIN_ITEM_CHARS => {
                Some(RowKind::Item(ItemDraft::new(text.clone(), row.index)))
            }
            _ => None,
        })
        .unwrap_or(RowKind::Noise)
}

/// Category label when the cell reads like a chapter heading.
pub fn heading_label(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if NUMBERED_HEADING.is_match(cell) {
        let label = LEADING_NUMBER.replace(cell, "").trim().to_string();
        return (!label.is_empty()).then_some(label);
    }
    is_trade_name(cell).then(|| cell.to_string())
}

/// Fuzzy match against [`TRADE_VOCABULARY`]: accent- and case-insensitive,
/// a trade name must start a word of a short cell.
pub fn is_trade_name(cell: &str) -> bool {
    if cell.chars().count() > MAX_HEADING_CHARS {
        return false;
    }
    let padded = format!(" {}", fold_accents(cell));
    TRADE_VOCABULARY
        .iter()
        .any(|trade| padded.contains(&format!(" {trade}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, cells: &[&str]) -> RawRow {
        RawRow::new(index, cells.iter().map(|c| CellValue::text(c)).collect())
    }

    #[test]
    fn numbered_heading_is_category() {
        assert_eq!(
            classify_generic(&row(0, &["1 ESTRUTURAS"])),
            RowKind::Category("ESTRUTURAS".into())
        );
        assert_eq!(
            classify_generic(&row(0, &["", "2.Alvenarias e paredes"])),
            RowKind::Category("Alvenarias e paredes".into())
        );
    }

    #[test]
    fn trade_vocabulary_is_category() {
        assert_eq!(
            classify_generic(&row(0, &["Canalizações"])),
            RowKind::Category("Canalizações".into())
        );
        assert_eq!(
            classify_generic(&row(0, &["PINTURAS INTERIORES"])),
            RowKind::Category("PINTURAS INTERIORES".into())
        );
    }

    #[test]
    fn trade_must_start_a_word() {
        assert!(is_trade_name("AVAC"));
        assert!(!is_trade_name("Escavação geral"));
    }

    #[test]
    fn long_text_mentioning_trade_is_item() {
        let text = "Fornecimento e aplicação de pinturas em paredes interiores";
        match classify_generic(&row(3, &[text])) {
            RowKind::Item(draft) => {
                assert_eq!(draft.description, text);
                assert_eq!(draft.source_row, 3);
                assert_eq!(draft.quantity, None);
                assert_eq!(draft.total_price, None);
            }
            other => panic!("expected item, got {other:?}"),
        }
    }

    #[test]
    fn first_long_text_cell_is_description() {
        match classify_generic(&row(1, &["a", "curto", "Betão armado em pilares", "Outro texto longo"])) {
            RowKind::Item(draft) => assert_eq!(draft.description, "Betão armado em pilares"),
            other => panic!("expected item, got {other:?}"),
        }
    }

    #[test]
    fn short_text_is_noise() {
        assert_eq!(classify_generic(&row(0, &["abc", "1234567890"])), RowKind::Noise);
        assert_eq!(classify_generic(&row(0, &[])), RowKind::Noise);
    }

    #[test]
    fn numeric_cells_never_become_descriptions() {
        let r = RawRow::new(0, vec![CellValue::text("x"), CellValue::Number(12345678901.0)]);
        assert_eq!(classify_generic(&r), RowKind::Noise);
    }
}
