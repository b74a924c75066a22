//! Header-row detection and column mapping for spreadsheet budgets.
//!
//! A header row is the first row holding a cell equal to "item" and a cell
//! containing "descri". Columns are then mapped to semantic fields through
//! [`HEADER_SYNONYMS`], evaluated in table order; a column claimed by one
//! field is not offered to later fields. That keeps "Subtipo" away from
//! `type`, and lets the unit of measure ("Un", "Unid", a bare "Unit") be
//! claimed before `unit_price` takes any other header containing "unit".

use super::sanitize::fold_accents;
use super::types::{ColumnMap, RawRow};

/// How a header cell (lower-cased, accents folded) is matched.
#[derive(Debug, Clone, Copy)]
pub enum HeaderRule {
    Equals(&'static str),
    StartsWith(&'static str),
    Contains(&'static str),
    ContainsAll(&'static [&'static str]),
}

impl HeaderRule {
    pub fn matches(&self, header: &str) -> bool {
        match self {
            Self::Equals(s) => header == *s,
            Self::StartsWith(s) => header.starts_with(s),
            Self::Contains(s) => header.contains(s),
            Self::ContainsAll(parts) => parts.iter().all(|p| header.contains(p)),
        }
    }
}

/// Semantic fields of a budget table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ItemCode,
    Description,
    Subtype,
    Type,
    Zone,
    UnitPrice,
    TotalPrice,
    Unit,
    Quantity,
    PercentComplete,
    Status,
}

/// Field → header synonyms, in claim order. Synonyms are written folded
/// (lower case, no accents).
pub const HEADER_SYNONYMS: &[(Field, &[HeaderRule])] = &[
    (
        Field::ItemCode,
        &[
            HeaderRule::Equals("item"),
            HeaderRule::Equals("art."),
            HeaderRule::Equals("artigo"),
            HeaderRule::Equals("codigo"),
            HeaderRule::Equals("cod."),
            HeaderRule::Equals("ref."),
            HeaderRule::Equals("code"),
            HeaderRule::Equals("n.º"),
            HeaderRule::Equals("nº"),
        ],
    ),
    (Field::Description, &[HeaderRule::Contains("descri")]),
    (
        Field::Subtype,
        &[
            HeaderRule::Contains("subtipo"),
            HeaderRule::Contains("sub-tipo"),
            HeaderRule::Contains("subtype"),
            HeaderRule::Contains("subcategoria"),
            HeaderRule::Contains("subcapitulo"),
        ],
    ),
    (
        Field::Type,
        &[
            HeaderRule::Contains("tipo"),
            HeaderRule::Contains("type"),
            HeaderRule::Contains("especialidade"),
            HeaderRule::Contains("categoria"),
            HeaderRule::Contains("category"),
            HeaderRule::Contains("capitulo"),
        ],
    ),
    (
        Field::Zone,
        &[
            HeaderRule::Contains("zona"),
            HeaderRule::Contains("zone"),
            HeaderRule::Equals("local"),
            HeaderRule::Equals("piso"),
        ],
    ),
    (
        Field::Unit,
        &[
            HeaderRule::Equals("un"),
            HeaderRule::Equals("un."),
            HeaderRule::Equals("und"),
            HeaderRule::Equals("unid"),
            HeaderRule::Equals("unid."),
            HeaderRule::Equals("unidade"),
            HeaderRule::Equals("unit"),
        ],
    ),
    (
        Field::UnitPrice,
        &[
            HeaderRule::Contains("unit"),
            HeaderRule::Contains("preco u"),
            HeaderRule::Contains("p.u"),
        ],
    ),
    (
        Field::TotalPrice,
        &[
            HeaderRule::ContainsAll(&["total", "preco"]),
            HeaderRule::ContainsAll(&["total", "price"]),
            HeaderRule::ContainsAll(&["total", "valor"]),
            HeaderRule::Equals("total"),
            HeaderRule::Equals("montante"),
            HeaderRule::Equals("importancia"),
        ],
    ),
    (
        Field::Quantity,
        &[
            HeaderRule::Equals("qt"),
            HeaderRule::Equals("qt."),
            HeaderRule::StartsWith("qtd"),
            HeaderRule::StartsWith("qty"),
            HeaderRule::StartsWith("quant"),
        ],
    ),
    (
        Field::PercentComplete,
        &[
            HeaderRule::Contains("%"),
            HeaderRule::Contains("percent"),
            HeaderRule::Contains("execucao"),
            HeaderRule::Contains("progress"),
        ],
    ),
    (
        Field::Status,
        &[
            HeaderRule::Equals("estado"),
            HeaderRule::Equals("status"),
            HeaderRule::Contains("situacao"),
        ],
    ),
];

/// True when the row looks like the budget header.
pub fn is_header_row(row: &RawRow) -> bool {
    let folded: Vec<String> = row.cells.iter().map(|c| fold_accents(c.as_text().trim())).collect();
    folded.iter().any(|c| c == "item") && folded.iter().any(|c| c.contains("descri"))
}

/// Locate the header row and build its column map.
pub fn detect_header(rows: &[RawRow]) -> Option<(usize, ColumnMap)> {
    let position = rows.iter().position(is_header_row)?;
    let map = build_column_map(&rows[position]);
    tracing::debug!(header_row = rows[position].index, columns = ?map, "Header row detected");
    Some((position, map))
}

/// Map header cells to semantic fields using [`HEADER_SYNONYMS`].
pub fn build_column_map(header: &RawRow) -> ColumnMap {
    let headers: Vec<String> = header
        .cells
        .iter()
        .map(|c| fold_accents(c.as_text().trim()))
        .collect();
    let mut claimed = vec![false; headers.len()];
    let mut map = ColumnMap::default();

    for (field, rules) in HEADER_SYNONYMS {
        let column = headers.iter().enumerate().position(|(i, h)| {
            !claimed[i] && !h.is_empty() && rules.iter().any(|rule| rule.matches(h))
        });
        if let Some(col) = column {
            claimed[col] = true;
            assign(&mut map, *field, col);
        }
    }

    map
}

fn assign(map: &mut ColumnMap, field: Field, col: usize) {
    let slot = match field {
        Field::ItemCode => &mut map.item_code,
        Field::Description => &mut map.description,
        Field::Subtype => &mut map.subtype,
        Field::Type => &mut map.item_type,
        Field::Zone => &mut map.zone,
        Field::UnitPrice => &mut map.unit_price,
        Field::TotalPrice => &mut map.total_price,
        Field::Unit => &mut map.unit,
        Field::Quantity => &mut map.quantity,
        Field::PercentComplete => &mut map.percent_complete,
        Field::Status => &mut map.status,
    };
    *slot = Some(col);
}
