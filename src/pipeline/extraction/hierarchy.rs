use crate::config::ExtractionConfig;

use super::classify::{ItemDraft, RowKind};
use super::types::{
    BudgetTree, Especialidade, ExtractedItem, ExtractionWarning, ItemStatus, Zona,
};

/// State threaded through the classified row stream of one document.
///
/// Flat on purpose: a category row overwrites `current_category`, nothing is
/// pushed or popped, so an item seen before any category keeps the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContext {
    pub current_category: String,
    pub current_zone: String,
}

impl ParseContext {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            current_category: config.default_category.clone(),
            current_zone: config.default_zone.clone(),
        }
    }

    /// Context after seeing `row`.
    pub fn observe(self, row: &RowKind) -> Self {
        match row {
            RowKind::Category(label) if !label.trim().is_empty() => Self {
                current_category: label.trim().to_string(),
                ..self
            },
            _ => self,
        }
    }
}

/// Items in input order, their Especialidade → Zona tree, and warnings
/// raised while finishing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyOutput {
    pub items: Vec<ExtractedItem>,
    pub tree: BudgetTree,
    pub warnings: Vec<ExtractionWarning>,
}

/// Fold classified rows into finished items and the budget tree.
pub fn build_hierarchy(rows: Vec<RowKind>, config: &ExtractionConfig) -> HierarchyOutput {
    let (_, output) = rows.into_iter().fold(
        (ParseContext::new(config), HierarchyOutput::default()),
        |(context, mut output), row| {
            let context = context.observe(&row);
            if let RowKind::Item(draft) = row {
                output.attach(draft, &context, config);
            }
            (context, output)
        },
    );

    tracing::debug!(
        items = output.items.len(),
        especialidades = output.tree.especialidades.len(),
        "Hierarchy built"
    );
    output
}

impl HierarchyOutput {
    fn attach(&mut self, draft: ItemDraft, context: &ParseContext, config: &ExtractionConfig) {
        let zone_name = draft
            .zone
            .as_deref()
            .map(str::trim)
            .filter(|z| !z.is_empty())
            .unwrap_or(&context.current_zone)
            .to_string();

        let especialidade = especialidade_for(&mut self.tree, &context.current_category);
        let category = especialidade.name.clone();
        let zona = zona_for(especialidade, &zone_name);
        let zone = zona.name.clone();
        let index = self.items.len();
        zona.item_indices.push(index);

        self.warnings
            .extend(draft.rejected_amounts.iter().map(|token| ExtractionWarning::UnparsedAmount {
                row: draft.source_row,
                token: token.clone(),
            }));

        self.items.push(finish_item(draft, category, zone, config));
    }
}

/// Case-insensitive lookup; the first spelling seen becomes the name.
fn especialidade_for<'a>(tree: &'a mut BudgetTree, name: &str) -> &'a mut Especialidade {
    let key = name.to_lowercase();
    let position = match tree
        .especialidades
        .iter()
        .position(|e| e.name.to_lowercase() == key)
    {
        Some(position) => position,
        None => {
            tree.especialidades.push(Especialidade {
                name: name.to_string(),
                zonas: Vec::new(),
            });
            tree.especialidades.len() - 1
        }
    };
    &mut tree.especialidades[position]
}

fn zona_for<'a>(especialidade: &'a mut Especialidade, name: &str) -> &'a mut Zona {
    let key = name.to_lowercase();
    let position = match especialidade
        .zonas
        .iter()
        .position(|z| z.name.to_lowercase() == key)
    {
        Some(position) => position,
        None => {
            especialidade.zonas.push(Zona {
                name: name.to_string(),
                item_indices: Vec::new(),
            });
            especialidade.zonas.len() - 1
        }
    };
    &mut especialidade.zonas[position]
}

/// Apply defaults and derive the missing price.
fn finish_item(
    draft: ItemDraft,
    category: String,
    zone: String,
    config: &ExtractionConfig,
) -> ExtractedItem {
    let percent_complete = draft.percent_complete.unwrap_or(0);
    let status = draft
        .status
        .unwrap_or_else(|| ItemStatus::from_percent(percent_complete));

    let mut item = ExtractedItem {
        category,
        subtype: draft.subtype,
        zone,
        code: draft.code,
        description: draft.description,
        quantity: draft.quantity.unwrap_or(1.0),
        unit: draft.unit.unwrap_or_else(|| config.default_unit.clone()),
        unit_price: draft.unit_price,
        total_price: draft.total_price,
        percent_complete,
        status,
        source_row: draft.source_row,
    };
    item.derive_prices();
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(description: &str, source_row: usize) -> ItemDraft {
        ItemDraft::new(description, source_row)
    }

    #[test]
    fn items_before_any_category_use_default() {
        let out = build_hierarchy(
            vec![RowKind::Item(draft("Montagem de estaleiro", 0))],
            &ExtractionConfig::default(),
        );
        assert_eq!(out.items[0].category, "Geral");
        assert_eq!(out.items[0].zone, "Geral");
        assert_eq!(out.items[0].unit, "un");
        assert_eq!(out.items[0].quantity, 1.0);
        assert_eq!(out.items[0].status, ItemStatus::Pending);
    }

    #[test]
    fn category_rows_overwrite_context() {
        let rows = vec![
            RowKind::Category("ESTRUTURAS".into()),
            RowKind::Item(draft("Betão armado", 1)),
            RowKind::Noise,
            RowKind::Category("PINTURAS".into()),
            RowKind::Item(draft("Pintura de tecto", 4)),
        ];
        let out = build_hierarchy(rows, &ExtractionConfig::default());
        let categories: Vec<_> = out.items.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(categories, vec!["ESTRUTURAS", "PINTURAS"]);
        assert_eq!(out.tree.especialidades.len(), 2);
    }

    #[test]
    fn names_unified_case_insensitively() {
        let mut second = draft("Pintura exterior", 3);
        second.zone = Some("piso 1".into());
        let mut first = draft("Pintura de tecto", 1);
        first.zone = Some("Piso 1".into());

        let rows = vec![
            RowKind::Category("Pinturas".into()),
            RowKind::Item(first),
            RowKind::Category("PINTURAS".into()),
            RowKind::Item(second),
        ];
        let out = build_hierarchy(rows, &ExtractionConfig::default());
        assert_eq!(out.tree.especialidades.len(), 1);
        let pinturas = &out.tree.especialidades[0];
        assert_eq!(pinturas.name, "Pinturas");
        assert_eq!(pinturas.zonas.len(), 1);
        assert_eq!(pinturas.zonas[0].item_indices, vec![0, 1]);
        assert_eq!(out.items[1].category, "Pinturas");
        assert_eq!(out.items[1].zone, "Piso 1");
    }

    #[test]
    fn order_is_stable() {
        let rows = vec![
            RowKind::Category("B".into()),
            RowKind::Item(draft("segundo item", 1)),
            RowKind::Category("A".into()),
            RowKind::Item(draft("terceiro item", 2)),
            RowKind::Category("B".into()),
            RowKind::Item(draft("quarto item", 3)),
        ];
        let out = build_hierarchy(rows, &ExtractionConfig::default());
        let rows: Vec<_> = out.items.iter().map(|i| i.source_row).collect();
        assert_eq!(rows, vec![1, 2, 3]);
        assert_eq!(out.tree.especialidades[0].zonas[0].item_indices, vec![0, 2]);
    }

    #[test]
    fn prices_derived_and_totals_summed() {
        let mut betao = draft("Betão armado", 1);
        betao.quantity = Some(10.0);
        betao.unit_price = Some(120.0);
        let mut cofragem = draft("Cofragem", 2);
        cofragem.quantity = Some(4.0);
        cofragem.total_price = Some(100.0);

        let out = build_hierarchy(
            vec![RowKind::Item(betao), RowKind::Item(cofragem)],
            &ExtractionConfig::default(),
        );
        assert_eq!(out.items[0].total_price, Some(1200.0));
        assert_eq!(out.items[1].unit_price, Some(25.0));
        assert_eq!(out.tree.total(&out.items), 1300.0);
    }

    #[test]
    fn status_inferred_from_percent_unless_explicit() {
        let mut half = draft("Reboco", 1);
        half.percent_complete = Some(50);
        let mut explicit = draft("Pintura", 2);
        explicit.percent_complete = Some(50);
        explicit.status = Some(ItemStatus::Done);

        let out = build_hierarchy(
            vec![RowKind::Item(half), RowKind::Item(explicit)],
            &ExtractionConfig::default(),
        );
        assert_eq!(out.items[0].status, ItemStatus::InProgress);
        assert_eq!(out.items[1].status, ItemStatus::Done);
    }

    #[test]
    fn rejected_amounts_become_warnings() {
        let mut d = draft("Betão", 6);
        d.rejected_amounts = vec!["dez".into()];
        let out = build_hierarchy(vec![RowKind::Item(d)], &ExtractionConfig::default());
        assert_eq!(
            out.warnings,
            vec![ExtractionWarning::UnparsedAmount {
                row: 6,
                token: "dez".into()
            }]
        );
    }

    #[test]
    fn configured_defaults_apply() {
        let config = ExtractionConfig {
            default_category: "General".into(),
            default_zone: "Site".into(),
            default_unit: "ea".into(),
            ..ExtractionConfig::default()
        };
        let out = build_hierarchy(vec![RowKind::Item(draft("Cleanup", 0))], &config);
        assert_eq!(out.items[0].category, "General");
        assert_eq!(out.items[0].zone, "Site");
        assert_eq!(out.items[0].unit, "ea");
    }

    #[test]
    fn blank_category_label_is_ignored() {
        let context = ParseContext::new(&ExtractionConfig::default())
            .observe(&RowKind::Category("  ".into()));
        assert_eq!(context.current_category, "Geral");
    }
}
