use std::path::Path;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::classify::{classify_structured, RowKind};
use super::format::{check_pdf_magic, check_size, DocumentKind};
use super::generic::classify_generic;
use super::header_detect::detect_header;
use super::hierarchy::build_hierarchy;
use super::line_reconstruct::reconstruct_lines;
use super::pdf::LopdfGlyphSource;
use super::pdf_rows::classify_pdf_line;
use super::table::{
    ingest_csv, ingest_workbook, restore_numeric_codes, rows_from_lines, rows_to_text,
    IngestedTable,
};
use super::types::{
    BudgetExtractor, ExtractionResult, ExtractionStrategy, ExtractionWarning, GlyphRunSource,
    RawRow,
};
use super::ExtractionError;
use crate::config::ExtractionConfig;

/// Concrete implementation of the budget extractor.
/// The PDF text layer is read through a trait object so tests can inject runs.
pub struct DocumentExtractor {
    config: ExtractionConfig,
    glyph_source: Box<dyn GlyphRunSource + Send + Sync>,
}

impl DocumentExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            glyph_source: Box::new(LopdfGlyphSource),
        }
    }

    /// Replace the lopdf text-layer reader.
    pub fn with_glyph_source(mut self, source: Box<dyn GlyphRunSource + Send + Sync>) -> Self {
        self.glyph_source = source;
        self
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

/// Classified rows of one document before the hierarchy fold.
struct Classified {
    rows: Vec<RowKind>,
    raw_text: String,
    strategy: ExtractionStrategy,
    warnings: Vec<ExtractionWarning>,
}

impl BudgetExtractor for DocumentExtractor {
    fn extract(
        &self,
        file_bytes: &[u8],
        file_name: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        let kind = DocumentKind::from_file_name(file_name)?;
        check_size(file_bytes.len() as u64, self.config.max_file_bytes)?;
        let document_id = document_id(file_bytes);

        tracing::info!(
            document_id = %document_id,
            kind = kind.as_str(),
            size_bytes = file_bytes.len(),
            "Starting budget extraction"
        );

        if file_bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ExtractionError::EmptyDocument);
        }

        let classified = match kind {
            DocumentKind::Xlsx | DocumentKind::Xls => {
                classify_table(ingest_workbook(file_bytes)?)?
            }
            DocumentKind::Csv => classify_table(ingest_csv(file_bytes)?)?,
            DocumentKind::Pdf => self.classify_pdf(file_bytes)?,
        };

        let hierarchy = build_hierarchy(classified.rows, &self.config);
        let mut warnings = classified.warnings;
        warnings.extend(hierarchy.warnings);

        tracing::info!(
            document_id = %document_id,
            strategy = ?classified.strategy,
            items = hierarchy.items.len(),
            especialidades = hierarchy.tree.especialidades.len(),
            warnings = warnings.len(),
            "Budget extraction complete"
        );

        Ok(ExtractionResult {
            document_id,
            items: hierarchy.items,
            raw_text: classified.raw_text,
            strategy_used: classified.strategy,
            hierarchy: hierarchy.tree,
            warnings,
        })
    }
}

impl DocumentExtractor {
    /// Line patterns first; when they recover no item at all, the lines they
    /// rejected get a second, generic pass. Category lines are kept so the
    /// generic items still land under them.
    fn classify_pdf(&self, file_bytes: &[u8]) -> Result<Classified, ExtractionError> {
        check_pdf_magic(file_bytes)?;
        let runs = self.glyph_source.glyph_runs(file_bytes)?;
        let lines = reconstruct_lines(&runs);
        tracing::debug!(runs = runs.len(), lines = lines.len(), "PDF lines reconstructed");

        if lines.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        let raw_text = lines.join("\n");
        let rows: Vec<RowKind> = lines
            .iter()
            .enumerate()
            .map(|(index, line)| classify_pdf_line(line, index))
            .collect();

        if rows.iter().any(|r| matches!(r, RowKind::Item(_))) {
            return Ok(Classified {
                rows,
                raw_text,
                strategy: ExtractionStrategy::PdfHeuristic,
                warnings: Vec::new(),
            });
        }

        tracing::warn!(lines = lines.len(), "No PDF line matched an item pattern, using generic fallback");
        let line_rows = rows_from_lines(&lines);
        let rows = rows
            .into_iter()
            .zip(&line_rows)
            .map(|(kind, row)| match kind {
                RowKind::Noise => classify_generic(row),
                kept => kept,
            })
            .collect();

        Ok(Classified {
            rows,
            raw_text,
            strategy: ExtractionStrategy::GenericFallback,
            warnings: vec![ExtractionWarning::PdfHeuristicFoundNothing],
        })
    }
}

/// Structured strategy below a detected header, generic strategy otherwise.
fn classify_table(mut table: IngestedTable) -> Result<Classified, ExtractionError> {
    if !table.has_content() {
        return Err(ExtractionError::EmptyDocument);
    }

    let raw_text = rows_to_text(&table.rows);
    let mut warnings = table.warnings;

    let (rows, strategy) = match detect_header(&table.rows) {
        Some((position, columns)) => {
            if let Some(code_column) = columns.item_code {
                restore_numeric_codes(&mut table.rows[position + 1..], code_column);
            }
            let rows = classify_rows(&table.rows[position + 1..], |row| {
                classify_structured(row, &columns)
            });
            (rows, ExtractionStrategy::StructuredSpreadsheet)
        }
        None => {
            tracing::warn!(rows = table.rows.len(), "No header row found, using generic fallback");
            warnings.push(ExtractionWarning::NoHeaderRow);
            (
                classify_rows(&table.rows, classify_generic),
                ExtractionStrategy::GenericFallback,
            )
        }
    };

    Ok(Classified {
        rows,
        raw_text,
        strategy,
        warnings,
    })
}

fn classify_rows(rows: &[RawRow], classify: impl Fn(&RawRow) -> RowKind) -> Vec<RowKind> {
    rows.iter()
        .filter(|row| !row.is_blank())
        .map(classify)
        .collect()
}

/// Deterministic id: UUID v5 over the SHA-256 of the bytes.
pub fn document_id(file_bytes: &[u8]) -> Uuid {
    let digest = Sha256::digest(file_bytes);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, &digest)
}

/// Extract with default settings.
pub fn extract(file_bytes: &[u8], file_name: &str) -> Result<ExtractionResult, ExtractionError> {
    DocumentExtractor::default().extract(file_bytes, file_name)
}

/// Read a file from disk and extract it with default settings.
pub fn extract_file(path: impl AsRef<Path>) -> Result<ExtractionResult, ExtractionError> {
    DocumentExtractor::default().extract_path(path.as_ref())
}

impl DocumentExtractor {
    /// Read a file from disk and extract it, dispatching on its name.
    /// The size cap is checked against file metadata before reading.
    pub fn extract_path(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        DocumentKind::from_file_name(file_name)?;
        check_size(std::fs::metadata(path)?.len(), self.config.max_file_bytes)?;

        let bytes = std::fs::read(path)?;
        self.extract(&bytes, file_name)
    }
}
