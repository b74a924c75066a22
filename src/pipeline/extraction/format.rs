use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Upload kinds the engine accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Xlsx,
    Xls,
    Csv,
    Pdf,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    /// Dispatch on the file name's extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractionError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            "" => Err(ExtractionError::UnsupportedFormat("(no extension)".into())),
            other => Err(ExtractionError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

/// Reject uploads over the configured size cap.
pub fn check_size(size_bytes: u64, max_bytes: u64) -> Result<(), ExtractionError> {
    if size_bytes > max_bytes {
        return Err(ExtractionError::FileTooLarge {
            size_bytes,
            max_bytes,
        });
    }
    Ok(())
}

/// A `.pdf` upload must start with the `%PDF` magic (leading whitespace tolerated).
pub fn check_pdf_magic(file_bytes: &[u8]) -> Result<(), ExtractionError> {
    let start = file_bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(file_bytes.len());
    if file_bytes[start..].starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(ExtractionError::MalformedPdf("missing %PDF header".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_known_extensions() {
        assert_eq!(DocumentKind::from_file_name("orcamento.xlsx").unwrap(), DocumentKind::Xlsx);
        assert_eq!(DocumentKind::from_file_name("old.XLS").unwrap(), DocumentKind::Xls);
        assert_eq!(DocumentKind::from_file_name("mapa.csv").unwrap(), DocumentKind::Csv);
        assert_eq!(DocumentKind::from_file_name("proposta.Pdf").unwrap(), DocumentKind::Pdf);
    }

    #[test]
    fn path_components_do_not_matter() {
        let kind = DocumentKind::from_file_name("uploads/2024/proposta final.pdf").unwrap();
        assert_eq!(kind, DocumentKind::Pdf);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = DocumentKind::from_file_name("notes.docx").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(ref e) if e == ".docx"));
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let err = DocumentKind::from_file_name("README").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[test]
    fn size_cap_enforced() {
        assert!(check_size(10, 10).is_ok());
        let err = check_size(11, 10).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::FileTooLarge { size_bytes: 11, max_bytes: 10 }
        ));
    }

    #[test]
    fn pdf_magic_detected() {
        assert!(check_pdf_magic(b"%PDF-1.4\n...").is_ok());
        assert!(check_pdf_magic(b"\n  %PDF-1.7").is_ok());
        assert!(matches!(
            check_pdf_magic(b"PK\x03\x04"),
            Err(ExtractionError::MalformedPdf(_))
        ));
        assert!(check_pdf_magic(b"").is_err());
    }
}
