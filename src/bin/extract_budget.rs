//! Extract one budget document and print the result as JSON.
//!
//! Usage:
//!   extract-budget <file.xlsx|file.xls|file.csv|file.pdf> [--compact]
//!
//! The upload cap is read from `BUDGET_EXTRACT_MAX_FILE_MB`; logs go to stderr
//! and follow `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;

use budget_extract::config::{ExtractionConfig, APP_NAME, APP_VERSION};
use budget_extract::DocumentExtractor;

fn main() -> ExitCode {
    budget_extract::init_tracing();

    let mut path: Option<PathBuf> = None;
    let mut compact = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--compact" => compact = true,
            "--version" | "-V" => {
                println!("{APP_NAME} {APP_VERSION}");
                return ExitCode::SUCCESS;
            }
            _ => path = Some(PathBuf::from(arg)),
        }
    }

    let Some(path) = path else {
        eprintln!("usage: extract-budget <file.xlsx|file.xls|file.csv|file.pdf> [--compact]");
        return ExitCode::from(2);
    };

    let extractor = DocumentExtractor::new(ExtractionConfig::from_env());
    let result = match extractor.extract_path(&path) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Extraction failed");
            eprintln!("{}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let json = if compact {
        serde_json::to_string(&result)
    } else {
        serde_json::to_string_pretty(&result)
    };
    match json {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to serialize result: {e}");
            ExitCode::FAILURE
        }
    }
}
