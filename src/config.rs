use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "budget-extract";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the upload cap, in megabytes.
pub const MAX_FILE_MB_ENV: &str = "BUDGET_EXTRACT_MAX_FILE_MB";

const DEFAULT_MAX_FILE_BYTES: u64 = 20 * 1024 * 1024; // 20MB

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "budget_extract=info,warn"
}

/// Tunables for one extraction engine instance.
///
/// The defaults reproduce the behavior of the import preview: items without a
/// category or zone land in "Geral", items without a unit are counted in "un".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Uploads larger than this are rejected before parsing.
    pub max_file_bytes: u64,
    pub default_category: String,
    pub default_zone: String,
    pub default_unit: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            default_category: "Geral".into(),
            default_zone: "Geral".into(),
            default_unit: "un".into(),
        }
    }
}

impl ExtractionConfig {
    /// Defaults, with the upload cap taken from `BUDGET_EXTRACT_MAX_FILE_MB` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(mb) = std::env::var(MAX_FILE_MB_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.max_file_bytes = mb.saturating_mul(1024 * 1024);
        }
        config
    }
}
