pub mod config;
pub mod pipeline;

pub use config::ExtractionConfig;
pub use pipeline::extraction::{
    extract, extract_file, BudgetExtractor, DocumentExtractor, ExtractedItem, ExtractionError,
    ExtractionResult, ExtractionStrategy,
};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins over the crate default.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
