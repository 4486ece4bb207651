//! Shared types, error model, and configuration for pubtrace.
//!
//! This crate is the foundation depended on by all other pubtrace crates.
//! It provides:
//! - [`PubtraceError`]: the unified error type
//! - Record types ([`CatalogRecord`], [`EnrichedRecord`])
//! - Configuration ([`AppConfig`], [`HttpConfig`], [`EnrichConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, EnrichConfig, HttpConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{PubtraceError, Result};
pub use types::{CatalogRecord, DOI_FIELD, EnrichedRecord, PUBLICATION_URL_FIELD};
