//! Enrichment orchestration for pubtrace.
//!
//! This crate ties the fetcher and the extractors together into a run:
//! load the seed catalog, enrich every record, write the new catalog.

pub mod catalog;
pub mod enrich;
pub mod pipeline;

pub use catalog::{load_catalog, parse_catalog, render_catalog, write_catalog};
pub use enrich::{EnrichmentOutcome, EnrichmentReport, Enricher};
pub use pipeline::{ProgressReporter, RunConfig, RunSummary, SilentProgress, run};
