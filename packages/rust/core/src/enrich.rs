//! Per-record enrichment orchestrator.
//!
//! Each catalog entry goes through: docs URL -> publication URL -> DOI.
//! Failures stay inside the record they happened in; the batch always runs
//! to the end and output order always matches input order.

use std::time::{Duration, Instant};

use futures::StreamExt;
use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use pubtrace_extract::{DoiSource, Lookup, locate_publication, resolve_doi};
use pubtrace_fetch::PageFetcher;
use pubtrace_shared::{CatalogRecord, EnrichConfig, EnrichedRecord};

use crate::catalog::json_kind;
use crate::pipeline::ProgressReporter;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Counters describing one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Entries in the input catalog.
    pub records_in: usize,
    /// Enriched records emitted.
    pub records_out: usize,
    /// Entries dropped because they were not JSON objects.
    pub skipped_not_object: usize,
    /// Records with no usable documentation URL.
    pub without_docs: usize,
    /// Records where a publication URL was found.
    pub publications_found: usize,
    /// DOIs taken from the publication URL.
    pub dois_from_url: usize,
    /// DOIs taken from the publication page body.
    pub dois_from_page: usize,
    /// Page fetches that failed (either stage).
    pub fetch_failures: usize,
    /// Wall time of the pass.
    pub elapsed: Duration,
}

impl EnrichmentReport {
    pub fn dois_found(&self) -> usize {
        self.dois_from_url + self.dois_from_page
    }

    fn record(&mut self, stats: &RecordStats) {
        self.records_out += 1;
        if !stats.had_docs {
            self.without_docs += 1;
        }
        if stats.publication_found {
            self.publications_found += 1;
        }
        match stats.doi_source {
            Some(DoiSource::Url) => self.dois_from_url += 1,
            Some(DoiSource::PageBody) => self.dois_from_page += 1,
            None => {}
        }
        self.fetch_failures += stats.fetch_failures;
    }
}

/// Enriched records plus the report for the pass that produced them.
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub records: Vec<EnrichedRecord>,
    pub report: EnrichmentReport,
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, Default)]
struct RecordStats {
    had_docs: bool,
    publication_found: bool,
    doi_source: Option<DoiSource>,
    fetch_failures: usize,
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// Runs the locator and resolver over a catalog.
pub struct Enricher<F> {
    fetcher: F,
    config: EnrichConfig,
}

impl<F: PageFetcher> Enricher<F> {
    pub fn new(fetcher: F, config: EnrichConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Enrich every entry of `catalog`.
    ///
    /// Up to `concurrency` records are in flight at once; results are
    /// yielded in input order regardless of which finishes first.
    #[instrument(skip_all, fields(entries = catalog.len(), concurrency = self.config.concurrency))]
    pub async fn enrich(
        &self,
        catalog: Vec<Value>,
        progress: &dyn ProgressReporter,
    ) -> EnrichmentOutcome {
        let start = Instant::now();
        let total = catalog.len();
        let mut report = EnrichmentReport {
            records_in: total,
            ..Default::default()
        };
        let mut records = Vec::with_capacity(total);

        info!(entries = total, "processing catalog");

        let mut results = futures::stream::iter(catalog.into_iter().enumerate())
            .map(|(index, entry)| self.enrich_entry(index, entry))
            .buffered(self.config.concurrency.max(1));

        let mut done = 0;
        while let Some(result) = results.next().await {
            done += 1;
            match result {
                Some((record, stats)) => {
                    report.record(&stats);
                    records.push(record);
                }
                None => report.skipped_not_object += 1,
            }
            progress.record_done(done, total);
        }

        report.elapsed = start.elapsed();

        info!(
            records_out = report.records_out,
            skipped = report.skipped_not_object,
            publications = report.publications_found,
            dois = report.dois_found(),
            fetch_failures = report.fetch_failures,
            duration_ms = report.elapsed.as_millis(),
            "catalog processed"
        );

        EnrichmentOutcome { records, report }
    }

    /// Enrich one catalog entry, or `None` if it is not a JSON object.
    async fn enrich_entry(&self, index: usize, entry: Value) -> Option<(EnrichedRecord, RecordStats)> {
        let record = match entry {
            Value::Object(record) => record,
            other => {
                warn!(item = index + 1, kind = json_kind(&other), "skipping entry, not a JSON object");
                return None;
            }
        };

        let title = record
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("No Title")
            .to_string();
        let span = info_span!("record", item = index + 1, %title);

        Some(self.enrich_record(record).instrument(span).await)
    }

    async fn enrich_record(&self, record: CatalogRecord) -> (EnrichedRecord, RecordStats) {
        let mut stats = RecordStats::default();

        let Some(doc_url) = docs_url(&record, &self.config.docs_field) else {
            debug!(field = %self.config.docs_field, "no documentation URL on record");
            return (EnrichedRecord::unenriched(record), stats);
        };
        stats.had_docs = true;

        let publication_url = match locate_publication(&self.fetcher, &doc_url).await {
            Lookup::Found(url) => url,
            Lookup::NotFound => return (EnrichedRecord::unenriched(record), stats),
            Lookup::FetchFailed(_) => {
                stats.fetch_failures += 1;
                return (EnrichedRecord::unenriched(record), stats);
            }
        };
        stats.publication_found = true;

        let doi = match resolve_doi(&self.fetcher, Some(&publication_url)).await {
            Lookup::Found(doi) => {
                stats.doi_source = Some(doi.source);
                Some(doi.value)
            }
            Lookup::NotFound => None,
            Lookup::FetchFailed(_) => {
                stats.fetch_failures += 1;
                None
            }
        };

        (EnrichedRecord::new(record, Some(publication_url), doi), stats)
    }
}

/// The record's documentation URL, if it holds a non-blank string.
fn docs_url(record: &CatalogRecord, field: &str) -> Option<String> {
    match record.get(field) {
        Some(Value::String(url)) if !url.trim().is_empty() => Some(url.clone()),
        _ => None,
    }
}
