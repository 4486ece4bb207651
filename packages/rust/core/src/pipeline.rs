//! End-to-end `run` pipeline: seed catalog → enrich → write.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use pubtrace_fetch::PageFetcher;
use pubtrace_shared::{AppConfig, EnrichConfig, Result};

use crate::catalog::{load_catalog, write_catalog};
use crate::enrich::{EnrichmentReport, Enricher};

/// Configuration for a single `run`.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Seed catalog location: an `http(s)` URL or a local path.
    pub seed: String,
    /// Destination for the enriched catalog.
    pub output: PathBuf,
    /// Enrichment settings.
    pub enrich: EnrichConfig,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            seed: config.catalog.seed.clone(),
            output: PathBuf::from(&config.catalog.output),
            enrich: config.enrich.clone(),
        }
    }
}

/// Result of a completed `run`.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Path the enriched catalog was written to.
    pub output: PathBuf,
    /// Per-record counters from the enrichment pass.
    pub report: EnrichmentReport,
    /// Total elapsed time, load and write included.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each catalog entry is handled.
    fn record_done(&self, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn record_done(&self, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run the full pipeline.
///
/// 1. Load the seed catalog
/// 2. Enrich every record
/// 3. Write the enriched catalog
///
/// A seed that cannot be loaded or parsed aborts the run before anything is
/// written. Per-record failures never abort it.
#[instrument(skip_all, fields(seed = %config.seed, output = %config.output.display()))]
pub async fn run<F: PageFetcher>(
    config: &RunConfig,
    fetcher: F,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();

    info!("starting run");

    // --- Phase 1: Seed ---
    progress.phase("Loading seed catalog");
    let catalog = load_catalog(&fetcher, &config.seed).await?;

    // --- Phase 2: Enrich ---
    progress.phase("Enriching records");
    let enricher = Enricher::new(fetcher, config.enrich.clone());
    let outcome = enricher.enrich(catalog, progress).await;

    // --- Phase 3: Write ---
    progress.phase("Writing enriched catalog");
    write_catalog(&config.output, &outcome.records)?;

    let summary = RunSummary {
        output: config.output.clone(),
        report: outcome.report,
        elapsed: start.elapsed(),
    };

    info!(
        output = %summary.output.display(),
        records = summary.report.records_out,
        dois = summary.report.dois_found(),
        duration_ms = summary.elapsed.as_millis(),
        "run complete"
    );

    progress.done(&summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pubtrace_fetch::HttpFetcher;
    use pubtrace_shared::{HttpConfig, PubtraceError};
    use serde_json::Value;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("pubtrace-pipeline-test-{}", Uuid::now_v7()))
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&HttpConfig {
            timeout_secs: 5,
            ..HttpConfig::default()
        })
        .unwrap()
    }

    async fn mount(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    /// Seed with one record per outcome: DOI from URL, DOI from page,
    /// no docs, and an unreachable docs page.
    async fn catalog_server() -> MockServer {
        let server = MockServer::start().await;
        let base = server.uri();

        let seed = serde_json::json!([
            {"title": "Forest Loss", "docs": format!("{base}/docs/forest"), "tags": ["forest"]},
            {"title": "Soil Moisture", "docs": format!("{base}/docs/soil")},
            {"title": "Undocumented"},
            {"title": "Gone", "docs": format!("{base}/docs/gone")},
        ]);
        mount(&server, "/seed.json", seed.to_string()).await;
        mount(
            &server,
            "/docs/forest",
            "<p>Publication URL: https://doi.org/10.1126/science.1244693</p>".to_string(),
        )
        .await;
        mount(
            &server,
            "/docs/soil",
            format!("<p>Publication URL: {base}/papers/soil</p>"),
        )
        .await;
        mount(
            &server,
            "/papers/soil",
            "<div>Cite as DOI: 10.5194/essd-12-1-2020</div>".to_string(),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/docs/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        server
    }

    fn run_config(seed: String, output: PathBuf) -> RunConfig {
        RunConfig {
            seed,
            output,
            enrich: EnrichConfig::default(),
        }
    }

    #[tokio::test]
    async fn run_enriches_and_writes_catalog() {
        let server = catalog_server().await;
        let tmp = temp_dir();
        let config = run_config(format!("{}/seed.json", server.uri()), tmp.join("out.json"));

        let summary = run(&config, fetcher(), &SilentProgress).await.unwrap();

        assert_eq!(summary.report.records_out, 4);
        assert_eq!(summary.report.dois_from_url, 1);
        assert_eq!(summary.report.dois_from_page, 1);
        assert_eq!(summary.report.without_docs, 1);
        assert_eq!(summary.report.fetch_failures, 1);

        let written = std::fs::read_to_string(&config.output).unwrap();
        assert!(written.ends_with("]\n"));
        let records: Vec<Value> = serde_json::from_str(&written).unwrap();
        assert_eq!(records[0]["doi"], "10.1126/science.1244693");
        assert_eq!(records[0]["tags"], serde_json::json!(["forest"]));
        assert_eq!(records[1]["publication_url"], format!("{}/papers/soil", server.uri()));
        assert_eq!(records[1]["doi"], "10.5194/essd-12-1-2020");
        assert_eq!(records[2]["publication_url"], Value::Null);
        assert_eq!(records[2]["doi"], Value::Null);
        assert_eq!(records[3]["publication_url"], Value::Null);

        let keys: Vec<&str> = records[0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["title", "docs", "tags", "publication_url", "doi"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn repeated_runs_are_byte_identical() {
        let server = catalog_server().await;
        let tmp = temp_dir();
        let seed = format!("{}/seed.json", server.uri());

        run(&run_config(seed.clone(), tmp.join("a.json")), fetcher(), &SilentProgress)
            .await
            .unwrap();
        run(&run_config(seed, tmp.join("b.json")), fetcher(), &SilentProgress)
            .await
            .unwrap();

        let a = std::fs::read(tmp.join("a.json")).unwrap();
        let b = std::fs::read(tmp.join("b.json")).unwrap();
        assert_eq!(a, b);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn bad_seed_aborts_without_output() {
        let server = MockServer::start().await;
        mount(&server, "/seed.json", r#"{"not": "an array"}"#.to_string()).await;
        let tmp = temp_dir();
        let config = run_config(format!("{}/seed.json", server.uri()), tmp.join("out.json"));

        let err = run(&config, fetcher(), &SilentProgress).await.unwrap_err();

        assert!(matches!(err, PubtraceError::Catalog { .. }));
        assert!(!config.output.exists());
    }

    #[tokio::test]
    async fn unreachable_seed_aborts_without_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/seed.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let tmp = temp_dir();
        let config = run_config(format!("{}/seed.json", server.uri()), tmp.join("out.json"));

        let err = run(&config, fetcher(), &SilentProgress).await.unwrap_err();

        assert!(matches!(err, PubtraceError::Network(_)));
        assert!(!config.output.exists());
    }

    #[tokio::test]
    async fn empty_seed_writes_empty_array() {
        let tmp = temp_dir();
        std::fs::create_dir_all(&tmp).unwrap();
        let seed_path = tmp.join("seed.json");
        std::fs::write(&seed_path, "[]").unwrap();
        let config = run_config(seed_path.display().to_string(), tmp.join("out.json"));

        let summary = run(&config, fetcher(), &SilentProgress).await.unwrap();

        assert_eq!(summary.report.records_out, 0);
        assert_eq!(std::fs::read_to_string(&config.output).unwrap(), "[]\n");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase:{name}"));
        }
        fn record_done(&self, current: usize, total: usize) {
            self.events.lock().unwrap().push(format!("record:{current}/{total}"));
        }
        fn done(&self, summary: &RunSummary) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{}", summary.report.records_out));
        }
    }

    #[tokio::test]
    async fn progress_sees_every_phase_and_record() {
        let tmp = temp_dir();
        std::fs::create_dir_all(&tmp).unwrap();
        let seed_path = tmp.join("seed.json");
        std::fs::write(&seed_path, r#"[{"title": "A"}, 7, {"title": "B"}]"#).unwrap();
        let config = run_config(seed_path.display().to_string(), tmp.join("out.json"));
        let progress = RecordingProgress::default();

        run(&config, fetcher(), &progress).await.unwrap();

        let events = progress.events.lock().unwrap().clone();
        assert_eq!(
            events,
            [
                "phase:Loading seed catalog",
                "phase:Enriching records",
                "record:1/3",
                "record:2/3",
                "record:3/3",
                "phase:Writing enriched catalog",
                "done:2",
            ]
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
