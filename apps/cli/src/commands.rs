//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use pubtrace_core::{ProgressReporter, RunConfig, RunSummary};
use pubtrace_extract::{Lookup, locate_publication, resolve_doi};
use pubtrace_fetch::HttpFetcher;
use pubtrace_shared::{AppConfig, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pubtrace: link catalog datasets to their publications and DOIs.
#[derive(Parser)]
#[command(
    name = "pubtrace",
    version,
    about = "Enrich a dataset catalog with publication URLs and DOIs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich the seed catalog and write the result.
    Run {
        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Find the publication URL on a single documentation page.
    Locate {
        /// Documentation page URL.
        doc_url: String,

        /// Config file (defaults to ~/.pubtrace/pubtrace.toml).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve the DOI for a single publication URL.
    Doi {
        /// Publication URL.
        publication_url: String,

        /// Config file (defaults to ~/.pubtrace/pubtrace.toml).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags that override config file values for `run`.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct RunOverrides {
    /// Config file (defaults to ~/.pubtrace/pubtrace.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed catalog URL or path.
    #[arg(long)]
    pub seed: Option<String>,

    /// Output path for the enriched catalog.
    #[arg(short, long)]
    pub out: Option<String>,

    /// Records processed concurrently.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl RunOverrides {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(seed) = &self.seed {
            config.catalog.seed = seed.clone();
        }
        if let Some(out) = &self.out {
            config.catalog.output = out.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.enrich.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.http.timeout_secs = timeout;
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show {
        /// Config file (defaults to ~/.pubtrace/pubtrace.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pubtrace=info",
        1 => "pubtrace=debug",
        _ => "pubtrace=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run { overrides } => cmd_run(&overrides).await,
        Command::Locate {
            doc_url,
            config,
            json,
        } => cmd_locate(&doc_url, config.as_deref(), json).await,
        Command::Doi {
            publication_url,
            config,
            json,
        } => cmd_doi(&publication_url, config.as_deref(), json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()).await,
        },
    }
}

/// Load and validate config from `path`, or the default location.
fn resolve_config(path: Option<&Path>, overrides: Option<&RunOverrides>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(overrides) = overrides {
        overrides.apply(&mut config);
    }
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(overrides: &RunOverrides) -> Result<()> {
    let config = resolve_config(overrides.config.as_deref(), Some(overrides))?;
    let fetcher = HttpFetcher::new(&config.http)?;
    let run_config = RunConfig::from(&config);

    info!(
        seed = %run_config.seed,
        output = %run_config.output.display(),
        concurrency = run_config.enrich.concurrency,
        "enriching catalog"
    );

    let reporter = CliProgress::new();
    let summary = pubtrace_core::run(&run_config, fetcher, &reporter).await?;
    let report = &summary.report;

    println!();
    println!("  Catalog enriched successfully!");
    println!("  Records:      {}", report.records_out);
    if report.skipped_not_object > 0 {
        println!("  Skipped:      {}", report.skipped_not_object);
    }
    println!("  No docs:      {}", report.without_docs);
    println!("  Publications: {}", report.publications_found);
    println!(
        "  DOIs:         {} ({} from URL, {} from page)",
        report.dois_found(),
        report.dois_from_url,
        report.dois_from_page
    );
    println!("  Fetch errors: {}", report.fetch_failures);
    println!("  Output:       {}", summary.output.display());
    println!("  Time:         {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_locate(doc_url: &str, config: Option<&Path>, json: bool) -> Result<()> {
    let config = resolve_config(config, None)?;
    let fetcher = HttpFetcher::new(&config.http)?;

    let lookup = locate_publication(&fetcher, doc_url).await;

    if json {
        let value = serde_json::json!({
            "doc_url": doc_url,
            "publication_url": lookup.clone().found(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    }

    match lookup {
        Lookup::Found(url) => {
            if !json {
                println!("{url}");
            }
            Ok(())
        }
        Lookup::NotFound => {
            if !json {
                println!("no publication URL found on {doc_url}");
            }
            Ok(())
        }
        Lookup::FetchFailed(reason) => Err(eyre!("could not fetch {doc_url}: {reason}")),
    }
}

async fn cmd_doi(publication_url: &str, config: Option<&Path>, json: bool) -> Result<()> {
    let config = resolve_config(config, None)?;
    let fetcher = HttpFetcher::new(&config.http)?;

    let lookup = resolve_doi(&fetcher, Some(publication_url)).await;

    if json {
        let found = lookup.clone().found();
        let value = serde_json::json!({
            "publication_url": publication_url,
            "doi": found.as_ref().map(|doi| doi.value.as_str()),
            "source": found.as_ref().map(|doi| doi.source.as_str()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    }

    match lookup {
        Lookup::Found(doi) => {
            if !json {
                println!("{doi} (from {})", doi.source.as_str());
            }
            Ok(())
        }
        Lookup::NotFound => {
            if !json {
                println!("no DOI found for {publication_url}");
            }
            Ok(())
        }
        Lookup::FetchFailed(reason) => {
            Err(eyre!("could not fetch {publication_url}: {reason}"))
        }
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn record_done(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Enriching records [{current}/{total}]"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
