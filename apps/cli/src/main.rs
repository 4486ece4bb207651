//! pubtrace CLI: link catalog datasets to the publications that describe them.
//!
//! Reads a seed catalog of dataset records, follows each record's
//! documentation page to its publication, and writes the catalog back out
//! with `publication_url` and `doi` fields attached.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
