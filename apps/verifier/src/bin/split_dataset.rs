//! Holds out a reproducible 20% sample of an annotated NER dataset as a test split.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use verifier::ner::dataset::{sample_test_indices, DEFAULT_SPLIT_SEED};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Annotated dataset (`text`, `entities` columns)
    #[arg(short, long, default_value = "data/skill_ner_dataset.csv")]
    input: PathBuf,

    /// Where the held-out rows are written
    #[arg(short, long, default_value = "data/test_skill_ner.csv")]
    output: PathBuf,

    /// Sampling seed
    #[arg(short, long, default_value_t = DEFAULT_SPLIT_SEED)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut reader = csv::Reader::from_path(&cli.input)
        .with_context(|| format!("Failed to open dataset '{}'", cli.input.display()))?;
    let headers = reader.headers()?.clone();
    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read dataset rows")?;

    let indices = sample_test_indices(records.len(), cli.seed);

    let mut writer = csv::Writer::from_path(&cli.output)
        .with_context(|| format!("Failed to create '{}'", cli.output.display()))?;
    writer.write_record(&headers)?;
    for index in &indices {
        writer.write_record(&records[*index])?;
    }
    writer.flush()?;

    info!(
        "Wrote {} of {} rows to {}",
        indices.len(),
        records.len(),
        cli.output.display()
    );
    Ok(())
}
