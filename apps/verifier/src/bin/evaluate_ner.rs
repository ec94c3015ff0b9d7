//! Exact-span accuracy of the NER model over a held-out split.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use verifier::ner::bert::BertSkillTagger;
use verifier::ner::dataset::{evaluate, load_examples};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding config.json, tokenizer.json and model.safetensors
    #[arg(short, long, default_value = "./skill_ner_model")]
    model_dir: PathBuf,

    /// Held-out split produced by split_dataset
    #[arg(short, long, default_value = "data/test_skill_ner.csv")]
    test_csv: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let tagger = BertSkillTagger::load(&cli.model_dir)?;
    let examples = load_examples(&cli.test_csv)?;
    info!("Evaluating {} examples", examples.len());

    let summary = evaluate(&tagger, &examples)?;
    info!("{} of {} predictions matched exactly", summary.correct, summary.total);
    println!("Accuracy: {:.2}", summary.accuracy());
    Ok(())
}
