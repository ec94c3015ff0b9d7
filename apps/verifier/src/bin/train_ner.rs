//! Fine-tunes the skill tagger on an annotated dataset and writes a model
//! directory the service can load.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use verifier::ner::dataset::{load_examples, DEFAULT_SPLIT_SEED};
use verifier::ner::train::{
    train_model, TrainingConfig, DEFAULT_DROPOUT, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Annotated training data (`text`, `entities` columns)
    #[arg(short, long, default_value = "data/train_data.csv")]
    train_csv: PathBuf,

    /// Pretrained BERT directory (config.json, tokenizer.json, optional model.safetensors)
    #[arg(short, long)]
    base_model: PathBuf,

    /// Where the trained model is written
    #[arg(short, long, default_value = "./skill_ner_model")]
    output_dir: PathBuf,

    /// Passes over the training data
    #[arg(short, long, default_value_t = DEFAULT_EPOCHS)]
    epochs: usize,

    /// Dropout on the encoder output
    #[arg(short, long, default_value_t = DEFAULT_DROPOUT)]
    dropout: f32,

    /// AdamW learning rate
    #[arg(short, long, default_value_t = DEFAULT_LEARNING_RATE)]
    learning_rate: f64,

    /// Shuffle seed
    #[arg(short, long, default_value_t = DEFAULT_SPLIT_SEED)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let examples = load_examples(&cli.train_csv)?;
    info!("Loaded {} training examples", examples.len());

    let settings = TrainingConfig {
        epochs: cli.epochs,
        dropout: cli.dropout,
        learning_rate: cli.learning_rate,
        seed: cli.seed,
    };
    let losses = train_model(&cli.base_model, &cli.output_dir, &examples, &settings)
        .context("Training failed")?;

    if let Some(last) = losses.last() {
        println!("Final loss: {last:.4}");
    }
    println!("Model saved to {}", cli.output_dir.display());
    Ok(())
}
