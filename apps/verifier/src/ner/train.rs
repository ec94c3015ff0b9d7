//! Fine-tuning for the skill tagger.
//!
//! Annotated character spans are aligned with the tokenizer's char offsets as
//! BIO class ids, then the BERT encoder and the `classifier` head are trained
//! with AdamW. The output directory has the layout [`BertSkillTagger::load`]
//! reads.
//!
//! [`BertSkillTagger::load`]: crate::ner::bert::BertSkillTagger::load

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use candle_transformers::models::bert::Config as BertConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::ner::bert::{read_config, window_len, TokenClassifier, WindowTokenizer};
use crate::ner::dataset::{AnnotatedExample, Annotation};

pub const DEFAULT_EPOCHS: usize = 30;
pub const DEFAULT_DROPOUT: f32 = 0.3;
pub const DEFAULT_LEARNING_RATE: f64 = 5e-5;

const OUTSIDE: &str = "O";

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub epochs: usize,
    /// Dropout on the encoder output during training.
    pub dropout: f32,
    pub learning_rate: f64,
    /// Seeds the per-epoch shuffle.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            dropout: DEFAULT_DROPOUT,
            learning_rate: DEFAULT_LEARNING_RATE,
            seed: 42,
        }
    }
}

/// Class table: `O`, then a `B-`/`I-` pair per entity label in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn from_examples(examples: &[AnnotatedExample]) -> Self {
        let entities: BTreeSet<&str> = examples
            .iter()
            .flat_map(|example| example.entities.iter().map(|(_, _, label)| label.as_str()))
            .collect();

        let mut labels = vec![OUTSIDE.to_string()];
        for entity in entities {
            labels.push(format!("B-{entity}"));
            labels.push(format!("I-{entity}"));
        }
        Self { labels }
    }

    pub fn class_count(&self) -> usize {
        self.labels.len()
    }

    /// True when no entity label was seen, only `O`.
    pub fn has_no_entities(&self) -> bool {
        self.labels.len() == 1
    }

    fn id(&self, tag: &str) -> Option<u32> {
        self.labels.iter().position(|l| l == tag).map(|i| i as u32)
    }

    pub fn id2label(&self) -> Map<String, Value> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| (i.to_string(), Value::from(label.as_str())))
            .collect()
    }

    pub fn label2id(&self) -> Map<String, Value> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), Value::from(i)))
            .collect()
    }
}

/// Class id per token. A token overlapping an annotated span is `B-` when it
/// is the first token of that span and `I-` otherwise. Zero-width tokens get
/// `None` and stay out of the loss.
pub fn align_bio(
    offsets: &[(usize, usize)],
    entities: &[Annotation],
    labels: &LabelSet,
) -> Result<Vec<Option<u32>>> {
    let mut aligned = Vec::with_capacity(offsets.len());
    let mut previous: Option<usize> = None;

    for &(start, end) in offsets {
        if start == end {
            aligned.push(None);
            continue;
        }

        let tag = match entities
            .iter()
            .position(|(span_start, span_end, _)| start < *span_end && end > *span_start)
        {
            Some(index) => {
                let prefix = if previous == Some(index) { "I" } else { "B" };
                previous = Some(index);
                format!("{prefix}-{}", entities[index].2)
            }
            None => {
                previous = None;
                OUTSIDE.to_string()
            }
        };
        let id = labels
            .id(&tag)
            .with_context(|| format!("tag '{tag}' is not in the label set"))?;
        aligned.push(Some(id));
    }

    Ok(aligned)
}

/// One window: `[CLS] … [SEP]` ids and a target per position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSample {
    pub input: Vec<u32>,
    pub targets: Vec<Option<u32>>,
}

/// Tokenizes every example and cuts it into windows the model can take.
pub(crate) fn build_samples(
    tokenizer: &WindowTokenizer,
    window: usize,
    examples: &[AnnotatedExample],
    labels: &LabelSet,
) -> Result<Vec<TrainingSample>> {
    let mut samples = Vec::new();

    for (row, example) in examples.iter().enumerate() {
        let encoding = tokenizer
            .inner
            .encode_char_offsets(example.text.as_str(), false)
            .map_err(|e| anyhow!("Tokenization failed for row {}: {e}", row + 1))?;
        let targets = align_bio(encoding.get_offsets(), &example.entities, labels)
            .with_context(|| format!("Cannot align entities of row {}", row + 1))?;

        for (ids, tags) in encoding.get_ids().chunks(window).zip(targets.chunks(window)) {
            if tags.iter().all(Option::is_none) {
                continue;
            }
            let mut padded = Vec::with_capacity(tags.len() + 2);
            padded.push(None);
            padded.extend_from_slice(tags);
            padded.push(None);
            samples.push(TrainingSample {
                input: tokenizer.wrap(ids),
                targets: padded,
            });
        }
    }

    Ok(samples)
}

/// Mean cross-entropy over the labeled positions of one sample.
fn sample_loss(
    network: &TokenClassifier,
    sample: &TrainingSample,
    device: &Device,
    dropout: f32,
) -> Result<Option<Tensor>> {
    let (positions, targets): (Vec<u32>, Vec<u32>) = sample
        .targets
        .iter()
        .enumerate()
        .filter_map(|(i, target)| target.map(|t| (i as u32, t)))
        .unzip();
    if positions.is_empty() {
        return Ok(None);
    }

    let logits = network.logits(&sample.input, device, dropout)?;
    let positions = Tensor::new(positions.as_slice(), device)?;
    let targets = Tensor::new(targets.as_slice(), device)?;
    let selected = logits.index_select(&positions, 0)?;
    Ok(Some(candle_nn::loss::cross_entropy(&selected, &targets)?))
}

/// Names a variable may carry in a pretrained checkpoint: with or without the
/// `bert.` prefix, and with the legacy `gamma`/`beta` LayerNorm names.
fn checkpoint_names(name: &str) -> Vec<String> {
    let mut names = vec![name.to_string()];
    if let Some(bare) = name.strip_prefix("bert.") {
        names.push(bare.to_string());
    }
    let legacy: Vec<String> = names
        .iter()
        .filter_map(|n| {
            n.strip_suffix("LayerNorm.weight")
                .map(|prefix| format!("{prefix}LayerNorm.gamma"))
                .or_else(|| {
                    n.strip_suffix("LayerNorm.bias")
                        .map(|prefix| format!("{prefix}LayerNorm.beta"))
                })
        })
        .collect();
    names.extend(legacy);
    names
}

/// Encoder and classification head backed by a `VarMap`.
pub struct SkillTaggerTrainer {
    varmap: VarMap,
    network: TokenClassifier,
    device: Device,
}

impl SkillTaggerTrainer {
    pub fn new(config: &BertConfig, labels: &LabelSet, device: Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let network = TokenClassifier::load(vb, config, labels.class_count())?;
        Ok(Self {
            varmap,
            network,
            device,
        })
    }

    /// Copies pretrained weights into every variable with a matching name and
    /// shape. Returns the number of tensors copied.
    pub fn load_pretrained(&self, weights: &Path) -> Result<usize> {
        let tensors = candle_core::safetensors::load(weights, &self.device)
            .with_context(|| format!("Failed to read pretrained weights '{}'", weights.display()))?;
        let vars = self
            .varmap
            .data()
            .lock()
            .map_err(|_| anyhow!("variable map lock poisoned"))?;

        let mut copied = 0;
        for (name, var) in vars.iter() {
            let Some(tensor) = checkpoint_names(name)
                .iter()
                .find_map(|candidate| tensors.get(candidate))
            else {
                continue;
            };
            if tensor.shape() != var.shape() {
                warn!(
                    "Skipping pretrained '{name}': shape {:?} != {:?}",
                    tensor.shape(),
                    var.shape()
                );
                continue;
            }
            var.set(&tensor.to_dtype(DType::F32)?)?;
            copied += 1;
        }
        Ok(copied)
    }

    /// Runs `settings.epochs` passes over `samples` in shuffled order.
    /// Returns the mean loss of each epoch.
    pub fn fine_tune(&self, samples: &[TrainingSample], settings: &TrainingConfig) -> Result<Vec<f32>> {
        if samples.is_empty() {
            bail!("No training samples");
        }

        let params = ParamsAdamW {
            lr: settings.learning_rate,
            ..Default::default()
        };
        let mut optimizer = AdamW::new(self.varmap.all_vars(), params)?;
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut epoch_losses = Vec::with_capacity(settings.epochs);

        for epoch in 0..settings.epochs {
            order.shuffle(&mut rng);
            let mut total = 0.0f32;
            let mut steps = 0usize;
            for &index in &order {
                let Some(loss) =
                    sample_loss(&self.network, &samples[index], &self.device, settings.dropout)?
                else {
                    continue;
                };
                optimizer.backward_step(&loss)?;
                total += loss.to_scalar::<f32>()?;
                steps += 1;
            }
            let mean = if steps == 0 { 0.0 } else { total / steps as f32 };
            info!("Epoch {epoch}: loss {mean:.4}");
            epoch_losses.push(mean);
        }

        Ok(epoch_losses)
    }

    pub fn save_weights(&self, path: &Path) -> Result<()> {
        self.varmap
            .save(path)
            .with_context(|| format!("Failed to write weights '{}'", path.display()))
    }
}

/// Base `config.json` with the label tables filled in.
pub fn labeled_config(raw: &str, labels: &LabelSet) -> Result<String> {
    let mut config: Value = serde_json::from_str(raw).context("config.json is not valid JSON")?;
    let object = config
        .as_object_mut()
        .context("config.json is not a JSON object")?;
    object.insert("id2label".to_string(), Value::Object(labels.id2label()));
    object.insert("label2id".to_string(), Value::Object(labels.label2id()));
    object.insert(
        "architectures".to_string(),
        json!(["BertForTokenClassification"]),
    );
    Ok(serde_json::to_string_pretty(&config)?)
}

/// Trains on `examples` starting from the model in `base_dir` and writes
/// `config.json`, `tokenizer.json` and `model.safetensors` to `output_dir`.
/// Without `model.safetensors` in `base_dir` the encoder starts from random weights.
pub fn train_model(
    base_dir: &Path,
    output_dir: &Path,
    examples: &[AnnotatedExample],
    settings: &TrainingConfig,
) -> Result<Vec<f32>> {
    let (raw_config, bert_config) = read_config(base_dir)?;
    let window = window_len(bert_config.max_position_embeddings)?;
    let tokenizer_path = base_dir.join("tokenizer.json");
    let tokenizer = WindowTokenizer::from_file(&tokenizer_path)?;

    let labels = LabelSet::from_examples(examples);
    if labels.has_no_entities() {
        bail!("Training data contains no annotated entities");
    }
    let samples = build_samples(&tokenizer, window, examples, &labels)?;
    info!(
        "Training on {} windows from {} examples ({} labels)",
        samples.len(),
        examples.len(),
        labels.class_count()
    );

    let trainer = SkillTaggerTrainer::new(&bert_config, &labels, Device::Cpu)?;
    let weights = base_dir.join("model.safetensors");
    if weights.exists() {
        let copied = trainer.load_pretrained(&weights)?;
        info!("Initialized {copied} tensors from {}", weights.display());
    } else {
        warn!(
            "No pretrained weights in {}; training from random initialization",
            base_dir.display()
        );
    }

    let losses = trainer.fine_tune(&samples, settings)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create '{}'", output_dir.display()))?;
    std::fs::write(
        output_dir.join("config.json"),
        labeled_config(&raw_config, &labels)?,
    )?;
    let tokenizer_out = output_dir.join("tokenizer.json");
    if std::fs::canonicalize(&tokenizer_path).ok() != std::fs::canonicalize(&tokenizer_out).ok() {
        std::fs::copy(&tokenizer_path, &tokenizer_out)
            .with_context(|| format!("Failed to copy tokenizer to '{}'", tokenizer_out.display()))?;
    }
    trainer.save_weights(&output_dir.join("model.safetensors"))?;

    Ok(losses)
}
