//! BERT token-classification backend for [`SkillTagger`].
//!
//! Loads a model directory exported in the Hugging Face layout:
//! - `config.json`: BERT config plus `id2label`
//! - `tokenizer.json`: WordPiece tokenizer
//! - `model.safetensors`: `bert.*` encoder weights and a `classifier` head
//!
//! Text longer than the position-embedding limit is tagged in consecutive
//! windows; each window is wrapped in `[CLS] … [SEP]`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::ner::{EntitySpan, SkillTagger};

/// Hard upper bound on a window, whatever the config claims.
const MAX_WINDOW_TOKENS: usize = 512;

/// The label table of `config.json`; everything else comes from `BertConfig`.
#[derive(Debug, Deserialize)]
struct HeadConfig {
    id2label: HashMap<String, String>,
}

/// A decoded BIO tag.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Tag {
    Outside,
    Begin(String),
    Inside(String),
}

impl Tag {
    /// Accepts BIO/BILOU prefixes; bare labels (IO scheme) are treated as `Inside`.
    fn parse(label: &str) -> Self {
        if label == "O" {
            return Tag::Outside;
        }
        match label.split_once('-') {
            Some(("B" | "S" | "U", entity)) => Tag::Begin(entity.to_string()),
            Some(("I" | "E" | "L", entity)) => Tag::Inside(entity.to_string()),
            _ => Tag::Inside(label.to_string()),
        }
    }
}

/// Usable tokens per window once `[CLS]` and `[SEP]` are added.
pub(crate) fn window_len(max_position_embeddings: usize) -> Result<usize> {
    if max_position_embeddings <= 2 {
        bail!("max_position_embeddings must exceed 2, got {max_position_embeddings}");
    }
    Ok(max_position_embeddings.min(MAX_WINDOW_TOKENS) - 2)
}

/// Reads and parses `config.json` from a model directory.
pub(crate) fn read_config(dir: &Path) -> Result<(String, BertConfig)> {
    let config_path = dir.join("config.json");
    let raw = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read NER config '{}'", config_path.display()))?;
    let config: BertConfig =
        serde_json::from_str(&raw).context("NER config.json is not a BERT config")?;
    Ok((raw, config))
}

/// WordPiece tokenizer with truncation and padding disabled.
pub(crate) struct WindowTokenizer {
    pub(crate) inner: Tokenizer,
    cls_id: u32,
    sep_id: u32,
}

impl WindowTokenizer {
    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let mut inner = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Failed to load NER tokenizer '{}': {e}", path.display()))?;
        inner
            .with_truncation(None)
            .map_err(|e| anyhow!("Failed to disable tokenizer truncation: {e}"))?;
        inner.with_padding(None);
        let cls_id = inner
            .token_to_id("[CLS]")
            .context("NER tokenizer has no [CLS] token")?;
        let sep_id = inner
            .token_to_id("[SEP]")
            .context("NER tokenizer has no [SEP] token")?;
        Ok(Self {
            inner,
            cls_id,
            sep_id,
        })
    }

    /// `[CLS] chunk [SEP]`
    pub(crate) fn wrap(&self, chunk: &[u32]) -> Vec<u32> {
        let mut input = Vec::with_capacity(chunk.len() + 2);
        input.push(self.cls_id);
        input.extend_from_slice(chunk);
        input.push(self.sep_id);
        input
    }
}

/// BERT encoder plus a linear token-classification head, stored as
/// `bert.*` and `classifier.*`.
pub(crate) struct TokenClassifier {
    encoder: BertModel,
    classifier: Linear,
}

impl TokenClassifier {
    pub(crate) fn load(vb: VarBuilder, config: &BertConfig, num_labels: usize) -> Result<Self> {
        let encoder = BertModel::load(vb.pp("bert"), config)
            .context("Failed to load BERT encoder weights")?;
        let classifier = candle_nn::linear(config.hidden_size, num_labels, vb.pp("classifier"))
            .context("Failed to load token classification head")?;
        Ok(Self {
            encoder,
            classifier,
        })
    }

    /// Logits of shape `(tokens, labels)` for one wrapped window.
    /// `dropout` applies to the encoder output and is 0 at inference.
    pub(crate) fn logits(&self, input: &[u32], device: &Device, dropout: f32) -> Result<Tensor> {
        let input_ids = Tensor::new(input, device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = input_ids.ones_like()?;

        let mut hidden = self
            .encoder
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        if dropout > 0.0 {
            hidden = candle_nn::ops::dropout(&hidden, dropout)?;
        }
        Ok(self.classifier.forward(&hidden)?.squeeze(0)?)
    }
}

pub struct BertSkillTagger {
    network: TokenClassifier,
    tokenizer: WindowTokenizer,
    tags: Vec<Tag>,
    window: usize,
    device: Device,
}

impl BertSkillTagger {
    /// Loads the model directory. Any failure here is fatal for the service.
    pub fn load(dir: &Path) -> Result<Self> {
        let (raw_config, bert_config) = read_config(dir)?;
        let head: HeadConfig = serde_json::from_str(&raw_config)
            .context("NER config.json has no id2label table")?;
        let tags = tag_table(&head.id2label)?;
        let window = window_len(bert_config.max_position_embeddings)?;

        let tokenizer = WindowTokenizer::from_file(&dir.join("tokenizer.json"))?;

        let device = Device::Cpu;
        let weights_path = dir.join("model.safetensors");
        if !weights_path.exists() {
            bail!("NER weights '{}' not found", weights_path.display());
        }
        // SAFETY: the weights file is opened read-only and not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        let network = TokenClassifier::load(vb, &bert_config, tags.len())?;

        info!(
            "NER model loaded from {} ({} labels, {} token window)",
            dir.display(),
            tags.len(),
            window
        );

        Ok(Self {
            network,
            tokenizer,
            tags,
            window,
            device,
        })
    }

    /// Predicted class id for each token of `chunk`.
    fn classify_window(&self, chunk: &[u32]) -> Result<Vec<usize>> {
        let input = self.tokenizer.wrap(chunk);
        let logits = self.network.logits(&input, &self.device, 0.0)?;
        let predictions = logits.argmax(D::Minus1)?.to_vec1::<u32>()?;

        Ok(predictions[1..predictions.len() - 1]
            .iter()
            .map(|&p| p as usize)
            .collect())
    }
}

impl SkillTagger for BertSkillTagger {
    fn tag(&self, text: &str) -> Result<Vec<EntitySpan>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let encoding = self
            .tokenizer
            .inner
            .encode_char_offsets(text, false)
            .map_err(|e| anyhow!("Tokenization failed: {e}"))?;
        let ids = encoding.get_ids();

        let mut classes = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(self.window) {
            classes.extend(self.classify_window(chunk)?);
        }

        let tokens: Vec<TokenPrediction> = encoding
            .get_offsets()
            .iter()
            .zip(encoding.get_word_ids())
            .zip(classes)
            .map(|((&offsets, &word), class)| TokenPrediction {
                offsets,
                word,
                class,
            })
            .collect();

        let spans = decode_spans(text, &tokens, &self.tags);
        debug!("Tagged {} tokens into {} spans", tokens.len(), spans.len());
        Ok(spans)
    }
}

struct TokenPrediction {
    offsets: (usize, usize),
    word: Option<u32>,
    class: usize,
}

/// Builds the class-id → tag table. Ids must be dense from 0.
fn tag_table(id2label: &HashMap<String, String>) -> Result<Vec<Tag>> {
    if id2label.is_empty() {
        bail!("NER config has an empty id2label table");
    }
    let mut tags = vec![None; id2label.len()];
    for (id, label) in id2label {
        let index: usize = id
            .parse()
            .with_context(|| format!("id2label key '{id}' is not an integer"))?;
        let slot = tags
            .get_mut(index)
            .with_context(|| format!("id2label id {index} is out of range"))?;
        *slot = Some(Tag::parse(label));
    }
    tags.into_iter()
        .enumerate()
        .map(|(i, t)| t.with_context(|| format!("id2label has no entry for id {i}")))
        .collect()
}

struct OpenSpan {
    entity: String,
    start: usize,
    end: usize,
    word: Option<u32>,
}

/// Merges per-token tags into character spans.
/// Word pieces continuing the word that closed the open span always extend it.
fn decode_spans(text: &str, tokens: &[TokenPrediction], tags: &[Tag]) -> Vec<EntitySpan> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut open: Option<OpenSpan> = None;

    let close = |open: &mut Option<OpenSpan>, spans: &mut Vec<EntitySpan>| {
        if let Some(span) = open.take() {
            let end = span.end.min(chars.len());
            let start = span.start.min(end);
            spans.push(EntitySpan {
                start,
                end,
                label: span.entity,
                text: chars[start..end].iter().collect(),
            });
        }
    };

    for token in tokens {
        let (start, end) = token.offsets;
        if start == end {
            continue;
        }

        if let Some(current) = open.as_mut() {
            if token.word.is_some() && token.word == current.word {
                current.end = current.end.max(end);
                continue;
            }
        }

        match tags.get(token.class) {
            None | Some(Tag::Outside) => close(&mut open, &mut spans),
            Some(Tag::Inside(entity))
                if open.as_ref().is_some_and(|current| &current.entity == entity) =>
            {
                if let Some(current) = open.as_mut() {
                    current.end = end;
                    current.word = token.word;
                }
            }
            Some(Tag::Begin(entity) | Tag::Inside(entity)) => {
                close(&mut open, &mut spans);
                open = Some(OpenSpan {
                    entity: entity.clone(),
                    start,
                    end,
                    word: token.word,
                });
            }
        }
    }
    close(&mut open, &mut spans);

    spans
}
