//! Annotated NER datasets: CSV files with a `text` column and an `entities`
//! column holding a literal list of `(start, end, 'LABEL')` tuples.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use serde::Deserialize;

use crate::ner::{EntitySpan, SkillTagger};

/// Fraction of rows held out for evaluation.
pub const TEST_FRACTION: f64 = 0.2;
/// Seed used for the held-out split unless overridden.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// `(start_char, end_char, label)` as annotated.
pub type Annotation = (usize, usize, String);

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedExample {
    pub text: String,
    pub entities: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
struct RawExample {
    text: String,
    entities: String,
}

fn tuple_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\(\s*(\d+)\s*,\s*(\d+)\s*,\s*['"]([^'"]*)['"]\s*\)"#)
            .expect("entity tuple pattern is valid")
    })
}

/// Parses `[(0, 6, 'SKILL'), (11, 17, 'SKILL')]`. Empty lists are allowed;
/// anything that is not a list of such tuples is rejected.
pub fn parse_entities(raw: &str) -> Result<Vec<Annotation>> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .with_context(|| format!("entities must be a list literal, got '{trimmed}'"))?;

    // Everything outside the tuples must be separators.
    let leftover = tuple_pattern().replace_all(inner, "");
    if !leftover.chars().all(|c| c == ',' || c.is_whitespace()) {
        bail!("entities list contains malformed tuples: '{trimmed}'");
    }

    let mut entities = Vec::new();
    for captures in tuple_pattern().captures_iter(inner) {
        entities.push((
            captures[1].parse::<usize>()?,
            captures[2].parse::<usize>()?,
            captures[3].to_string(),
        ));
    }

    Ok(entities)
}

/// Loads every row of an annotated CSV.
pub fn load_examples(path: &Path) -> Result<Vec<AnnotatedExample>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open dataset '{}'", path.display()))?;

    let mut examples = Vec::new();
    for (row, record) in reader.deserialize::<RawExample>().enumerate() {
        let raw = record.with_context(|| format!("Invalid dataset row {}", row + 1))?;
        let entities = parse_entities(&raw.entities)
            .with_context(|| format!("Invalid entities in dataset row {}", row + 1))?;
        examples.push(AnnotatedExample {
            text: raw.text,
            entities,
        });
    }
    Ok(examples)
}

/// Number of rows held out from `total`, rounded like a fractional sample.
pub fn held_out_count(total: usize) -> usize {
    (total as f64 * TEST_FRACTION).round() as usize
}

/// Indices of a reproducible random sample of `held_out_count(total)` rows, in sampled order.
pub fn sample_test_indices(total: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    rand::seq::index::sample(&mut rng, total, held_out_count(total)).into_vec()
}

/// Outcome of an exact-match evaluation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationSummary {
    pub correct: usize,
    pub total: usize,
}

impl EvaluationSummary {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// A prediction is correct only when every span (offsets and label) matches, in order.
pub fn spans_match(predicted: &[EntitySpan], expected: &[Annotation]) -> bool {
    predicted.len() == expected.len()
        && predicted
            .iter()
            .zip(expected)
            .all(|(p, (start, end, label))| p.start == *start && p.end == *end && &p.label == label)
}

pub fn evaluate(tagger: &dyn SkillTagger, examples: &[AnnotatedExample]) -> Result<EvaluationSummary> {
    let mut correct = 0;
    for example in examples {
        let predicted = tagger.tag(&example.text)?;
        if spans_match(&predicted, &example.entities) {
            correct += 1;
        }
    }
    Ok(EvaluationSummary {
        correct,
        total: examples.len(),
    })
}
