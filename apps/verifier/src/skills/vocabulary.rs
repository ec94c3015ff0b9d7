//! Skill vocabulary: the fixed set of skill names the dictionary matcher looks for.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::skills::extract::normalize_text;

/// Built-in vocabulary used when `SKILLS_PATH` is not configured.
/// Language names mirror GitHub's linguist spelling so they can be matched against repositories.
const DEFAULT_SKILLS: &[&str] = &[
    // Languages
    "python", "java", "javascript", "typescript", "c", "c++", "c#", "go", "rust", "ruby",
    "php", "swift", "kotlin", "scala", "r", "matlab", "perl", "haskell", "elixir", "erlang",
    "clojure", "dart", "lua", "julia", "objective-c", "shell", "powershell", "bash", "sql",
    "html", "css", "scss", "vue", "svelte", "jupyter notebook", "dockerfile", "makefile",
    "hcl", "solidity", "assembly", "fortran", "cobol", "groovy", "f#", "ocaml", "zig",
    // Frameworks and libraries
    "react", "angular", "django", "flask", "fastapi", "spring", "spring boot", "express",
    "node.js", "next.js", "rails", "laravel", ".net", "tensorflow", "pytorch", "keras",
    "scikit-learn", "pandas", "numpy", "spark", "hadoop", "kafka", "graphql", "tokio",
    // Tools and platforms
    "docker", "kubernetes", "terraform", "ansible", "jenkins", "git", "linux", "aws",
    "azure", "gcp", "postgresql", "mysql", "mongodb", "redis", "elasticsearch", "nginx",
    "rabbitmq", "sqlite", "firebase", "grafana", "prometheus",
    // Practices
    "machine learning", "deep learning", "nlp", "computer vision", "data science",
    "microservices", "rest", "ci/cd", "devops", "agile", "scrum",
];

/// Immutable, lowercase set of known skills. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    skills: HashSet<String>,
}

impl SkillVocabulary {
    /// Builds a vocabulary from arbitrary entries. Entries go through the same
    /// normalization as résumé text; blanks are dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let skills = entries
            .into_iter()
            .map(|s| normalize_text(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();
        Self { skills }
    }

    pub fn builtin() -> Self {
        Self::new(DEFAULT_SKILLS.iter())
    }

    /// Loads one skill per line. Blank lines and lines starting with `#` are ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read skill vocabulary '{}'", path.display()))?;
        let vocabulary = Self::new(
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        );
        if vocabulary.is_empty() {
            anyhow::bail!("Skill vocabulary '{}' contains no entries", path.display());
        }
        Ok(vocabulary)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(String::as_str)
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.skills.contains(skill)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
