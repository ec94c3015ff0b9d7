//! Question bank: static interview questions loaded from CSV at startup.

use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of questions handed out per request.
pub const QUESTIONS_PER_REQUEST: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub technology: String,
    pub complexity_score: f64,
    pub question_text: String,
    pub expected_answer: String,
}

/// Difficulty tier mapped onto complexity-score ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Difficulty {
    /// complexity ≤ 3
    Easy,
    /// 3 < complexity < 7
    #[default]
    Medium,
    /// complexity ≥ 7
    Hard,
}

impl Difficulty {
    /// Unrecognized tiers fall back to `Medium`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            "medium" => Difficulty::Medium,
            other => {
                debug!("Unknown difficulty '{other}', using medium");
                Difficulty::Medium
            }
        }
    }

    pub fn admits(self, complexity: f64) -> bool {
        match self {
            Difficulty::Easy => complexity <= 3.0,
            Difficulty::Medium => complexity > 3.0 && complexity < 7.0,
            Difficulty::Hard => complexity >= 7.0,
        }
    }
}

/// Immutable question table, shared read-only across requests.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Loads the bank from a CSV with `technology`, `complexity_score`,
    /// `question_text` and `expected_answer` columns. Extra columns are ignored.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open question bank '{}'", path.display()))?;

        let mut questions = Vec::new();
        for (row, record) in reader.deserialize::<Question>().enumerate() {
            let question = record.with_context(|| {
                format!("Invalid question bank row {} in '{}'", row + 1, path.display())
            })?;
            questions.push(question);
        }
        if questions.is_empty() {
            bail!("Question bank '{}' contains no questions", path.display());
        }
        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions whose technology is in `technologies` (case-insensitive) and
    /// whose complexity falls in the difficulty range.
    pub fn filter(&self, technologies: &[String], difficulty: Difficulty) -> Vec<&Question> {
        let wanted: Vec<String> = technologies
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect();

        self.questions
            .iter()
            .filter(|q| wanted.contains(&q.technology.trim().to_lowercase()))
            .filter(|q| difficulty.admits(q.complexity_score))
            .collect()
    }

    /// Up to `QUESTIONS_PER_REQUEST` distinct questions drawn uniformly at random.
    pub fn select<R: Rng + ?Sized>(
        &self,
        technologies: &[String],
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Vec<Question> {
        let candidates = self.filter(technologies, difficulty);
        let amount = candidates.len().min(QUESTIONS_PER_REQUEST);
        rand::seq::index::sample(rng, candidates.len(), amount)
            .into_iter()
            .map(|i| candidates[i].clone())
            .collect()
    }

    /// First question whose text matches exactly.
    pub fn find_by_text(&self, question_text: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.question_text == question_text)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn question(technology: &str, complexity: f64, text: &str) -> Question {
        Question {
            technology: technology.to_string(),
            complexity_score: complexity,
            question_text: text.to_string(),
            expected_answer: format!("answer to {text}"),
        }
    }

    fn bank() -> QuestionBank {
        QuestionBank::new(vec![
            question("Python", 2.0, "py-easy"),
            question("Python", 3.0, "py-boundary-easy"),
            question("Python", 4.0, "py-medium"),
            question("Python", 6.5, "py-medium-2"),
            question("Python", 7.0, "py-hard"),
            question("Rust", 5.0, "rs-medium"),
            question("Go", 9.0, "go-hard"),
        ])
    }

    fn texts(questions: &[&Question]) -> Vec<String> {
        questions.iter().map(|q| q.question_text.clone()).collect()
    }

    fn techs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_difficulty_boundaries() {
        assert!(Difficulty::Easy.admits(3.0));
        assert!(!Difficulty::Medium.admits(3.0));
        assert!(Difficulty::Medium.admits(4.0));
        assert!(!Difficulty::Easy.admits(4.0));
        assert!(!Difficulty::Hard.admits(4.0));
        assert!(Difficulty::Hard.admits(7.0));
        assert!(!Difficulty::Medium.admits(7.0));
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("EASY"), Difficulty::Easy);
        assert_eq!(Difficulty::parse(" hard "), Difficulty::Hard);
        assert_eq!(Difficulty::parse("medium"), Difficulty::Medium);
        assert_eq!(Difficulty::parse("impossible"), Difficulty::Medium);
    }

    #[test]
    fn test_filter_by_technology_and_difficulty() {
        let bank = bank();
        assert_eq!(
            texts(&bank.filter(&techs(&["Python"]), Difficulty::Easy)),
            vec!["py-easy", "py-boundary-easy"]
        );
        assert_eq!(
            texts(&bank.filter(&techs(&["python", "Rust"]), Difficulty::Medium)),
            vec!["py-medium", "py-medium-2", "rs-medium"]
        );
        assert_eq!(
            texts(&bank.filter(&techs(&["Go", "Python"]), Difficulty::Hard)),
            vec!["py-hard", "go-hard"]
        );
        assert!(bank.filter(&techs(&["Haskell"]), Difficulty::Hard).is_empty());
    }

    #[test]
    fn test_select_at_most_two_distinct() {
        let bank = bank();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let picked = bank.select(&techs(&["Python", "Rust"]), Difficulty::Medium, &mut rng);
            assert_eq!(picked.len(), 2);
            assert_ne!(picked[0].question_text, picked[1].question_text);
            assert!(picked.iter().all(|q| Difficulty::Medium.admits(q.complexity_score)));
        }
    }

    #[test]
    fn test_select_returns_fewer_when_scarce() {
        let bank = bank();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = bank.select(&techs(&["Rust"]), Difficulty::Medium, &mut rng);
        assert_eq!(picked.len(), 1);
        assert!(bank
            .select(&techs(&["Rust"]), Difficulty::Hard, &mut rng)
            .is_empty());
    }

    #[test]
    fn test_select_is_deterministic_with_seed() {
        let bank = bank();
        let a = bank.select(
            &techs(&["Python"]),
            Difficulty::Medium,
            &mut StdRng::seed_from_u64(99),
        );
        let b = bank.select(
            &techs(&["Python"]),
            Difficulty::Medium,
            &mut StdRng::seed_from_u64(99),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_find_by_text_is_exact() {
        let bank = bank();
        assert!(bank.find_by_text("py-hard").is_some());
        assert!(bank.find_by_text("PY-HARD").is_none());
    }

    #[test]
    fn test_from_csv_ignores_extra_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "id,technology,complexity_score,question_text,expected_answer"
        )
        .unwrap();
        writeln!(
            file,
            "1,Python,2,What is a list?,\"An ordered, mutable sequence\""
        )
        .unwrap();
        writeln!(file, "2,Rust,8.5,What is a lifetime?,A borrow scope").unwrap();
        file.flush().unwrap();

        let bank = QuestionBank::from_csv(file.path()).unwrap();
        assert_eq!(bank.len(), 2);
        let q = bank.find_by_text("What is a list?").unwrap();
        assert_eq!(q.expected_answer, "An ordered, mutable sequence");
        assert_eq!(q.complexity_score, 2.0);
    }

    #[test]
    fn test_from_csv_rejects_bad_score() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "technology,complexity_score,question_text,expected_answer").unwrap();
        writeln!(file, "Python,hard,Q,A").unwrap();
        file.flush().unwrap();
        assert!(QuestionBank::from_csv(file.path()).is_err());
    }

    #[test]
    fn test_from_csv_rejects_header_only_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "technology,complexity_score,question_text,expected_answer").unwrap();
        file.flush().unwrap();

        let err = QuestionBank::from_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("contains no questions"));
    }
}
