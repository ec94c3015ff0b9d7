use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;

use crate::config::Config;
use crate::github::RepositorySource;
use crate::interview::QuestionBank;
use crate::linkedin::LinkedInClient;
use crate::ner::SkillTagger;
use crate::skills::SkillMatcher;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything except the quiz RNG is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Dictionary matcher compiled from the skill vocabulary.
    pub skills: Arc<SkillMatcher>,
    /// NER fallback. Default: BertSkillTagger loaded from NER_MODEL_DIR.
    pub tagger: Arc<dyn SkillTagger>,
    /// Repository listing and language lookups. Default: GitHubClient.
    pub repositories: Arc<dyn RepositorySource>,
    pub question_bank: Arc<QuestionBank>,
    pub linkedin: LinkedInClient,
    /// Seeded from QUIZ_SEED when set; held only while questions are drawn.
    pub quiz_rng: Arc<Mutex<StdRng>>,
}
