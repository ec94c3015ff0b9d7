use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use verifier::config::Config;
use verifier::github::GitHubClient;
use verifier::interview::QuestionBank;
use verifier::linkedin::LinkedInClient;
use verifier::ner::bert::BertSkillTagger;
use verifier::routes::build_router;
use verifier::skills::{SkillMatcher, SkillVocabulary};
use verifier::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume verifier v{}", env!("CARGO_PKG_VERSION"));

    let vocabulary = match &config.skills_path {
        Some(path) => SkillVocabulary::from_file(path)?,
        None => SkillVocabulary::builtin(),
    };
    let skills = Arc::new(SkillMatcher::new(&vocabulary));
    info!("Skill vocabulary loaded ({} skills)", skills.len());

    let question_bank = QuestionBank::from_csv(&config.question_bank_path)?;
    info!(
        "Question bank loaded from {} ({} questions)",
        config.question_bank_path.display(),
        question_bank.len()
    );

    let tagger = tokio::task::spawn_blocking({
        let dir = config.ner_model_dir.clone();
        move || BertSkillTagger::load(&dir)
    })
    .await
    .context("NER model loader panicked")??;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(concat!("resume-verifier/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let repositories = GitHubClient::new(
        http.clone(),
        config.github_api_url.clone(),
        config.github_token.clone(),
    );
    if config.github_token.is_none() {
        info!("GITHUB_TOKEN not set; using unauthenticated GitHub rate limits");
    }
    let linkedin = LinkedInClient::new(http, config.linkedin_api_url.clone());

    let quiz_rng = match config.quiz_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let cors_origin: HeaderValue = config
        .cors_allowed_origin
        .parse()
        .with_context(|| format!("Invalid CORS_ALLOWED_ORIGIN '{}'", config.cors_allowed_origin))?;

    let state = AppState {
        config: config.clone(),
        skills,
        tagger: Arc::new(tagger),
        repositories: Arc::new(repositories),
        question_bank: Arc::new(question_bank),
        linkedin,
        quiz_rng: Arc::new(Mutex::new(quiz_rng)),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(cors_origin)
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
