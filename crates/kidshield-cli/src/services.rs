//! Startup wiring: load models and data once, hand back shared handles.

use std::sync::Arc;

use anyhow::Context;
use kidshield_ai::{Assistant, Embedder, GeminiClient, ToxicChecker, ToxicityModel};
use kidshield_core::{AnalysisRequest, KeywordScreen, MessageAnalyzer, QueryRequest, RequestError};
use kidshield_store::KnowledgeBase;
use tracing::info;

use crate::args::{AssistantArgs, Detector, DetectorArgs};

/// Build the configured message analyzer.
pub fn build_analyzer(args: &DetectorArgs) -> anyhow::Result<Arc<dyn MessageAnalyzer>> {
    match args.detector {
        Detector::Keyword => {
            let screen = keyword_screen(args);
            info!(
                harassment = screen.harassment_words().len(),
                offensive = screen.offensive_words().len(),
                "using keyword detector"
            );
            Ok(Arc::new(screen))
        }
        Detector::Model => {
            info!("loading models once at startup");
            let embedder = Embedder::load(&args.embedding_model).with_context(|| {
                format!("loading embedding model from {}", args.embedding_model.display())
            })?;
            let classifier = ToxicityModel::load(&args.toxicity_model).with_context(|| {
                format!("loading toxicity model from {}", args.toxicity_model.display())
            })?;
            let checker = ToxicChecker::new(Arc::new(embedder), Arc::new(classifier))
                .context("embedding offensive reference set")?;
            info!("models loaded and ready");
            Ok(Arc::new(checker))
        }
    }
}

fn keyword_screen(args: &DetectorArgs) -> KeywordScreen {
    let defaults = KeywordScreen::default();
    let harassment = if args.harassment_words.is_empty() {
        defaults.harassment_words().to_vec()
    } else {
        args.harassment_words.clone()
    };
    let offensive = if args.offensive_words.is_empty() {
        defaults.offensive_words().to_vec()
    } else {
        args.offensive_words.clone()
    };
    KeywordScreen::new(harassment, offensive)
}

/// One-shot `analyze` input, validated like an `/analyze` body.
pub fn analysis_request(text: &str) -> Result<AnalysisRequest, RequestError> {
    AnalysisRequest::from_json(Some(&serde_json::json!({ "text": text })))
}

/// One-shot `ask` input, validated like an `/ai/query` body.
pub fn query_request(query: &str) -> Result<QueryRequest, RequestError> {
    QueryRequest::from_json(Some(&serde_json::json!({ "query": query })))
}

/// Load the knowledge base, embedding model, and LLM client.
pub fn build_assistant(args: &AssistantArgs) -> anyhow::Result<Arc<Assistant>> {
    anyhow::ensure!(
        !args.api_key.trim().is_empty(),
        "GEMINI_API_KEY not found in environment variables!"
    );

    let knowledge = KnowledgeBase::load(&args.knowledge_base)
        .with_context(|| format!("loading knowledge base {}", args.knowledge_base.display()))?;
    let embedder = Embedder::load(&args.embedding_model).with_context(|| {
        format!("loading embedding model from {}", args.embedding_model.display())
    })?;
    anyhow::ensure!(
        embedder.dim() == knowledge.dim(),
        "embedding model produces {}-dim vectors but the knowledge base has {}-dim vectors",
        embedder.dim(),
        knowledge.dim()
    );

    let llm = GeminiClient::new(args.api_key.clone(), &args.llm_model);
    info!(model = %llm.model(), documents = knowledge.len(), "assistant ready");

    Ok(Arc::new(Assistant::new(
        knowledge,
        Arc::new(embedder),
        Arc::new(llm),
    )))
}
