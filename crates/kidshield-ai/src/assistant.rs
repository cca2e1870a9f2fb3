//! Retrieval-augmented assistant: nearest knowledge-base chunk + hosted LLM.

use std::sync::Arc;

use kidshield_core::Answer;
use kidshield_store::{KnowledgeBase, StoreError};
use thiserror::Error;
use tracing::info;

use crate::{GenerateError, Generator, TextEmbedder};

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("embedding failed: {0:#}")]
    Embed(anyhow::Error),
    #[error(transparent)]
    Retrieval(#[from] StoreError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("inference task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Prompt sent to the LLM for a query and its matched chunk.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "User query: {query}\n\n\
         Matched context: {context}\n\n\
         You are an assistant helping a parent."
    )
}

/// Answers parent questions against a fixed knowledge base.
///
/// The embedder must be the model that produced the knowledge-base vectors.
/// Only the vector dimension can be checked here.
pub struct Assistant {
    knowledge: KnowledgeBase,
    embedder: Arc<dyn TextEmbedder>,
    generator: Arc<dyn Generator>,
}

impl Assistant {
    pub fn new(
        knowledge: KnowledgeBase,
        embedder: Arc<dyn TextEmbedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            knowledge,
            embedder,
            generator,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Best-matching chunk for `query`.
    ///
    /// Embedding is blocking model inference and runs on the blocking pool.
    pub async fn retrieve(&self, query: &str) -> Result<String, AssistError> {
        let embedder = Arc::clone(&self.embedder);
        let owned = query.to_string();
        let vector = tokio::task::spawn_blocking(move || embedder.embed(&owned))
            .await?
            .map_err(AssistError::Embed)?;

        let m = self.knowledge.nearest(&vector)?;
        info!(index = m.index, score = m.score, "matched knowledge-base chunk");
        Ok(m.document.to_string())
    }

    /// Retrieve context for `query` and ask the LLM.
    pub async fn answer(&self, query: &str) -> Result<Answer, AssistError> {
        let context = self.retrieve(query).await?;
        let prompt = build_prompt(query, &context);
        let response = self.generator.generate(&prompt).await?;
        Ok(Answer {
            query: query.to_string(),
            context,
            response,
        })
    }
}
