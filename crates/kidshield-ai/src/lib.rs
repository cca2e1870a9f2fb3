//! AI inference layer: ONNX Runtime for embeddings/classification, hosted LLM for answers.
//!
//! The model-backed types sit behind the [`TextEmbedder`], [`TextClassifier`]
//! and [`Generator`] traits so the decision logic and the HTTP layer can be
//! exercised without model files or network access.

mod assistant;
mod checker;
mod llm;

pub use assistant::{AssistError, Assistant, build_prompt};
pub use checker::ToxicChecker;
pub use llm::{GenerateError, Generator};

#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "onnx")]
pub use embedder::Embedder;

#[cfg(feature = "onnx")]
mod toxicity;
#[cfg(feature = "onnx")]
pub use toxicity::ToxicityModel;

#[cfg(feature = "gemini")]
mod gemini;
#[cfg(feature = "gemini")]
pub use gemini::{DEFAULT_MODEL as DEFAULT_GEMINI_MODEL, GeminiClient};

/// Sentence embedding model.
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Embed several texts, one vector per input.
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Top label from a text-classification model.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Probability of `label`, in `[0, 1]`.
    pub score: f32,
}

/// Single-label text classifier.
pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str) -> anyhow::Result<Prediction>;
}
