//! Model-backed message analysis: reference-sentence similarity plus a
//! toxicity classifier, combined by [`Verdict::combine`].

use std::sync::Arc;

use kidshield_core::similarity::max_similarity;
use kidshield_core::verdict::{self, OFFENSIVE_EXAMPLES};
use kidshield_core::{Assessment, MessageAnalyzer, Similarity, Toxicity, Verdict};
use tracing::{error, info};

use crate::{TextClassifier, TextEmbedder};

/// Analyzer holding both models and the pre-embedded reference set.
pub struct ToxicChecker {
    embedder: Arc<dyn TextEmbedder>,
    classifier: Arc<dyn TextClassifier>,
    references: Vec<Vec<f32>>,
}

impl ToxicChecker {
    /// Build a checker, embedding the built-in offensive reference sentences.
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        classifier: Arc<dyn TextClassifier>,
    ) -> anyhow::Result<Self> {
        Self::with_references(embedder, classifier, OFFENSIVE_EXAMPLES)
    }

    /// Build a checker against a custom reference set.
    pub fn with_references(
        embedder: Arc<dyn TextEmbedder>,
        classifier: Arc<dyn TextClassifier>,
        references: &[&str],
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!references.is_empty(), "reference set is empty");
        let references = embedder.embed_batch(references)?;
        anyhow::ensure!(
            !references.is_empty(),
            "embedder returned no reference vectors"
        );
        info!(count = references.len(), "embedded offensive reference set");
        Ok(Self {
            embedder,
            classifier,
            references,
        })
    }

    /// Max cosine similarity of the normalized text against the reference set.
    pub fn detect_offense(&self, text: &str) -> anyhow::Result<Similarity> {
        let emb = self.embedder.embed(&verdict::clean(text))?;
        let score = max_similarity(&emb, &self.references)
            .ok_or_else(|| anyhow::anyhow!("reference set is empty"))?;
        info!(score, "similarity score");
        Ok(Similarity { score })
    }

    /// Classify the first 512 characters of the text.
    pub fn check_toxic(&self, text: &str) -> anyhow::Result<Toxicity> {
        let prediction = self
            .classifier
            .classify(verdict::truncate_for_classifier(text))?;
        let toxicity = Toxicity::new(prediction.label, prediction.score.clamp(0.0, 1.0));
        info!(label = %toxicity.label, score = toxicity.score, "toxicity model result");
        Ok(toxicity)
    }
}

impl MessageAnalyzer for ToxicChecker {
    /// A failed stage falls back to its own neutral result, so the other
    /// stage can still flag. Only when both fail is the assessment degraded.
    fn analyze(&self, text: &str) -> Assessment {
        let similarity = self.detect_offense(text);
        let toxicity = self.check_toxic(text);

        let (similarity, toxicity) = match (similarity, toxicity) {
            (Err(sim_err), Err(tox_err)) => {
                error!(error = %format!("{sim_err:#}"), "similarity stage failed");
                error!(error = %format!("{tox_err:#}"), "classifier stage failed");
                return Assessment::degraded(format!(
                    "similarity: {sim_err:#}; classifier: {tox_err:#}"
                ));
            }
            (similarity, toxicity) => (
                similarity.unwrap_or_else(|e| {
                    error!(error = %format!("{e:#}"), "similarity stage failed; scoring 0.0");
                    Similarity { score: 0.0 }
                }),
                toxicity.unwrap_or_else(|e| {
                    error!(error = %format!("{e:#}"), "classifier stage failed; labelling error");
                    Toxicity::error()
                }),
            ),
        };

        let verdict = Verdict::combine(similarity, toxicity);
        info!(
            flag = verdict.flag,
            similarity = verdict.similarity_score,
            label = %verdict.tox_label,
            score = verdict.tox_score,
            "analysis complete"
        );
        Assessment::Scored(verdict)
    }
}
