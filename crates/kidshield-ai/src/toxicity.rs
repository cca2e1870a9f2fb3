//! ONNX Runtime text-classification pipeline for toxicity models.
//!
//! Expects a HuggingFace sequence-classification export (e.g.
//! martin-ha/toxic-comment-model): `model.onnx`, `tokenizer.json`, and
//! optionally `config.json` carrying the `id2label` map. The model's first
//! output must be logits shaped `[batch, num_labels]`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{info, warn};

use crate::{Prediction, TextClassifier};

#[derive(Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Sequence classifier returning the softmax top label.
pub struct ToxicityModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    /// BERT exports take `token_type_ids`; DistilBERT exports do not.
    token_type_ids: bool,
}

impl ToxicityModel {
    /// Load a classifier from a model directory.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: 512,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        let labels = load_labels(&model_dir.join("config.json"))?;

        info!(
            labels = ?labels,
            token_type_ids,
            model = %model_path.display(),
            "loaded toxicity model"
        );
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            token_type_ids,
        })
    }

    /// Label names in model output order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn label_for(&self, idx: usize) -> String {
        self.labels
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{idx}"))
    }
}

impl TextClassifier for ToxicityModel {
    fn classify(&self, text: &str) -> anyhow::Result<Prediction> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let to_i64 = |v: &[u32]| v.iter().map(|&x| x as i64).collect::<Vec<_>>();
        let seq_len = encoding.get_ids().len();
        let shape = [1i64, seq_len as i64];

        let ids_tensor =
            Tensor::from_array((shape, to_i64(encoding.get_ids()).into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((
            shape,
            to_i64(encoding.get_attention_mask()).into_boxed_slice(),
        ))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("classifier session lock poisoned"))?;

        let outputs = if self.token_type_ids {
            let type_tensor =
                Tensor::from_array((shape, to_i64(encoding.get_type_ids()).into_boxed_slice()))?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])?
        };

        let (output_shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 2 && dims[0] == 1 && dims[1] > 0,
            "unexpected logits shape: {dims:?}, expected [1, num_labels]"
        );

        let probs = softmax(&logits[..dims[1] as usize]);
        let (idx, score) = argmax(&probs).ok_or_else(|| anyhow::anyhow!("empty logits"))?;

        Ok(Prediction {
            label: self.label_for(idx),
            score,
        })
    }
}

/// Read `id2label` from a HuggingFace `config.json`, ordered by id.
fn load_labels(config_path: &Path) -> anyhow::Result<Vec<String>> {
    if !config_path.exists() {
        warn!(path = %config_path.display(), "no config.json; labels will be LABEL_<n>");
        return Ok(vec![]);
    }
    let raw = std::fs::read_to_string(config_path)?;
    let config: ModelConfig = serde_json::from_str(&raw)?;
    labels_from_map(&config.id2label)
}

fn labels_from_map(id2label: &HashMap<String, String>) -> anyhow::Result<Vec<String>> {
    let mut indexed = id2label
        .iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|i| (i, label.clone()))
                .map_err(|_| anyhow::anyhow!("non-numeric id2label key: {id:?}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    indexed.sort_by_key(|(i, _)| *i);

    let mut labels = Vec::with_capacity(indexed.len());
    for (i, label) in indexed {
        anyhow::ensure!(i == labels.len(), "id2label has a gap at {}", labels.len());
        labels.push(label);
    }
    Ok(labels)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[2.0, -1.0, 0.5]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 0.0]);
        assert!((probs[0] - 1.0).abs() < 1e-6);
        assert!(probs[1] >= 0.0);
    }

    #[test]
    fn argmax_prefers_first_on_tie() {
        assert_eq!(argmax(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(argmax(&[0.1, 0.9]), Some((1, 0.9)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn labels_ordered_by_id() {
        let map = HashMap::from([
            ("1".to_string(), "toxic".to_string()),
            ("0".to_string(), "non-toxic".to_string()),
        ]);
        assert_eq!(labels_from_map(&map).unwrap(), ["non-toxic", "toxic"]);
    }

    #[test]
    fn labels_reject_gaps_and_junk() {
        let gap = HashMap::from([("0".to_string(), "a".to_string()), ("2".to_string(), "c".to_string())]);
        assert!(labels_from_map(&gap).is_err());

        let junk = HashMap::from([("zero".to_string(), "a".to_string())]);
        assert!(labels_from_map(&junk).is_err());
    }

    fn model_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
            .join("toxic-comment-model")
    }

    fn load() -> Option<ToxicityModel> {
        let dir = model_dir();
        if !dir.join("model.onnx").exists() {
            eprintln!(
                "skipping: toxicity model not found. Export with:\n  \
                 optimum-cli export onnx --model martin-ha/toxic-comment-model models/toxic-comment-model"
            );
            return None;
        }
        Some(ToxicityModel::load(&dir).unwrap())
    }

    #[test]
    fn classifies_threat_as_toxic() {
        let Some(model) = load() else { return };
        let p = model.classify("I will kill you, you idiot").unwrap();
        assert_eq!(p.label.to_lowercase(), "toxic");
        assert!(p.score > 0.5);
    }

    #[test]
    fn classifies_greeting_as_non_toxic() {
        let Some(model) = load() else { return };
        let p = model.classify("Hello how are you").unwrap();
        assert_ne!(p.label.to_lowercase(), "toxic");
        assert!((0.0..=1.0).contains(&p.score));
    }
}
