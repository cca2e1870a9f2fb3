//! ONNX Runtime embedding pipeline for sentence-transformers models.
//!
//! Implements mean-pooled embeddings using all-MiniLM-L6-v2 (384 dimensions).
//! The model directory must contain `model.onnx` and `tokenizer.json`.

use std::path::Path;
use std::sync::Mutex;

use kidshield_core::similarity::normalize;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use crate::TextEmbedder;

/// Sentence embedding generator using ONNX Runtime.
///
/// Loads a sentence-transformers model (e.g., all-MiniLM-L6-v2) and produces
/// normalized embeddings suitable for cosine similarity search. The session
/// is locked for each run, so one `Embedder` can be shared across requests.
pub struct Embedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dim: usize,
}

impl Embedder {
    /// Load an embedding model from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;

        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(384);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;

        // MiniLM was trained on 256-token inputs.
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: 256,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dim,
        })
    }

    /// Embedding dimensionality (384 for all-MiniLM-L6-v2).
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn run_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let batch = encodings.len();
        let seq_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
        let padded = |field: fn(&tokenizers::Encoding) -> &[u32]| -> Vec<i64> {
            encodings
                .iter()
                .flat_map(|e| {
                    let row = field(e);
                    row.iter()
                        .map(|&v| i64::from(v))
                        .chain(std::iter::repeat(0).take(seq_len - row.len()))
                })
                .collect()
        };
        let ids = padded(tokenizers::Encoding::get_ids);
        let mask = padded(tokenizers::Encoding::get_attention_mask);
        let type_ids = padded(tokenizers::Encoding::get_type_ids);

        let shape = [batch as i64, seq_len as i64];
        let inputs = ort::inputs![
            "input_ids" => Tensor::from_array((shape, ids.into_boxed_slice()))?,
            "attention_mask" => Tensor::from_array((shape, mask.clone().into_boxed_slice()))?,
            "token_type_ids" => Tensor::from_array((shape, type_ids.into_boxed_slice()))?,
        ];

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("embedding session lock poisoned"))?;
        let outputs = session.run(inputs)?;

        let (output_shape, hidden) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3
                && dims[0] as usize == batch
                && dims[1] as usize == seq_len
                && dims[2] as usize == self.dim,
            "unexpected hidden-state shape {dims:?}, expected [{batch}, {seq_len}, {}]",
            self.dim
        );

        let embeddings = (0..batch)
            .map(|i| {
                let row_mask = &mask[i * seq_len..(i + 1) * seq_len];
                let tokens = hidden[i * seq_len * self.dim..(i + 1) * seq_len * self.dim]
                    .chunks_exact(self.dim);
                let mut pooled = vec![0.0f32; self.dim];
                let mut count = 0.0f32;
                for (token, &m) in tokens.zip(row_mask) {
                    if m == 0 {
                        continue;
                    }
                    for (p, &h) in pooled.iter_mut().zip(token) {
                        *p += h;
                    }
                    count += 1.0;
                }
                if count > 0.0 {
                    pooled.iter_mut().for_each(|p| *p /= count);
                }
                normalize(&mut pooled);
                pooled
            })
            .collect();

        Ok(embeddings)
    }
}

impl TextEmbedder for Embedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.run_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("model returned no embedding"))
    }

    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.run_batch(texts)
    }
}

/// Last static dimension of the hidden-state output, if the graph declares one.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
