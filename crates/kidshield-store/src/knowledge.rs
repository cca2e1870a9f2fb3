//! Static knowledge base: document chunks with precomputed embeddings.
//!
//! The file is produced offline and has the shape
//! `{"documents": ["chunk", ...], "embeddingschild": [[f32; dim], ...]}`.
//! Row `i` of the embedding matrix belongs to document `i`.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::StoreError;

#[derive(Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    documents: Vec<String>,
    #[serde(default, rename = "embeddingschild", alias = "embeddings")]
    embeddings: Vec<Vec<f32>>,
}

/// Immutable document/embedding table searched by cosine similarity.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    documents: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    dim: usize,
}

/// Best-matching chunk for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub index: usize,
    pub score: f32,
    pub document: &'a str,
}

impl KnowledgeBase {
    /// Load and validate a knowledge-base JSON file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let kb = Self::from_json(&raw)?;
        info!(
            documents = kb.len(),
            dim = kb.dim(),
            path = %path.display(),
            "loaded knowledge base"
        );
        Ok(kb)
    }

    /// Parse and validate knowledge-base JSON.
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        let file: KnowledgeFile = serde_json::from_str(raw)?;
        Self::new(file.documents, file.embeddings)
    }

    /// Build from parallel arrays.
    ///
    /// Fails when either array is empty, the lengths differ, or rows do not
    /// share one dimension.
    pub fn new(documents: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Self, StoreError> {
        if documents.is_empty() || embeddings.is_empty() {
            return Err(StoreError::Empty);
        }
        if documents.len() != embeddings.len() {
            return Err(StoreError::LengthMismatch {
                documents: documents.len(),
                embeddings: embeddings.len(),
            });
        }

        let dim = embeddings[0].len();
        if dim == 0 {
            return Err(StoreError::Empty);
        }
        if let Some((row, v)) = embeddings.iter().enumerate().find(|(_, v)| v.len() != dim) {
            return Err(StoreError::RaggedEmbeddings {
                row,
                expected: dim,
                found: v.len(),
            });
        }

        Ok(Self {
            documents,
            embeddings,
            dim,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Always false for a constructed knowledge base.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Embedding dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn document(&self, index: usize) -> Option<&str> {
        self.documents.get(index).map(String::as_str)
    }

    /// Single best chunk for a query embedding; ties go to the earliest row.
    pub fn nearest(&self, query: &[f32]) -> Result<Match<'_>, StoreError> {
        if query.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                found: query.len(),
            });
        }

        let (index, score) =
            kidshield_core::nearest(query, &self.embeddings).ok_or(StoreError::Empty)?;

        Ok(Match {
            index,
            score,
            document: &self.documents[index],
        })
    }
}
