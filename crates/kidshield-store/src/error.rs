use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("knowledge base file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Documents or embeddings are empty!")]
    Empty,

    #[error("{documents} documents but {embeddings} embeddings")]
    LengthMismatch { documents: usize, embeddings: usize },

    #[error("embedding row {row} has dimension {found}, expected {expected}")]
    RaggedEmbeddings {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("query vector has dimension {found}, knowledge base has {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}
