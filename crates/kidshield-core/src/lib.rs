pub mod keywords;
pub mod message;
pub mod similarity;
pub mod verdict;

pub use keywords::KeywordScreen;
pub use message::{AnalysisRequest, AnalysisResponse, Answer, QueryRequest, RequestError};
pub use similarity::{cosine_similarity, nearest};
pub use verdict::{Assessment, Similarity, Toxicity, Verdict};

/// Anything that can turn a message into an [`Assessment`].
///
/// Implemented by the keyword screen and by the model-backed checker in
/// `kidshield-ai`. Implementations must be cheap to share across threads;
/// the server holds one behind an `Arc` for the process lifetime.
pub trait MessageAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Assessment;
}
