//! Storage layer: the assistant's static knowledge base.

mod error;
pub use error::StoreError;

mod knowledge;
pub use knowledge::{KnowledgeBase, Match};
