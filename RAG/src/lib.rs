pub mod models;
pub mod document_processor;
pub mod embedding_service;
pub mod hierarchical_index;
pub mod retrieval;
pub mod llm_service;
pub mod query_service;

pub use models::*;
pub use document_processor::DocumentProcessor;
pub use embedding_service::EmbeddingService;
pub use hierarchical_index::HierarchicalIndexer;
pub use retrieval::{bm25_retrieve, semantic_retrieve, RetrievalMode, DEFAULT_TOP_N};
pub use llm_service::{AnswerGenerator, GeminiService};
pub use query_service::{Answer, QueryService};
