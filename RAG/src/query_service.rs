use crate::llm_service::AnswerGenerator;
use crate::models::*;
use crate::retrieval::{retrieve, RetrievalMode};
use anyhow::Result;
use std::sync::Arc;

#[derive(Debug)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<RetrievedSection>,
    pub processing_time_ms: u128,
}

pub struct QueryService {
    generator: Arc<dyn AnswerGenerator>,
    mode: RetrievalMode,
    top_n: usize,
}

impl QueryService {
    pub fn new(generator: Arc<dyn AnswerGenerator>, mode: RetrievalMode, top_n: usize) -> Self {
        Self {
            generator,
            mode,
            top_n: top_n.max(1),
        }
    }

    pub fn mode(&self) -> RetrievalMode {
        self.mode
    }

    pub async fn query(&self, query: &str, index: &DocumentIndex) -> Result<Answer> {
        let start_time = std::time::Instant::now();

        let sources = retrieve(self.mode, query, index, self.top_n);
        let answer = self.generator.generate_answer(&sources, query).await?;

        Ok(Answer {
            answer,
            sources,
            processing_time_ms: start_time.elapsed().as_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchical_index::HierarchicalIndexer;
    use async_trait::async_trait;

    struct EchoGenerator;

    #[async_trait]
    impl AnswerGenerator for EchoGenerator {
        async fn generate_answer(&self, retrieved: &[RetrievedSection], query: &str) -> Result<String> {
            Ok(format!("{} ({} sources)", query, retrieved.len()))
        }
    }

    #[tokio::test]
    async fn query_passes_top_sections_to_generator() {
        let index = HierarchicalIndexer::new().build_index(&[Document {
            id: "1".to_string(),
            filename: "a.pdf".to_string(),
            content: "Section 1.1 one. Section 1.2 two. Section 1.3 three. Section 1.4 four."
                .to_string(),
        }]);
        let service = QueryService::new(Arc::new(EchoGenerator), RetrievalMode::Bm25, 2);

        let answer = service.query("two", &index).await.unwrap();
        assert_eq!(answer.answer, "two (2 sources)");
        assert_eq!(answer.sources.len(), 2);
    }
}
