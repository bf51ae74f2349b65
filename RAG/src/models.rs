use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub content: String,
}

/// Per-document output of the preprocessing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub filename: String,
    pub sentences: Vec<String>,
    pub preprocessed_words: Vec<String>,
    pub text_chunks: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: String,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub section_id: String,
    pub section_title: String,
    pub chunks: Vec<IndexedChunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter_id: String,
    pub chapter_title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub filename: String,
    pub chapters: Vec<Chapter>,
}

/// Root of the document -> chapter -> section -> chunk tree, together with
/// the TF-IDF model used to embed its chunks and incoming queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentIndex {
    pub documents: Vec<IndexedDocument>,
    pub vocabulary: HashMap<String, usize>,
    pub idf_scores: HashMap<String, f32>,
}

impl DocumentIndex {
    pub fn sections(&self) -> impl Iterator<Item = (&IndexedDocument, &Section)> {
        self.documents.iter().flat_map(|doc| {
            doc.chapters
                .iter()
                .flat_map(move |chapter| chapter.sections.iter().map(move |s| (doc, s)))
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.sections().map(|(_, s)| s.chunks.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedSection {
    pub section_key: String,
    pub section_title: String,
    pub document: String,
    pub similarity_score: f32,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiCandidate {
    pub content: GeminiContent,
}
