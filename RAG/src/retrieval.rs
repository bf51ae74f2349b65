use crate::embedding_service::{tokenize, EmbeddingService};
use crate::models::*;
use anyhow::{anyhow, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

pub const DEFAULT_TOP_N: usize = 3;

const BM25_K1: f32 = 1.5;
const BM25_B: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalMode {
    #[default]
    Semantic,
    Bm25,
}

impl FromStr for RetrievalMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semantic" => Ok(Self::Semantic),
            "bm25" => Ok(Self::Bm25),
            other => Err(anyhow!("unknown retrieval mode '{}', expected semantic or bm25", other)),
        }
    }
}

pub fn retrieve(
    mode: RetrievalMode,
    query: &str,
    index: &DocumentIndex,
    top_n: usize,
) -> Vec<RetrievedSection> {
    match mode {
        RetrievalMode::Semantic => semantic_retrieve(query, index, top_n),
        RetrievalMode::Bm25 => bm25_retrieve(query, index, top_n),
    }
}

/// Scores each section by its best-matching chunk (cosine similarity of the
/// TF-IDF embeddings) and returns the `top_n` best sections.
pub fn semantic_retrieve(query: &str, index: &DocumentIndex, top_n: usize) -> Vec<RetrievedSection> {
    let embedding_service = EmbeddingService::new();
    let query_embedding = embedding_service.embed_query(query, index);

    let scored = index.sections().filter_map(|(document, section)| {
        best_chunk(section, |chunk| {
            chunk
                .embedding
                .as_ref()
                .map(|e| embedding_service.calculate_similarity(&query_embedding, e))
        })
        .map(|(score, chunk)| retrieved(document, section, chunk, score))
    });

    top_sections(scored.collect(), top_n)
}

/// Okapi BM25 over all chunks in the index, aggregated per section by the
/// best chunk score.
pub fn bm25_retrieve(query: &str, index: &DocumentIndex, top_n: usize) -> Vec<RetrievedSection> {
    let query_terms = tokenize(query);

    let chunk_terms: HashMap<&str, Vec<String>> = index
        .sections()
        .flat_map(|(_, section)| section.chunks.iter())
        .map(|chunk| (chunk.id.as_str(), tokenize(&chunk.content)))
        .collect();

    let total_chunks = chunk_terms.len() as f32;
    if total_chunks == 0.0 {
        return Vec::new();
    }
    let avg_len = chunk_terms.values().map(Vec::len).sum::<usize>() as f32 / total_chunks;

    let mut doc_frequencies: HashMap<&str, usize> = HashMap::new();
    for term in &query_terms {
        if doc_frequencies.contains_key(term.as_str()) {
            continue;
        }
        let df = chunk_terms.values().filter(|terms| terms.contains(term)).count();
        doc_frequencies.insert(term.as_str(), df);
    }

    let score_chunk = |chunk: &IndexedChunk| -> Option<f32> {
        let terms = chunk_terms.get(chunk.id.as_str())?;
        let len = terms.len() as f32;
        let score = query_terms
            .iter()
            .map(|term| {
                let tf = terms.iter().filter(|t| *t == term).count() as f32;
                if tf == 0.0 {
                    return 0.0;
                }
                let df = doc_frequencies.get(term.as_str()).copied().unwrap_or(0) as f32;
                let idf = ((total_chunks - df + 0.5) / (df + 0.5) + 1.0).ln();
                let norm = if avg_len > 0.0 { len / avg_len } else { 0.0 };
                idf * tf * (BM25_K1 + 1.0) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * norm))
            })
            .sum();
        Some(score)
    };

    let scored = index.sections().filter_map(|(document, section)| {
        best_chunk(section, score_chunk)
            .map(|(score, chunk)| retrieved(document, section, chunk, score))
    });

    top_sections(scored.collect(), top_n)
}

fn best_chunk<F>(section: &Section, mut score: F) -> Option<(f32, &IndexedChunk)>
where
    F: FnMut(&IndexedChunk) -> Option<f32>,
{
    section
        .chunks
        .iter()
        .filter_map(|chunk| score(chunk).map(|s| (s, chunk)))
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
}

fn retrieved(
    document: &IndexedDocument,
    section: &Section,
    chunk: &IndexedChunk,
    score: f32,
) -> RetrievedSection {
    RetrievedSection {
        section_key: section.section_id.clone(),
        section_title: section.section_title.clone(),
        document: document.filename.clone(),
        similarity_score: score,
        content: chunk.content.clone(),
    }
}

fn top_sections(mut sections: Vec<RetrievedSection>, top_n: usize) -> Vec<RetrievedSection> {
    // Stable sort keeps document order among equal scores.
    sections.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(Ordering::Equal)
    });
    sections.truncate(top_n);

    log::info!("Found {} relevant sections", sections.len());
    sections
}
