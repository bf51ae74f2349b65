use crate::models::*;
use std::collections::{HashMap, HashSet};

const VOCABULARY_SIZE: usize = 1000;
const MIN_DIMENSIONS: usize = 100;

/// TF-IDF embeddings over the chunks of a [`DocumentIndex`].
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddingService;

impl EmbeddingService {
    pub fn new() -> Self {
        Self
    }

    /// Builds the vocabulary and IDF table from every chunk in the index and
    /// stores an embedding on each chunk.
    pub fn generate_embeddings(&self, index: &mut DocumentIndex) {
        log::info!("Generating embeddings for all document chunks...");

        let mut word_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_frequencies: HashMap<String, usize> = HashMap::new();
        let total_chunks = index.chunk_count();

        for (_, section) in index.sections() {
            for chunk in &section.chunks {
                let words = tokenize(&chunk.content);
                let unique_words: HashSet<_> = words.iter().collect();

                for word in &words {
                    *word_counts.entry(word.clone()).or_insert(0) += 1;
                }

                for word in unique_words {
                    *doc_frequencies.entry(word.clone()).or_insert(0) += 1;
                }
            }
        }

        let idf_scores: HashMap<String, f32> = doc_frequencies
            .iter()
            .map(|(word, df)| {
                let idf = (total_chunks as f32 / *df as f32).ln();
                (word.clone(), idf)
            })
            .collect();

        // Ties broken alphabetically so the vocabulary is stable across runs.
        let mut word_freq_pairs: Vec<_> = word_counts.into_iter().collect();
        word_freq_pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let vocabulary: HashMap<String, usize> = word_freq_pairs
            .into_iter()
            .take(VOCABULARY_SIZE)
            .enumerate()
            .map(|(idx, (word, _))| (word, idx))
            .collect();

        for document in index.documents.iter_mut() {
            for chapter in document.chapters.iter_mut() {
                for section in chapter.sections.iter_mut() {
                    for chunk in section.chunks.iter_mut() {
                        chunk.embedding = Some(create_tfidf_embedding(
                            &chunk.content,
                            &vocabulary,
                            &idf_scores,
                        ));
                    }
                }
            }
            log::info!("Generated embeddings for document: {}", document.filename);
        }

        index.vocabulary = vocabulary;
        index.idf_scores = idf_scores;
    }

    pub fn embed_query(&self, query: &str, index: &DocumentIndex) -> Vec<f32> {
        create_tfidf_embedding(query, &index.vocabulary, &index.idf_scores)
    }

    pub fn calculate_similarity(&self, embedding1: &[f32], embedding2: &[f32]) -> f32 {
        let min_len = embedding1.len().min(embedding2.len());

        let dot_product: f32 = embedding1[..min_len]
            .iter()
            .zip(embedding2[..min_len].iter())
            .map(|(a, b)| a * b)
            .sum();

        let norm1: f32 = embedding1[..min_len].iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm2: f32 = embedding2[..min_len].iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm1 == 0.0 || norm2 == 0.0 {
            0.0
        } else {
            dot_product / (norm1 * norm2)
        }
    }
}

fn create_tfidf_embedding(
    text: &str,
    vocabulary: &HashMap<String, usize>,
    idf_scores: &HashMap<String, f32>,
) -> Vec<f32> {
    let mut embedding = vec![0.0; vocabulary.len().max(MIN_DIMENSIONS)];
    let words = tokenize(text);
    let total_words = words.len() as f32;

    for (word, count) in count_words(&words) {
        if let Some(&idx) = vocabulary.get(&word) {
            let tf = count as f32 / total_words;
            let idf = idf_scores.get(&word).copied().unwrap_or(1.0);
            embedding[idx] = tf * idf;
        }
    }

    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in embedding.iter_mut() {
            *value /= norm;
        }
    }

    embedding
}

/// Lowercased alphanumeric words longer than two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| word.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|word| word.chars().count() > 2)
        .collect()
}

fn count_words(words: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in words {
        *counts.entry(word.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> IndexedChunk {
        IndexedChunk {
            id: content.to_string(),
            content: content.to_string(),
            embedding: None,
        }
    }

    fn index_of(chunks: Vec<IndexedChunk>) -> DocumentIndex {
        DocumentIndex {
            documents: vec![IndexedDocument {
                filename: "a.pdf".to_string(),
                chapters: vec![Chapter {
                    chapter_id: "chapter_1".to_string(),
                    chapter_title: "Chapter 1".to_string(),
                    sections: vec![Section {
                        section_id: "section_1_1".to_string(),
                        section_title: "Section 1.1".to_string(),
                        chunks,
                    }],
                }],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn tokenize_drops_short_words_and_symbols() {
        assert_eq!(tokenize("The total: 42 dollars!"), vec!["the", "total", "dollars"]);
    }

    #[test]
    fn embeddings_are_normalized() {
        let mut index = index_of(vec![
            chunk("invoice total amount due"),
            chunk("shipping address and phone"),
        ]);
        EmbeddingService::new().generate_embeddings(&mut index);

        for (_, section) in index.sections() {
            for chunk in &section.chunks {
                let embedding = chunk.embedding.as_ref().unwrap();
                assert!(embedding.len() >= MIN_DIMENSIONS);
                let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                assert!((norm - 1.0).abs() < 1e-5);
            }
        }
        assert!(!index.vocabulary.is_empty());
    }

    #[test]
    fn query_is_closest_to_matching_chunk() {
        let mut index = index_of(vec![
            chunk("invoice total amount due"),
            chunk("shipping address and phone"),
        ]);
        let service = EmbeddingService::new();
        service.generate_embeddings(&mut index);

        let query = service.embed_query("what is the invoice total", &index);
        let chunks = &index.documents[0].chapters[0].sections[0].chunks;
        let first = service.calculate_similarity(&query, chunks[0].embedding.as_ref().unwrap());
        let second = service.calculate_similarity(&query, chunks[1].embedding.as_ref().unwrap());
        assert!(first > second);
    }

    #[test]
    fn similarity_with_zero_vector_is_zero() {
        let service = EmbeddingService::new();
        assert_eq!(service.calculate_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
