use crate::models::*;
use anyhow::{Context, Result};
use pdf_extract::extract_text;
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

pub const DEFAULT_CHUNK_SIZE: usize = 500;

const KEYWORD_PATTERNS: [&str; 4] = [
    "machine learning",
    "deep learning",
    "artificial intelligence",
    "data science",
];

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "don", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "s", "same", "she",
    "should", "so", "some", "such", "t", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours", "yourself",
    "yourselves",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn punctuation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("valid regex"))
}

pub struct DocumentProcessor {
    chunk_size: usize,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn extract_text_from_pdf(&self, file_path: &Path) -> Result<Document> {
        let filename = file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .with_context(|| format!("{} has no file name", file_path.display()))?;

        log::info!("Processing PDF: {}", filename);

        let content = extract_text(file_path)
            .with_context(|| format!("failed to extract text from {}", filename))?;

        Ok(Document {
            id: Uuid::new_v4().to_string(),
            filename,
            content,
        })
    }

    /// Extracts every PDF in parallel; the result keeps the input order.
    pub fn extract_text_from_pdfs(&self, paths: &[PathBuf]) -> Result<Vec<Document>> {
        let documents = paths
            .par_iter()
            .map(|path| self.extract_text_from_pdf(path))
            .collect::<Result<Vec<_>>>()?;

        log::info!("Processed {} documents", documents.len());
        Ok(documents)
    }

    pub fn extract_and_process_text(&self, paths: &[PathBuf]) -> Result<Vec<ProcessedDocument>> {
        let documents = self.extract_text_from_pdfs(paths)?;
        Ok(documents.iter().map(|doc| self.process_document(doc)).collect())
    }

    pub fn process_document(&self, document: &Document) -> ProcessedDocument {
        ProcessedDocument {
            filename: document.filename.clone(),
            sentences: self.split_into_sentences(&document.content),
            preprocessed_words: self.preprocess_text(&document.content),
            text_chunks: self.chunk_text(&document.content),
            keywords: self.extract_keywords(&document.content),
        }
    }

    /// Lowercases, strips punctuation and drops English stopwords.
    pub fn preprocess_text(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let collapsed = whitespace_re().replace_all(&lowered, " ");
        let cleaned = punctuation_re().replace_all(&collapsed, "");

        cleaned
            .split_whitespace()
            .filter(|word| !stopwords().contains(word))
            .map(str::to_string)
            .collect()
    }

    pub fn split_into_sentences(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Fixed-size chunks measured in characters.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(self.chunk_size)
            .map(|chunk| chunk.iter().collect())
            .collect()
    }

    /// Known phrases in order of appearance, matched case-insensitively.
    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        let normalized = whitespace_re().replace_all(text, " ");
        let lowered = normalized.to_lowercase();

        let mut matches: Vec<(usize, String)> = Vec::new();
        for pattern in KEYWORD_PATTERNS {
            let mut from = 0;
            while let Some(pos) = lowered[from..].find(pattern) {
                let start = from + pos;
                let end = start + pattern.len();
                if is_word_boundary(&lowered, start, end) {
                    matches.push((start, normalized.get(start..end).unwrap_or(pattern).to_string()));
                }
                from = end;
            }
        }

        matches.sort_by_key(|(start, _)| *start);
        matches.into_iter().map(|(_, keyword)| keyword).collect()
    }
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}
