use crate::document_processor::DocumentProcessor;
use crate::embedding_service::EmbeddingService;
use crate::models::*;
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use uuid::Uuid;

pub const PREAMBLE_TITLE: &str = "Preamble";

fn chapter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Chapter \d+").expect("valid regex"))
}

fn section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Section \d+\.\d+").expect("valid regex"))
}

/// Text before the first heading, then each heading with the text up to the
/// next one.
struct Split<'a> {
    intro: &'a str,
    headed: Vec<(&'a str, &'a str)>,
}

fn split_on_headings<'a>(text: &'a str, heading: &Regex) -> Split<'a> {
    let matches: Vec<_> = heading.find_iter(text).collect();
    let intro_end = matches.first().map_or(text.len(), |m| m.start());

    let headed = matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let body_end = matches.get(i + 1).map_or(text.len(), |next| next.start());
            (m.as_str(), &text[m.end()..body_end])
        })
        .collect();

    Split {
        intro: &text[..intro_end],
        headed,
    }
}

pub struct HierarchicalIndexer {
    processor: DocumentProcessor,
    embedding_service: EmbeddingService,
}

impl Default for HierarchicalIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchicalIndexer {
    pub fn new() -> Self {
        Self::with_processor(DocumentProcessor::new())
    }

    pub fn with_processor(processor: DocumentProcessor) -> Self {
        Self {
            processor,
            embedding_service: EmbeddingService::new(),
        }
    }

    /// Builds the tree for every document and embeds all of its chunks.
    pub fn build_index(&self, documents: &[Document]) -> DocumentIndex {
        let mut index = DocumentIndex {
            documents: documents
                .iter()
                .map(|doc| self.build_hierarchical_tree(&doc.filename, &doc.content))
                .collect(),
            ..Default::default()
        };

        self.embedding_service.generate_embeddings(&mut index);

        log::info!(
            "Indexed {} documents into {} chunks",
            index.documents.len(),
            index.chunk_count()
        );
        index
    }

    /// Splits on `Chapter N` then `Section N.M` headings. Text before the
    /// first chapter heading becomes `chapter_0`, and text before the first
    /// section heading of a chapter becomes its `section_{n}_0`.
    pub fn build_hierarchical_tree(&self, filename: &str, text: &str) -> IndexedDocument {
        let split = split_on_headings(text, chapter_re());
        let mut chapters = Vec::new();

        if !split.intro.trim().is_empty() {
            chapters.push(self.build_chapter(0, PREAMBLE_TITLE, split.intro));
        }

        for (n, (title, body)) in split.headed.into_iter().enumerate() {
            chapters.push(self.build_chapter(n + 1, title, body));
        }

        IndexedDocument {
            filename: filename.to_string(),
            chapters,
        }
    }

    fn build_chapter(&self, chapter_no: usize, title: &str, body: &str) -> Chapter {
        let split = split_on_headings(body, section_re());
        let mut sections = Vec::new();

        if !split.intro.trim().is_empty() {
            sections.push(Section {
                section_id: format!("section_{}_0", chapter_no),
                section_title: title.to_string(),
                chunks: self.chunk_section(split.intro.trim()),
            });
        }

        for (m, (section_title, section_body)) in split.headed.into_iter().enumerate() {
            let content = format!("{}{}", section_title, section_body.trim_end());
            sections.push(Section {
                section_id: format!("section_{}_{}", chapter_no, m + 1),
                section_title: section_title.to_string(),
                chunks: self.chunk_section(&content),
            });
        }

        Chapter {
            chapter_id: format!("chapter_{}", chapter_no),
            chapter_title: title.to_string(),
            sections,
        }
    }

    fn chunk_section(&self, text: &str) -> Vec<IndexedChunk> {
        self.processor
            .chunk_text(text)
            .into_iter()
            .map(|content| IndexedChunk {
                id: Uuid::new_v4().to_string(),
                content,
                embedding: None,
            })
            .collect()
    }
}

impl DocumentIndex {
    pub fn save_index(&self, index_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(index_path, json)
            .with_context(|| format!("failed to write index to {}", index_path.display()))?;
        log::info!("Saved index to {}", index_path.display());
        Ok(())
    }

    pub fn load_index(index_path: &Path) -> Result<Self> {
        let json = fs::read_to_string(index_path)
            .with_context(|| format!("failed to read index from {}", index_path.display()))?;
        let index = serde_json::from_str(&json)
            .with_context(|| format!("{} is not a valid index", index_path.display()))?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = "Foreword text. Chapter 1 Basics intro. Section 1.1 Alpha body. \
                        Section 1.2 Beta body. Chapter 2 Section 2.1 Gamma body.";

    #[test]
    fn splits_chapters_and_sections() {
        let indexer = HierarchicalIndexer::new();
        let doc = indexer.build_hierarchical_tree("book.pdf", BOOK);

        let chapter_ids: Vec<_> = doc.chapters.iter().map(|c| c.chapter_id.as_str()).collect();
        assert_eq!(chapter_ids, vec!["chapter_0", "chapter_1", "chapter_2"]);
        assert_eq!(doc.chapters[0].chapter_title, PREAMBLE_TITLE);

        let first: Vec<_> = doc.chapters[1]
            .sections
            .iter()
            .map(|s| (s.section_id.as_str(), s.section_title.as_str()))
            .collect();
        assert_eq!(
            first,
            vec![
                ("section_1_0", "Chapter 1"),
                ("section_1_1", "Section 1.1"),
                ("section_1_2", "Section 1.2"),
            ]
        );
        assert_eq!(doc.chapters[1].sections[1].chunks[0].content, "Section 1.1 Alpha body.");

        let second: Vec<_> = doc.chapters[2].sections.iter().map(|s| s.section_id.as_str()).collect();
        assert_eq!(second, vec!["section_2_1"]);
    }

    #[test]
    fn headingless_text_becomes_preamble() {
        let indexer = HierarchicalIndexer::new();
        let doc = indexer.build_hierarchical_tree("memo.pdf", "Just a memo about totals.");

        assert_eq!(doc.chapters.len(), 1);
        assert_eq!(doc.chapters[0].chapter_id, "chapter_0");
        assert_eq!(doc.chapters[0].sections.len(), 1);
        assert_eq!(doc.chapters[0].sections[0].section_id, "section_0_0");
    }

    #[test]
    fn long_sections_are_chunked() {
        let indexer = HierarchicalIndexer::with_processor(DocumentProcessor::with_chunk_size(10));
        let doc = indexer.build_hierarchical_tree("a.pdf", "Section 1.1 abcdefghijklmnop");
        let chunks = &doc.chapters[0].sections[0].chunks;
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 10));
    }

    #[test]
    fn index_round_trips_through_disk() {
        let indexer = HierarchicalIndexer::new();
        let documents = vec![Document {
            id: "1".to_string(),
            filename: "book.pdf".to_string(),
            content: BOOK.to_string(),
        }];
        let index = indexer.build_index(&documents);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        index.save_index(&path).unwrap();
        let loaded = DocumentIndex::load_index(&path).unwrap();

        assert_eq!(loaded.chunk_count(), index.chunk_count());
        assert_eq!(loaded.vocabulary, index.vocabulary);
    }

    #[test]
    fn loading_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, "not json").unwrap();
        assert!(DocumentIndex::load_index(&path).is_err());
    }
}
