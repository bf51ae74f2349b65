// Offline indexer: extracts the given PDFs, builds the hierarchical index and
// saves it as JSON. With --query it also prints the best matching sections.

use anyhow::Result;
use clap::Parser;
use docqa_rag::{retrieval, DocumentIndex, DocumentProcessor, HierarchicalIndexer, RetrievalMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "docqa-index", about = "Build a hierarchical index from PDF files")]
struct Args {
    /// PDF files to index
    #[arg(required_unless_present = "load")]
    pdfs: Vec<PathBuf>,

    /// Where to write the index
    #[arg(short, long, default_value = "index.json")]
    output: PathBuf,

    /// Skip extraction and query an index saved earlier
    #[arg(long, conflicts_with = "pdfs")]
    load: Option<PathBuf>,

    /// Print the best sections for this question
    #[arg(short, long)]
    query: Option<String>,

    #[arg(long, default_value = "semantic")]
    mode: RetrievalMode,

    #[arg(long, default_value_t = docqa_rag::DEFAULT_TOP_N)]
    top_n: usize,

    /// Also print preprocessing output (sentences, keywords, word counts) per document
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let index = match &args.load {
        Some(path) => DocumentIndex::load_index(path)?,
        None => {
            let processor = DocumentProcessor::new();
            let documents = processor.extract_text_from_pdfs(&args.pdfs)?;

            if args.verbose {
                for doc in &documents {
                    let processed = processor.process_document(doc);
                    println!(
                        "{}: {} sentences, {} words, {} chunks, keywords: {:?}",
                        processed.filename,
                        processed.sentences.len(),
                        processed.preprocessed_words.len(),
                        processed.text_chunks.len(),
                        processed.keywords
                    );
                }
            }

            let index = HierarchicalIndexer::with_processor(processor).build_index(&documents);
            index.save_index(&args.output)?;
            println!("Index written to {}", args.output.display());
            index
        }
    };

    if let Some(query) = &args.query {
        for section in retrieval::retrieve(args.mode, query, &index, args.top_n) {
            println!(
                "[{:.3}] {} / {}: {}",
                section.similarity_score, section.document, section.section_title, section.content
            );
        }
    }

    Ok(())
}
