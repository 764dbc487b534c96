//! Batch front end for the Tavola retrieval engine.
//!
//! `tavola build` runs the offline phase: records → documents →
//! embeddings → index, persisted as one knowledge-base directory.
//! `tavola ask` runs the online phase for a single question.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use tavola_rag::mock::{ExtractiveGenerator, HashEmbedder};
use tavola_rag::{
    DocumentBuilder, EmbeddingStore, EngineConfig, INDEX_FILE, RestaurantRecord, RetrievalEngine,
    SimilarityIndex,
};

#[derive(Parser)]
#[command(name = "tavola", version, about = "Restaurant knowledge-base builder and query runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a knowledge base from a JSON array of restaurant records.
    Build {
        /// Path to the restaurant records JSON file.
        #[arg(long)]
        records: PathBuf,
        /// Directory the knowledge base is written into.
        #[arg(long, default_value = "knowledge_base")]
        out: PathBuf,
        /// Embedding dimension for the bundled offline embedder.
        #[arg(long, default_value_t = 128)]
        dimension: usize,
    },
    /// Answer a single question from a built knowledge base.
    Ask {
        /// Knowledge base directory produced by `build`.
        #[arg(long, default_value = "knowledge_base")]
        kb: PathBuf,
        /// Embedding dimension; must match the one used at build time.
        #[arg(long, default_value_t = 128)]
        dimension: usize,
        /// Number of documents retrieved into the context.
        #[arg(long, default_value_t = 5)]
        top_k: usize,
        /// The question to answer.
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build { records, out, dimension } => build(records, out, dimension).await,
        Command::Ask { kb, dimension, top_k, question } => {
            ask(kb, dimension, top_k, &question).await
        }
    }
}

async fn build(records_path: PathBuf, out: PathBuf, dimension: usize) -> anyhow::Result<()> {
    let raw = fs::read(&records_path)
        .with_context(|| format!("reading records from {}", records_path.display()))?;
    let records: Vec<RestaurantRecord> =
        serde_json::from_slice(&raw).context("parsing restaurant records")?;
    info!(restaurants = records.len(), "loaded restaurant records");

    let documents = DocumentBuilder::new().build_all(&records)?;
    info!(documents = documents.len(), "built documents");

    let embedder = HashEmbedder::new(dimension);
    let store = EmbeddingStore::build(documents, &embedder).await?;
    let vectors: Vec<Vec<f32>> = store.rows().map(<[f32]>::to_vec).collect();
    let index = SimilarityIndex::build(&vectors)?;

    store.persist(&out)?;
    index.persist(&out.join(INDEX_FILE))?;

    println!(
        "Knowledge base built: {} restaurants, {} documents -> {}",
        records.len(),
        store.len(),
        out.display()
    );
    Ok(())
}

async fn ask(kb: PathBuf, dimension: usize, top_k: usize, question: &str) -> anyhow::Result<()> {
    let config = EngineConfig::builder().top_k(top_k).build()?;
    let engine = RetrievalEngine::open(
        &kb,
        Arc::new(HashEmbedder::new(dimension)),
        // No generation model is bundled; the extractive generator
        // surfaces the retrieved context as the answer.
        Arc::new(ExtractiveGenerator),
        config,
    )?;

    let answer = engine.answer(question).await?;
    println!("{answer}");
    Ok(())
}
