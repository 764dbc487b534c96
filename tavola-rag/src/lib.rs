//! # tavola-rag
//!
//! Knowledge retrieval engine behind the Tavola restaurant assistant.
//!
//! ## Overview
//!
//! The crate turns restaurant records (basic info, menu rows, reviews)
//! into addressable text documents, embeds them into a vector space,
//! indexes the vectors for exact nearest-neighbor search, and at query
//! time retrieves the top-matching documents to ground a text
//! generator:
//!
//! - [`DocumentBuilder`] — record → documents, offline
//! - [`EmbeddingStore`] — documents + vectors in lockstep, persisted
//! - [`SimilarityIndex`] — flat exact k-NN over the vectors, persisted
//! - [`RetrievalEngine`] — embed → search → generate, online
//! - [`ConversationLog`] — per-session question/answer history
//!
//! The embedding and generation models are consumed through the
//! [`Embedder`] and [`Generator`] collaborator traits; the [`mock`]
//! module ships deterministic offline implementations.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tavola_rag::{
//!     DocumentBuilder, EmbeddingStore, EngineConfig, RetrievalEngine, SimilarityIndex,
//!     mock::{HashEmbedder, StaticGenerator},
//! };
//!
//! // Offline build phase
//! let embedder = HashEmbedder::new(128);
//! let documents = DocumentBuilder::new().build_all(&records)?;
//! let store = EmbeddingStore::build(documents, &embedder).await?;
//! let index = SimilarityIndex::build(&store.rows().map(<[f32]>::to_vec).collect::<Vec<_>>())?;
//! store.persist(kb_dir)?;
//! index.persist(&kb_dir.join(tavola_rag::INDEX_FILE))?;
//!
//! // Online serving phase
//! let engine = RetrievalEngine::open(
//!     kb_dir,
//!     Arc::new(embedder),
//!     Arc::new(StaticGenerator::new("Answer: hello")),
//!     EngineConfig::default(),
//! )?;
//! let answer = engine.answer("Where can I get a budget latte?").await?;
//! ```

pub mod builder;
pub mod config;
pub mod conversation;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;
pub mod mock;
pub mod record;
pub mod store;

pub use builder::DocumentBuilder;
pub use config::{EngineConfig, EngineConfigBuilder};
pub use conversation::{ConversationLog, ConversationTurn};
pub use document::{Document, DocumentKind, PriceCategory};
pub use embedding::Embedder;
pub use engine::RetrievalEngine;
pub use error::{RagError, Result};
pub use generation::Generator;
pub use index::{DistanceMetric, INDEX_FILE, SearchHit, SimilarityIndex};
pub use record::{MenuItem, RestaurantRecord, Review};
pub use store::{DOCUMENTS_FILE, EMBEDDINGS_FILE, EmbeddingStore, MANIFEST_FILE};
