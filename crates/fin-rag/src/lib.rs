//! fin-rag: question answering over financial documents
//!
//! Documents are fetched from a URL or uploaded, stored in a local directory,
//! split into overlapping chunks, embedded with Gemini and indexed in Pinecone.
//! Questions are answered by retrieving the closest chunks and prompting Gemini
//! as a financial analyst restricted to that context.

pub mod acquisition;
pub mod chain;
pub mod config;
pub mod error;
pub mod generation;
pub mod indexing;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod types;

pub use chain::QaChain;
pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{Chunk, Document, FileType};
