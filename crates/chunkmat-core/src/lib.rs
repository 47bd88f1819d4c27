//! Core data structures for chunked sparse matrices (pure Rust)

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod error;
pub mod matrix;
pub mod partition;
pub mod pattern;
pub mod util;

pub use config::Tuning;
pub use error::{ChunkError, Result};
pub use matrix::{ChunkSparseMatrix, IdentityMatrix};
pub use pattern::ChunkSparsityPattern;
