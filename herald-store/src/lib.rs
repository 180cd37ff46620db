//! # herald-store
//!
//! Durable content store, integrity validator and the canonical document
//! façade.
//!
//! Read and write content through [`ContentRepository`]: it repairs what it
//! reads, caches canonical documents for this context and announces every
//! write on the configured [`herald_core::Broadcast`].

pub mod error;
pub mod integrity;
pub mod paths;
pub mod repository;
pub mod store;

pub use error::StoreError;
pub use integrity::{DefaultReason, RepairOutcome, RepairReport};
pub use repository::{ContentRepository, DocumentCache};
pub use store::FileStore;
