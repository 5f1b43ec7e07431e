//! Core domain types and traits for memoraid.
//!
//! This crate defines the structured memory aid document, the provider
//! capability trait that every LLM backend implements, the error taxonomy,
//! and the deterministic review scheduler. It has no I/O of its own.

pub mod aid;
pub mod error;
pub mod provider;
pub mod schedule;

pub use aid::{Language, MindMapNode, Mnemonic, MnemonicType, SenseKind, SenseRecord, SensoryAssociation, StructuredAid};
pub use error::{Error, ProviderError, Result};
pub use provider::{AidProvider, ProviderRole};
pub use schedule::{REVIEW_OFFSETS_MINUTES, compute_review_schedule};
