//! Orchestration layer: provider selection, resilience, and response repair.
//!
//! [`AidOrchestrator`] is the single entry point the application surface
//! talks to. It validates input, resolves a provider through the registry,
//! wraps each upstream call in a timeout and retry loop, records metrics,
//! and runs every delivered reply through the repair pipeline so callers
//! always receive a schema-valid [`StructuredAid`](memoraid_core::StructuredAid).

pub mod manager;
pub mod repair;

pub use manager::AidOrchestrator;
pub use memoraid_core::{compute_review_schedule, REVIEW_OFFSETS_MINUTES};
