//! Contract analysis.
//!
//! Normalization of server payloads, the text/upload orchestration built on
//! top of it, and finding statistics for the renderers.

pub mod aggregator;
pub mod normalizer;
pub mod orchestrator;

pub use aggregator::*;
pub use orchestrator::{AnalysisRoute, ContractAnalysisOrchestrator};
