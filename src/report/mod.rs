//! Rendering of analysis reports, explanations and history.

pub mod generator;

pub use generator::*;
