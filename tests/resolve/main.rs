//! Integration tests for Layer 4: Resolve
//!
//! Tests for both import phases, the mutual reference pair and the export
//! phases.

#[path = "../support/mod.rs"]
mod support;

mod cycle;
mod import;
