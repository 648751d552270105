//! Integration tests for Layer 1: Schema
//!
//! Tests for field adapters, entity descriptors and the subtype registry.

#[path = "../support/mod.rs"]
mod support;

mod adapters;
