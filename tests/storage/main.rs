//! Integration tests for Layer 2: Storage
//!
//! Tests for the model table and the entity store.

#[path = "../support/mod.rs"]
mod support;

mod store;
