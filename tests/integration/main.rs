//! End-to-end tests across every layer.
//!
//! Tests for lossless round trips, the minimal and dangling-reference
//! scenarios, and the pipeline with payload collaborators and files.

#[path = "../support/mod.rs"]
mod support;

mod pipeline;
mod scenarios;
