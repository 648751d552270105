//! Flat container records and codecs for mapstudio.
//!
//! This crate provides:
//! - [`Record`] and [`FlatContainer`] - The unlinked, name-addressed form of a map
//! - [`decode`] and [`encode`] - The little-endian binary container
//! - [`to_json`] and [`from_json`] - A human-readable dump that passes every
//!   field through its adapter

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod binary;
pub mod json;
pub mod record;

pub use binary::{FORMAT_VERSION, MAGIC, decode, encode};
pub use json::{from_json, from_json_value, to_json, to_json_value};
pub use record::{FlatContainer, Record};
