//! Core identifiers, values, and errors for mapstudio.
//!
//! This crate provides:
//! - [`NodeId`], [`ModelId`], [`Handle`] - Handles into the linked entity graph
//! - [`Value`] - Field values, generic over how references are represented
//! - [`Family`], [`GameVariant`] - Record families and target games
//! - [`FieldType`] - Type descriptors for descriptor validation
//! - [`BitSet`] - Fixed-width packed flag vectors ([`BitSet128`], [`BitSet256`])
//! - [`Error`] - Fatal errors with context
//! - [`Diagnostics`] - Recoverable, operation-scoped warnings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bits;
pub mod diagnostic;
pub mod error;
pub mod game;
pub mod handle;
pub mod types;
pub mod value;

pub use bits::{BitSet, BitSet128, BitSet256, BitWidth};
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{Error, ErrorContext, ErrorKind};
pub use game::{Family, GameVariant, TextEncoding};
pub use handle::{Handle, ModelId, NodeId};
pub use types::FieldType;
pub use value::{FlatValue, NodeValue, Value};

/// Result type used throughout mapstudio.
pub type Result<T> = std::result::Result<T, Error>;
