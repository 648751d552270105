//! Error types for mapstudio.
//!
//! Every error here is fatal for the operation that produced it. Recoverable
//! conditions are reported through [`crate::Diagnostics`] instead.

use std::fmt;

use thiserror::Error;

use crate::game::{Family, GameVariant};
use crate::handle::NodeId;
use crate::types::FieldType;

/// The main error type for mapstudio operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: FieldType, actual: FieldType) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an unregistered subtype error.
    #[must_use]
    pub fn unregistered_subtype(variant: GameVariant, family: Family, tag: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnregisteredSubtype {
            variant,
            family,
            tag: tag.into(),
        })
    }

    /// Creates a bit-set width mismatch error.
    #[must_use]
    pub fn bit_width_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::BitSetWidthMismatch { expected, actual })
    }

    /// Creates a container corruption error.
    #[must_use]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Corrupt(message.into()))
    }

    /// Creates a node not found error.
    #[must_use]
    pub fn node_not_found(id: NodeId) -> Self {
        Self::new(ErrorKind::NodeNotFound(id))
    }

    /// Creates a stale node reference error.
    #[must_use]
    pub fn stale_node(id: NodeId) -> Self {
        Self::new(ErrorKind::StaleNode(id))
    }

    /// Creates a field not found error.
    #[must_use]
    pub fn field_not_found(subtype: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(ErrorKind::FieldNotFound {
            subtype: subtype.into(),
            field: field.into(),
        })
    }

    /// Creates a duplicate name error.
    #[must_use]
    pub fn duplicate_name(family: Family, name: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateName {
            family,
            name: name.into(),
        })
    }

    /// Combines several errors into one.
    ///
    /// A single error is returned unchanged rather than wrapped.
    #[must_use]
    pub fn aggregate(mut errors: Vec<Error>) -> Self {
        if errors.len() == 1 {
            return errors.remove(0);
        }
        Self::new(ErrorKind::Aggregate(errors))
    }

    /// Returns true if this error indicates a schema bug rather than bad data.
    ///
    /// An aggregate is a configuration error if any of its members is.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match &self.kind {
            ErrorKind::UnregisteredSubtype { .. } | ErrorKind::BitSetWidthMismatch { .. } => true,
            ErrorKind::Aggregate(errors) => errors.iter().any(Error::is_configuration),
            _ => false,
        }
    }

    /// Returns the member errors of an aggregate, or this error alone.
    #[must_use]
    pub fn flatten(&self) -> Vec<&Error> {
        match &self.kind {
            ErrorKind::Aggregate(errors) => errors.iter().flat_map(Error::flatten).collect(),
            _ => vec![self],
        }
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// No descriptor is registered for a subtype tag in this game variant.
    #[error("unregistered subtype {tag:?} for {family} in {variant}")]
    UnregisteredSubtype {
        /// Game variant being decoded or encoded.
        variant: GameVariant,
        /// Record family of the tag.
        family: Family,
        /// The subtype tag as found in the container.
        tag: String,
    },

    /// The container header names a game variant this engine does not know.
    #[error("unknown game variant code: {0}")]
    UnknownVariant(u32),

    /// A bit-set value did not match the declared width of its field.
    #[error("bit-set width mismatch: expected {expected} bits, got {actual}")]
    BitSetWidthMismatch {
        /// Declared width in bits.
        expected: usize,
        /// Width of the value supplied.
        actual: usize,
    },

    /// A field value did not match the declared field type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: FieldType,
        /// The actual type encountered.
        actual: FieldType,
    },

    /// A descriptor has no field with this name.
    #[error("field not found: {field} on {subtype}")]
    FieldNotFound {
        /// Subtype that was queried.
        subtype: String,
        /// Field name that was not found.
        field: String,
    },

    /// An exported node references a node that is not part of the export set.
    #[error("{family} {source_name:?} field {field} references {target:?}, which is not being exported")]
    MissingExportTarget {
        /// Family of the referencing node.
        family: Family,
        /// Name of the referencing node.
        source_name: String,
        /// Reference field name.
        field: String,
        /// Name of the missing target.
        target: String,
    },

    /// An exported node references a synthesized placeholder node.
    #[error("{family} {source_name:?} field {field} references placeholder {target_family} {target:?}; materialize it before export")]
    PlaceholderExport {
        /// Family of the referencing node.
        family: Family,
        /// Name of the referencing node.
        source_name: String,
        /// Reference field name.
        field: String,
        /// Family of the placeholder target.
        target_family: Family,
        /// Name of the placeholder target.
        target: String,
    },

    /// Two records in the same family share a name.
    #[error("duplicate {family} name: {name:?}")]
    DuplicateName {
        /// Family containing the duplicate.
        family: Family,
        /// The duplicated name.
        name: String,
    },

    /// Two mutually exclusive fields were both set and strict checking is on.
    #[error("{subtype} {name:?}: fields {first} and {second} are mutually exclusive")]
    ExclusiveFields {
        /// Subtype tag of the node.
        subtype: String,
        /// Node name.
        name: String,
        /// First field of the pair.
        first: String,
        /// Second field of the pair.
        second: String,
    },

    /// Structurally invalid container data.
    #[error("corrupt container: {0}")]
    Corrupt(String),

    /// The container ended before a complete value could be read.
    #[error("truncated container at offset {offset}: {message}")]
    Truncated {
        /// Byte offset where reading failed.
        offset: u64,
        /// What was being read.
        message: String,
    },

    /// A model name whose subtype cannot be inferred.
    #[error("invalid model name: {0:?}")]
    InvalidModelName(String),

    /// Node was not found in the store.
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Node handle is stale (generation mismatch).
    #[error("stale node reference: {0:?}")]
    StaleNode(NodeId),

    /// A payload collaborator failed.
    #[error("payload error: {0}")]
    Payload(String),

    /// JSON dump or report serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Several fatal errors raised by one operation.
    #[error("{} errors: {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<Error>),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Record family being processed.
    pub family: Option<Family>,
    /// Record or node name.
    pub record: Option<String>,
    /// Field name.
    pub field: Option<String>,
    /// Byte offset into the container, when decoding.
    pub offset: Option<u64>,
    /// Stack of enclosing operations, innermost last.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the family and record name.
    #[must_use]
    pub fn with_record(mut self, family: Family, name: impl Into<String>) -> Self {
        self.family = Some(family);
        self.record = Some(name.into());
        self
    }

    /// Sets the field name.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Sets the byte offset.
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(family), Some(record)) = (self.family, &self.record) {
            write!(f, "in {family} {record:?}")?;
            if let Some(field) = &self.field {
                write!(f, " field {field}")?;
            }
        }
        if let Some(offset) = self.offset {
            write!(f, " at offset {offset:#x}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
