//! Recoverable, operation-scoped diagnostics.
//!
//! A pipeline call owns one [`Diagnostics`] list and returns it alongside its
//! result. Recording a diagnostic also emits a `tracing` warning, so hosts
//! that only look at logs still see it.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::game::Family;

/// Category of a recoverable condition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiagnosticKind {
    /// A referenced model had no declaration; a placeholder model was created.
    PlaceholderModel,
    /// A declared model's payload could not be loaded.
    MissingPayload,
    /// A referenced node did not exist; a placeholder node was created.
    PlaceholderNode,
    /// A reference named a node of the wrong subtype.
    SubtypeMismatch,
    /// Two records in one family shared a name; the last one won.
    DuplicateName,
    /// The two sides of a mutual reference pair disagreed.
    CycleDisagreement,
    /// Both fields of a mutually exclusive pair were set.
    ExclusiveFields,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PlaceholderModel => "placeholder-model",
            Self::MissingPayload => "missing-payload",
            Self::PlaceholderNode => "placeholder-node",
            Self::SubtypeMismatch => "subtype-mismatch",
            Self::DuplicateName => "duplicate-name",
            Self::CycleDisagreement => "cycle-disagreement",
            Self::ExclusiveFields => "exclusive-fields",
        };
        f.write_str(s)
    }
}

/// One recoverable condition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostic {
    /// Category.
    pub kind: DiagnosticKind,
    /// Family of the record the diagnostic is about.
    pub family: Family,
    /// Name of the record the diagnostic is about.
    pub name: String,
    /// Human-readable detail.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {:?}: {}",
            self.kind, self.family, self.name, self.message
        )
    }
}

/// Append-only list of diagnostics for one operation.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic and logs it.
    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        family: Family,
        name: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            family,
            name: name.into(),
            message: message.into(),
        };
        tracing::warn!(
            kind = %diagnostic.kind,
            family = %diagnostic.family,
            name = %diagnostic.name,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    /// Appends every diagnostic from another list without logging again.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of diagnostics of one kind.
    #[must_use]
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Iterates over diagnostics in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
