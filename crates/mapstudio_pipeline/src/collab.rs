//! Interfaces to the collaborators the engine does not implement.
//!
//! The geometry and texture codecs live outside this workspace. The pipeline
//! only asks them for opaque payload handles by model name, and hands dirty
//! models back together with their canonical path.

use mapstudio_foundation::Result;
use mapstudio_schema::ModelSubtype;
use mapstudio_storage::{Model, PayloadHandle};

pub use mapstudio_storage::{PathConvention, StandardPathConvention};

/// Looks up model payloads by name.
///
/// Lookups are independent and may run on several worker threads at once.
pub trait PayloadSource: Send + Sync {
    /// Loads the payload for a model.
    ///
    /// `Ok(None)` means the payload does not exist, which is recoverable.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself failed.
    fn load(&self, name: &str, subtype: ModelSubtype) -> Result<Option<PayloadHandle>>;
}

/// Writes edited model payloads back to external storage.
pub trait PayloadSink: Send + Sync {
    /// Writes `model`'s payload to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload could not be written.
    fn write(&self, model: &Model, path: &str) -> Result<()>;
}

/// Collaborator that has no payloads and discards writes.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoPayloads;

impl PayloadSource for NoPayloads {
    fn load(&self, _name: &str, _subtype: ModelSubtype) -> Result<Option<PayloadHandle>> {
        Ok(None)
    }
}

impl PayloadSink for NoPayloads {
    fn write(&self, _model: &Model, _path: &str) -> Result<()> {
        Ok(())
    }
}
