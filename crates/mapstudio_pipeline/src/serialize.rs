//! Container files on disk.
//!
//! This module provides functions for saving and loading flat containers
//! in the binary container format, plus the human-readable JSON dump used
//! for diffing.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use mapstudio_codec::{FlatContainer, decode, encode, from_json, to_json};
use mapstudio_foundation::{Error, ErrorKind, Result};
use mapstudio_schema::SubtypeRegistry;

/// Saves a container to a file in the binary container format.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
///
/// # Errors
///
/// Returns an error if the container cannot be encoded, or if the file
/// cannot be created or written to.
pub fn save_to_file<P: AsRef<Path>>(
    container: &FlatContainer,
    registry: &SubtypeRegistry,
    path: P,
) -> Result<()> {
    let bytes = encode(container, registry)?;
    write_file(path.as_ref(), &bytes)
}

/// Loads a container from a binary container file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if decoding fails.
pub fn load_from_file<P: AsRef<Path>>(path: P, registry: &SubtypeRegistry) -> Result<FlatContainer> {
    let bytes = read_file(path.as_ref())?;
    decode(&bytes, registry)
}

/// Writes the JSON dump of a container to a file.
///
/// # Errors
///
/// Returns an error if a value cannot be represented in JSON, or if the file
/// cannot be created or written to.
pub fn dump_json_to_file<P: AsRef<Path>>(
    container: &FlatContainer,
    registry: &SubtypeRegistry,
    path: P,
) -> Result<()> {
    let text = to_json(container, registry)?;
    write_file(path.as_ref(), text.as_bytes())
}

/// Reads a container from a JSON dump file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not UTF-8, or does not
/// describe a valid container.
pub fn load_json_from_file<P: AsRef<Path>>(
    path: P,
    registry: &SubtypeRegistry,
) -> Result<FlatContainer> {
    let bytes = read_file(path.as_ref())?;
    let text = String::from_utf8(bytes).map_err(|e| {
        Error::new(ErrorKind::Serialization(format!(
            "file '{}' is not UTF-8: {e}",
            path.as_ref().display()
        )))
    })?;
    from_json(&text, registry)
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to create file '{}': {e}",
            path.display()
        )))
    })?;

    let mut writer = BufWriter::new(file);
    writer.write_all(bytes).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to write to file '{}': {e}",
            path.display()
        )))
    })?;

    writer.flush().map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to flush file '{}': {e}",
            path.display()
        )))
    })?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to open file '{}': {e}",
            path.display()
        )))
    })?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to read file '{}': {e}",
            path.display()
        )))
    })?;

    Ok(bytes)
}
