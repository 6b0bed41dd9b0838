//! JSON-array snapshot files
//!
//! A snapshot is a UTF-8 JSON array of records, indented with two spaces,
//! non-ASCII left unescaped, with a trailing newline.

use crate::error::{ArchiveError, Result};
use crate::etl::{Extractor, Loader};

use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Read a snapshot back into memory
pub struct SnapshotReader {
    path: PathBuf,
}

impl SnapshotReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records
    ///
    /// # Errors
    /// [`ArchiveError::Io`] if the file cannot be opened, and
    /// [`ArchiveError::Format`] if it is not JSON or its root is not an array.
    pub fn read(&self) -> Result<Vec<Value>> {
        let file = File::open(&self.path).map_err(|e| ArchiveError::io(&self.path, e))?;
        let value: Value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            if e.is_io() {
                ArchiveError::io(&self.path, e.into())
            } else {
                ArchiveError::format(&self.path, format!("Invalid JSON: {}", e))
            }
        })?;

        match value {
            Value::Array(records) => Ok(records),
            other => Err(ArchiveError::format(
                &self.path,
                format!("Expected a JSON array at root, got {}", type_name(&other)),
            )),
        }
    }
}

impl Extractor for SnapshotReader {
    type Item = Value;

    async fn extract(&self) -> eyre::Result<Vec<Self::Item>> {
        Ok(self.read()?)
    }
}

/// Write records as a snapshot
pub struct SnapshotWriter {
    path: PathBuf,
    atomic: bool,
}

impl SnapshotWriter {
    /// Writer that truncates and rewrites `path` directly
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            atomic: false,
        }
    }

    /// Writer that goes through a temporary sibling file and renames it over
    /// `path`, so readers never observe a half-written snapshot
    pub fn atomic(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            atomic: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole array in one operation
    pub fn write(&self, records: &[Value]) -> Result<()> {
        if self.atomic {
            return replace_atomically(&self.path, "._snapshot_", |w| write_records(w, records));
        }

        let file = File::create(&self.path).map_err(|e| ArchiveError::io(&self.path, e))?;
        let mut writer = BufWriter::new(file);
        write_records(&mut writer, records)
            .and_then(|()| writer.flush())
            .map_err(|e| ArchiveError::io(&self.path, e))
    }
}

impl Loader for SnapshotWriter {
    type Item = Value;

    async fn load(&self, items: Vec<Self::Item>) -> eyre::Result<usize> {
        self.write(&items)?;
        Ok(items.len())
    }
}

/// Serialize `records` in snapshot layout
pub fn write_records(writer: &mut dyn Write, records: &[Value]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, records)?;
    writer.write_all(b"\n")
}

/// Replace `path` with whatever `write` produces, all or nothing.
///
/// The content goes to a temporary file in the same directory which is
/// renamed over `path` only after `write` succeeds and the data is synced.
/// On any failure the temporary file is removed and `path` is untouched.
pub fn replace_atomically<F>(path: &Path, prefix: &str, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".json")
        .tempfile_in(dir)
        .map_err(|e| ArchiveError::io(dir, e))?;
    log::trace!("Staging {} via {}", path.display(), temp.path().display());

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)
            .and_then(|()| writer.flush())
            .map_err(|e| ArchiveError::io(path, e))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| ArchiveError::io(path, e))?;

    temp.persist(path)
        .map_err(|e| ArchiveError::io(path, e.error))?;

    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
