//! Snapshot cleaning
//!
//! Removes empty-text records from a snapshot on disk. Cleaning in place
//! goes through a temporary file and an atomic rename, so a failure at any
//! point leaves the original snapshot byte-for-byte intact.
//!
//! Two cleaners must not run against the same file at once; nothing here
//! locks the file.

use crate::error::{ArchiveError, Result};
use crate::storage::{SnapshotReader, SnapshotWriter, replace_atomically, write_records};
use crate::transform::EmptyTextFilter;

use std::path::{Path, PathBuf};

/// Outcome of a [`clean`] run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanReport {
    /// Records in the input snapshot
    pub input: usize,
    /// Records dropped by the filter
    pub removed: usize,
    /// Records written
    pub output: usize,
    /// Where the cleaned snapshot went
    pub written_to: PathBuf,
    /// Whether the input was replaced atomically
    pub in_place: bool,
}

/// Drop records whose `text` is exactly `sentinel` from the snapshot at
/// `input`.
///
/// With `output` omitted, or pointing at the same file as `input`, the
/// input is replaced atomically. Otherwise `output` is written directly.
///
/// # Errors
/// - [`ArchiveError::Format`] if the input root is not an array (nothing is
///   written)
/// - [`ArchiveError::Io`] on any read or write failure
pub fn clean(input: impl AsRef<Path>, sentinel: &str, output: Option<&Path>) -> Result<CleanReport> {
    let input = absolute(input.as_ref())?;
    let output = match output {
        Some(path) => absolute(path)?,
        None => input.clone(),
    };
    let in_place = output == input;

    let records = SnapshotReader::new(&input).read()?;
    let total = records.len();

    let (kept, removed) = EmptyTextFilter::new(sentinel).apply(records);
    log::debug!(
        "Filtered {} of {} record(s) matching {:?}",
        removed,
        total,
        sentinel
    );

    if in_place {
        replace_atomically(&input, "._clean_", |w| write_records(w, &kept))?;
    } else {
        SnapshotWriter::new(&output).write(&kept)?;
    }

    Ok(CleanReport {
        input: total,
        removed,
        output: kept.len(),
        written_to: output,
        in_place,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| ArchiveError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_clean_in_place() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tweets.json");
        std::fs::write(
            &path,
            r#"[{"text":"<p></p>"},{"text":"hi"},{"text":" <p></p> "}]"#,
        )
        .unwrap();

        let report = clean(&path, "<p></p>", None).unwrap();
        assert_eq!(report.input, 3);
        assert_eq!(report.removed, 1);
        assert_eq!(report.output, 2);
        assert!(report.in_place);

        assert_eq!(read(&path), json!([{"text": "hi"}, {"text": " <p></p> "}]));
        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temporary file left behind");
    }

    #[test]
    fn test_clean_to_other_file() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("tweets.json");
        let output = temp.path().join("clean.json");
        let original = "[\"loose\", {\"text\": \"<p></p>\"}]";
        std::fs::write(&input, original).unwrap();

        let report = clean(&input, "<p></p>", Some(&output)).unwrap();
        assert!(!report.in_place);
        assert_eq!(report.written_to, output);
        assert_eq!(report.removed, 1);

        assert_eq!(std::fs::read_to_string(&input).unwrap(), original);
        assert_eq!(read(&output), json!(["loose"]));
    }

    #[test]
    fn test_same_path_spelled_differently_is_in_place() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("tweets.json");
        std::fs::write(&input, "[]").unwrap();

        let output = temp.path().join(".").join("tweets.json");
        let report = clean(&input, "<p></p>", Some(&output)).unwrap();
        assert!(report.in_place);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_in_place_clean_leaves_input() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("locked");
        std::fs::create_dir(&dir).unwrap();
        let input = dir.join("tweets.json");
        let original = "[\n  {\"text\": \"<p></p>\"},\n  {\"text\": \"hi\"}\n]";
        std::fs::write(&input, original).unwrap();

        // no temporary file can be created beside the input
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();
        let writable = std::fs::File::create(dir.join("check")).is_ok();

        let result = clean(&input, "<p></p>", None);
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
        if writable {
            // permissions are not enforced for this user (root)
            return;
        }

        assert!(matches!(result.unwrap_err(), ArchiveError::Io { .. }));
        assert_eq!(std::fs::read_to_string(&input).unwrap(), original);
        let entries: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_non_array_root_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("tweets.json");
        let output = temp.path().join("clean.json");
        std::fs::write(&input, r#"{"text": "<p></p>"}"#).unwrap();

        let err = clean(&input, "<p></p>", Some(&output)).unwrap_err();
        assert!(matches!(err, ArchiveError::Format { .. }));
        assert!(!output.exists());
    }
}
