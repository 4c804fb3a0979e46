//! Scoped append-only CSV writer
//!
//! Each batch is one open-append-flush-close cycle: no long-lived handle, so
//! an operator interrupt between batches always leaves a valid file behind.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

use super::{OutputError, OutputResult};

/// Append a batch of rows to a CSV file, writing `header` first iff the file
/// is currently empty. Returns the number of rows written.
pub fn append_rows<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: &[T],
) -> OutputResult<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::Io(format!(
                    "failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| OutputError::Io(format!("failed to open {}: {e}", path.display())))?;

    let write_header = file
        .metadata()
        .map_err(|e| OutputError::Io(format!("failed to stat {}: {e}", path.display())))?
        .len()
        == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));

    if write_header {
        writer
            .write_record(header)
            .map_err(|e| OutputError::Csv(format!("failed to write header: {e}")))?;
    }

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| OutputError::Csv(format!("failed to write row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| OutputError::Io(format!("failed to flush {}: {e}", path.display())))?;

    debug!(
        "appended {} rows to {} (header written: {write_header})",
        rows.len(),
        path.display()
    );
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Row {
        name: String,
        value: u32,
    }

    const HEADER: [&str; 2] = ["Name", "Value"];

    fn row(name: &str, value: u32) -> Row {
        Row {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn test_header_written_once_across_batches() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");

        append_rows(&path, &HEADER, &[row("a", 1), row("b", 2)]).unwrap();
        append_rows(&path, &HEADER, &[row("c", 3)]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Name,Value");
        assert_eq!(
            contents.matches("Name,Value").count(),
            1,
            "header must appear exactly once:\n{contents}"
        );
        assert_eq!(lines[3], "c,3");
    }

    #[test]
    fn test_empty_batch_still_writes_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");

        let written = append_rows::<Row>(&path, &HEADER, &[]).unwrap();
        assert_eq!(written, 0);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), "Name,Value");
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/deep/out.csv");

        append_rows(&path, &HEADER, &[row("a", 1)]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_reruns_duplicate_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");

        append_rows(&path, &HEADER, &[row("a", 1)]).unwrap();
        append_rows(&path, &HEADER, &[row("a", 1)]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("a,1").count(), 2);
    }
}
