//! Row file discovery and loading.
//!
//! Rows arrive already split into `column -> value` objects, either as a JSON
//! array (`.json`) or one object per line (`.jsonl`), and are converted into
//! [`RawRow`]s for the normalizer.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use flow_core::error::{MetricsError, Result};
use flow_core::models::RawRow;
use serde_json::Value;
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Find the row files under `data_path`.
///
/// A file path is returned as-is. A directory is scanned recursively for
/// `.json` and `.jsonl` files, sorted by path.
pub fn find_row_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }
    if data_path.is_file() {
        return vec![data_path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_row_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every row under `data_path`, in file order then line order.
pub fn load_rows(data_path: &Path) -> Result<Vec<RawRow>> {
    if !data_path.exists() {
        return Err(MetricsError::DataPathNotFound(data_path.to_path_buf()));
    }

    let files = find_row_files(data_path);
    if files.is_empty() {
        return Err(MetricsError::NoDataFiles(data_path.to_path_buf()));
    }

    let mut rows: Vec<RawRow> = Vec::new();
    for file_path in &files {
        let loaded = if has_extension(file_path, "jsonl") {
            read_jsonl_file(file_path)?
        } else {
            read_json_file(file_path)?
        };
        debug!("File {}: {} rows", file_path.display(), loaded.len());
        rows.extend(loaded);
    }

    debug!("Loaded {} rows from {} files", rows.len(), files.len());
    Ok(rows)
}

/// Convert a JSON object into a [`RawRow`]. Scalars are stringified, `null`
/// becomes the empty string and nested values keep their JSON text.
///
/// Returns `None` when `value` is not an object.
pub fn row_from_value(value: &Value) -> Option<RawRow> {
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .map(|(column, v)| (column.clone(), cell_text(v)))
            .collect(),
    )
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_row_file(path: &Path) -> bool {
    has_extension(path, "json") || has_extension(path, "jsonl")
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().map(|e| e == ext).unwrap_or(false)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn open(file_path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(file_path).map_err(|source| MetricsError::FileRead {
        path: file_path.to_path_buf(),
        source,
    })
}

/// One object per line; blank, malformed and non-object lines are skipped.
fn read_jsonl_file(file_path: &Path) -> Result<Vec<RawRow>> {
    let reader = std::io::BufReader::new(open(file_path)?);
    let mut rows = Vec::new();

    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let data: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                debug!(
                    "Failed to parse JSON line {} in {}: {}",
                    index + 1,
                    file_path.display(),
                    e
                );
                continue;
            }
        };

        match row_from_value(&data) {
            Some(row) => rows.push(row),
            None => debug!(
                "Skipping non-object line {} in {}",
                index + 1,
                file_path.display()
            ),
        }
    }

    Ok(rows)
}

/// A JSON array of objects; non-object elements are skipped.
fn read_json_file(file_path: &Path) -> Result<Vec<RawRow>> {
    let reader = std::io::BufReader::new(open(file_path)?);
    let data: Value = serde_json::from_reader(reader)?;

    let rows = match &data {
        Value::Array(items) => items.iter().filter_map(row_from_value).collect(),
        Value::Object(_) => row_from_value(&data).into_iter().collect(),
        _ => {
            warn!(
                "Expected an array of rows in {}, found a scalar",
                file_path.display()
            );
            Vec::new()
        }
    };
    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_lines(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn sample_row(key: &str) -> String {
        json!({
            "Chave da item": key,
            "Tipo de item": "Story",
            "Criado": "01/jan/24 10:00 AM",
        })
        .to_string()
    }

    // ── find_row_files ────────────────────────────────────────────────────────

    #[test]
    fn test_find_row_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("2024");
        std::fs::create_dir_all(&sub).unwrap();
        write_lines(dir.path(), "c.jsonl", &["{}"]);
        write_lines(dir.path(), "a.json", &["[]"]);
        write_lines(&sub, "b.jsonl", &["{}"]);
        write_lines(dir.path(), "notes.txt", &["ignored"]);

        let files = find_row_files(dir.path());
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["b.jsonl", "a.json", "c.jsonl"]);
    }

    #[test]
    fn test_find_row_files_single_file() {
        let dir = TempDir::new().unwrap();
        let path = write_lines(dir.path(), "export.data", &["[]"]);
        assert_eq!(find_row_files(&path), vec![path]);
    }

    #[test]
    fn test_find_row_files_nonexistent_path() {
        let files = find_row_files(Path::new("/tmp/does-not-exist-flow-metrics-xyz"));
        assert!(files.is_empty());
    }

    // ── load_rows ─────────────────────────────────────────────────────────────

    #[test]
    fn test_load_rows_jsonl_skips_malformed_and_blank() {
        let dir = TempDir::new().unwrap();
        let good = sample_row("PROJ-1");
        write_lines(dir.path(), "rows.jsonl", &["{not valid json{{", &good, "", "42"]);

        let rows = load_rows(dir.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Chave da item"), Some("PROJ-1"));
    }

    #[test]
    fn test_load_rows_json_array() {
        let dir = TempDir::new().unwrap();
        let content = json!([
            {"Chave da item": "PROJ-1", "Estimativa": 28800, "Area": null},
            {"Chave da item": "PROJ-2", "Flag": true},
            "not a row",
        ])
        .to_string();
        let path = write_lines(dir.path(), "rows.json", &[&content]);

        let rows = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Estimativa"), Some("28800"));
        assert_eq!(rows[0].get("Area"), Some(""));
        assert_eq!(rows[1].get("Flag"), Some("true"));
    }

    #[test]
    fn test_load_rows_keeps_file_order() {
        let dir = TempDir::new().unwrap();
        write_lines(dir.path(), "b.jsonl", &[&sample_row("PROJ-2")]);
        write_lines(dir.path(), "a.jsonl", &[&sample_row("PROJ-1")]);

        let rows = load_rows(dir.path()).unwrap();
        let keys: Vec<&str> = rows.iter().filter_map(|r| r.get("Chave da item")).collect();
        assert_eq!(keys, vec!["PROJ-1", "PROJ-2"]);
    }

    #[test]
    fn test_load_rows_missing_path() {
        let err = load_rows(Path::new("/tmp/does-not-exist-flow-metrics-xyz")).unwrap_err();
        assert!(matches!(err, MetricsError::DataPathNotFound(_)));
    }

    #[test]
    fn test_load_rows_empty_directory() {
        let dir = TempDir::new().unwrap();
        let err = load_rows(dir.path()).unwrap_err();
        assert!(matches!(err, MetricsError::NoDataFiles(_)));
    }

    #[test]
    fn test_load_rows_invalid_json_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_lines(dir.path(), "rows.json", &["[{broken"]);
        let err = load_rows(&path).unwrap_err();
        assert!(matches!(err, MetricsError::JsonParse(_)));
    }

    // ── row_from_value ────────────────────────────────────────────────────────

    #[test]
    fn test_row_from_value_nested_keeps_json_text() {
        let row = row_from_value(&json!({"tags": ["a", "b"]})).unwrap();
        assert_eq!(row.get("tags"), Some(r#"["a","b"]"#));
    }

    #[test]
    fn test_row_from_value_rejects_non_object() {
        assert!(row_from_value(&json!([1, 2])).is_none());
        assert!(row_from_value(&json!("text")).is_none());
    }
}
