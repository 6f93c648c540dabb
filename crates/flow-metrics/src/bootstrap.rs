use std::path::{Path, PathBuf};

use anyhow::Context;
use flow_core::mapping::FieldMapping;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map the CLI level names to a tracing filter directive.
fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" | "CRITICAL" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber on stderr, keeping stdout for
/// the report itself.
///
/// Falls back to `"info"` if the level string is not recognised.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(())
}

// ── Mapping discovery ──────────────────────────────────────────────────────────

/// `~/.flow-metrics/mapping.json`, or the same path under the current
/// directory when there is no home directory.
pub fn default_mapping_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    FieldMapping::default_path_in(&home)
}

/// Load the field mapping for this run.
///
/// An explicit `--mapping` file must exist and parse. Without one the default
/// mapping file is used when present, otherwise the stock export columns.
pub fn load_mapping(explicit: Option<&Path>) -> anyhow::Result<FieldMapping> {
    load_mapping_from(explicit, &default_mapping_path())
}

fn load_mapping_from(explicit: Option<&Path>, fallback: &Path) -> anyhow::Result<FieldMapping> {
    FieldMapping::resolve(explicit, fallback).with_context(|| match explicit {
        Some(path) => format!("invalid mapping file {}", path.display()),
        None => format!("invalid mapping file {}", fallback.display()),
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── filter_directive ──────────────────────────────────────────────────────

    #[test]
    fn test_filter_directive_maps_level_names() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("CRITICAL"), "debug");
        assert_eq!(filter_directive("INFO"), "info");
        assert_eq!(filter_directive("warning"), "warn");
        assert_eq!(filter_directive("ERROR"), "error");
        assert_eq!(filter_directive("trace"), "trace");
    }

    // ── load_mapping ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_mapping_defaults_to_standard() {
        let tmp = TempDir::new().expect("tempdir");
        let fallback = FieldMapping::default_path_in(tmp.path());
        let mapping = load_mapping_from(None, &fallback).expect("mapping");
        assert_eq!(mapping, FieldMapping::standard());
    }

    #[test]
    fn test_load_mapping_explicit_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("custom.json");
        std::fs::write(&path, r#"{"key": "Issue key", "type": "Issue Type"}"#).unwrap();

        let mapping =
            load_mapping_from(Some(&path), &tmp.path().join("unused.json")).expect("mapping");
        assert_eq!(mapping.key, "Issue key");
        assert_eq!(mapping.resolved, "");
    }

    #[test]
    fn test_load_mapping_missing_explicit_file_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("missing.json");
        let err = load_mapping_from(Some(&path), &tmp.path().join("unused.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_default_mapping_path_file_name() {
        let path = default_mapping_path();
        assert!(path.ends_with(".flow-metrics/mapping.json"));
    }
}
