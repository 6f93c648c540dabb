//! User-chosen mapping from canonical item fields to export column names.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::models::RawRow;

/// Canonical fields an export column can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Key,
    Type,
    Status,
    Area,
    Created,
    Resolved,
    DeliveryStart,
    DeliveryEnd,
    DiscoveryStart,
    DiscoveryEnd,
    Approval,
    Refinement,
    Release,
    Block,
    Estimate,
}

impl Field {
    /// Key under which the field appears in a mapping file.
    pub fn key(self) -> &'static str {
        match self {
            Field::Key => "key",
            Field::Type => "type",
            Field::Status => "status",
            Field::Area => "area",
            Field::Created => "created",
            Field::Resolved => "resolved",
            Field::DeliveryStart => "deliveryStart",
            Field::DeliveryEnd => "deliveryEnd",
            Field::DiscoveryStart => "discoveryStart",
            Field::DiscoveryEnd => "discoveryEnd",
            Field::Approval => "approval",
            Field::Refinement => "refinement",
            Field::Release => "release",
            Field::Block => "block",
            Field::Estimate => "estimate",
        }
    }
}

/// Fields every item needs; a batch cannot be processed without them.
pub const REQUIRED_FIELDS: [Field; 2] = [Field::Key, Field::Type];

/// Fields whose mapped column must exist in the export header.
pub const HEADER_CHECKED_FIELDS: [Field; 6] = [
    Field::Key,
    Field::Type,
    Field::Status,
    Field::Area,
    Field::Created,
    Field::Resolved,
];

/// Column name per canonical field. An empty string means the field is not
/// tracked: every lookup through it yields `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMapping {
    pub key: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub status: String,
    pub area: String,
    pub created: String,
    pub resolved: String,
    pub delivery_start: String,
    pub delivery_end: String,
    pub discovery_start: String,
    pub discovery_end: String,
    pub approval: String,
    pub refinement: String,
    pub release: String,
    pub block: String,
    pub estimate: String,
}

impl FieldMapping {
    /// Column names of the tracker's stock Portuguese export.
    pub fn standard() -> Self {
        Self {
            key: "Chave da item".to_string(),
            item_type: "Tipo de item".to_string(),
            status: "Status".to_string(),
            area: "Area".to_string(),
            created: "Criado".to_string(),
            resolved: "Resolvido".to_string(),
            delivery_start: "Início do Delivery".to_string(),
            delivery_end: "Final do Delivery".to_string(),
            discovery_start: "Início do Discovery".to_string(),
            discovery_end: "Final do Discovery".to_string(),
            approval: "Aprovação".to_string(),
            refinement: "Refinamento".to_string(),
            release: "Release".to_string(),
            block: "Bloqueio".to_string(),
            estimate: "Estimativa".to_string(),
        }
    }

    /// Column mapped to `field`, or `None` when the field is not tracked.
    pub fn column(&self, field: Field) -> Option<&str> {
        let column = match field {
            Field::Key => &self.key,
            Field::Type => &self.item_type,
            Field::Status => &self.status,
            Field::Area => &self.area,
            Field::Created => &self.created,
            Field::Resolved => &self.resolved,
            Field::DeliveryStart => &self.delivery_start,
            Field::DeliveryEnd => &self.delivery_end,
            Field::DiscoveryStart => &self.discovery_start,
            Field::DiscoveryEnd => &self.discovery_end,
            Field::Approval => &self.approval,
            Field::Refinement => &self.refinement,
            Field::Release => &self.release,
            Field::Block => &self.block,
            Field::Estimate => &self.estimate,
        };
        if column.trim().is_empty() {
            None
        } else {
            Some(column.as_str())
        }
    }

    /// Look `field` up in `row` through this mapping.
    pub fn value<'r>(&self, row: &'r RawRow, field: Field) -> Option<&'r str> {
        self.column(field).and_then(|column| row.get(column))
    }

    /// Problems that make the header unusable with this mapping: required
    /// fields left unmapped, and mapped key columns missing from `headers`.
    ///
    /// An empty result means the batch can be processed.
    pub fn missing_columns(&self, headers: &HashSet<String>) -> Vec<String> {
        let mut missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|f| self.column(**f).is_none())
            .map(|f| format!("{} (unmapped)", f.key()))
            .collect();

        for field in HEADER_CHECKED_FIELDS {
            if let Some(column) = self.column(field) {
                if !headers.contains(column) {
                    missing.push(column.to_string());
                }
            }
        }
        missing
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    /// Mapping file location under `base_dir`: `.flow-metrics/mapping.json`.
    pub fn default_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".flow-metrics").join("mapping.json")
    }

    /// Load a mapping from a JSON object of canonical key → column name.
    /// Keys absent from the file stay unmapped.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| MetricsError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mapping: Self = serde_json::from_str(&content)?;
        debug!("Loaded field mapping from {}", path.display());
        Ok(mapping)
    }

    /// Resolve the mapping for one run: an explicit file must load; without
    /// one, `fallback_path` is used when it exists, otherwise
    /// [`FieldMapping::standard`].
    pub fn resolve(explicit: Option<&Path>, fallback_path: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if fallback_path.exists() {
            return Self::load_from(fallback_path);
        }
        debug!("No mapping file found; using the standard export columns");
        Ok(Self::standard())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn headers(cols: &[&str]) -> HashSet<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    // ── column / value ───────────────────────────────────────────────────────

    #[test]
    fn test_unmapped_field_is_none() {
        let mapping = FieldMapping {
            key: "Key".to_string(),
            block: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(mapping.column(Field::Key), Some("Key"));
        assert_eq!(mapping.column(Field::Resolved), None);
        assert_eq!(mapping.column(Field::Block), None);
    }

    #[test]
    fn test_value_reads_through_mapping() {
        let mapping = FieldMapping::standard();
        let row: RawRow = [("Chave da item", "PROJ-7"), ("Criado", "")]
            .into_iter()
            .collect();
        assert_eq!(mapping.value(&row, Field::Key), Some("PROJ-7"));
        assert_eq!(mapping.value(&row, Field::Created), Some(""));
        assert_eq!(mapping.value(&row, Field::Resolved), None);
    }

    // ── missing_columns ──────────────────────────────────────────────────────

    #[test]
    fn test_missing_columns_all_present() {
        let mapping = FieldMapping::standard();
        let hdr = headers(&[
            "Chave da item",
            "Tipo de item",
            "Status",
            "Area",
            "Criado",
            "Resolvido",
        ]);
        assert!(mapping.missing_columns(&hdr).is_empty());
    }

    #[test]
    fn test_missing_columns_reports_absent_header() {
        let mapping = FieldMapping::standard();
        let hdr = headers(&["Chave da item", "Tipo de item", "Status", "Area"]);
        assert_eq!(mapping.missing_columns(&hdr), vec!["Criado", "Resolvido"]);
    }

    #[test]
    fn test_missing_columns_unmapped_optional_is_fine() {
        let mapping = FieldMapping {
            key: "K".to_string(),
            item_type: "T".to_string(),
            ..Default::default()
        };
        assert!(mapping.missing_columns(&headers(&["K", "T"])).is_empty());
    }

    #[test]
    fn test_missing_columns_required_unmapped() {
        let mapping = FieldMapping {
            key: "K".to_string(),
            ..Default::default()
        };
        assert_eq!(
            mapping.missing_columns(&headers(&["K"])),
            vec!["type (unmapped)"]
        );
    }

    // ── load / resolve ───────────────────────────────────────────────────────

    #[test]
    fn test_load_from_partial_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("mapping.json");
        std::fs::write(
            &path,
            r#"{"key": "Issue key", "type": "Issue Type", "deliveryEnd": "Review"}"#,
        )
        .unwrap();

        let mapping = FieldMapping::load_from(&path).expect("load");
        assert_eq!(mapping.key, "Issue key");
        assert_eq!(mapping.item_type, "Issue Type");
        assert_eq!(mapping.delivery_end, "Review");
        assert_eq!(mapping.column(Field::Created), None);
    }

    #[test]
    fn test_load_from_missing_file_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let err = FieldMapping::load_from(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, MetricsError::FileRead { .. }));
    }

    #[test]
    fn test_load_from_invalid_json_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("mapping.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FieldMapping::load_from(&path).unwrap_err();
        assert!(matches!(err, MetricsError::JsonParse(_)));
    }

    #[test]
    fn test_resolve_falls_back_to_standard() {
        let tmp = TempDir::new().expect("tempdir");
        let fallback = FieldMapping::default_path_in(tmp.path());
        let mapping = FieldMapping::resolve(None, &fallback).expect("resolve");
        assert_eq!(mapping, FieldMapping::standard());
    }

    #[test]
    fn test_resolve_prefers_fallback_file_when_present() {
        let tmp = TempDir::new().expect("tempdir");
        let fallback = FieldMapping::default_path_in(tmp.path());
        std::fs::create_dir_all(fallback.parent().unwrap()).unwrap();
        std::fs::write(&fallback, r#"{"key": "Id", "type": "Kind"}"#).unwrap();

        let mapping = FieldMapping::resolve(None, &fallback).expect("resolve");
        assert_eq!(mapping.key, "Id");
        assert_eq!(mapping.status, "");
    }
}
