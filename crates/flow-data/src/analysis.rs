//! Main analysis pipeline.
//!
//! Checks the mapping against the export header, admits rows that carry a key
//! and a type, and normalizes each admitted row into an [`Item`].

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use flow_core::error::{MetricsError, Result};
use flow_core::mapping::{Field, FieldMapping};
use flow_core::models::{Item, RawRow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::normalizer::normalize;
use crate::reader::load_rows;

// ── Public types ──────────────────────────────────────────────────────────────

/// A row that failed admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRow {
    /// 1-based line in the original export, counting the header line.
    pub line_number: usize,
    pub errors: Vec<String>,
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    pub rows_read: usize,
    pub rows_admitted: usize,
    pub rows_rejected: usize,
    /// Items with at least one block period.
    pub blocked_items: usize,
    /// Items whose last block period is still open.
    pub currently_blocked: usize,
    /// Wall-clock seconds spent admitting and normalizing rows.
    pub process_time_seconds: f64,
}

/// The complete output of [`analyze_rows`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub items: Vec<Item>,
    pub rejected: Vec<RejectedRow>,
    pub metadata: AnalysisMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Union of the column names present in `rows`.
pub fn collect_headers(rows: &[RawRow]) -> HashSet<String> {
    rows.iter()
        .flat_map(|row| row.columns().map(str::to_string))
        .collect()
}

/// Admission check for the row at 0-based `index`: key and type must be
/// present and non-blank.
pub fn admit_row(row: &RawRow, index: usize, mapping: &FieldMapping) -> std::result::Result<(), RejectedRow> {
    let errors: Vec<String> = [Field::Key, Field::Type]
        .into_iter()
        .filter(|field| {
            mapping
                .value(row, *field)
                .map_or(true, |v| v.trim().is_empty())
        })
        .map(|field| {
            format!(
                "'{}' is required",
                mapping.column(field).unwrap_or(field.key())
            )
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(RejectedRow {
            line_number: index + 2,
            errors,
        })
    }
}

/// Run the pipeline over rows already in memory.
///
/// 1. Check the mapping against the header.
/// 2. Admit rows with a key and a type; log the rest.
/// 3. Normalize every admitted row.
pub fn analyze_rows(rows: &[RawRow], mapping: &FieldMapping) -> Result<AnalysisResult> {
    let start = std::time::Instant::now();

    if rows.is_empty() {
        return Err(MetricsError::NoValidRows { read: 0, rejected: 0 });
    }

    // ── Step 1: Header ────────────────────────────────────────────────────────
    let missing = mapping.missing_columns(&collect_headers(rows));
    if !missing.is_empty() {
        return Err(MetricsError::Config(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    // ── Step 2: Admission ─────────────────────────────────────────────────────
    let mut admitted: Vec<&RawRow> = Vec::with_capacity(rows.len());
    let mut rejected: Vec<RejectedRow> = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match admit_row(row, index, mapping) {
            Ok(()) => admitted.push(row),
            Err(rejection) => {
                debug!(
                    "Rejected line {}: {}",
                    rejection.line_number,
                    rejection.errors.join("; ")
                );
                rejected.push(rejection);
            }
        }
    }

    if !rejected.is_empty() {
        warn!("{} of {} rows rejected", rejected.len(), rows.len());
    }
    if admitted.is_empty() {
        return Err(MetricsError::NoValidRows {
            read: rows.len(),
            rejected: rejected.len(),
        });
    }

    // ── Step 3: Normalize ─────────────────────────────────────────────────────
    let items: Vec<Item> = admitted.iter().map(|row| normalize(row, mapping)).collect();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        rows_read: rows.len(),
        rows_admitted: items.len(),
        rows_rejected: rejected.len(),
        blocked_items: items
            .iter()
            .filter(|i| !i.block_history.periods.is_empty())
            .count(),
        currently_blocked: items
            .iter()
            .filter(|i| i.block_history.is_currently_blocked)
            .count(),
        process_time_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        "Analyzed {} items ({} rejected) in {:.3}s",
        metadata.rows_admitted, metadata.rows_rejected, metadata.process_time_seconds
    );

    Ok(AnalysisResult {
        items,
        rejected,
        metadata,
    })
}

/// Load rows from `data_path` and run [`analyze_rows`] on them.
pub fn analyze_path(data_path: &Path, mapping: &FieldMapping) -> Result<AnalysisResult> {
    let rows = load_rows(data_path)?;
    analyze_rows(&rows, mapping)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
