//! Row → [`Item`] normalization.

use flow_core::dates::days_between;
use flow_core::mapping::{Field, FieldMapping};
use flow_core::models::{EffortBreakdown, Item, RawRow};

use crate::blocks::parse_block_history;

/// Seconds in one 8-hour workday.
pub const SECONDS_PER_WORKDAY: f64 = 8.0 * 60.0 * 60.0;

/// Convert an estimate in seconds to whole workdays, rounding half away from
/// zero. Blank, non-numeric and non-finite input is 0.
///
/// ```
/// use flow_data::normalizer::parse_estimate;
///
/// assert_eq!(parse_estimate(Some("28800")), 1);
/// assert_eq!(parse_estimate(Some("43200")), 2);
/// assert_eq!(parse_estimate(Some("n/a")), 0);
/// assert_eq!(parse_estimate(None), 0);
/// ```
pub fn parse_estimate(text: Option<&str>) -> i64 {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return 0;
    };
    match text.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() => (seconds / SECONDS_PER_WORKDAY).round() as i64,
        _ => 0,
    }
}

/// Build an [`Item`] from one admitted row. Never fails: unmapped or
/// malformed fields just leave the derived values empty.
pub fn normalize(row: &RawRow, mapping: &FieldMapping) -> Item {
    let text = |field: Field| mapping.value(row, field).unwrap_or("").to_string();
    let optional = |field: Field| {
        mapping
            .value(row, field)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut item = Item::new(text(Field::Key).trim(), text(Field::Type).trim());
    item.status = optional(Field::Status);
    item.area = optional(Field::Area);

    item.created = text(Field::Created);
    item.resolved = text(Field::Resolved);
    item.delivery_start = text(Field::DeliveryStart);
    item.delivery_end = text(Field::DeliveryEnd);
    item.discovery_start = text(Field::DiscoveryStart);
    item.discovery_end = text(Field::DiscoveryEnd);
    item.approval = text(Field::Approval);
    item.refinement = text(Field::Refinement);
    item.release = text(Field::Release);

    item.lead_time = days_between(&item.created, &item.resolved);
    item.delivery_time = days_between(&item.delivery_start, &item.delivery_end);
    item.discovery_time = days_between(&item.discovery_start, &item.discovery_end);

    item.effort = EffortBreakdown::from_phases(
        days_between(&item.discovery_start, &item.approval),
        days_between(&item.discovery_end, &item.refinement),
        item.delivery_time,
        days_between(&item.release, &item.resolved),
    );

    item.estimate = parse_estimate(mapping.value(row, Field::Estimate));

    item.block_annotation = optional(Field::Block);
    if let Some(annotation) = &item.block_annotation {
        item.block_history = parse_block_history(annotation);
    }

    item
}

// ── Tests ─────────────────────────────────────────────────────────────────────
