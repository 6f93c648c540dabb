use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::dates::parse_export_date;

// ── RawRow ────────────────────────────────────────────────────────────────────

/// One source record as produced by the external tabular parser: column name
/// to (possibly empty) string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(HashMap<String, String>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `column`, or `None` when the row has no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.insert(column.into(), value.into());
    }

    /// Column names present in this row, in no particular order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for RawRow {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ── Selectors ─────────────────────────────────────────────────────────────────

/// One of the raw date-valued fields of an [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateField {
    Created,
    Resolved,
    DeliveryStart,
    DeliveryEnd,
    DiscoveryStart,
    DiscoveryEnd,
    Approval,
    Refinement,
    Release,
}

impl DateField {
    pub const ALL: [DateField; 9] = [
        DateField::Created,
        DateField::Resolved,
        DateField::DeliveryStart,
        DateField::DeliveryEnd,
        DateField::DiscoveryStart,
        DateField::DiscoveryEnd,
        DateField::Approval,
        DateField::Refinement,
        DateField::Release,
    ];

    /// Kebab-case name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            DateField::Created => "created",
            DateField::Resolved => "resolved",
            DateField::DeliveryStart => "delivery-start",
            DateField::DeliveryEnd => "delivery-end",
            DateField::DiscoveryStart => "discovery-start",
            DateField::DiscoveryEnd => "discovery-end",
            DateField::Approval => "approval",
            DateField::Refinement => "refinement",
            DateField::Release => "release",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// A numeric per-item metric that reports can aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    LeadTime,
    DeliveryTime,
    DiscoveryTime,
    TotalEffort,
    Estimate,
    BlockedDays,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::LeadTime,
        Metric::DeliveryTime,
        Metric::DiscoveryTime,
        Metric::TotalEffort,
        Metric::Estimate,
        Metric::BlockedDays,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::LeadTime => "lead-time",
            Metric::DeliveryTime => "delivery",
            Metric::DiscoveryTime => "discovery",
            Metric::TotalEffort => "effort",
            Metric::Estimate => "estimate",
            Metric::BlockedDays => "blocked",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// The date each report groups this metric by unless told otherwise:
    /// delivery by its review date, discovery by its prioritisation date,
    /// everything else by resolution.
    pub fn default_date_field(self) -> DateField {
        match self {
            Metric::DeliveryTime => DateField::DeliveryEnd,
            Metric::DiscoveryTime => DateField::DiscoveryEnd,
            _ => DateField::Resolved,
        }
    }
}

// ── Block history ─────────────────────────────────────────────────────────────

/// A reconstructed interval during which an item was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPeriod {
    pub block_date: NaiveDate,
    /// `None` while the item is still blocked.
    pub unblock_date: Option<NaiveDate>,
    pub block_status: Option<String>,
    pub unblock_status: Option<String>,
    pub block_author: Option<String>,
    pub unblock_author: Option<String>,
    pub block_description: String,
    pub unblock_description: Option<String>,
    pub blocked_days: Option<i64>,
    pub still_blocked: bool,
}

/// Every block period of one item plus the running totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHistory {
    pub periods: Vec<BlockPeriod>,
    pub total_blocked_days: i64,
    pub is_currently_blocked: bool,
}

// ── Item ──────────────────────────────────────────────────────────────────────

/// Day counts spent in each phase of the work item's flow. Missing phases
/// count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffortBreakdown {
    pub analysis_to_approval: i64,
    pub refinement_to_prioritization: i64,
    pub sprint_to_review: i64,
    pub release_to_done: i64,
    pub total: i64,
}

impl EffortBreakdown {
    /// Build the breakdown from optional phase durations; `None` counts as 0.
    pub fn from_phases(
        analysis_to_approval: Option<i64>,
        refinement_to_prioritization: Option<i64>,
        sprint_to_review: Option<i64>,
        release_to_done: Option<i64>,
    ) -> Self {
        let analysis_to_approval = analysis_to_approval.unwrap_or(0);
        let refinement_to_prioritization = refinement_to_prioritization.unwrap_or(0);
        let sprint_to_review = sprint_to_review.unwrap_or(0);
        let release_to_done = release_to_done.unwrap_or(0);
        Self {
            analysis_to_approval,
            refinement_to_prioritization,
            sprint_to_review,
            release_to_done,
            total: analysis_to_approval
                + refinement_to_prioritization
                + sprint_to_review
                + release_to_done,
        }
    }
}

/// One work item derived from a source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub key: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub status: Option<String>,
    pub area: Option<String>,

    // Raw date strings exactly as exported; empty when unmapped or blank.
    pub created: String,
    pub resolved: String,
    pub delivery_start: String,
    pub delivery_end: String,
    pub discovery_start: String,
    pub discovery_end: String,
    pub approval: String,
    pub refinement: String,
    pub release: String,

    pub lead_time: Option<i64>,
    pub delivery_time: Option<i64>,
    pub discovery_time: Option<i64>,
    pub effort: EffortBreakdown,
    /// Estimate in 8-hour workdays.
    pub estimate: i64,

    pub block_annotation: Option<String>,
    pub block_history: BlockHistory,
}

impl Item {
    /// An item with only its identity set; every other field is empty.
    pub fn new(key: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            item_type: item_type.into(),
            status: None,
            area: None,
            created: String::new(),
            resolved: String::new(),
            delivery_start: String::new(),
            delivery_end: String::new(),
            discovery_start: String::new(),
            discovery_end: String::new(),
            approval: String::new(),
            refinement: String::new(),
            release: String::new(),
            lead_time: None,
            delivery_time: None,
            discovery_time: None,
            effort: EffortBreakdown::default(),
            estimate: 0,
            block_annotation: None,
            block_history: BlockHistory::default(),
        }
    }

    /// Raw text of the selected date field.
    pub fn date_text(&self, field: DateField) -> &str {
        match field {
            DateField::Created => &self.created,
            DateField::Resolved => &self.resolved,
            DateField::DeliveryStart => &self.delivery_start,
            DateField::DeliveryEnd => &self.delivery_end,
            DateField::DiscoveryStart => &self.discovery_start,
            DateField::DiscoveryEnd => &self.discovery_end,
            DateField::Approval => &self.approval,
            DateField::Refinement => &self.refinement,
            DateField::Release => &self.release,
        }
    }

    /// Parsed value of the selected date field.
    pub fn date(&self, field: DateField) -> Option<NaiveDateTime> {
        parse_export_date(self.date_text(field))
    }

    /// Value of `metric` for this item. Lead, delivery and discovery times
    /// keep their `None`; effort, estimate and blocked days are always set.
    pub fn metric(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::LeadTime => self.lead_time,
            Metric::DeliveryTime => self.delivery_time,
            Metric::DiscoveryTime => self.discovery_time,
            Metric::TotalEffort => Some(self.effort.total),
            Metric::Estimate => Some(self.estimate),
            Metric::BlockedDays => Some(self.block_history.total_blocked_days),
        }
    }
}
