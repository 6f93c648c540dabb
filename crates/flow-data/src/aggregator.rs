//! Grouping of items by calendar month and by type, and the per-group metric
//! summaries every report is built from.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use flow_core::dates::month_key;
use flow_core::formatting::month_label;
use flow_core::models::{DateField, Item, Metric};
use flow_core::stats::{bucket_distribution, Distribution, MetricSummary};
use serde::Serialize;

// ── ItemFilter ────────────────────────────────────────────────────────────────

/// Area and type restrictions applied before aggregation. Empty lists do not
/// restrict anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Keep only these areas (exact match).
    pub areas: Vec<String>,
    /// Keep only these types (exact match).
    pub types: Vec<String>,
    /// Drop these types, compared case-insensitively.
    pub exclude_types: Vec<String>,
}

impl ItemFilter {
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty() && self.types.is_empty() && self.exclude_types.is_empty()
    }

    pub fn matches(&self, item: &Item) -> bool {
        let area_ok = self.areas.is_empty()
            || item
                .area
                .as_deref()
                .map_or(false, |area| self.areas.iter().any(|a| a == area));
        let type_ok = self.types.is_empty() || self.types.iter().any(|t| *t == item.item_type);
        let excluded = self
            .exclude_types
            .iter()
            .any(|t| t.to_lowercase() == item.item_type.to_lowercase());
        area_ok && type_ok && !excluded
    }

    /// Items passing the filter, in input order.
    pub fn apply<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

// ── MonthGroup ────────────────────────────────────────────────────────────────

/// Items whose selected date falls in one calendar month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthGroup<'a> {
    /// `YYYY-MM`.
    pub key: String,
    /// Display label, e.g. `março de 2024`.
    pub label: String,
    pub items: Vec<&'a Item>,
}

/// Group items by the month of `field`, ascending by month. Items whose
/// selected date is missing or unparseable belong to no group.
pub fn group_by_month<'a, I>(items: I, field: DateField) -> Vec<MonthGroup<'a>>
where
    I: IntoIterator<Item = &'a Item>,
{
    group_by_month_with(items, |item| item.date(field))
}

/// [`group_by_month`] with an arbitrary date selector.
pub fn group_by_month_with<'a, I, F>(items: I, selector: F) -> Vec<MonthGroup<'a>>
where
    I: IntoIterator<Item = &'a Item>,
    F: Fn(&Item) -> Option<NaiveDateTime>,
{
    // BTreeMap keeps the `YYYY-MM` keys in chronological order.
    let mut map: BTreeMap<String, MonthGroup<'a>> = BTreeMap::new();

    for item in items {
        let Some(dt) = selector(item) else {
            continue;
        };
        let key = month_key(&dt);
        map.entry(key.clone())
            .or_insert_with(|| MonthGroup {
                key,
                label: month_label(&dt),
                items: Vec::new(),
            })
            .items
            .push(item);
    }

    map.into_values().collect()
}

// ── TypeGroup ─────────────────────────────────────────────────────────────────

/// Items sharing one exact type string.
#[derive(Debug, Clone, Serialize)]
pub struct TypeGroup<'a> {
    pub item_type: String,
    pub items: Vec<&'a Item>,
}

/// Partition items by exact type, ordered by type name. No normalization is
/// applied: `Bug` and `bug` are different groups.
pub fn group_by_type<'a, I>(items: I) -> Vec<TypeGroup<'a>>
where
    I: IntoIterator<Item = &'a Item>,
{
    let mut map: BTreeMap<&'a str, Vec<&'a Item>> = BTreeMap::new();
    for item in items {
        map.entry(item.item_type.as_str()).or_default().push(item);
    }
    map.into_iter()
        .map(|(item_type, items)| TypeGroup {
            item_type: item_type.to_string(),
            items,
        })
        .collect()
}

// ── Metric summaries ──────────────────────────────────────────────────────────

/// Values of `metric` over `items`, skipping items where it is absent.
pub fn metric_values<'a, I>(items: I, metric: Metric) -> Vec<i64>
where
    I: IntoIterator<Item = &'a Item>,
{
    items.into_iter().filter_map(|item| item.metric(metric)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSummary {
    pub item_type: String,
    pub summary: MetricSummary,
}

/// One summary per type present in `items`.
pub fn summarize_by_type<'a, I>(items: I, metric: Metric) -> Vec<TypeSummary>
where
    I: IntoIterator<Item = &'a Item>,
{
    group_by_type(items)
        .into_iter()
        .map(|group| TypeSummary {
            summary: MetricSummary::from_values(&metric_values(group.items, metric)),
            item_type: group.item_type,
        })
        .collect()
}

/// Summary of one month, overall and split by type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub key: String,
    pub label: String,
    pub overall: MetricSummary,
    pub by_type: Vec<TypeSummary>,
}

/// Per-month statistics of `metric`, months taken from `field`.
pub fn monthly_breakdown<'a, I>(items: I, field: DateField, metric: Metric) -> Vec<MonthlySummary>
where
    I: IntoIterator<Item = &'a Item>,
{
    group_by_month(items, field)
        .into_iter()
        .map(|month| MonthlySummary {
            overall: MetricSummary::from_values(&metric_values(month.items.iter().copied(), metric)),
            by_type: summarize_by_type(month.items.iter().copied(), metric),
            key: month.key,
            label: month.label,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDistribution {
    pub item_type: String,
    pub distribution: Distribution,
}

/// Bucketed distribution of `metric` for each type.
pub fn distribution_by_type<'a, I>(
    items: I,
    metric: Metric,
    boundaries: &[i64],
) -> Vec<TypeDistribution>
where
    I: IntoIterator<Item = &'a Item>,
{
    group_by_type(items)
        .into_iter()
        .map(|group| TypeDistribution {
            distribution: bucket_distribution(&metric_values(group.items, metric), boundaries),
            item_type: group.item_type,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
