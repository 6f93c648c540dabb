//! Report views built from the analysed items, rendered as text or JSON.

use std::fmt;

use anyhow::bail;
use chrono::NaiveDateTime;
use flow_core::formatting::{format_days, format_percentage, format_short_date};
use flow_core::models::{BlockHistory, DateField, Item, Metric};
use flow_core::stats::{bucket_distribution, Distribution, MetricSummary};
use flow_data::aggregator::{
    distribution_by_type, metric_values, monthly_breakdown, summarize_by_type, MonthlySummary,
    TypeDistribution, TypeSummary,
};
use flow_data::analysis::AnalysisMetadata;
use flow_data::review::{review_aging, ReviewAging};
use serde::Serialize;

// ── Report types ──────────────────────────────────────────────────────────────

/// Parameters shared by every view.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub metric: Metric,
    pub date_field: DateField,
    pub boundaries: Vec<i64>,
    /// Reference instant for review aging.
    pub as_of: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub metric: Metric,
    pub item_count: usize,
    pub overall: MetricSummary,
    pub by_type: Vec<TypeSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub metric: Metric,
    pub date_field: DateField,
    pub months: Vec<MonthlySummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionReport {
    pub metric: Metric,
    pub overall: Distribution,
    pub by_type: Vec<TypeDistribution>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedItem<'a> {
    pub key: &'a str,
    pub item_type: &'a str,
    pub history: &'a BlockHistory,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocksReport<'a> {
    pub items: Vec<BlockedItem<'a>>,
    pub total_blocked_days: i64,
    pub currently_blocked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemsReport<'a> {
    pub items: Vec<&'a Item>,
}

/// One rendered view.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum Report<'a> {
    Summary(SummaryReport),
    Monthly(MonthlyReport),
    Distribution(DistributionReport),
    Blocks(BlocksReport<'a>),
    Review(ReviewAging<'a>),
    Items(ItemsReport<'a>),
}

/// JSON envelope: run metadata plus the selected view.
#[derive(Debug, Serialize)]
pub struct ReportOutput<'a> {
    pub metadata: &'a AnalysisMetadata,
    pub report: &'a Report<'a>,
}

// ── Building ──────────────────────────────────────────────────────────────────

/// Build the view named `view` over `items`.
pub fn build_report<'a>(view: &str, items: &[&'a Item], ctx: &ReportContext) -> anyhow::Result<Report<'a>> {
    let iter = || items.iter().copied();

    let report = match view {
        "summary" => Report::Summary(SummaryReport {
            metric: ctx.metric,
            item_count: items.len(),
            overall: MetricSummary::from_values(&metric_values(iter(), ctx.metric)),
            by_type: summarize_by_type(iter(), ctx.metric),
        }),
        "monthly" => Report::Monthly(MonthlyReport {
            metric: ctx.metric,
            date_field: ctx.date_field,
            months: monthly_breakdown(iter(), ctx.date_field, ctx.metric),
        }),
        "distribution" => Report::Distribution(DistributionReport {
            metric: ctx.metric,
            overall: bucket_distribution(&metric_values(iter(), ctx.metric), &ctx.boundaries),
            by_type: distribution_by_type(iter(), ctx.metric, &ctx.boundaries),
        }),
        "blocks" => {
            let blocked: Vec<BlockedItem<'a>> = iter()
                .filter(|item| !item.block_history.periods.is_empty())
                .map(|item| BlockedItem {
                    key: &item.key,
                    item_type: &item.item_type,
                    history: &item.block_history,
                })
                .collect();
            Report::Blocks(BlocksReport {
                total_blocked_days: blocked.iter().map(|b| b.history.total_blocked_days).sum(),
                currently_blocked: blocked
                    .iter()
                    .filter(|b| b.history.is_currently_blocked)
                    .count(),
                items: blocked,
            })
        }
        "review" => Report::Review(review_aging(iter(), ctx.as_of)),
        "items" => Report::Items(ItemsReport { items: iter().collect() }),
        other => bail!("unknown view: {}", other),
    };
    Ok(report)
}

// ── Text rendering ────────────────────────────────────────────────────────────

fn write_summary_line(f: &mut fmt::Formatter<'_>, s: &MetricSummary) -> fmt::Result {
    write!(
        f,
        "{:>5}  mean {:>5}  median {:>5}  p70 {:>5}  p85 {:>5}  p95 {:>5}  min {:>5}  max {:>5}",
        s.count,
        format_days(s.mean),
        format_days(s.median),
        format_days(s.p70),
        format_days(s.p85),
        format_days(s.p95),
        format!("{}d", s.min),
        format!("{}d", s.max),
    )
}

fn write_distribution(f: &mut fmt::Formatter<'_>, d: &Distribution, indent: &str) -> fmt::Result {
    for bucket in &d.buckets {
        writeln!(
            f,
            "{}{:<20} {:>5}  {:>7}",
            indent,
            bucket.label(),
            bucket.count,
            format_percentage(bucket.percentage, 1)
        )?;
    }
    Ok(())
}

fn days_cell(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |d| format!("{}d", d))
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Summary(r) => {
                writeln!(f, "{} over {} items", r.metric.name(), r.item_count)?;
                write!(f, "{:<20} ", "all")?;
                write_summary_line(f, &r.overall)?;
                writeln!(f)?;
                for t in &r.by_type {
                    write!(f, "{:<20} ", t.item_type)?;
                    write_summary_line(f, &t.summary)?;
                    writeln!(f)?;
                }
            }
            Report::Monthly(r) => {
                writeln!(f, "{} by {}", r.metric.name(), r.date_field.name())?;
                for month in &r.months {
                    writeln!(f)?;
                    write!(f, "{:<20} ", month.label)?;
                    write_summary_line(f, &month.overall)?;
                    writeln!(f)?;
                    for t in &month.by_type {
                        write!(f, "  {:<18} ", t.item_type)?;
                        write_summary_line(f, &t.summary)?;
                        writeln!(f)?;
                    }
                }
            }
            Report::Distribution(r) => {
                writeln!(f, "{} distribution ({} values)", r.metric.name(), r.overall.total)?;
                write_distribution(f, &r.overall, "  ")?;
                for t in &r.by_type {
                    writeln!(f)?;
                    writeln!(f, "{} ({} values)", t.item_type, t.distribution.total)?;
                    write_distribution(f, &t.distribution, "  ")?;
                }
            }
            Report::Blocks(r) => {
                writeln!(
                    f,
                    "{} blocked items, {} still blocked, {} blocked days",
                    r.items.len(),
                    r.currently_blocked,
                    r.total_blocked_days
                )?;
                for blocked in &r.items {
                    writeln!(f)?;
                    writeln!(
                        f,
                        "{} ({}) {}d{}",
                        blocked.key,
                        blocked.item_type,
                        blocked.history.total_blocked_days,
                        if blocked.history.is_currently_blocked { " [blocked]" } else { "" }
                    )?;
                    for period in &blocked.history.periods {
                        let until = period
                            .unblock_date
                            .map_or_else(|| "now".to_string(), |d| d.to_string());
                        writeln!(
                            f,
                            "  {} -> {:<10} {:>5}  {}",
                            period.block_date,
                            until,
                            days_cell(period.blocked_days),
                            period.block_description
                        )?;
                    }
                }
            }
            Report::Review(r) => {
                writeln!(f, "{} items in review", r.items.len())?;
                write_distribution(f, &r.distribution, "  ")?;
                writeln!(f)?;
                for t in &r.by_type {
                    writeln!(f, "  {:<20} {:>5}", t.label, t.count)?;
                }
                writeln!(f)?;
                for ri in &r.items {
                    writeln!(
                        f,
                        "{:<12} {:<16} {:>5}  {:<18} {}",
                        ri.item.key,
                        ri.normalized_type,
                        format!("{}d", ri.days_in_review),
                        ri.period,
                        format_short_date(&ri.item.delivery_end)
                    )?;
                }
            }
            Report::Items(r) => {
                writeln!(
                    f,
                    "{:<12} {:<16} {:<10} {:<10} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
                    "key", "type", "created", "resolved", "lead", "deliv", "disc", "effort", "est", "block"
                )?;
                for item in &r.items {
                    writeln!(
                        f,
                        "{:<12} {:<16} {:<10} {:<10} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
                        item.key,
                        item.item_type,
                        format_short_date(&item.created),
                        format_short_date(&item.resolved),
                        days_cell(item.lead_time),
                        days_cell(item.delivery_time),
                        days_cell(item.discovery_time),
                        format!("{}d", item.effort.total),
                        format!("{}d", item.estimate),
                        format!("{}d", item.block_history.total_blocked_days),
                    )?;
                }
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
