use serde::{Deserialize, Serialize};

/// Default bucket boundaries (in days) used by the distribution reports.
pub const DEFAULT_BUCKET_BOUNDARIES: [i64; 4] = [30, 60, 90, 180];

/// Percentiles reported for every metric summary.
pub const REPORTED_PERCENTILES: [f64; 3] = [0.70, 0.85, 0.95];

// ── Percentile helpers ────────────────────────────────────────────────────────

/// Compute the `p`-quantile (`p` in `[0, 1]`) of a **sorted** slice using
/// linear interpolation between the two nearest ranks.
///
/// The rank is `p * (n - 1)`; `p = 0` yields the minimum and `p = 1` the
/// maximum. `p` outside `[0, 1]` is clamped. Returns `0.0` for an empty slice.
///
/// # Examples
///
/// ```
/// use flow_core::stats::percentile;
///
/// assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
/// assert_eq!(percentile(&[1.0, 2.0, 3.0], 0.5), 2.0);
/// ```
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let len = sorted_data.len();
    if len == 1 {
        return sorted_data[0];
    }
    let rank = p.clamp(0.0, 1.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted_data[lo];
    }
    let weight = rank - lo as f64;
    sorted_data[lo] * (1.0 - weight) + sorted_data[hi] * weight
}

/// Median of an unsorted slice: the middle order statistic, or the mean of
/// the two middle ones for an even count. Returns `0.0` when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Arithmetic mean, `0.0` when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Ascending copy of `values` (NaN-free input assumed).
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Share of `part` in `whole` as a percentage; `0.0` when `whole` is zero.
fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

// ── MetricSummary ─────────────────────────────────────────────────────────────

/// Count, central tendency and tail percentiles of one metric over a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p70: f64,
    pub p85: f64,
    pub p95: f64,
    pub min: i64,
    pub max: i64,
}

impl MetricSummary {
    /// Summarise integer day values. An empty slice yields the all-zero summary.
    pub fn from_values(values: &[i64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let as_f64: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        let sorted = sorted_copy(&as_f64);
        let [p70, p85, p95] = REPORTED_PERCENTILES.map(|p| percentile(&sorted, p));

        Self {
            count: values.len(),
            mean: mean(&as_f64),
            median: median(&sorted),
            p70,
            p85,
            p95,
            min: values.iter().copied().min().unwrap_or_default(),
            max: values.iter().copied().max().unwrap_or_default(),
        }
    }
}

// ── Bucket distribution ───────────────────────────────────────────────────────

/// One range of a [`Distribution`]. `lower` is exclusive, `upper` inclusive;
/// `None` means unbounded on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
    pub count: usize,
    /// Share of the group's values in this bucket, `0.0..=100.0`.
    pub percentage: f64,
}

impl Bucket {
    /// Whether `value` falls in `(lower, upper]`.
    pub fn contains(&self, value: i64) -> bool {
        self.lower.map_or(true, |lo| value > lo) && self.upper.map_or(true, |hi| value <= hi)
    }

    /// Display label in days, e.g. `até 30 dias`, `31-60 dias`, `acima de 180 dias`.
    pub fn label(&self) -> String {
        match (self.lower, self.upper) {
            (None, Some(hi)) => format!("até {} dias", hi),
            (Some(lo), Some(hi)) => format!("{}-{} dias", lo + 1, hi),
            (Some(lo), None) => format!("acima de {} dias", lo),
            (None, None) => "todos".to_string(),
        }
    }
}

/// Counts of a group's values across fixed, ordered ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub total: usize,
    pub buckets: Vec<Bucket>,
}

/// Classify each value into exactly one of `boundaries.len() + 1` buckets:
/// `v <= b1`, `b(k-1) < v <= bk`, and the overflow bucket `v > bn`.
///
/// Boundaries are sorted and deduplicated before use.
///
/// # Examples
///
/// ```
/// use flow_core::stats::bucket_distribution;
///
/// let dist = bucket_distribution(&[10, 40, 70, 200], &[30, 60, 90, 180]);
/// let counts: Vec<usize> = dist.buckets.iter().map(|b| b.count).collect();
/// assert_eq!(counts, vec![1, 1, 1, 0, 1]);
/// ```
pub fn bucket_distribution(values: &[i64], boundaries: &[i64]) -> Distribution {
    let mut bounds = boundaries.to_vec();
    bounds.sort_unstable();
    bounds.dedup();

    let mut buckets: Vec<Bucket> = Vec::with_capacity(bounds.len() + 1);
    let mut lower: Option<i64> = None;
    for &upper in &bounds {
        buckets.push(Bucket {
            lower,
            upper: Some(upper),
            count: 0,
            percentage: 0.0,
        });
        lower = Some(upper);
    }
    buckets.push(Bucket {
        lower,
        upper: None,
        count: 0,
        percentage: 0.0,
    });

    for &value in values {
        if let Some(bucket) = buckets.iter_mut().find(|b| b.contains(value)) {
            bucket.count += 1;
        }
    }

    let total = values.len();
    for bucket in &mut buckets {
        bucket.percentage = share(bucket.count, total);
    }

    Distribution { total, buckets }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
