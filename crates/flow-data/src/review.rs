//! Aging of items waiting in review.
//!
//! An item is in review when its status mentions `review`. Its age is counted
//! from the end of delivery (the date it entered review) to `as_of`.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use flow_core::dates::{days_between_dates, parse_export_date};
use flow_core::formatting::normalize_label;
use flow_core::models::Item;
use flow_core::stats::{bucket_distribution, Distribution};
use serde::Serialize;

/// Upper bounds of the review age ranges, in days.
pub const REVIEW_BOUNDARIES: [i64; 3] = [30, 60, 90];

/// One item currently in review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem<'a> {
    pub item: &'a Item,
    pub normalized_type: String,
    pub days_in_review: i64,
    pub period: &'static str,
}

/// Number of review items sharing one normalized type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    pub normalized_type: String,
    /// First original spelling seen for the type.
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAging<'a> {
    /// Oldest first.
    pub items: Vec<ReviewItem<'a>>,
    pub distribution: Distribution,
    pub by_type: Vec<TypeCount>,
}

pub fn is_in_review(item: &Item) -> bool {
    item.status
        .as_deref()
        .map_or(false, |status| status.to_lowercase().contains("review"))
}

/// Whole days between the item's delivery end and `as_of`, in either
/// direction, rounding partial days up. `None` when delivery end is missing
/// or unparseable.
pub fn days_in_review(item: &Item, as_of: NaiveDateTime) -> Option<i64> {
    let entered = parse_export_date(&item.delivery_end)?;
    let days = if as_of >= entered {
        days_between_dates(entered, as_of)
    } else {
        days_between_dates(as_of, entered)
    };
    Some(days)
}

/// Age range label for a review age.
pub fn review_period(days: i64) -> &'static str {
    match days {
        d if d <= 30 => "até 30 dias",
        d if d <= 60 => "31-60 dias",
        d if d <= 90 => "61-90 dias",
        _ => "acima de 90 dias",
    }
}

/// Review items among `items` with their ages at `as_of`, plus the age
/// distribution and the count per normalized type.
pub fn review_aging<'a, I>(items: I, as_of: NaiveDateTime) -> ReviewAging<'a>
where
    I: IntoIterator<Item = &'a Item>,
{
    let mut review: Vec<ReviewItem<'a>> = items
        .into_iter()
        .filter(|item| is_in_review(item))
        .filter_map(|item| {
            let days = days_in_review(item, as_of)?;
            Some(ReviewItem {
                item,
                normalized_type: normalize_label(&item.item_type),
                days_in_review: days,
                period: review_period(days),
            })
        })
        .collect();

    let ages: Vec<i64> = review.iter().map(|r| r.days_in_review).collect();
    let distribution = bucket_distribution(&ages, &REVIEW_BOUNDARIES);

    let mut types: BTreeMap<&str, TypeCount> = BTreeMap::new();
    for r in &review {
        types
            .entry(r.normalized_type.as_str())
            .or_insert_with(|| TypeCount {
                normalized_type: r.normalized_type.clone(),
                label: r.item.item_type.clone(),
                count: 0,
            })
            .count += 1;
    }
    let by_type = types.into_values().collect();

    review.sort_by(|a, b| b.days_in_review.cmp(&a.days_in_review));

    ReviewAging {
        items: review,
        distribution,
        by_type,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn as_of() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn review_item(key: &str, item_type: &str, status: &str, delivery_end: &str) -> Item {
        let mut item = Item::new(key, item_type);
        item.status = Some(status.to_string());
        item.delivery_end = delivery_end.to_string();
        item
    }

    // ── is_in_review ──────────────────────────────────────────────────────────

    #[test]
    fn test_is_in_review_case_insensitive() {
        assert!(is_in_review(&review_item("P-1", "Story", "Code Review", "")));
        assert!(is_in_review(&review_item("P-1", "Story", "IN REVIEW", "")));
        assert!(!is_in_review(&review_item("P-1", "Story", "Done", "")));
        assert!(!is_in_review(&Item::new("P-1", "Story")));
    }

    // ── days_in_review ────────────────────────────────────────────────────────

    #[test]
    fn test_days_in_review_rounds_up() {
        let item = review_item("P-1", "Story", "Review", "31/mai/24 12:00 AM");
        assert_eq!(days_in_review(&item, as_of()), Some(2));
    }

    #[test]
    fn test_days_in_review_future_date_is_absolute() {
        let item = review_item("P-1", "Story", "Review", "03/jun/24 12:00 AM");
        assert_eq!(days_in_review(&item, as_of()), Some(2));
    }

    #[test]
    fn test_days_in_review_unparseable() {
        let item = review_item("P-1", "Story", "Review", "");
        assert_eq!(days_in_review(&item, as_of()), None);
    }

    // ── review_period ─────────────────────────────────────────────────────────

    #[test]
    fn test_review_period_boundaries() {
        assert_eq!(review_period(0), "até 30 dias");
        assert_eq!(review_period(30), "até 30 dias");
        assert_eq!(review_period(31), "31-60 dias");
        assert_eq!(review_period(60), "31-60 dias");
        assert_eq!(review_period(90), "61-90 dias");
        assert_eq!(review_period(91), "acima de 90 dias");
    }

    // ── review_aging ──────────────────────────────────────────────────────────

    #[test]
    fn test_review_aging() {
        let items = vec![
            review_item("P-1", "História", "Review", "20/mai/24 12:00 PM"),
            review_item("P-2", "historia", "In Review", "01/jan/24 12:00 PM"),
            review_item("P-3", "Bug", "Review", "15/mar/24 12:00 PM"),
            review_item("P-4", "Bug", "Done", "15/mar/24 12:00 PM"),
            review_item("P-5", "Bug", "Review", ""),
        ];
        let aging = review_aging(&items, as_of());

        let keys: Vec<&str> = aging.items.iter().map(|r| r.item.key.as_str()).collect();
        assert_eq!(keys, vec!["P-2", "P-3", "P-1"]);
        assert_eq!(aging.items[0].period, "acima de 90 dias");
        assert_eq!(aging.items[2].days_in_review, 12);

        let counts: Vec<usize> = aging.distribution.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 1]);

        assert_eq!(aging.by_type.len(), 2);
        assert_eq!(aging.by_type[0].normalized_type, "bug");
        assert_eq!(aging.by_type[1].normalized_type, "historia");
        assert_eq!(aging.by_type[1].count, 2);
        assert_eq!(aging.by_type[1].label, "História");
    }
}
