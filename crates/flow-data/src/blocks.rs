//! Block history reconstruction from the free-text block annotation.
//!
//! The annotation is a sequence of entries, each introduced by a date tag and
//! optionally carrying status and author tags:
//!
//! ```text
//! DATA[2024-03-01] STATUS[Blocked] AUTOR[ana] waiting on vendor DATA[2024-03-05] STATUS[Unblocked]
//! ```
//!
//! Dated entries are sorted chronologically and paired: the first of each pair
//! blocks the item, the second unblocks it. A trailing unpaired entry means the
//! item is still blocked.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use flow_core::dates::days_between_dates;
use flow_core::models::{BlockHistory, BlockPeriod};
use regex::Regex;
use tracing::debug;

const ENTRY_MARKER: &str = "DATA[";

/// One annotation entry before pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub author: Option<String>,
    pub description: String,
}

/// Scanner state while walking the annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Before the first entry marker; text here belongs to no entry.
    SeekingEntry,
    /// Inside an entry that began at `start`.
    InEntry { start: usize },
}

fn date_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^DATA\[(\d{4}-\d{2}-\d{2})\]").expect("regex is valid"))
}

fn status_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"STATUS\[([^\]]+)\]").expect("regex is valid"))
}

fn author_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"AUTOR\[([^\]]+)\]").expect("regex is valid"))
}

fn any_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"DATA\[\d{4}-\d{2}-\d{2}\]|AUTOR\[[^\]]+\]|STATUS\[[^\]]+\]")
            .expect("regex is valid")
    })
}

// ── Scanning ──────────────────────────────────────────────────────────────────

/// Split the annotation into entries, one per `DATA[` marker, in text order.
///
/// Text before the first marker is ignored. A `DATA[` inside a description
/// starts a new entry.
pub fn scan_entries(text: &str) -> Vec<BlockEntry> {
    let mut entries = Vec::new();
    let mut state = ScanState::SeekingEntry;

    for (pos, _) in text.match_indices(ENTRY_MARKER) {
        if let ScanState::InEntry { start } = state {
            push_entry(&mut entries, &text[start..pos]);
        }
        state = ScanState::InEntry { start: pos };
    }

    if let ScanState::InEntry { start } = state {
        push_entry(&mut entries, &text[start..]);
    }

    entries
}

fn push_entry(entries: &mut Vec<BlockEntry>, segment: &str) {
    if segment[ENTRY_MARKER.len()..].trim().is_empty() {
        return;
    }
    entries.push(parse_entry(segment));
}

/// Decode one entry segment starting at its `DATA[` marker.
fn parse_entry(segment: &str) -> BlockEntry {
    let date = date_tag().captures(segment).and_then(|caps| {
        let raw = &caps[1];
        let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok();
        if parsed.is_none() {
            debug!("Ignoring block entry with invalid date {}", raw);
        }
        parsed
    });

    let status = status_tag().captures(segment).map(|caps| caps[1].to_string());
    let author = author_tag().captures(segment).map(|caps| caps[1].to_string());
    let description = any_tag().replace_all(segment, "").trim().to_string();

    BlockEntry {
        date,
        status,
        author,
        description,
    }
}

// ── Pairing ───────────────────────────────────────────────────────────────────

/// Reconstruct the block history of an item from its annotation.
///
/// Empty text yields an empty history. Entries without a valid date are left
/// out of pairing.
///
/// ```
/// use flow_data::blocks::parse_block_history;
///
/// let history = parse_block_history("DATA[2024-03-01] STATUS[Blocked] DATA[2024-03-05] STATUS[Free]");
/// assert_eq!(history.periods.len(), 1);
/// assert_eq!(history.total_blocked_days, 4);
/// assert!(!history.is_currently_blocked);
/// ```
pub fn parse_block_history(text: &str) -> BlockHistory {
    let mut dated: Vec<(NaiveDate, BlockEntry)> = scan_entries(text)
        .into_iter()
        .filter_map(|entry| entry.date.map(|date| (date, entry)))
        .collect();

    // Stable: same-day entries keep their text order.
    dated.sort_by_key(|(date, _)| *date);

    let mut history = BlockHistory::default();
    for pair in dated.chunks(2) {
        match pair {
            [(block_date, block), (unblock_date, unblock)] => {
                let days = days_between_dates(
                    block_date.and_time(NaiveTime::MIN),
                    unblock_date.and_time(NaiveTime::MIN),
                );
                history.total_blocked_days += days;
                history.periods.push(BlockPeriod {
                    block_date: *block_date,
                    unblock_date: Some(*unblock_date),
                    block_status: block.status.clone(),
                    unblock_status: unblock.status.clone(),
                    block_author: block.author.clone(),
                    unblock_author: unblock.author.clone(),
                    block_description: block.description.clone(),
                    unblock_description: Some(unblock.description.clone()),
                    blocked_days: Some(days),
                    still_blocked: false,
                });
            }
            [(block_date, block)] => {
                history.periods.push(BlockPeriod {
                    block_date: *block_date,
                    unblock_date: None,
                    block_status: block.status.clone(),
                    unblock_status: None,
                    block_author: block.author.clone(),
                    unblock_author: None,
                    block_description: block.description.clone(),
                    unblock_description: None,
                    blocked_days: None,
                    still_blocked: true,
                });
            }
            _ => {}
        }
    }

    history.is_currently_blocked = dated.len() % 2 == 1;
    history
}

// ── Tests ─────────────────────────────────────────────────────────────────────
