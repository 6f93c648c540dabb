//! Data layer for flow metrics.
//!
//! Reads exported rows, normalizes them into work items, reconstructs block
//! histories and groups items for the reports.

pub mod aggregator;
pub mod analysis;
pub mod blocks;
pub mod normalizer;
pub mod reader;
pub mod review;
