use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::models::{DateField, Metric};
use crate::stats::DEFAULT_BUCKET_BOUNDARIES;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Flow metrics for issue-tracker exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flow-metrics",
    about = "Lead time, delivery, effort and block metrics for issue-tracker exports",
    version
)]
pub struct Settings {
    /// Exported rows: a .json/.jsonl file or a directory of them
    #[arg(long, short)]
    pub input: PathBuf,

    /// Field mapping file (JSON object of canonical key to column name)
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    /// Metric to aggregate
    #[arg(long, default_value = "lead-time", value_parser = ["lead-time", "delivery", "discovery", "effort", "estimate", "blocked"])]
    pub metric: String,

    /// Date field used for monthly grouping (depends on the metric if omitted)
    #[arg(long, value_parser = [
        "created", "resolved", "delivery-start", "delivery-end", "discovery-start",
        "discovery-end", "approval", "refinement", "release",
    ])]
    pub group_by: Option<String>,

    /// Upper bucket boundaries in days, comma separated
    #[arg(long, value_delimiter = ',', default_value = "30,60,90,180")]
    pub buckets: Vec<i64>,

    /// Only include items from this area (repeatable)
    #[arg(long)]
    pub area: Vec<String>,

    /// Only include items of this type (repeatable)
    #[arg(long = "type")]
    pub item_type: Vec<String>,

    /// Exclude items of this type, case-insensitive (repeatable)
    #[arg(long)]
    pub exclude_type: Vec<String>,

    /// Report view
    #[arg(long, default_value = "summary", value_parser = ["summary", "monthly", "distribution", "blocks", "review", "items"])]
    pub view: String,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and resolve derived defaults.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`Settings::load`] but with an explicit argument list, so it can
    /// be unit-tested without spawning subprocesses.
    pub fn load_from_args(args: Vec<OsString>) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let settings = Settings::parse_from(args);
        Self::resolve(settings, &matches)
    }

    /// Apply `--debug` and fill `--group-by` from the metric when it was not
    /// given on the command line.
    fn resolve(mut settings: Settings, matches: &clap::ArgMatches) -> Settings {
        // NOTE: clap stores the arg id using the field name, not the flag.
        if !is_arg_explicitly_set(matches, "group_by") {
            settings.group_by = Some(settings.metric().default_date_field().name().to_string());
        }

        if settings.buckets.is_empty() {
            settings.buckets = DEFAULT_BUCKET_BOUNDARIES.to_vec();
        }

        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Selected metric as an enum.
    pub fn metric(&self) -> Metric {
        Metric::from_name(&self.metric).unwrap_or(Metric::LeadTime)
    }

    /// Date field used for grouping, falling back to the metric's default.
    pub fn date_field(&self) -> DateField {
        self.group_by
            .as_deref()
            .and_then(DateField::from_name)
            .unwrap_or_else(|| self.metric().default_date_field())
    }

    pub fn wants_json(&self) -> bool {
        self.format == "json"
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
