mod bootstrap;
mod report;

use anyhow::Result;
use chrono::Local;
use flow_core::settings::Settings;
use flow_data::aggregator::ItemFilter;
use flow_data::analysis::analyze_path;

use report::{build_report, ReportContext, ReportOutput};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Flow Metrics v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Input: {}, View: {}, Metric: {}",
        settings.input.display(),
        settings.view,
        settings.metric
    );

    let mapping = bootstrap::load_mapping(settings.mapping.as_deref())?;
    let analysis = analyze_path(&settings.input, &mapping)?;

    let filter = ItemFilter {
        areas: settings.area.clone(),
        types: settings.item_type.clone(),
        exclude_types: settings.exclude_type.clone(),
    };
    let items = filter.apply(&analysis.items);
    if !filter.is_empty() {
        tracing::info!("{} of {} items match the filter", items.len(), analysis.items.len());
    }

    let ctx = ReportContext {
        metric: settings.metric(),
        date_field: settings.date_field(),
        boundaries: settings.buckets.clone(),
        as_of: Local::now().naive_local(),
    };
    let report = build_report(&settings.view, &items, &ctx)?;

    if settings.wants_json() {
        let output = ReportOutput {
            metadata: &analysis.metadata,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
