//! Snapshot orchestration.
//!
//! One call per user interaction: recomputes every presentation-boundary
//! artifact from the immutable loaded table and the current filter
//! selection. Each view carries its own empty state, so a selection that
//! matches nothing still yields a complete snapshot (zero KPIs, empty
//! frames, "insufficient data" narratives) instead of an error.

use polars::prelude::DataFrame;
use tracing::info;

use crate::aggregate::{self, KpiSummary};
use crate::analytics::{self, GrowthSummary, ReboundVerdict};
use crate::dataset::CovidDataset;
use crate::error::DashboardError;
use crate::filter::{self, FilterSelection};

/// Everything the presentation layer consumes for one filter selection.
pub struct DashboardSnapshot {
    /// Sorted continent labels present in the dataset.
    pub continent_options: Vec<String>,
    /// Sorted countries, restricted to the selected continents.
    pub country_options: Vec<String>,
    pub kpis: KpiSummary,
    /// Wide timeline (date + four summed count columns), ascending by date.
    pub timeline: DataFrame,
    /// Long-form timeline (date, series, cases) for the line chart.
    pub timeline_long: DataFrame,
    /// (country, lat, long, confirmed) for the bubble map.
    pub map_points: DataFrame,
    /// (country, active) top-10 ranking for the bar chart.
    pub top_active: DataFrame,
    pub growth: Option<GrowthSummary>,
    pub growth_narrative: String,
    pub rebound: ReboundVerdict,
    pub rebound_narrative: String,
}

pub fn build_snapshot(
    dataset: &CovidDataset,
    selection: &FilterSelection,
) -> Result<DashboardSnapshot, DashboardError> {
    let df = dataset.frame();

    let continent_options = filter::continent_options(df)?;
    let country_options = filter::country_options(df, &selection.continents)?;

    let filtered = filter::apply(df, selection)?;

    // KPI, map and ranking read only the end-date slice. An explicit range
    // pins the end date; otherwise the dataset's last date is used.
    let end_date = match selection.date_range {
        Some((_, end)) => Some(end),
        None => dataset.date_span()?.map(|(_, max)| max),
    };
    let last_day = match end_date {
        Some(end) => aggregate::end_date_slice(&filtered, end)?,
        None => filtered.clear(),
    };

    let kpis = aggregate::kpi_summary(&last_day)?;
    let timeline = aggregate::timeline(&filtered)?;
    let timeline_long = aggregate::timeline_long(&timeline)?;
    let map_points = aggregate::map_points(&last_day)?;
    let top_active = aggregate::top_active(&last_day)?;

    let growth = analytics::growth_rate(&timeline)?;
    let growth_narrative = analytics::growth_narrative(growth.as_ref());
    let rebound = analytics::rebound_index(&timeline)?;
    let rebound_narrative = analytics::rebound_narrative(&rebound);

    info!(
        filtered_rows = filtered.height(),
        timeline_points = timeline.height(),
        rebound_severity = rebound.severity(),
        "built dashboard snapshot"
    );

    Ok(DashboardSnapshot {
        continent_options,
        country_options,
        kpis,
        timeline,
        timeline_long,
        map_points,
        top_active,
        growth,
        growth_narrative,
        rebound,
        rebound_narrative,
    })
}
