//! Filter engine.
//!
//! Narrows the case table by continent set, country set and inclusive date
//! range. Every axis is independently optional: an empty selection places no
//! restriction. The country options offered to the UI are conditioned on the
//! selected continents, never the other way around.

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::debug;

use crate::error::DashboardError;
use crate::schema::cases;

/// One user filter selection. Empty vectors mean "no restriction";
/// `date_range` is inclusive on both ends at day granularity.
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    pub continents: Vec<String>,
    pub countries: Vec<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// A day-granularity date literal for comparisons against `file_date`.
pub(crate) fn date_expr(date: NaiveDate) -> Expr {
    let days = date
        .signed_duration_since(NaiveDate::default())
        .num_days() as i32;
    lit(days).cast(DataType::Date)
}

/// Apply the selection to the enriched case table.
pub fn apply(df: &DataFrame, selection: &FilterSelection) -> Result<DataFrame, DashboardError> {
    let mut lazy = df.clone().lazy();

    if let Some((start, end)) = selection.date_range {
        lazy = lazy.filter(
            col(cases::FILE_DATE)
                .gt_eq(date_expr(start))
                .and(col(cases::FILE_DATE).lt_eq(date_expr(end))),
        );
    }

    if !selection.continents.is_empty() {
        let wanted = Series::new(cases::CONTINENT.into(), selection.continents.clone());
        lazy = lazy.filter(col(cases::CONTINENT).is_in(lit(wanted), false));
    }

    if !selection.countries.is_empty() {
        let wanted = Series::new(cases::COUNTRY_REGION.into(), selection.countries.clone());
        lazy = lazy.filter(col(cases::COUNTRY_REGION).is_in(lit(wanted), false));
    }

    let filtered = lazy.collect()?;
    debug!(rows = filtered.height(), "applied filter selection");
    Ok(filtered)
}

/// Sorted distinct continent labels present in the table.
pub fn continent_options(df: &DataFrame) -> Result<Vec<String>, DashboardError> {
    sorted_unique(df, cases::CONTINENT)
}

/// Sorted distinct countries offered for selection, restricted to the given
/// continents when any are selected.
pub fn country_options(
    df: &DataFrame,
    continents: &[String],
) -> Result<Vec<String>, DashboardError> {
    if continents.is_empty() {
        return sorted_unique(df, cases::COUNTRY_REGION);
    }

    let wanted = Series::new(cases::CONTINENT.into(), continents.to_vec());
    let narrowed = df
        .clone()
        .lazy()
        .filter(col(cases::CONTINENT).is_in(lit(wanted), false))
        .collect()?;
    sorted_unique(&narrowed, cases::COUNTRY_REGION)
}

fn sorted_unique(df: &DataFrame, column: &str) -> Result<Vec<String>, DashboardError> {
    let unique = df.column(column)?.as_materialized_series().unique()?;
    let mut values: Vec<String> = unique
        .str()?
        .into_iter()
        .flatten()
        .map(|s| s.to_string())
        .collect();
    values.sort();
    Ok(values)
}
