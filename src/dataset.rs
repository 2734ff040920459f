//! Dataset loading.
//!
//! Reads the pre-aggregated case table from CSV, types the columns, backfills
//! the `active` column when the file does not carry one, and attaches the
//! continent column. The loaded table is immutable for the rest of the
//! session; every downstream view recomputes from it.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use polars::datatypes::TimeUnit;
use polars::prelude::StrptimeOptions;
use polars::prelude::*;
use tracing::{debug, info};

use crate::enrich;
use crate::error::DashboardError;
use crate::schema::cases;

/// The loaded, enriched case table. Read-only after construction.
#[derive(Debug)]
pub struct CovidDataset {
    df: DataFrame,
}

impl CovidDataset {
    /// Load the case table from a CSV file.
    ///
    /// Required columns: country_region, file_date, confirmed, deaths,
    /// recovered. Optional: active (backfilled as confirmed - deaths -
    /// recovered when the column is absent), lat, long (null when absent).
    ///
    /// A missing file is the one terminal condition of the pipeline and is
    /// surfaced as `DashboardError::DataNotFound`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DashboardError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DashboardError::DataNotFound(PathBuf::from(path)));
        }

        let raw = read_csv_as_strings(path)?;
        require_columns(&raw, &cases::REQUIRED)?;

        let schema = raw.schema();
        let has_active = schema.contains(cases::ACTIVE);
        let has_lat = schema.contains(cases::LAT);
        let has_long = schema.contains(cases::LONG);
        debug!(has_active, has_lat, has_long, "optional columns present");

        let mut lazy = raw.lazy().with_columns([
            col(cases::CONFIRMED).cast(DataType::Int64),
            col(cases::DEATHS).cast(DataType::Int64),
            col(cases::RECOVERED).cast(DataType::Int64),
            col(cases::FILE_DATE)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .str()
                .to_datetime(
                    Some(TimeUnit::Microseconds),
                    None,
                    StrptimeOptions {
                        format: None,
                        strict: false,
                        ..Default::default()
                    },
                    lit("raise"),
                )
                .cast(DataType::Date),
        ]);

        // Backfill only when the column is entirely absent; supplied values
        // are kept as-is even if inconsistent with the formula.
        if has_active {
            lazy = lazy.with_columns([col(cases::ACTIVE).cast(DataType::Int64)]);
        } else {
            lazy = lazy.with_columns([(col(cases::CONFIRMED)
                - col(cases::DEATHS)
                - col(cases::RECOVERED))
            .alias(cases::ACTIVE)]);
        }

        if has_lat {
            lazy = lazy.with_columns([col(cases::LAT).cast(DataType::Float64)]);
        } else {
            lazy = lazy.with_columns([lit(NULL).cast(DataType::Float64).alias(cases::LAT)]);
        }
        if has_long {
            lazy = lazy.with_columns([col(cases::LONG).cast(DataType::Float64)]);
        } else {
            lazy = lazy.with_columns([lit(NULL).cast(DataType::Float64).alias(cases::LONG)]);
        }

        let typed = lazy.collect()?;

        // Broadcast-join the per-distinct-country continent labels.
        let continent_map = enrich::continent_map_frame(&typed)?;
        let df = typed
            .lazy()
            .join(
                continent_map.lazy(),
                [col(cases::COUNTRY_REGION)],
                [col(cases::COUNTRY_REGION)],
                JoinArgs::new(JoinType::Left),
            )
            .collect()?;

        info!(rows = df.height(), path = %path.display(), "loaded case table");
        Ok(Self { df })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Min and max file_date, for the UI date picker bounds. None on an
    /// empty table.
    pub fn date_span(&self) -> Result<Option<(NaiveDate, NaiveDate)>, DashboardError> {
        let dates = self.df.column(cases::FILE_DATE)?.date()?;
        match (dates.phys.min(), dates.phys.max()) {
            (Some(min), Some(max)) => Ok(Some((date_from_days(min), date_from_days(max)))),
            _ => Ok(None),
        }
    }
}

pub(crate) fn date_from_days(days: i32) -> NaiveDate {
    NaiveDate::default() + Duration::days(days as i64)
}

/// Read a CSV file with all columns as String dtype and trimmed column names.
fn read_csv_as_strings(path: &Path) -> Result<DataFrame, DashboardError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), DashboardError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(DashboardError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}
