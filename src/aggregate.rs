//! Aggregation over the filtered case table.
//!
//! KPI totals, the date-grouped timeline in wide and long form, geographic
//! points for the bubble map, and the top-N active-cases ranking. The KPI,
//! map and ranking views all read the end-date-only slice of the filtered
//! table, not the whole range.

use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use polars::prelude::*;
use serde::Serialize;

use crate::error::DashboardError;
use crate::filter::date_expr;
use crate::schema::{cases, timeline};

const TOP_COUNTRIES: u32 = 10;

/// Static coordinate overrides for countries whose source coordinates are
/// ambiguous or missing. Consulted only by the map view and always wins over
/// per-row coordinates.
static COUNTRY_COORDS: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    HashMap::from([
        ("France", (46.2276, 2.2137)),
        ("United Kingdom", (55.3781, -3.4360)),
        ("Denmark", (56.2639, 9.5018)),
        ("Netherlands", (52.1326, 5.2913)),
        ("US", (37.0902, -95.7129)),
        ("United States", (37.0902, -95.7129)),
    ])
});

/// KPI triple shown at the top of the page. Totals are zero and the fatality
/// rate is zero when no rows match the end date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    pub confirmed: i64,
    pub deaths: i64,
    pub fatality_rate: f64,
}

/// Rows of the filtered table whose date equals exactly the selected end date.
pub fn end_date_slice(df: &DataFrame, end: NaiveDate) -> Result<DataFrame, DashboardError> {
    let out = df
        .clone()
        .lazy()
        .filter(col(cases::FILE_DATE).eq(date_expr(end)))
        .collect()?;
    Ok(out)
}

pub fn kpi_summary(df_last_day: &DataFrame) -> Result<KpiSummary, DashboardError> {
    let confirmed = df_last_day.column(cases::CONFIRMED)?.i64()?.sum().unwrap_or(0);
    let deaths = df_last_day.column(cases::DEATHS)?.i64()?.sum().unwrap_or(0);

    let fatality_rate = if confirmed > 0 {
        deaths as f64 / confirmed as f64 * 100.0
    } else {
        0.0
    };

    Ok(KpiSummary {
        confirmed,
        deaths,
        fatality_rate,
    })
}

/// Group the filtered table by date, summing the four count columns.
/// Explicitly sorted ascending by date: growth and rebound consume the rows
/// positionally.
pub fn timeline(df_filtered: &DataFrame) -> Result<DataFrame, DashboardError> {
    let out = df_filtered
        .clone()
        .lazy()
        .group_by([col(cases::FILE_DATE)])
        .agg([
            col(cases::CONFIRMED).sum(),
            col(cases::DEATHS).sum(),
            col(cases::RECOVERED).sum(),
            col(cases::ACTIVE).sum(),
        ])
        .sort([cases::FILE_DATE], SortMultipleOptions::default())
        .collect()?;
    Ok(out)
}

/// Long form of the timeline (date, series, cases) for the multi-series
/// line chart.
pub fn timeline_long(timeline_df: &DataFrame) -> Result<DataFrame, DashboardError> {
    let height = timeline_df.height();
    let dates = timeline_df.column(cases::FILE_DATE)?.date()?;

    let mut out_dates: Vec<Option<i32>> = Vec::with_capacity(height * cases::COUNTS.len());
    let mut out_series: Vec<&str> = Vec::with_capacity(height * cases::COUNTS.len());
    let mut out_values: Vec<Option<i64>> = Vec::with_capacity(height * cases::COUNTS.len());

    for name in cases::COUNTS {
        let values = timeline_df.column(name)?.i64()?;
        for i in 0..height {
            out_dates.push(dates.phys.get(i));
            out_series.push(name);
            out_values.push(values.get(i));
        }
    }

    let date_series = Series::new(cases::FILE_DATE.into(), out_dates).cast(&DataType::Date)?;
    let out = DataFrame::new(vec![
        date_series.into(),
        Series::new(timeline::SERIES.into(), out_series).into(),
        Series::new(timeline::CASES.into(), out_values).into(),
    ])?;
    Ok(out)
}

/// Geographic points (country, lat, long, confirmed) for the bubble map,
/// computed from the end-date slice.
///
/// Coordinates come from the static override table when the country is
/// listed there; otherwise from the country's highest-confirmed row.
/// Countries with no resolvable coordinate are dropped from this view only.
pub fn map_points(df_last_day: &DataFrame) -> Result<DataFrame, DashboardError> {
    let best_row_coord = SortMultipleOptions::default().with_order_descending(true);
    let totals = df_last_day
        .clone()
        .lazy()
        .group_by([col(cases::COUNTRY_REGION)])
        .agg([
            col(cases::CONFIRMED).sum(),
            col(cases::LAT)
                .sort_by([col(cases::CONFIRMED)], best_row_coord.clone())
                .first(),
            col(cases::LONG)
                .sort_by([col(cases::CONFIRMED)], best_row_coord)
                .first(),
        ])
        .collect()?;

    let countries = totals.column(cases::COUNTRY_REGION)?.str()?;
    let confirmed = totals.column(cases::CONFIRMED)?.i64()?;
    let lat = totals.column(cases::LAT)?.f64()?;
    let long = totals.column(cases::LONG)?.f64()?;

    let mut out_country: Vec<&str> = Vec::new();
    let mut out_lat: Vec<f64> = Vec::new();
    let mut out_long: Vec<f64> = Vec::new();
    let mut out_confirmed: Vec<i64> = Vec::new();

    for i in 0..totals.height() {
        let Some(country) = countries.get(i) else {
            continue;
        };
        let resolved = match COUNTRY_COORDS.get(country) {
            Some(&coords) => Some(coords),
            None => match (lat.get(i), long.get(i)) {
                (Some(lat), Some(long)) => Some((lat, long)),
                _ => None,
            },
        };
        let Some((point_lat, point_long)) = resolved else {
            continue;
        };

        out_country.push(country);
        out_lat.push(point_lat);
        out_long.push(point_long);
        out_confirmed.push(confirmed.get(i).unwrap_or(0));
    }

    let out = DataFrame::new(vec![
        Series::new(cases::COUNTRY_REGION.into(), out_country).into(),
        Series::new(cases::LAT.into(), out_lat).into(),
        Series::new(cases::LONG.into(), out_long).into(),
        Series::new(cases::CONFIRMED.into(), out_confirmed).into(),
    ])?;
    Ok(out)
}

/// Top-10 countries by active cases on the end date (country, active).
///
/// Takes the max per country rather than the sum, so duplicate rows for the
/// same country on the same date do not inflate the ranking.
pub fn top_active(df_last_day: &DataFrame) -> Result<DataFrame, DashboardError> {
    let out = df_last_day
        .clone()
        .lazy()
        .group_by([col(cases::COUNTRY_REGION)])
        .agg([col(cases::ACTIVE).max()])
        .sort(
            [cases::ACTIVE],
            SortMultipleOptions::default().with_order_descending(true),
        )
        .limit(TOP_COUNTRIES)
        .collect()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(s: &str) -> i32 {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .expect("parse date")
            .signed_duration_since(NaiveDate::default())
            .num_days() as i32
    }

    fn with_date_dtype(df: DataFrame) -> DataFrame {
        df.lazy()
            .with_columns([col(cases::FILE_DATE).cast(DataType::Date)])
            .collect()
            .expect("cast dates")
    }

    #[test]
    fn kpi_sums_and_fatality_rate() {
        let df = polars::df![
            cases::CONFIRMED => [30i64, 70],
            cases::DEATHS => [1i64, 2]
        ]
        .expect("construct dataframe");

        let kpi = kpi_summary(&df).expect("kpi");
        assert_eq!(kpi.confirmed, 100);
        assert_eq!(kpi.deaths, 3);
        assert!((kpi.fatality_rate - 3.0).abs() < 1e-9);
    }

    #[test]
    fn kpi_on_empty_slice_is_all_zero() {
        let df = polars::df![
            cases::CONFIRMED => [30i64],
            cases::DEATHS => [1i64]
        ]
        .expect("construct dataframe")
        .clear();

        let kpi = kpi_summary(&df).expect("kpi");
        assert_eq!(kpi.confirmed, 0);
        assert_eq!(kpi.deaths, 0);
        assert_eq!(kpi.fatality_rate, 0.0);
    }

    #[test]
    fn end_date_slice_matches_exact_day_only() {
        let df = with_date_dtype(
            polars::df![
                cases::COUNTRY_REGION => ["A", "A", "B"],
                cases::FILE_DATE => [days("2020-01-01"), days("2020-01-02"), days("2020-01-02")],
                cases::CONFIRMED => [1i64, 2, 3]
            ]
            .expect("construct dataframe"),
        );

        let slice = end_date_slice(&df, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap())
            .expect("end date slice");
        assert_eq!(slice.height(), 2);
    }

    #[test]
    fn timeline_sums_per_date_and_sorts_ascending() {
        let df = with_date_dtype(
            polars::df![
                cases::FILE_DATE => [days("2020-01-02"), days("2020-01-01"), days("2020-01-02")],
                cases::CONFIRMED => [20i64, 10, 5],
                cases::DEATHS => [2i64, 1, 1],
                cases::RECOVERED => [3i64, 2, 1],
                cases::ACTIVE => [15i64, 7, 3]
            ]
            .expect("construct dataframe"),
        );

        let tl = timeline(&df).expect("timeline");
        assert_eq!(tl.height(), 2);

        let confirmed = tl.column(cases::CONFIRMED).expect("confirmed").i64().expect("ints");
        assert_eq!(confirmed.get(0), Some(10));
        assert_eq!(confirmed.get(1), Some(25));

        let dates = tl.column(cases::FILE_DATE).expect("dates").date().expect("dates");
        assert!(dates.phys.get(0) < dates.phys.get(1));
    }

    #[test]
    fn timeline_long_emits_one_row_per_date_and_series() {
        let tl = with_date_dtype(
            polars::df![
                cases::FILE_DATE => [days("2020-01-01"), days("2020-01-02")],
                cases::CONFIRMED => [10i64, 25],
                cases::DEATHS => [1i64, 3],
                cases::RECOVERED => [2i64, 4],
                cases::ACTIVE => [7i64, 18]
            ]
            .expect("construct dataframe"),
        );

        let long = timeline_long(&tl).expect("long form");
        assert_eq!(long.height(), 8);

        let series = long.column(timeline::SERIES).expect("series").str().expect("strings");
        let names: Vec<&str> = series.into_iter().flatten().collect();
        for name in cases::COUNTS {
            assert_eq!(names.iter().filter(|n| **n == name).count(), 2);
        }
    }

    #[test]
    fn ranking_takes_max_not_sum_over_duplicates() {
        let df = polars::df![
            cases::COUNTRY_REGION => ["A", "A", "A", "B"],
            cases::ACTIVE => [5i64, 5, 9, 4]
        ]
        .expect("construct dataframe");

        let top = top_active(&df).expect("ranking");
        assert_eq!(top.height(), 2);

        let countries = top.column(cases::COUNTRY_REGION).expect("countries").str().expect("strings");
        let active = top.column(cases::ACTIVE).expect("active").i64().expect("ints");
        assert_eq!(countries.get(0), Some("A"));
        assert_eq!(active.get(0), Some(9));
    }

    #[test]
    fn ranking_is_capped_at_ten() {
        let countries: Vec<String> = (0..12).map(|i| format!("C{i:02}")).collect();
        let active: Vec<i64> = (0..12).collect();
        let df = polars::df![
            cases::COUNTRY_REGION => countries,
            cases::ACTIVE => active
        ]
        .expect("construct dataframe");

        let top = top_active(&df).expect("ranking");
        assert_eq!(top.height(), 10);

        let first = top.column(cases::ACTIVE).expect("active").i64().expect("ints");
        assert_eq!(first.get(0), Some(11));
    }

    #[test]
    fn map_points_override_wins_over_row_coordinates() {
        let df = polars::df![
            cases::COUNTRY_REGION => ["US", "US"],
            cases::CONFIRMED => [50i64, 100],
            cases::LAT => [Some(1.0), Some(2.0)],
            cases::LONG => [Some(1.0), Some(2.0)]
        ]
        .expect("construct dataframe");

        let points = map_points(&df).expect("map points");
        assert_eq!(points.height(), 1);

        let lat = points.column(cases::LAT).expect("lat").f64().expect("floats");
        let long = points.column(cases::LONG).expect("long").f64().expect("floats");
        assert_eq!(lat.get(0), Some(37.0902));
        assert_eq!(long.get(0), Some(-95.7129));

        let confirmed = points.column(cases::CONFIRMED).expect("confirmed").i64().expect("ints");
        assert_eq!(confirmed.get(0), Some(150));
    }

    #[test]
    fn map_points_fall_back_to_highest_confirmed_row() {
        let df = polars::df![
            cases::COUNTRY_REGION => ["Chile", "Chile"],
            cases::CONFIRMED => [10i64, 90],
            cases::LAT => [Some(-30.0), Some(-33.4)],
            cases::LONG => [Some(-70.0), Some(-70.6)]
        ]
        .expect("construct dataframe");

        let points = map_points(&df).expect("map points");
        let lat = points.column(cases::LAT).expect("lat").f64().expect("floats");
        assert_eq!(lat.get(0), Some(-33.4));
    }

    #[test]
    fn map_points_drop_unresolvable_countries() {
        let df = polars::df![
            cases::COUNTRY_REGION => ["Nowhere", "Chile"],
            cases::CONFIRMED => [10i64, 90],
            cases::LAT => [None, Some(-33.4)],
            cases::LONG => [None, Some(-70.6)]
        ]
        .expect("construct dataframe");

        let points = map_points(&df).expect("map points");
        assert_eq!(points.height(), 1);

        let countries = points
            .column(cases::COUNTRY_REGION)
            .expect("countries")
            .str()
            .expect("strings");
        assert_eq!(countries.get(0), Some("Chile"));
    }
}
