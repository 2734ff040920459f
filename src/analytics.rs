//! Derived analytics over the sorted timeline: growth rate and the 7-day
//! rebound index, plus the narrative strings shown in the conclusions panel.
//!
//! Both computations are total: degenerate inputs produce defined defaults
//! (`None` / `InsufficientData`), never an error or a division by zero.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use crate::dataset::date_from_days;
use crate::error::DashboardError;
use crate::schema::cases;

/// Timeline points required before a rebound verdict can be computed.
const REBOUND_MIN_POINTS: usize = 14;
const ROLLING_WINDOW: usize = 7;

const ALERT_THRESHOLD: f64 = 1.2;
const UPWARD_THRESHOLD: f64 = 1.0;

/// Growth of confirmed cases between the first and last timeline rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_cases: i64,
    pub end_cases: i64,
    /// Percentage change. When start_cases is zero this is 0 for a flat zero
    /// timeline and a flat 100 otherwise, a fixed policy rather than a
    /// mathematically rigorous rate.
    pub rate: f64,
}

/// Rebound verdict: ratio of the latest 7-day average of new cases to the
/// 7-day average one week earlier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ReboundVerdict {
    InsufficientData,
    ReboundAlert { ratio: f64 },
    UpwardTrend { ratio: f64 },
    StableOrDeclining { ratio: f64 },
}

impl ReboundVerdict {
    /// Severity level for the presentation layer, mirroring the alert boxes
    /// of the dashboard.
    pub fn severity(&self) -> &'static str {
        match self {
            ReboundVerdict::InsufficientData => "info",
            ReboundVerdict::ReboundAlert { .. } => "error",
            ReboundVerdict::UpwardTrend { .. } => "warning",
            ReboundVerdict::StableOrDeclining { .. } => "success",
        }
    }
}

/// Growth rate from the first and last rows of the sorted timeline.
/// Needs at least two points; otherwise there is nothing to compare.
pub fn growth_rate(timeline_df: &DataFrame) -> Result<Option<GrowthSummary>, DashboardError> {
    let height = timeline_df.height();
    if height < 2 {
        return Ok(None);
    }

    let dates = timeline_df.column(cases::FILE_DATE)?.date()?;
    let confirmed = timeline_df.column(cases::CONFIRMED)?.i64()?;

    let (Some(start_days), Some(end_days)) = (dates.phys.get(0), dates.phys.get(height - 1)) else {
        return Ok(None);
    };
    let start_cases = confirmed.get(0).unwrap_or(0);
    let end_cases = confirmed.get(height - 1).unwrap_or(0);

    let rate = if start_cases > 0 {
        (end_cases - start_cases) as f64 / start_cases as f64 * 100.0
    } else if end_cases == 0 {
        0.0
    } else {
        100.0
    };

    Ok(Some(GrowthSummary {
        start_date: date_from_days(start_days),
        end_date: date_from_days(end_days),
        start_cases,
        end_cases,
        rate,
    }))
}

/// Rebound index over the sorted timeline.
///
/// New cases are the first difference of the confirmed column (first delta
/// treated as zero). The verdict compares the trailing 7-day mean of new
/// cases at the last position against the mean one week earlier; a zero
/// denominator yields a ratio of 0.
pub fn rebound_index(timeline_df: &DataFrame) -> Result<ReboundVerdict, DashboardError> {
    let confirmed: Vec<f64> = timeline_df
        .column(cases::CONFIRMED)?
        .i64()?
        .into_iter()
        .map(|v| v.unwrap_or(0) as f64)
        .collect();

    let n = confirmed.len();
    if n < REBOUND_MIN_POINTS {
        return Ok(ReboundVerdict::InsufficientData);
    }

    let mut new_cases = vec![0.0; n];
    for i in 1..n {
        new_cases[i] = confirmed[i] - confirmed[i - 1];
    }

    let current_week = window_mean(&new_cases, n - ROLLING_WINDOW);
    let prev_week = window_mean(&new_cases, n - 2 * ROLLING_WINDOW);

    let ratio = if prev_week > 0.0 {
        current_week / prev_week
    } else {
        0.0
    };

    let verdict = if ratio > ALERT_THRESHOLD {
        ReboundVerdict::ReboundAlert { ratio }
    } else if ratio > UPWARD_THRESHOLD {
        ReboundVerdict::UpwardTrend { ratio }
    } else {
        ReboundVerdict::StableOrDeclining { ratio }
    };
    Ok(verdict)
}

fn window_mean(values: &[f64], start: usize) -> f64 {
    let window = &values[start..start + ROLLING_WINDOW];
    window.iter().sum::<f64>() / ROLLING_WINDOW as f64
}

/// Narrative string for the growth-rate panel.
pub fn growth_narrative(summary: Option<&GrowthSummary>) -> String {
    match summary {
        Some(s) => format!(
            "Between {} and {}, confirmed cases changed by {:.2}% \
             (from {} to {} cases).",
            s.start_date, s.end_date, s.rate, s.start_cases, s.end_cases
        ),
        None => "Insufficient data to compute a growth rate for the selected period.".to_string(),
    }
}

/// Narrative string for the rebound panel.
pub fn rebound_narrative(verdict: &ReboundVerdict) -> String {
    match verdict {
        ReboundVerdict::InsufficientData => {
            "At least 14 days of data are needed to compute the rebound index.".to_string()
        }
        ReboundVerdict::ReboundAlert { ratio } => format!(
            "REBOUND ALERT: rebound index {ratio:.2}. Cases are growing rapidly \
             in the last week of the selected period."
        ),
        ReboundVerdict::UpwardTrend { ratio } => format!(
            "Upward trend: rebound index {ratio:.2}. Slight increase in cases \
             over the last week."
        ),
        ReboundVerdict::StableOrDeclining { ratio } => format!(
            "Stable or declining: rebound index {ratio:.2}. The rate of spread \
             is slowing."
        ),
    }
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

    fn timeline_from(confirmed: &[i64]) -> DataFrame {
        let base = days("2020-01-01");
        let dates: Vec<i32> = (0..confirmed.len() as i32).map(|i| base + i).collect();
        polars::df![
            cases::FILE_DATE => dates,
            cases::CONFIRMED => confirmed
        ]
        .expect("construct dataframe")
        .lazy()
        .with_columns([col(cases::FILE_DATE).cast(DataType::Date)])
        .collect()
        .expect("cast dates")
    }

    #[test]
    fn growth_rate_between_first_and_last_point() {
        let tl = timeline_from(&[100, 150]);
        let summary = growth_rate(&tl).expect("growth").expect("two points");
        assert!((summary.rate - 50.0).abs() < 1e-9);
        assert_eq!(summary.start_cases, 100);
        assert_eq!(summary.end_cases, 150);
    }

    #[test]
    fn growth_rate_zero_start_policy() {
        let flat_zero = timeline_from(&[0, 0, 0]);
        let summary = growth_rate(&flat_zero).expect("growth").expect("points");
        assert_eq!(summary.rate, 0.0);

        let from_zero = timeline_from(&[0, 42]);
        let summary = growth_rate(&from_zero).expect("growth").expect("points");
        assert_eq!(summary.rate, 100.0);
    }

    #[test]
    fn growth_rate_needs_two_points() {
        let tl = timeline_from(&[100]);
        assert!(growth_rate(&tl).expect("growth").is_none());
    }

    #[test]
    fn rebound_requires_fourteen_points() {
        let confirmed: Vec<i64> = (0..13).map(|i| 100 + i * 10).collect();
        let tl = timeline_from(&confirmed);
        let verdict = rebound_index(&tl).expect("rebound");
        assert_eq!(verdict, ReboundVerdict::InsufficientData);
        assert!(rebound_narrative(&verdict).contains("14"));
    }

    #[test]
    fn steady_new_cases_read_as_stable() {
        // 15 points with a constant 10 new cases per day: both weekly
        // averages are 10, ratio exactly 1.0.
        let confirmed: Vec<i64> = (0..15).map(|i| 100 + i * 10).collect();
        let tl = timeline_from(&confirmed);
        match rebound_index(&tl).expect("rebound") {
            ReboundVerdict::StableOrDeclining { ratio } => {
                assert!((ratio - 1.0).abs() < 1e-9);
            }
            other => panic!("expected stable verdict, got {other:?}"),
        }
    }

    #[test]
    fn accelerating_new_cases_trigger_the_alert() {
        // 10 new cases per day for a week, then 30 per day: ratio 3.0.
        let mut confirmed = Vec::new();
        let mut total = 100i64;
        confirmed.push(total);
        for _ in 0..7 {
            total += 10;
            confirmed.push(total);
        }
        for _ in 0..7 {
            total += 30;
            confirmed.push(total);
        }
        let tl = timeline_from(&confirmed);
        match rebound_index(&tl).expect("rebound") {
            ReboundVerdict::ReboundAlert { ratio } => {
                assert!((ratio - 3.0).abs() < 1e-9);
            }
            other => panic!("expected rebound alert, got {other:?}"),
        }
    }

    #[test]
    fn zero_denominator_yields_zero_ratio() {
        let confirmed = vec![100i64; 15];
        let tl = timeline_from(&confirmed);
        match rebound_index(&tl).expect("rebound") {
            ReboundVerdict::StableOrDeclining { ratio } => assert_eq!(ratio, 0.0),
            other => panic!("expected stable verdict, got {other:?}"),
        }
    }

    #[test]
    fn severity_levels_follow_the_verdict() {
        assert_eq!(ReboundVerdict::InsufficientData.severity(), "info");
        assert_eq!(ReboundVerdict::ReboundAlert { ratio: 2.0 }.severity(), "error");
        assert_eq!(ReboundVerdict::UpwardTrend { ratio: 1.1 }.severity(), "warning");
        assert_eq!(
            ReboundVerdict::StableOrDeclining { ratio: 0.5 }.severity(),
            "success"
        );
    }
}
