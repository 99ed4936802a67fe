//! Benchmark chart data
//!
//! Turns a table of measurements (one row per x tick, one column per
//! implementation) into line series for an external renderer.

use crate::{PlotError, Result};
use serde::Serialize;

/// Line colors assigned to series in order
pub const SERIES_COLORS: [&str; 5] = ["#F6511D", "#00A6ED", "#FFB400", "#7FB800", "#0D2C54"];

/// One row of a benchmark table
#[derive(Debug, Clone, PartialEq)]
pub struct PerfRow {
    pub tick: String,
    pub values: Vec<f64>,
}

impl PerfRow {
    pub fn new(tick: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            tick: tick.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerfSeries {
    pub label: String,
    pub color: &'static str,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerfPlan {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Tick labels at x = 0, 1, 2, ...
    pub ticks: Vec<String>,
    pub y_lower: f64,
    pub series: Vec<PerfSeries>,
}

/// Build a benchmark chart from rows and series labels
///
/// Series beyond the available colors or labels are dropped.
pub fn perf_plan(
    rows: &[PerfRow],
    labels: &[&str],
    title: &str,
    x_label: &str,
    units: &str,
) -> Result<PerfPlan> {
    let width = rows.first().map_or(0, |r| r.values.len());
    if let Some(bad) = rows.iter().find(|r| r.values.len() != width) {
        return Err(PlotError::InvalidConfiguration(format!(
            "Row '{}' has {} values, expected {}",
            bad.tick,
            bad.values.len(),
            width
        )));
    }

    let x: Vec<f64> = (0..rows.len()).map(|i| i as f64).collect();
    let series: Vec<PerfSeries> = labels
        .iter()
        .zip(SERIES_COLORS)
        .take(width)
        .enumerate()
        .map(|(column, (label, color))| PerfSeries {
            label: label.to_string(),
            color,
            x: x.clone(),
            y: rows.iter().map(|r| r.values[column]).collect(),
        })
        .collect();

    if series.len() < width {
        log::warn!(
            "Benchmark table has {} columns, only {} are plotted",
            width,
            series.len()
        );
    }

    Ok(PerfPlan {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: units.to_string(),
        ticks: rows.iter().map(|r| r.tick.clone()).collect(),
        y_lower: 0.0,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_from_columns() {
        let rows = vec![
            PerfRow::new("64", vec![1.0, 2.0]),
            PerfRow::new("128", vec![1.5, 3.5]),
            PerfRow::new("256", vec![2.5, 7.0]),
        ];
        let plan = perf_plan(&rows, &["fast", "slow"], "Speed", "Size", "ms").unwrap();

        assert_eq!(plan.ticks, vec!["64", "128", "256"]);
        assert_eq!(plan.series.len(), 2);
        assert_eq!(plan.series[1].label, "slow");
        assert_eq!(plan.series[1].y, vec![2.0, 3.5, 7.0]);
        assert_eq!(plan.series[0].x, vec![0.0, 1.0, 2.0]);
        assert_eq!(plan.series[0].color, "#F6511D");
        assert_eq!(plan.y_label, "ms");
    }

    #[test]
    fn test_extra_columns_dropped() {
        let rows = vec![PerfRow::new("a", vec![1.0; 7])];
        let labels = ["1", "2", "3", "4", "5", "6", "7"];
        let plan = perf_plan(&rows, &labels, "Speed", "X", "ms").unwrap();
        assert_eq!(plan.series.len(), SERIES_COLORS.len());
    }

    #[test]
    fn test_ragged_rows() {
        let rows = vec![PerfRow::new("a", vec![1.0, 2.0]), PerfRow::new("b", vec![1.0])];
        assert!(matches!(
            perf_plan(&rows, &["x", "y"], "Speed", "X", "ms"),
            Err(PlotError::InvalidConfiguration(_))
        ));
    }
}
