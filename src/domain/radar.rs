//! Radar - Spider Chart Series
//!
//! Builds normalized radar series from in-memory analytics rows. Drawing is
//! left to the chart widget; this only decides axes and point values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One analytics table row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRow {
    pub ticker: String,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl AnalyticsRow {
    /// Numeric value of `field`; numeric strings are accepted
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.values.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
    }
}

/// One polygon on the chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarSeries {
    pub label: String,
    /// Normalized values in `[0, 1]`, aligned with the chart axes
    pub points: Vec<Option<f64>>,
}

/// Axes plus one series per row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RadarChart {
    pub axes: Vec<String>,
    pub series: Vec<RadarSeries>,
}

/// Build radar series for `rows` over the enabled subset of `fields`
///
/// Fields missing from `enabled` count as enabled. Each axis is min-max
/// normalized across the rows; an axis with one distinct value maps to 0.5.
pub fn build_radar_series(
    rows: &[AnalyticsRow],
    fields: &[String],
    enabled: &BTreeMap<String, bool>,
) -> RadarChart {
    let axes: Vec<String> = fields
        .iter()
        .filter(|f| enabled.get(f.as_str()).copied().unwrap_or(true))
        .cloned()
        .collect();

    let bounds: Vec<Option<(f64, f64)>> = axes
        .iter()
        .map(|axis| {
            rows.iter()
                .filter_map(|row| row.number(axis))
                .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                })
        })
        .collect();

    let series = rows
        .iter()
        .map(|row| RadarSeries {
            label: row.ticker.clone(),
            points: axes
                .iter()
                .zip(&bounds)
                .map(|(axis, bound)| {
                    let value = row.number(axis)?;
                    let (lo, hi) = (*bound)?;
                    if hi > lo {
                        Some((value - lo) / (hi - lo))
                    } else {
                        Some(0.5)
                    }
                })
                .collect(),
        })
        .collect();

    RadarChart { axes, series }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(ticker: &str, values: Value) -> AnalyticsRow {
        serde_json::from_value(json!({ "ticker": ticker, "values": values })).expect("row")
    }

    #[test]
    fn normalizes_each_axis() {
        let rows = vec![
            row("AAA", json!({"pe": 10, "yield": "2.0"})),
            row("BBB", json!({"pe": 30, "yield": "4.0"})),
        ];
        let fields = vec!["pe".to_string(), "yield".to_string()];
        let chart = build_radar_series(&rows, &fields, &BTreeMap::new());

        assert_eq!(chart.axes, fields);
        assert_eq!(chart.series[0].points, vec![Some(0.0), Some(0.0)]);
        assert_eq!(chart.series[1].points, vec![Some(1.0), Some(1.0)]);
    }

    #[test]
    fn disabled_fields_are_not_axes() {
        let rows = vec![row("AAA", json!({"pe": 10, "beta": 1.2}))];
        let fields = vec!["pe".to_string(), "beta".to_string()];
        let enabled = BTreeMap::from([("beta".to_string(), false)]);

        let chart = build_radar_series(&rows, &fields, &enabled);
        assert_eq!(chart.axes, vec!["pe".to_string()]);
        // Single row: constant axis sits in the middle
        assert_eq!(chart.series[0].points, vec![Some(0.5)]);
    }

    #[test]
    fn non_numeric_values_are_gaps() {
        let rows = vec![
            row("AAA", json!({"sector": "Tech", "pe": null})),
            row("BBB", json!({"sector": "Energy", "pe": 12})),
        ];
        let fields = vec!["sector".to_string(), "pe".to_string()];
        let chart = build_radar_series(&rows, &fields, &BTreeMap::new());

        assert_eq!(chart.series[0].points, vec![None, None]);
        assert_eq!(chart.series[1].points, vec![None, Some(0.5)]);
    }
}
