//! Latest-value snapshots (`/api/v1/allmetrics?format=json`).

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::{FetchError, NetdataClient};

/// One dimension's latest value, in long form.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub host: String,
    /// `last_updated` of the chart, in epoch seconds.
    pub time: i64,
    pub chart: String,
    /// `chart<col_sep>name`.
    pub dimension: String,
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartSnapshot {
    #[serde(default)]
    last_updated: i64,
    #[serde(default)]
    dimensions: BTreeMap<String, DimensionSnapshot>,
}

#[derive(Debug, Deserialize)]
struct DimensionSnapshot {
    name: String,
    value: Option<f64>,
}

impl NetdataClient {
    /// Latest value of every dimension on `host`, optionally restricted to
    /// `charts`.
    pub async fn allmetrics(
        &self,
        host: &str,
        charts: Option<&[String]>,
        col_sep: &str,
    ) -> Result<Vec<MetricSample>, FetchError> {
        let url = self.api_url(host, "allmetrics?format=json");
        let raw: BTreeMap<String, ChartSnapshot> = self.get_json(&url, self.credentials()).await?;
        let samples = samples_from_snapshot(host, raw, charts, col_sep);

        debug!(host, samples = samples.len(), "fetched allmetrics");
        Ok(samples)
    }

    /// [`NetdataClient::allmetrics`] for several hosts, one after another.
    pub async fn allmetrics_hosts(
        &self,
        hosts: &[String],
        charts: Option<&[String]>,
        col_sep: &str,
    ) -> Result<Vec<MetricSample>, FetchError> {
        let mut samples = Vec::new();
        for host in hosts {
            samples.extend(self.allmetrics(host, charts, col_sep).await?);
        }
        Ok(samples)
    }
}

fn samples_from_snapshot(
    host: &str,
    raw: BTreeMap<String, ChartSnapshot>,
    charts: Option<&[String]>,
    col_sep: &str,
) -> Vec<MetricSample> {
    raw.into_iter()
        .filter(|(chart, _)| charts.map_or(true, |wanted| wanted.contains(chart)))
        .flat_map(|(chart, snapshot)| {
            let time = snapshot.last_updated;
            snapshot
                .dimensions
                .into_values()
                .map(move |dim| MetricSample {
                    host: host.to_string(),
                    time,
                    dimension: format!("{}{}{}", chart, col_sep, dim.name),
                    chart: chart.clone(),
                    value: dim.value,
                })
        })
        .collect()
}

/// Pivot long-form samples into one mean value per dimension column.
///
/// Dimensions without any value are left out. Columns come out sorted by
/// name when `sort_cols` is set, otherwise in first-seen order.
pub fn wide(samples: &[MetricSample], sort_cols: bool) -> Vec<(String, f64)> {
    let mut order: Vec<&str> = Vec::new();
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for sample in samples {
        let Some(value) = sample.value else { continue };
        let entry = sums.entry(sample.dimension.as_str()).or_insert_with(|| {
            order.push(sample.dimension.as_str());
            (0.0, 0)
        });
        entry.0 += value;
        entry.1 += 1;
    }

    if sort_cols {
        order.sort_unstable();
    }

    order
        .into_iter()
        .map(|dim| {
            let (sum, count) = sums[dim];
            (dim.to_string(), sum / count as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> BTreeMap<String, ChartSnapshot> {
        serde_json::from_value(json!({
            "system.cpu": {
                "last_updated": 1600000000,
                "dimensions": {
                    "user": {"name": "user", "value": 1.5},
                    "system": {"name": "system", "value": 0.5}
                }
            },
            "system.load": {
                "last_updated": 1600000001,
                "dimensions": {"load1": {"name": "load1", "value": null}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_long_form() {
        let samples = samples_from_snapshot("A", snapshot(), None, "|");
        assert_eq!(samples.len(), 3);
        let user = samples.iter().find(|s| s.dimension == "system.cpu|user").unwrap();
        assert_eq!(user.time, 1600000000);
        assert_eq!(user.chart, "system.cpu");
        assert_eq!(user.value, Some(1.5));
    }

    #[test]
    fn test_chart_filter() {
        let charts = vec!["system.load".to_string()];
        let samples = samples_from_snapshot("A", snapshot(), Some(&charts), "|");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, None);
    }

    #[test]
    fn test_wide_means_per_dimension() {
        let mut samples = samples_from_snapshot("A", snapshot(), None, "|");
        samples.extend(samples_from_snapshot("B", snapshot(), None, "|"));
        samples[0].value = Some(3.5);

        let wide = wide(&samples, true);
        let names: Vec<&str> = wide.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["system.cpu|system", "system.cpu|user"]);
        assert_eq!(wide[0].1, (3.5 + 0.5) / 2.0);
    }
}
