//! Single chart fetch: one GET, one decoded [`ChartFrame`].

use serde::Deserialize;
use tracing::debug;

use netdata_types::{ChartFrame, ColumnNaming, FloatPrecision, Frame, RowKey, Value};

use crate::{Credentials, FetchError, FetchRequest, FrameSink, NetdataClient};

/// Per-frame processing shared by every unit of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOptions {
    pub naming: ColumnNaming,
    /// Drop columns holding anything but numbers.
    pub numeric_only: bool,
    pub precision: FloatPrecision,
}

/// Decoded `/api/v1/data?format=json` body.
///
/// The first label names the time field of every row and is discarded.
#[derive(Debug, Clone, Deserialize)]
pub struct RawChartPayload {
    pub labels: Vec<String>,
    pub data: Vec<Vec<serde_json::Value>>,
}

impl RawChartPayload {
    /// Build the frame for `chart` on `host`.
    pub fn into_frame(
        self,
        host: &str,
        chart: &str,
        options: &FrameOptions,
    ) -> Result<ChartFrame, FetchError> {
        let index = self
            .data
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let time = row.first().and_then(timestamp).ok_or_else(|| {
                    FetchError::Parse(format!("row {} has no numeric timestamp", i))
                })?;
                Ok(if options.naming.host_prefix {
                    RowKey::time(time)
                } else {
                    RowKey::new(host, time)
                })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        let mut frame = Frame::with_index(index);
        for (offset, dimension) in self.labels.iter().enumerate().skip(1) {
            let values = self
                .data
                .iter()
                .map(|row| row.get(offset).map_or(Value::Null, cell))
                .collect();
            frame.push_column(options.naming.column_key(host, chart, dimension), values);
        }

        if options.numeric_only {
            frame.retain_numeric();
        }
        frame.cast(options.precision);

        Ok(ChartFrame {
            host: host.to_string(),
            chart: chart.to_string(),
            frame,
        })
    }
}

/// Fetch and decode one chart.
pub async fn fetch_chart(
    client: &NetdataClient,
    request: &FetchRequest,
    options: &FrameOptions,
) -> Result<ChartFrame, FetchError> {
    let credentials = match (&request.username, &request.password) {
        (Some(username), Some(password)) => Some(Credentials {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };

    let payload: RawChartPayload = client.get_json(&request.url, credentials.as_ref()).await?;
    let frame = payload.into_frame(&request.host, &request.chart, options)?;

    debug!(
        host = %request.host,
        chart = %request.chart,
        rows = frame.frame.n_rows(),
        columns = frame.frame.n_cols(),
        "fetched chart"
    );
    Ok(frame)
}

/// Fetch one chart and append it to `sink`.
pub async fn collect_chart(
    client: &NetdataClient,
    request: &FetchRequest,
    options: &FrameOptions,
    sink: &FrameSink,
) -> Result<(), FetchError> {
    let frame = fetch_chart(client, request, options).await?;
    if !sink.push(frame) {
        debug!(host = %request.host, chart = %request.chart, "sink sealed, frame discarded");
    }
    Ok(())
}

fn timestamp(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|t| t.trunc() as i64))
}

fn cell(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
        serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
        serde_json::Value::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}
