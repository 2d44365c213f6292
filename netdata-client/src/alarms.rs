//! Alarm log retrieval (`/api/v1/alarm_log`).

use chrono::DateTime;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{FetchError, NetdataClient};

/// Fields holding epoch seconds that can be rendered as calendar time.
pub const ALARM_TIME_FIELDS: &[&str] = &["when", "delay_up_to_timestamp"];

/// The alarm log reshaped into a table: one row per alarm record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlarmLog {
    /// Union of record keys, in first-seen order.
    pub columns: Vec<String>,
    /// One row per record, aligned with `columns`; missing keys are null.
    pub rows: Vec<Vec<Value>>,
}

impl AlarmLog {
    /// Reshape decoded records into a table.
    pub fn from_records(records: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|c| record.remove(c).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, if present.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let i = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[i]).collect())
    }

    /// Replace epoch-second values in [`ALARM_TIME_FIELDS`] with RFC 3339
    /// UTC strings. Non-numeric values are left alone.
    pub fn convert_datetimes(&mut self) {
        let targets: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| ALARM_TIME_FIELDS.contains(&c.as_str()))
            .map(|(i, _)| i)
            .collect();

        for row in &mut self.rows {
            for &i in &targets {
                if let Some(formatted) = epoch_to_rfc3339(&row[i]) {
                    row[i] = Value::String(formatted);
                }
            }
        }
    }
}

fn epoch_to_rfc3339(value: &Value) -> Option<String> {
    let secs = value.as_f64()?;
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round() as u32;
    DateTime::from_timestamp(whole, nanos).map(|dt| dt.to_rfc3339())
}

impl NetdataClient {
    /// Fetch the alarm log of `host`, optionally converting its timestamps.
    pub async fn alarm_log(&self, host: &str, datetimes: bool) -> Result<AlarmLog, FetchError> {
        let url = self.api_url(host, "alarm_log");
        let records: Vec<Map<String, Value>> = self.get_json(&url, self.credentials()).await?;

        let mut log = AlarmLog::from_records(records);
        if datetimes {
            log.convert_datetimes();
        }

        debug!(host, alarms = log.len(), "fetched alarm log");
        Ok(log)
    }
}
