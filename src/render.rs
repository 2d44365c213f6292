//! CSV and JSON output of datasets, alarm logs and allmetrics snapshots.

use std::io::{self, Write};

use serde_json::json;

use netdata_client::{AlarmLog, MetricSample};
use netdata_types::Value;

use crate::pipeline::Dataset;

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_record<W, I, S>(out: &mut W, fields: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line: Vec<String> = fields.into_iter().map(|f| escape(f.as_ref())).collect();
    writeln!(out, "{}", line.join(","))
}

/// Plain-text rendering of a JSON cell: strings unquoted, null empty.
fn json_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write a dataset as CSV. The host column only appears when the index
/// still carries hosts.
pub fn dataset_csv<W: Write>(out: &mut W, dataset: &Dataset) -> io::Result<()> {
    let frame = &dataset.frame;
    let with_host = frame.index().iter().any(|key| key.host.is_some());

    let mut header: Vec<&str> = Vec::with_capacity(frame.n_cols() + 2);
    if with_host {
        header.push("host");
    }
    header.push("time");
    header.extend(frame.column_names());
    write_record(out, header)?;

    for (i, key) in frame.index().iter().enumerate() {
        let mut record: Vec<String> = Vec::with_capacity(frame.n_cols() + 2);
        if with_host {
            record.push(key.host.clone().unwrap_or_default());
        }
        record.push(match &dataset.datetime {
            Some(dt) => dt.values[i].to_rfc3339(),
            None => key.time.to_string(),
        });
        record.extend(frame.row(i).map(Value::to_string));
        write_record(out, record)?;
    }
    Ok(())
}

pub fn dataset_json<W: Write>(out: &mut W, dataset: &Dataset) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, dataset)?;
    writeln!(out)
}

pub fn alarms_csv<W: Write>(out: &mut W, log: &AlarmLog) -> io::Result<()> {
    write_record(out, &log.columns)?;
    for row in &log.rows {
        write_record(out, row.iter().map(json_cell))?;
    }
    Ok(())
}

/// Alarm records as a JSON array of objects, nulls left out.
pub fn alarms_json<W: Write>(out: &mut W, log: &AlarmLog) -> io::Result<()> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> = log
        .rows
        .iter()
        .map(|row| {
            log.columns
                .iter()
                .zip(row)
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &records)?;
    writeln!(out)
}

pub fn samples_csv<W: Write>(out: &mut W, samples: &[MetricSample]) -> io::Result<()> {
    write_record(out, ["host", "time", "chart", "dimension", "value"])?;
    for s in samples {
        write_record(
            out,
            [
                s.host.clone(),
                s.time.to_string(),
                s.chart.clone(),
                s.dimension.clone(),
                s.value.map(|v| v.to_string()).unwrap_or_default(),
            ],
        )?;
    }
    Ok(())
}

pub fn samples_json<W: Write>(out: &mut W, samples: &[MetricSample]) -> io::Result<()> {
    let records: Vec<serde_json::Value> = samples
        .iter()
        .map(|s| {
            json!({
                "host": s.host,
                "time": s.time,
                "chart": s.chart,
                "dimension": s.dimension,
                "value": s.value,
            })
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &records)?;
    writeln!(out)
}

/// Wide allmetrics form: one header line of dimension columns, one row of means.
pub fn wide_csv<W: Write>(out: &mut W, wide: &[(String, f64)]) -> io::Result<()> {
    write_record(out, wide.iter().map(|(name, _)| name.as_str()))?;
    write_record(out, wide.iter().map(|(_, value)| value.to_string()))
}

pub fn wide_json<W: Write>(out: &mut W, wide: &[(String, f64)]) -> io::Result<()> {
    let record: serde_json::Map<String, serde_json::Value> = wide
        .iter()
        .map(|(name, value)| (name.clone(), json!(value)))
        .collect();
    serde_json::to_writer_pretty(&mut *out, &record)?;
    writeln!(out)
}

/// Chart names, one per line.
pub fn chart_list<W: Write>(out: &mut W, charts: &[String], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Csv => {
            for chart in charts {
                writeln!(out, "{}", escape(chart))?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, charts)?;
            writeln!(out)
        }
    }
}
