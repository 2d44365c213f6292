//! Concatenation of per-chart frames into one frame.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use netdata_types::{ChartFrame, Column, Frame, RowKey, Value};

/// What the merge needs to know about the batch the frames came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeContext {
    /// Number of distinct hosts requested.
    pub host_count: usize,
    /// Whether column names already carry the host.
    pub host_prefix: bool,
}

impl MergeContext {
    /// Frames share one time axis and carry disjoint columns.
    pub fn joins_columns(&self) -> bool {
        self.host_count == 1 || self.host_prefix
    }
}

/// Merge frames in arrival order.
///
/// With one host, or with host-prefixed column names, frames are joined
/// side by side on their row keys. Otherwise their rows are stacked and the
/// columns outer-joined, since every host reports the same column names.
/// No frames gives an empty frame.
pub fn merge(frames: Vec<ChartFrame>, ctx: MergeContext) -> Frame {
    if frames.is_empty() {
        return Frame::new();
    }
    let count = frames.len();
    let merged = if ctx.joins_columns() {
        concat_columns(frames)
    } else {
        concat_rows(frames)
    };
    debug!(
        frames = count,
        rows = merged.n_rows(),
        columns = merged.n_cols(),
        axis = if ctx.joins_columns() { "columns" } else { "rows" },
        "merged frames"
    );
    merged
}

/// The k-th occurrence of a key in a frame pairs with the k-th occurrence of
/// the same key in every other frame.
fn aligned_keys(index: &[RowKey]) -> Vec<(RowKey, usize)> {
    let mut seen: HashMap<&RowKey, usize> = HashMap::new();
    index
        .iter()
        .map(|key| {
            let occurrence = seen.entry(key).or_insert(0);
            let slot = (key.clone(), *occurrence);
            *occurrence += 1;
            slot
        })
        .collect()
}

fn concat_columns(frames: Vec<ChartFrame>) -> Frame {
    let slots: BTreeSet<(RowKey, usize)> = frames
        .iter()
        .flat_map(|f| aligned_keys(f.frame.index()))
        .collect();
    let position: HashMap<&(RowKey, usize), usize> =
        slots.iter().enumerate().map(|(i, slot)| (slot, i)).collect();
    let n_rows = slots.len();

    let mut columns: Vec<Column> = Vec::new();
    let mut column_at: HashMap<String, usize> = HashMap::new();

    for chart in &frames {
        let rows: Vec<usize> = aligned_keys(chart.frame.index())
            .iter()
            .map(|slot| position[slot])
            .collect();

        for source in chart.frame.columns() {
            let target = *column_at.entry(source.name.clone()).or_insert_with(|| {
                columns.push(Column::new(source.name.clone(), vec![Value::Null; n_rows]));
                columns.len() - 1
            });
            for (&row, value) in rows.iter().zip(&source.values) {
                if !value.is_null() {
                    columns[target].values[row] = value.clone();
                }
            }
        }
    }

    let mut frame = Frame::with_index(slots.into_iter().map(|(key, _)| key).collect());
    for column in columns {
        frame.push_column(column.name, column.values);
    }
    frame
}

fn concat_rows(frames: Vec<ChartFrame>) -> Frame {
    let names: BTreeSet<&str> = frames
        .iter()
        .flat_map(|f| f.frame.column_names())
        .collect();

    let index: Vec<RowKey> = frames
        .iter()
        .flat_map(|f| f.frame.index().iter().cloned())
        .collect();

    let mut frame = Frame::with_index(index);
    for name in names {
        let values = frames
            .iter()
            .flat_map(|f| match f.frame.column(name) {
                Some(column) => column.values.clone(),
                None => vec![Value::Null; f.frame.n_rows()],
            })
            .collect();
        frame.push_column(name, values);
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(host: &str, chart: &str, index: Vec<RowKey>, columns: &[(&str, Vec<f64>)]) -> ChartFrame {
        let mut frame = Frame::with_index(index);
        for (name, values) in columns {
            frame.push_column(*name, values.iter().map(|&v| Value::Number(v)).collect());
        }
        ChartFrame {
            host: host.to_string(),
            chart: chart.to_string(),
            frame,
        }
    }

    fn times(host: Option<&str>, ts: &[i64]) -> Vec<RowKey> {
        ts.iter()
            .map(|&t| RowKey {
                host: host.map(str::to_string),
                time: t,
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let merged = merge(
            Vec::new(),
            MergeContext {
                host_count: 2,
                host_prefix: false,
            },
        );
        assert!(merged.is_empty());
        assert_eq!(merged.n_cols(), 0);
    }

    #[test]
    fn test_column_axis_outer_joins_time() {
        let cpu = chart("A", "cpu", times(Some("A"), &[1, 2]), &[("cpu|user", vec![1.0, 2.0])]);
        let load = chart("A", "load", times(Some("A"), &[2, 3]), &[("load|1m", vec![0.2, 0.3])]);

        let merged = merge(
            vec![load, cpu],
            MergeContext {
                host_count: 1,
                host_prefix: false,
            },
        );

        assert_eq!(merged.index(), times(Some("A"), &[1, 2, 3]).as_slice());
        assert_eq!(
            merged.column("cpu|user").unwrap().values,
            vec![Value::Number(1.0), Value::Number(2.0), Value::Null]
        );
        assert_eq!(
            merged.column("load|1m").unwrap().values,
            vec![Value::Null, Value::Number(0.2), Value::Number(0.3)]
        );
    }

    #[test]
    fn test_column_axis_keeps_duplicate_timestamps() {
        let a = chart("A", "c", times(None, &[1, 1]), &[("c|v", vec![1.0, 5.0])]);
        let merged = merge(
            vec![a],
            MergeContext {
                host_count: 1,
                host_prefix: false,
            },
        );
        assert_eq!(merged.n_rows(), 2);
    }

    #[test]
    fn test_column_axis_duplicate_column_last_write_wins() {
        let first = chart("A", "c", times(None, &[1, 2]), &[("c|v", vec![1.0, 2.0])]);
        let second = chart("A", "c", times(None, &[2]), &[("c|v", vec![9.0])]);
        let merged = merge(
            vec![first, second],
            MergeContext {
                host_count: 1,
                host_prefix: false,
            },
        );
        assert_eq!(merged.n_cols(), 1);
        assert_eq!(
            merged.column("c|v").unwrap().values,
            vec![Value::Number(1.0), Value::Number(9.0)]
        );
    }

    #[test]
    fn test_row_axis_stacks_hosts() {
        let a = chart("A", "c", times(Some("A"), &[1, 2]), &[("c|x", vec![1.0, 2.0])]);
        let b = chart("B", "c", times(Some("B"), &[5]), &[("c|y", vec![7.0])]);

        let merged = merge(
            vec![a, b],
            MergeContext {
                host_count: 2,
                host_prefix: false,
            },
        );

        assert_eq!(merged.n_rows(), 3);
        assert_eq!(merged.column_names().collect::<Vec<_>>(), vec!["c|x", "c|y"]);
        assert_eq!(
            merged.column("c|y").unwrap().values,
            vec![Value::Null, Value::Null, Value::Number(7.0)]
        );
        assert_eq!(merged.index()[2], RowKey::new("B", 5));
    }
}
