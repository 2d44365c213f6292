//! Row-level post-processing steps.

use std::collections::BTreeMap;

use netdata_types::{Frame, RowKey, Value};

/// Collapse rows sharing a key into their element-wise maximum.
///
/// Rows come out in key order. Within a group nulls never win and ties go
/// to the later row.
pub fn dedup_max(frame: &Frame) -> Frame {
    let mut groups: BTreeMap<&RowKey, Vec<usize>> = BTreeMap::new();
    for (i, key) in frame.index().iter().enumerate() {
        groups.entry(key).or_default().push(i);
    }

    if groups.len() == frame.n_rows() {
        let order: Vec<usize> = groups.into_values().flatten().collect();
        return frame.take_rows(&order);
    }

    let mut out = Frame::with_index(groups.keys().map(|&key| key.clone()).collect());
    for column in frame.columns() {
        let values = groups
            .values()
            .map(|rows| {
                rows.iter()
                    .fold(Value::Null, |acc, &i| acc.max_of(column.values[i].clone()))
            })
            .collect();
        out.push_column(column.name.clone(), values);
    }
    out
}

/// Remove the host level from the index.
pub fn drop_host_level(frame: &mut Frame) {
    for key in frame.index_mut() {
        key.host = None;
    }
}

/// Sort rows by key, keeping the relative order of equal keys.
pub fn sort_rows(frame: &Frame) -> Frame {
    let mut order: Vec<usize> = (0..frame.n_rows()).collect();
    order.sort_by(|&a, &b| frame.index()[a].cmp(&frame.index()[b]));
    frame.take_rows(&order)
}

/// Carry the last non-null value of each column forward over nulls.
pub fn ffill(frame: &mut Frame) {
    for column in frame.columns_mut() {
        let mut last: Option<Value> = None;
        for value in &mut column.values {
            if value.is_null() {
                if let Some(ref prev) = last {
                    *value = prev.clone();
                }
            } else {
                last = Some(value.clone());
            }
        }
    }
}

/// Replace each value with its difference from the previous row, then drop
/// rows left entirely null. The first row always becomes null.
///
/// Only numbers are differenced; a text or null operand gives null.
pub fn diff(frame: &Frame) -> Frame {
    let mut differenced = frame.clone();
    for (out, column) in differenced.columns_mut().iter_mut().zip(frame.columns()) {
        for i in 0..column.values.len() {
            out.values[i] = match i.checked_sub(1) {
                None => Value::Null,
                Some(p) => match (column.values[i].as_f64(), column.values[p].as_f64()) {
                    (Some(cur), Some(prev)) => Value::Number(cur - prev),
                    _ => Value::Null,
                },
            };
        }
    }
    drop_all_null_rows(&differenced)
}

/// Drop rows where every cell is null. Frames without columns are returned
/// unchanged.
pub fn drop_all_null_rows(frame: &Frame) -> Frame {
    if frame.n_cols() == 0 {
        return frame.clone();
    }
    let keep: Vec<usize> = (0..frame.n_rows())
        .filter(|&i| frame.row(i).any(|v| !v.is_null()))
        .collect();
    frame.take_rows(&keep)
}
