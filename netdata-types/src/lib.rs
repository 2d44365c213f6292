//! # netdata-types
//!
//! Tabular data model for chart history pulled from netdata hosts. A
//! [`Frame`] is a row index of [`RowKey`]s (host and time, or time alone)
//! plus a list of equally long [`Column`]s of [`Value`] cells.
//!
//! ## Features
//!
//! - `serde`: serialization of every type via serde; cells, keys and
//!   columns also deserialize
//!
//! ## Example
//!
//! ```rust
//! use netdata_types::{ColumnNaming, Frame, RowKey, Value};
//!
//! let naming = ColumnNaming::default();
//! let mut frame = Frame::with_index(vec![RowKey::new("london", 1), RowKey::new("london", 2)]);
//! frame.push_column(
//!     naming.column_key("london", "system.cpu", "user"),
//!     vec![Value::Number(1.5), Value::Null],
//! );
//!
//! assert_eq!(frame.n_rows(), 2);
//! assert!(frame.column("system.cpu|user").is_some());
//! ```

mod frame;
mod naming;
mod value;

pub use frame::*;
pub use naming::*;
pub use value::*;
