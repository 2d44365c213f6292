//! Column naming.

/// How chart, dimension and host are combined into a column name.
///
/// Without host prefixing a column is `chart<col_sep>dimension` and the
/// host lives in the row index; with it the column becomes
/// `host<host_sep>chart<col_sep>dimension` and the index is time only.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnNaming {
    pub col_sep: String,
    pub host_sep: String,
    pub host_prefix: bool,
}

impl ColumnNaming {
    /// Separator between chart and dimension.
    pub const DEFAULT_COL_SEP: &'static str = "|";
    /// Separator between host and chart.
    pub const DEFAULT_HOST_SEP: &'static str = ":";

    /// Build the column key for one dimension of a chart on a host.
    pub fn column_key(&self, host: &str, chart: &str, dimension: &str) -> String {
        if self.host_prefix {
            format!("{host}{}{chart}{}{dimension}", self.host_sep, self.col_sep)
        } else {
            format!("{chart}{}{dimension}", self.col_sep)
        }
    }
}

impl Default for ColumnNaming {
    fn default() -> Self {
        Self {
            col_sep: Self::DEFAULT_COL_SEP.to_string(),
            host_sep: Self::DEFAULT_HOST_SEP.to_string(),
            host_prefix: false,
        }
    }
}
