//! Request planning: hosts and charts in, one [`FetchRequest`] per pair out.

use tracing::debug;

use crate::{FetchError, NetdataClient};

/// One chart data request against one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub chart: String,
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Which charts to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSelection {
    /// The same charts on every host.
    Charts(Vec<String>),
    /// Every chart each host reports, optionally filtered by name prefix.
    /// Costs one catalog request per host.
    All { starts_with: Option<String> },
    /// An explicit chart list per host, in the given host order.
    PerHost(Vec<(String, Vec<String>)>),
}

impl ChartSelection {
    /// Sentinel accepted in place of a chart name to mean "every chart".
    pub const ALL: &'static str = "all";

    /// Build a selection from chart names, treating a lone `all` as
    /// [`ChartSelection::All`].
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() == 1 && names[0] == Self::ALL {
            ChartSelection::All { starts_with: None }
        } else {
            ChartSelection::Charts(names)
        }
    }
}

impl From<&str> for ChartSelection {
    fn from(chart: &str) -> Self {
        ChartSelection::from_names([chart])
    }
}

impl From<Vec<String>> for ChartSelection {
    fn from(charts: Vec<String>) -> Self {
        ChartSelection::from_names(charts)
    }
}

/// Time window and aggregation of a data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQuery {
    /// Absolute timestamp, or seconds relative to `before` when negative.
    pub after: i64,
    /// Absolute timestamp, or seconds relative to now when zero or negative.
    pub before: i64,
    /// Number of points to aggregate into; zero returns every point.
    pub points: u64,
    /// Server-side grouping function (`average`, `max`, `sum`, ...).
    pub group: String,
}

impl Default for DataQuery {
    fn default() -> Self {
        Self {
            after: -60,
            before: 0,
            points: 0,
            group: "average".to_string(),
        }
    }
}

/// The flat list of requests for one batch, plus the hosts it spans.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestPlan {
    pub hosts: Vec<String>,
    pub requests: Vec<FetchRequest>,
}

impl NetdataClient {
    /// URL of the chart data endpoint.
    pub fn data_url(&self, host: &str, chart: &str, query: &DataQuery) -> String {
        self.api_url(
            host,
            &format!(
                "data?chart={}&after={}&before={}&points={}&format=json&group={}",
                chart, query.after, query.before, query.points, query.group
            ),
        )
    }

    /// Build the request for one (host, chart) pair, carrying the client's
    /// protocol and credentials.
    pub fn request(&self, host: &str, chart: &str, query: &DataQuery) -> FetchRequest {
        let credentials = self.credentials();
        FetchRequest {
            url: self.data_url(host, chart, query),
            chart: chart.to_string(),
            host: host.to_string(),
            username: credentials.map(|c| c.username.clone()),
            password: credentials.map(|c| c.password.clone()),
        }
    }

    /// Expand hosts and a chart selection into requests, host-major.
    ///
    /// `hosts` is ignored for [`ChartSelection::PerHost`], which names its
    /// own hosts.
    pub async fn plan(
        &self,
        hosts: &[String],
        selection: &ChartSelection,
        query: &DataQuery,
    ) -> Result<RequestPlan, FetchError> {
        let pairs: Vec<(String, Vec<String>)> = match selection {
            ChartSelection::Charts(charts) => hosts
                .iter()
                .map(|host| (host.clone(), charts.clone()))
                .collect(),
            ChartSelection::All { starts_with } => {
                let mut pairs = Vec::with_capacity(hosts.len());
                for host in hosts {
                    let charts = self
                        .chart_list(host, starts_with.as_deref())
                        .await
                        .map_err(|e| e.for_chart(host.clone(), ChartSelection::ALL))?;
                    pairs.push((host.clone(), charts));
                }
                pairs
            }
            ChartSelection::PerHost(mapping) => mapping.clone(),
        };

        if pairs.is_empty() {
            return Err(FetchError::InvalidConfig("no hosts to fetch from".to_string()));
        }

        let plan = RequestPlan {
            hosts: pairs.iter().map(|(host, _)| host.clone()).collect(),
            requests: pairs
                .iter()
                .flat_map(|(host, charts)| charts.iter().map(move |chart| (host, chart)))
                .map(|(host, chart)| self.request(host, chart, query))
                .collect(),
        };

        debug!(
            hosts = plan.hosts.len(),
            requests = plan.requests.len(),
            "planned chart requests"
        );
        Ok(plan)
    }
}
