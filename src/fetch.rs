//! The end-to-end `get_data` call: plan, fetch, merge, post-process.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::info;

use netdata_client::{fetch_all, ChartSelection, DataQuery, FrameOptions, NetdataClient};

use crate::pipeline::{merge, process, Dataset, MergeContext, PostProcess};
use crate::Error;

/// Everything one `get_data` call needs besides the client.
#[derive(Debug, Clone)]
pub struct DataRequest {
    pub hosts: Vec<String>,
    pub charts: ChartSelection,
    pub query: DataQuery,
    /// Per-chart frame shaping: column naming, numeric filter, precision.
    pub frame: FrameOptions,
    /// Deadline for the whole concurrent phase.
    pub timeout: Duration,
    pub post: PostProcess,
}

impl Default for DataRequest {
    fn default() -> Self {
        Self {
            hosts: vec!["london.my-netdata.io".to_string()],
            charts: ChartSelection::from("system.cpu"),
            query: DataQuery::default(),
            frame: FrameOptions::default(),
            timeout: Duration::from_secs(60),
            post: PostProcess::default(),
        }
    }
}

/// Fetch every requested chart from every host and return one dataset.
///
/// A deadline that elapses is not an error: whatever finished in time is
/// merged, and nothing finishing gives an empty dataset. The first failing
/// chart aborts the batch.
pub async fn get_data(client: &NetdataClient, request: &DataRequest) -> Result<Dataset, Error> {
    let plan = client
        .plan(&request.hosts, &request.charts, &request.query)
        .await?;

    let ctx = MergeContext {
        host_count: plan.hosts.iter().collect::<BTreeSet<_>>().len(),
        host_prefix: request.frame.naming.host_prefix,
    };

    let outcome = fetch_all(client, plan.requests, &request.frame, request.timeout).await?;
    if !outcome.is_complete() {
        info!(
            fetched = outcome.frames.len(),
            requested = outcome.requested,
            "building dataset from a partial batch"
        );
    }

    let merged = merge(outcome.frames, ctx);
    Ok(process(merged, ctx, &request.post)?)
}
