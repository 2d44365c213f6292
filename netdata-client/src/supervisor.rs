//! Concurrent fan-out of chart fetches under a single deadline.
//!
//! Every request gets its own task in a [`JoinSet`]. The set is drained
//! inside one `tokio::time::timeout`:
//!
//! - all tasks finish: every frame is returned
//! - the deadline fires first: the remaining tasks are aborted and whatever
//!   frames were already appended are returned, without an error
//! - a task fails before the deadline: the remaining tasks are aborted and
//!   the failure is returned, with no frames
//!
//! Once the deadline has fired the outcome is a timeout; failures of tasks
//! that are being cancelled are never reported. Either way every task has
//! stopped by the time [`fetch_all`] returns.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::{Id, JoinSet};
use tokio::time::error::Elapsed;
use tracing::{info, warn};

use netdata_types::ChartFrame;

use crate::chart::{collect_chart, FrameOptions};
use crate::{FetchError, FetchRequest, NetdataClient};

#[derive(Debug, Default)]
struct SinkState {
    frames: Vec<ChartFrame>,
    sealed: bool,
}

/// Append-only collection the fetch tasks push their frames into.
///
/// Clones share the same collection. After [`FrameSink::seal`] further
/// pushes are rejected, so a task whose abort is still in flight cannot
/// change the result.
#[derive(Debug, Clone, Default)]
pub struct FrameSink {
    inner: Arc<Mutex<SinkState>>,
}

impl FrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame. Returns false if the sink is already sealed.
    pub fn push(&self, frame: ChartFrame) -> bool {
        let mut state = self.inner.lock();
        if state.sealed {
            return false;
        }
        state.frames.push(frame);
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the sink and take every frame appended so far.
    pub fn seal(&self) -> Vec<ChartFrame> {
        let mut state = self.inner.lock();
        state.sealed = true;
        std::mem::take(&mut state.frames)
    }
}

/// Frames gathered by one batch.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Frames in completion order.
    pub frames: Vec<ChartFrame>,
    /// Number of requests in the batch.
    pub requested: usize,
    /// True if the deadline fired before every request completed.
    pub timed_out: bool,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        !self.timed_out
    }
}

type Units = JoinSet<Result<(), FetchError>>;

/// Host and chart of every spawned unit, keyed by task id.
type Owners = HashMap<Id, (String, String)>;

/// Join units until one fails or all succeed.
async fn drain(units: &mut Units, owners: &Owners) -> Result<(), FetchError> {
    while let Some(joined) = units.join_next_with_id().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((_, Err(e))) => return Err(e),
            Err(e) => {
                let err = FetchError::Task(e.to_string());
                return Err(match owners.get(&e.id()) {
                    Some((host, chart)) => err.for_chart(host.clone(), chart.clone()),
                    None => err,
                });
            }
        }
    }
    Ok(())
}

/// Drain `units` under `timeout`, then cancel the rest and wait for every
/// cancellation to land. No unit outlives this call.
async fn supervise(
    units: &mut Units,
    owners: &Owners,
    timeout: Duration,
) -> Result<Result<(), FetchError>, Elapsed> {
    let drained = tokio::time::timeout(timeout, drain(units, owners)).await;
    units.abort_all();
    while units.join_next().await.is_some() {}
    drained
}

/// Fetch every request concurrently, waiting at most `timeout` overall.
pub async fn fetch_all(
    client: &NetdataClient,
    requests: Vec<FetchRequest>,
    options: &FrameOptions,
    timeout: Duration,
) -> Result<FetchOutcome, FetchError> {
    let requested = requests.len();
    let sink = FrameSink::new();
    let options = Arc::new(options.clone());
    let mut units = Units::new();
    let mut owners = Owners::with_capacity(requested);

    for request in requests {
        let client = client.clone();
        let options = Arc::clone(&options);
        let sink = sink.clone();
        let owner = (request.host.clone(), request.chart.clone());
        let handle = units.spawn(async move {
            collect_chart(&client, &request, &options, &sink)
                .await
                .map_err(|e| e.for_chart(request.host.clone(), request.chart.clone()))
        });
        owners.insert(handle.id(), owner);
    }

    let drained = supervise(&mut units, &owners, timeout).await;
    let frames = sink.seal();

    match drained {
        Ok(Ok(())) => {
            info!(requested, frames = frames.len(), "fetched all charts");
            Ok(FetchOutcome {
                frames,
                requested,
                timed_out: false,
            })
        }
        Ok(Err(e)) => {
            warn!(error = %e, "chart fetch failed, aborting batch");
            Err(e)
        }
        Err(_) => {
            warn!(
                requested,
                completed = frames.len(),
                timeout_ms = timeout.as_millis() as u64,
                "fetch deadline elapsed, continuing with completed charts"
            );
            Ok(FetchOutcome {
                frames,
                requested,
                timed_out: true,
            })
        }
    }
}
