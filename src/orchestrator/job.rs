use crate::error::{CaptureError, JobFailure, PublishError};
use crate::filter::JsPolicy;
use crate::publish::{Publish, Publisher};
use crate::results::{FailureKind, Outcome};
use crate::snapshot::{CaptureRequest, PageArchiver};
use crate::store::{NamingKey, SnapshotStore};
use crate::transport::Dialer;
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// One validated link of a batch
#[derive(Debug, Clone)]
pub struct Job {
    /// Position in the input list, used for naming and duplicate resolution
    pub seq: usize,
    /// Link exactly as the caller passed it
    pub link: String,
    pub url: Url,
}

/// Progress of a job; failures leave the machine from any state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Validated,
    Captured,
    Stored,
    Published,
    Done,
}

/// What a job sends to the collector once it finishes
#[derive(Debug)]
pub struct JobReport {
    pub seq: usize,
    pub link: String,
    pub outcome: Outcome,
}

/// Read-only state shared by every job of a batch
pub(crate) struct JobContext {
    pub archiver: Arc<dyn PageArchiver>,
    pub publisher: Arc<Publisher>,
    pub store: SnapshotStore,
    pub dialer: Option<Dialer>,
    pub js_policy: JsPolicy,
    pub gateway: String,
    pub timeout: Option<Duration>,
    /// Pre-fetched page bytes keyed by link
    pub inputs: HashMap<String, Vec<u8>>,
}

/// Run one job to completion and report its outcome
pub(crate) async fn run_job(ctx: Arc<JobContext>, job: Job, report_tx: mpsc::Sender<JobReport>) {
    let outcome = match execute(&ctx, &job).await {
        Ok(destination) => {
            ::log::info!("{} => {}", job.link, destination);
            Outcome::Published(destination)
        }
        Err(failure) => {
            ::log::error!("{} => {}", job.link, failure);
            Outcome::Failed(FailureKind::from(&failure))
        }
    };

    let report = JobReport {
        seq: job.seq,
        link: job.link,
        outcome,
    };
    if let Err(e) = report_tx.send(report).await {
        ::log::error!("Failed to report job {}: {}", e.0.seq, e.0.link);
    }
}

async fn execute(ctx: &JobContext, job: &Job) -> Result<String, JobFailure> {
    let mut state = JobState::Validated;

    let request = CaptureRequest {
        url: job.url.to_string(),
        dialer: ctx.dialer,
        disable_js: ctx.js_policy.disable_js(job.url.as_str()),
        input: ctx.inputs.get(&job.link).cloned(),
    };
    let snapshot = within(ctx.timeout, ctx.archiver.capture(&request), CaptureError::Timeout).await?;
    advance(job, &mut state, JobState::Captured);

    let key = NamingKey {
        link: &job.link,
        content_type: &snapshot.content_type,
        captured_at: Utc::now(),
        seq: job.seq,
    };
    let path = ctx.store.store(&key, &snapshot.content).await?;
    drop(snapshot);
    advance(job, &mut state, JobState::Stored);

    let cid = within(ctx.timeout, ctx.publisher.publish(&path), PublishError::Timeout).await?;
    advance(job, &mut state, JobState::Published);

    let destination = ctx.publisher.destination(&ctx.gateway, &cid, &job.link);
    advance(job, &mut state, JobState::Done);

    Ok(destination)
}

fn advance(job: &Job, state: &mut JobState, next: JobState) {
    ::log::debug!("Job {} ({}): {:?} -> {:?}", job.seq, job.link, state, next);
    *state = next;
}

/// Bound `fut` by the optional stage timeout
async fn within<T, E, F>(
    limit: Option<Duration>,
    fut: F,
    on_timeout: impl FnOnce(Duration) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(limit)),
        },
        None => fut.await,
    }
}
