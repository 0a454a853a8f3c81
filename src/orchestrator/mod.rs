//! Batch orchestration: fans a list of links out to concurrent jobs and folds
//! their outcomes into one mapping.
//!
//! Every batch owns a scratch directory that is removed before
//! [`Wayback::run`] returns, whatever the outcome. Jobs never see each other's
//! failures; only batch setup (scratch directory, Tor) can fail the whole call.

mod job;


pub use job::{Job, JobReport, JobState};

use crate::config::ArchiverConfig;
use crate::error::WaybackError;
use crate::filter::JsPolicy;
use crate::publish::{Backends, Publisher};
use crate::results::{FailureKind, Outcome, ResultMap};
use crate::snapshot::{PageArchiver, WebDriverArchiver};
use crate::store::SnapshotStore;
use crate::transport::{self, READY_CEILING};
use crate::validate::validate;
use job::{JobContext, run_job};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Archives batches of links and publishes the snapshots
pub struct Wayback {
    config: ArchiverConfig,
    archiver: Arc<dyn PageArchiver>,
    publisher: Arc<Publisher>,
    js_policy: JsPolicy,
    inputs: HashMap<String, Vec<u8>>,
}

impl Wayback {
    /// Build an orchestrator from explicit collaborators
    pub fn new(
        config: ArchiverConfig,
        archiver: Arc<dyn PageArchiver>,
        backends: Backends,
    ) -> Result<Self, regex::Error> {
        let js_policy = JsPolicy::new(&config.disable_js_patterns)?;
        let publisher = Arc::new(Publisher::select(&config, backends));

        Ok(Self {
            config,
            archiver,
            publisher,
            js_policy,
            inputs: HashMap::new(),
        })
    }

    /// Build an orchestrator wired to WebDriver capture and the HTTP backends
    pub fn from_config(config: ArchiverConfig) -> Result<Self, regex::Error> {
        let archiver = Arc::new(WebDriverArchiver::new(&config.webdriver_url));
        let backends = Backends::http(&config);
        Self::new(config, archiver, backends)
    }

    /// Archive `content` for `link` instead of fetching the page. Applies to
    /// every occurrence of `link` in later batches.
    pub fn with_input(mut self, link: impl Into<String>, content: Vec<u8>) -> Self {
        self.inputs.insert(link.into(), content);
        self
    }

    pub fn config(&self) -> &ArchiverConfig {
        &self.config
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Archive every link and return link => destination, or the failure
    /// marker for links that could not be archived
    pub async fn run(&self, links: &[String]) -> Result<ResultMap, WaybackError> {
        let outcomes = self.run_detailed(links).await?;
        Ok(outcomes
            .into_iter()
            .map(|(link, outcome)| {
                let entry = outcome.entry().to_string();
                (link, entry)
            })
            .collect())
    }

    /// Same as [`Wayback::run`] but keeps the failure stage of each link
    pub async fn run_detailed(
        &self,
        links: &[String],
    ) -> Result<HashMap<String, Outcome>, WaybackError> {
        if links.is_empty() {
            return Ok(HashMap::new());
        }

        let started = std::time::Instant::now();
        ::log::info!("Starting batch of {} links", links.len());

        // Removed on drop, which also covers early returns and panics
        let mut builder = tempfile::Builder::new();
        builder.prefix("wbipfs-");
        let dir = match &self.config.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(WaybackError::TempDir)?;

        let (dialer, transport) = if self.config.use_tor {
            let (dialer, handle) =
                transport::setup_transport(&self.config.tor_binary, READY_CEILING).await?;
            (Some(dialer), Some(handle))
        } else {
            (None, None)
        };

        let ctx = Arc::new(JobContext {
            archiver: Arc::clone(&self.archiver),
            publisher: Arc::clone(&self.publisher),
            store: SnapshotStore::new(dir.path()),
            dialer,
            js_policy: self.js_policy.clone(),
            gateway: self.config.gateway.clone(),
            timeout: self.config.timeout(),
            inputs: self.inputs.clone(),
        });

        let mut collected = Collector::default();
        let (report_tx, mut report_rx) = mpsc::channel::<JobReport>(links.len());
        let mut handles: Vec<(usize, &String, JoinHandle<()>)> = Vec::with_capacity(links.len());

        for (seq, link) in links.iter().enumerate() {
            match validate(link) {
                Ok(url) => {
                    let job = Job {
                        seq,
                        link: link.clone(),
                        url,
                    };
                    let handle = tokio::spawn(run_job(Arc::clone(&ctx), job, report_tx.clone()));
                    handles.push((seq, link, handle));
                }
                Err(e) => {
                    ::log::warn!("Skipping {:?}: {}", link, e);
                    collected.record(seq, link.clone(), Outcome::Failed(FailureKind::InvalidUrl));
                }
            }
        }
        drop(report_tx);

        let spawned = handles.len();
        for (seq, link, handle) in handles {
            if let Err(e) = handle.await {
                ::log::error!("{} => job aborted: {}", link, e);
                collected.record(seq, link.clone(), Outcome::Failed(FailureKind::Aborted));
            }
        }

        while let Some(report) = report_rx.recv().await {
            collected.record(report.seq, report.link, report.outcome);
        }

        if let Some(handle) = transport {
            handle.close().await;
        }
        drop(ctx);
        if let Err(e) = dir.close() {
            ::log::warn!("Failed to remove batch directory: {}", e);
        }

        let outcomes = collected.finish();
        ::log::info!(
            "Batch complete - {} links, {} jobs, {} published in {:.2} seconds",
            links.len(),
            spawned,
            outcomes.values().filter(|o| o.is_published()).count(),
            started.elapsed().as_secs_f64()
        );
        Ok(outcomes)
    }
}

/// Folds job outcomes into the result mapping; for a link given more than
/// once, the entry from the latest position in the input wins
#[derive(Debug, Default)]
struct Collector {
    entries: HashMap<String, (usize, Outcome)>,
}

impl Collector {
    fn record(&mut self, seq: usize, link: String, outcome: Outcome) {
        match self.entries.get(&link) {
            Some((existing, _)) if *existing > seq => {}
            _ => {
                self.entries.insert(link, (seq, outcome));
            }
        }
    }

    fn finish(self) -> HashMap<String, Outcome> {
        self.entries
            .into_iter()
            .map(|(link, (_, outcome))| (link, outcome))
            .collect()
    }
}
