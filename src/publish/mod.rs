//! Publish backends.
//!
//! A [`Publisher`] is chosen once per batch from [`ArchiverConfig`] and then
//! applied to every stored snapshot. Each strategy only turns a file into a
//! content identifier; [`Publisher::destination`] turns that identifier into
//! the gateway URL recorded for the job.

pub mod daemon;
pub mod embedded;
pub mod http;
pub mod pinning;

use crate::config::{ArchiverConfig, PinningSlot, PublishMode};
use crate::error::PublishError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use daemon::{DaemonClient, DaemonEndpoint, DaemonPublisher};
pub use embedded::{EmbeddedNode, EmbeddedPublisher};
pub use http::{HttpDaemonClient, InfuraProvider, PinataProvider};
pub use pinning::{PinningProvider, PinningPublisher};

/// Shared contract of the publish strategies
#[async_trait]
pub trait Publish: Send + Sync {
    /// Publish the file at `path` and return its content identifier
    async fn publish(&self, path: &Path) -> Result<String, PublishError>;
}

/// Collaborators the strategies delegate to
#[derive(Clone)]
pub struct Backends {
    pub daemon: Arc<dyn DaemonClient>,
    pub pinner: Arc<dyn PinningProvider>,
    pub embedded: Option<Arc<dyn EmbeddedNode>>,
}

impl Backends {
    /// HTTP-backed collaborators; the embedded node is not part of this build
    pub fn http(config: &ArchiverConfig) -> Self {
        let pinner: Arc<dyn PinningProvider> = match config.pinning.slot {
            PinningSlot::Infura => Arc::new(InfuraProvider::new()),
            PinningSlot::Pinata => Arc::new(PinataProvider::new(
                &config.pinning.api_key,
                &config.pinning.secret,
            )),
        };

        Self {
            daemon: Arc::new(HttpDaemonClient::new()),
            pinner,
            embedded: None,
        }
    }
}

/// The strategy selected for a batch
pub enum Publisher {
    Daemon(DaemonPublisher),
    Pinning(PinningPublisher),
    Embedded(EmbeddedPublisher),
}

impl Publisher {
    /// Pick the strategy named by `config.publish_mode`
    pub fn select(config: &ArchiverConfig, backends: Backends) -> Self {
        let publisher = match config.publish_mode {
            PublishMode::Daemon => Publisher::Daemon(DaemonPublisher::new(
                DaemonEndpoint::new(&config.daemon_host, config.daemon_port),
                backends.daemon,
            )),
            PublishMode::Pinner => {
                Publisher::Pinning(PinningPublisher::new(&config.pinning, backends.pinner))
            }
            PublishMode::Embedded => {
                let publisher = EmbeddedPublisher::new(backends.embedded);
                Publisher::Embedded(match &config.temp_root {
                    Some(root) => publisher.with_repo_root(root),
                    None => publisher,
                })
            }
        };
        ::log::debug!("Selected {} publisher", publisher.mode().as_str());
        publisher
    }

    pub fn mode(&self) -> PublishMode {
        match self {
            Publisher::Daemon(_) => PublishMode::Daemon,
            Publisher::Pinning(_) => PublishMode::Pinner,
            Publisher::Embedded(_) => PublishMode::Embedded,
        }
    }

    /// Canonical retrieval URL for `cid`. Daemon destinations carry the
    /// original link as a fragment.
    pub fn destination(&self, gateway: &str, cid: &str, link: &str) -> String {
        let base = gateway.trim_end_matches('/');
        match self {
            Publisher::Daemon(_) => format!("{base}/{cid}#{link}"),
            Publisher::Pinning(_) | Publisher::Embedded(_) => format!("{base}/{cid}"),
        }
    }
}

#[async_trait]
impl Publish for Publisher {
    async fn publish(&self, path: &Path) -> Result<String, PublishError> {
        match self {
            Publisher::Daemon(p) => p.publish(path).await,
            Publisher::Pinning(p) => p.publish(path).await,
            Publisher::Embedded(p) => p.publish(path).await,
        }
    }
}
