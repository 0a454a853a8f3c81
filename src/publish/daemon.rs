use crate::error::PublishError;
use crate::publish::Publish;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Host and port of a local storage daemon's API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonEndpoint {
    pub host: String,
    pub port: u32,
}

impl DaemonEndpoint {
    pub fn new(host: &str, port: u32) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }

    /// Host must be non-empty and port within 1..=65535
    pub fn validate(&self) -> Result<u16, PublishError> {
        match u16::try_from(self.port) {
            Ok(port) if port != 0 && !self.host.is_empty() => Ok(port),
            _ => Err(PublishError::InvalidEndpoint {
                host: self.host.clone(),
                port: self.port,
            }),
        }
    }

    /// Base URL of the daemon API, e.g. `http://127.0.0.1:5001/api/v0`
    pub fn api_base(&self) -> String {
        format!("http://{}:{}/api/v0", self.host, self.port)
    }
}

/// Daemon content-add API
#[async_trait]
pub trait DaemonClient: Send + Sync {
    /// Add `content` and return its content identifier
    async fn add(&self, endpoint: &DaemonEndpoint, content: Vec<u8>) -> Result<String, PublishError>;
}

/// Publishes by handing the file to a reachable daemon
pub struct DaemonPublisher {
    endpoint: DaemonEndpoint,
    client: Arc<dyn DaemonClient>,
}

impl DaemonPublisher {
    pub fn new(endpoint: DaemonEndpoint, client: Arc<dyn DaemonClient>) -> Self {
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &DaemonEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl Publish for DaemonPublisher {
    async fn publish(&self, path: &Path) -> Result<String, PublishError> {
        self.endpoint.validate()?;

        let content = tokio::fs::read(path).await.map_err(PublishError::Read)?;
        let cid = self.client.add(&self.endpoint, content).await?;

        ::log::debug!(
            "Daemon {}:{} added {} as {}",
            self.endpoint.host,
            self.endpoint.port,
            path.display(),
            cid
        );
        Ok(cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DaemonClient for RecordingClient {
        async fn add(
            &self,
            _endpoint: &DaemonEndpoint,
            content: Vec<u8>,
        ) -> Result<String, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("cid-{}", content.len()))
        }
    }

    #[test]
    fn test_endpoint_validation() {
        assert_eq!(DaemonEndpoint::new("localhost", 5001).validate().unwrap(), 5001);
        assert_eq!(DaemonEndpoint::new("h", 65535).validate().unwrap(), 65535);
        assert!(DaemonEndpoint::new("", 5001).validate().is_err());
        assert!(DaemonEndpoint::new("localhost", 0).validate().is_err());
        assert!(DaemonEndpoint::new("localhost", 65536).validate().is_err());
    }

    #[tokio::test]
    async fn test_invalid_endpoint_skips_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, b"hello").unwrap();

        let client = Arc::new(RecordingClient::default());
        for (host, port) in [("", 5001), ("localhost", 0), ("localhost", 70000)] {
            let publisher = DaemonPublisher::new(DaemonEndpoint::new(host, port), client.clone());
            let err = publisher.publish(&path).await.unwrap_err();
            assert!(matches!(err, PublishError::InvalidEndpoint { .. }));
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_publish_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, b"hello").unwrap();

        let client = Arc::new(RecordingClient::default());
        let publisher = DaemonPublisher::new(DaemonEndpoint::new("localhost", 5001), client.clone());

        assert_eq!(publisher.publish(&path).await.unwrap(), "cid-5");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        let missing = dir.path().join("missing.html");
        assert!(matches!(
            publisher.publish(&missing).await,
            Err(PublishError::Read(_))
        ));
    }
}
