use crate::config::{PinningConfig, PinningSlot};
use crate::error::PublishError;
use crate::publish::Publish;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// A third-party pinning service's pin-file API
#[async_trait]
pub trait PinningProvider: Send + Sync {
    /// Pin the file at `path` and return its content identifier
    async fn pin_file(&self, path: &Path) -> Result<String, PublishError>;
}

/// Publishes through the pinning provider chosen by the configured slot
pub enum PinningPublisher {
    Ready(Arc<dyn PinningProvider>),
    /// A named provider was selected without its api key and secret
    MissingCredentials(PinningSlot),
}

impl PinningPublisher {
    /// Wrap `provider`, refusing up front when the slot needs credentials that
    /// were not supplied
    pub fn new(config: &PinningConfig, provider: Arc<dyn PinningProvider>) -> Self {
        match config.slot {
            PinningSlot::Pinata if config.api_key.is_empty() || config.secret.is_empty() => {
                ::log::error!("Please set WAYBACK_APIKEY and WAYBACK_SECRET for the pinata slot");
                PinningPublisher::MissingCredentials(config.slot)
            }
            _ => PinningPublisher::Ready(provider),
        }
    }
}

#[async_trait]
impl Publish for PinningPublisher {
    async fn publish(&self, path: &Path) -> Result<String, PublishError> {
        match self {
            PinningPublisher::Ready(provider) => provider.pin_file(path).await,
            PinningPublisher::MissingCredentials(_) => Err(PublishError::MissingCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PinningProvider for CountingProvider {
        async fn pin_file(&self, path: &Path) -> Result<String, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("cid-of-{}", path.display()))
        }
    }

    fn pinata(api_key: &str, secret: &str) -> PinningConfig {
        PinningConfig {
            slot: PinningSlot::Pinata,
            api_key: api_key.to_string(),
            secret: secret.to_string(),
        }
    }

    #[tokio::test]
    async fn test_default_slot_needs_no_credentials() {
        let provider = Arc::new(CountingProvider::default());
        let publisher = PinningPublisher::new(&PinningConfig::default(), provider.clone());

        let cid = publisher.publish(Path::new("/tmp/page.html")).await.unwrap();
        assert_eq!(cid, "cid-of-/tmp/page.html");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_named_slot_without_credentials() {
        let provider = Arc::new(CountingProvider::default());

        for config in [pinata("", ""), pinata("key", ""), pinata("", "secret")] {
            let publisher = PinningPublisher::new(&config, provider.clone());
            assert!(matches!(
                publisher.publish(Path::new("/tmp/page.html")).await,
                Err(PublishError::MissingCredentials)
            ));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_named_slot_with_credentials() {
        let provider = Arc::new(CountingProvider::default());
        let publisher = PinningPublisher::new(&pinata("key", "secret"), provider.clone());

        assert!(publisher.publish(Path::new("/tmp/a.html")).await.is_ok());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
