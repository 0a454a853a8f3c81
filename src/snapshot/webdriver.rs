use crate::error::CaptureError;
use crate::snapshot::{CaptureRequest, PageArchiver, Snapshot};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use tokio::time::timeout;

/// Common WebDriver endpoints tried after the configured one
const FALLBACK_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Hard ceiling for loading one page
const PAGE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(45);

/// Captures pages by driving a browser over WebDriver.
///
/// Each capture opens its own session so the proxy and JavaScript settings of
/// one request never leak into another.
#[derive(Debug, Clone)]
pub struct WebDriverArchiver {
    webdriver_url: String,
}

impl WebDriverArchiver {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }

    /// Connects to the WebDriver instance, falling back to well-known ports
    async fn connect(&self, caps: Map<String, Value>) -> Result<Client, CaptureError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);

        let last_error = match builder.connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Ok(client);
            }
            Err(e) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
                e.to_string()
            }
        };

        for url in FALLBACK_URLS.iter() {
            if *url == self.webdriver_url {
                continue; // Skip if it's the same as the one we already tried
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = builder.connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(client);
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(CaptureError::WebDriver(last_error))
    }

    async fn load(client: &Client, url: &str) -> Result<String, CaptureError> {
        client
            .goto(url)
            .await
            .map_err(|e| navigation_error(e, "accessing", url))?;

        client
            .source()
            .await
            .map_err(|e| navigation_error(e, "getting source for", url))
    }
}

#[async_trait]
impl PageArchiver for WebDriverArchiver {
    async fn capture(&self, request: &CaptureRequest) -> Result<Snapshot, CaptureError> {
        if let Some(input) = &request.input {
            ::log::debug!(
                "Using supplied page for {} ({} bytes)",
                request.url,
                input.len()
            );
            return Ok(Snapshot::new(
                input.clone(),
                "text/html; charset=utf-8",
                request.url.clone(),
            ));
        }

        let started = std::time::Instant::now();
        let client = self.connect(session_capabilities(request)).await?;

        let loaded = timeout(PAGE_TIMEOUT, Self::load(&client, &request.url)).await;

        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }

        let html = match loaded {
            Ok(result) => result?,
            Err(_) => {
                ::log::error!("Timeout capturing: {}", request.url);
                return Err(CaptureError::Timeout(PAGE_TIMEOUT));
            }
        };

        ::log::debug!(
            "Captured {} ({} bytes) in {:.2} seconds",
            request.url,
            html.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(Snapshot::new(
            html.into_bytes(),
            "text/html; charset=utf-8",
            request.url.clone(),
        ))
    }
}

/// Session capabilities for one capture: proxy routing and JavaScript toggle
pub fn session_capabilities(request: &CaptureRequest) -> Map<String, Value> {
    let mut caps = Map::new();

    if let Some(dialer) = &request.dialer {
        caps.insert(
            "proxy".to_string(),
            json!({
                "proxyType": "manual",
                "socksProxy": dialer.socks_addr().to_string(),
                "socksVersion": 5,
            }),
        );
    }

    if request.disable_js {
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "prefs": { "profile.managed_default_content_settings.javascript": 2 } }),
        );
        caps.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "prefs": { "javascript.enabled": false } }),
        );
    }

    caps
}

/// Converts a WebDriver command failure into a capture error
fn navigation_error(error: fantoccini::error::CmdError, context: &str, url: &str) -> CaptureError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost session while {} {}", context, url);
    } else {
        ::log::error!("Failed {} {}: {}", context, url, error);
    }
    CaptureError::Navigation {
        url: url.to_string(),
        reason: format!("{context}: {error}"),
    }
}
