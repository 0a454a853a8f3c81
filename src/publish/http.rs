//! HTTP clients for the daemon API and the hosted pinning services.

use crate::error::PublishError;
use crate::publish::daemon::{DaemonClient, DaemonEndpoint};
use crate::publish::pinning::PinningProvider;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const INFURA_ADD_URL: &str = "https://ipfs.infura.io:5001/api/v0/add?pin=true";
const PINATA_PIN_URL: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";

/// Reply of the `/api/v0/add` endpoint
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// Reply of Pinata's `pinFileToIPFS`
#[derive(Debug, Deserialize)]
struct PinataResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn build_client() -> reqwest::Client {
    match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            ::log::warn!(
                "Failed to build HTTP client with {:?} timeout, using defaults: {}",
                REQUEST_TIMEOUT,
                e
            );
            reqwest::Client::new()
        }
    }
}

fn file_form(content: Vec<u8>, file_name: &str) -> Form {
    Form::new().part("file", Part::bytes(content).file_name(file_name.to_string()))
}

async fn read_upload(path: &Path) -> Result<(Vec<u8>, String), PublishError> {
    let content = tokio::fs::read(path).await.map_err(PublishError::Read)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot.html".to_string());
    Ok((content, name))
}

/// Send a request and decode its JSON reply, mapping every failure with `wrap`
async fn send_json<T, F>(request: reqwest::RequestBuilder, wrap: F) -> Result<T, PublishError>
where
    T: for<'de> Deserialize<'de>,
    F: Fn(String) -> PublishError,
{
    let response = request.send().await.map_err(|e| wrap(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(wrap(format!("HTTP {}: {}", status, body.trim())));
    }

    response.json::<T>().await.map_err(|e| wrap(e.to_string()))
}

/// Talks to a daemon's HTTP API
#[derive(Debug, Clone)]
pub struct HttpDaemonClient {
    client: reqwest::Client,
}

impl HttpDaemonClient {
    pub fn new() -> Self {
        Self {
            client: build_client(),
        }
    }
}

impl Default for HttpDaemonClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DaemonClient for HttpDaemonClient {
    async fn add(&self, endpoint: &DaemonEndpoint, content: Vec<u8>) -> Result<String, PublishError> {
        let url = format!("{}/add", endpoint.api_base());
        let request = self.client.post(&url).multipart(file_form(content, "snapshot"));

        let reply: AddResponse = send_json(request, PublishError::Transfer).await?;
        Ok(reply.hash)
    }
}

/// Default pinning provider; uploads anonymously
#[derive(Debug, Clone)]
pub struct InfuraProvider {
    client: reqwest::Client,
    add_url: String,
}

impl InfuraProvider {
    pub fn new() -> Self {
        Self::with_url(INFURA_ADD_URL)
    }

    /// Point the provider at another `/api/v0/add` compatible endpoint
    pub fn with_url(add_url: &str) -> Self {
        Self {
            client: build_client(),
            add_url: add_url.to_string(),
        }
    }
}

impl Default for InfuraProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PinningProvider for InfuraProvider {
    async fn pin_file(&self, path: &Path) -> Result<String, PublishError> {
        let (content, name) = read_upload(path).await?;
        let request = self
            .client
            .post(&self.add_url)
            .multipart(file_form(content, &name));

        let reply: AddResponse = send_json(request, PublishError::Pin).await?;
        Ok(reply.hash)
    }
}

/// Pinata pinning service, authenticated with an api key and secret
#[derive(Debug, Clone)]
pub struct PinataProvider {
    client: reqwest::Client,
    pin_url: String,
    api_key: String,
    secret: String,
}

impl PinataProvider {
    pub fn new(api_key: &str, secret: &str) -> Self {
        Self {
            client: build_client(),
            pin_url: PINATA_PIN_URL.to_string(),
            api_key: api_key.to_string(),
            secret: secret.to_string(),
        }
    }

    pub fn with_url(mut self, pin_url: &str) -> Self {
        self.pin_url = pin_url.to_string();
        self
    }
}

#[async_trait]
impl PinningProvider for PinataProvider {
    async fn pin_file(&self, path: &Path) -> Result<String, PublishError> {
        let (content, name) = read_upload(path).await?;
        let request = self
            .client
            .post(&self.pin_url)
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret)
            .multipart(file_form(content, &name));

        let reply: PinataResponse = send_json(request, PublishError::Pin).await?;
        Ok(reply.ipfs_hash)
    }
}
