pub mod webdriver;

use crate::error::CaptureError;
use crate::transport::Dialer;
use async_trait::async_trait;

pub use webdriver::WebDriverArchiver;

/// A captured page
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Self-contained document bytes
    pub content: Vec<u8>,

    /// Declared content type of `content`
    pub content_type: String,

    /// Link the snapshot was taken from
    pub url: String,
}

impl Snapshot {
    pub fn new(content: Vec<u8>, content_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            content,
            content_type: content_type.into(),
            url: url.into(),
        }
    }
}

/// Everything the page archiver needs for one capture
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub url: String,

    /// Route traffic through this proxy instead of dialing directly
    pub dialer: Option<Dialer>,

    /// Capture with JavaScript turned off
    pub disable_js: bool,

    /// Page bytes the caller already holds; used instead of fetching `url`
    pub input: Option<Vec<u8>>,
}

/// Turns a link into a self-contained snapshot
#[async_trait]
pub trait PageArchiver: Send + Sync {
    async fn capture(&self, request: &CaptureRequest) -> Result<Snapshot, CaptureError>;
}
