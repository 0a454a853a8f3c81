use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Reasons a link is rejected before any work is scheduled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The link was an empty string
    #[error("empty url")]
    Empty,

    /// The link is not an absolute URI with a scheme and a host
    #[error("malformed url: {0}")]
    Malformed(String),
}

/// Failures while bringing up the anonymizing transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport executable is not on the search path
    #[error("transport executable `{0}` not found on PATH")]
    ExecutableNotFound(String),

    /// The process could not be started
    #[error("failed to start transport process: {0}")]
    Spawn(#[source] std::io::Error),

    /// The process did not report readiness before the deadline
    #[error("transport not ready after {0:?}")]
    TransportTimeout(Duration),

    /// The process exited before it became ready
    #[error("transport process exited before becoming ready")]
    Exited,

    /// Local I/O needed by the transport failed
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the page-snapshot collaborator
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No WebDriver session could be opened
    #[error("webdriver unavailable: {0}")]
    WebDriver(String),

    /// The page could not be loaded or read back
    #[error("failed to capture {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// Capture ran past the configured stage timeout
    #[error("capture timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures writing a snapshot into the batch directory
#[derive(Debug, Error)]
pub enum StoreError {
    /// The snapshot file could not be written
    #[error("write failed, path: {path}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of any publish strategy
#[derive(Debug, Error)]
pub enum PublishError {
    /// Daemon host or port outside the accepted range
    #[error("daemon hostname or port is invalid, host: {host:?}, port: {port}")]
    InvalidEndpoint { host: String, port: u32 },

    /// The daemon rejected or failed the content-add call
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// A named pinning provider was selected without its credentials
    #[error("missing pinning service api key or secret")]
    MissingCredentials,

    /// The pinning provider failed
    #[error("pin failed: {0}")]
    Pin(String),

    /// The embedded node is not part of this build
    #[error("embedded node is not available in this build")]
    Unimplemented,

    /// Content fetched back from the embedded node did not match
    #[error("content read back for {cid} does not match the published file")]
    Verify { cid: String },

    /// The scratch repo for the embedded node could not be created
    #[error("create node repo failed: {0}")]
    Repo(#[source] std::io::Error),

    /// The snapshot file could not be read for publishing
    #[error("read file failed: {0}")]
    Read(#[source] std::io::Error),

    /// Publish ran past the configured stage timeout
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),
}

/// Why a single job ended without a destination
#[derive(Debug, Error)]
pub enum JobFailure {
    #[error("invalid url: {0}")]
    Invalid(#[from] ValidationError),

    #[error("archive failed: {0}")]
    ArchiveFailed(#[from] CaptureError),

    #[error("write failed: {0}")]
    WriteFailed(#[from] StoreError),

    #[error("publish failed: {0}")]
    PublishFailed(#[from] PublishError),

    /// The job task panicked or was aborted
    #[error("job aborted: {0}")]
    Aborted(String),
}

/// Batch-level failures; the only errors `Wayback::run` ever returns
#[derive(Debug, Error)]
pub enum WaybackError {
    #[error("create temp directory failed: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("dial tor failed: {0}")]
    Transport(#[from] TransportError),
}
