use crate::error::JobFailure;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value recorded for every link that did not get published
pub const FAILURE_MARKER: &str = "Archive failed.";

/// Mapping from original link to destination URL or [`FAILURE_MARKER`]
pub type ResultMap = HashMap<String, String>;

/// Stage at which a job gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidUrl,
    ArchiveFailed,
    WriteFailed,
    PublishFailed,
    Aborted,
}

impl From<&JobFailure> for FailureKind {
    fn from(failure: &JobFailure) -> Self {
        match failure {
            JobFailure::Invalid(_) => FailureKind::InvalidUrl,
            JobFailure::ArchiveFailed(_) => FailureKind::ArchiveFailed,
            JobFailure::WriteFailed(_) => FailureKind::WriteFailed,
            JobFailure::PublishFailed(_) => FailureKind::PublishFailed,
            JobFailure::Aborted(_) => FailureKind::Aborted,
        }
    }
}

/// Result of one link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// Gateway URL of the published snapshot
    Published(String),
    Failed(FailureKind),
}

impl Outcome {
    /// The string stored in the plain result mapping
    pub fn entry(&self) -> &str {
        match self {
            Outcome::Published(destination) => destination,
            Outcome::Failed(_) => FAILURE_MARKER,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Outcome::Published(_))
    }
}
