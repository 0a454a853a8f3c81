//! Archive web pages and publish the snapshots to content-addressed storage.
//!
//! A [`Wayback`] takes a batch of links, captures each page, stores the
//! snapshot in a batch-scoped scratch directory and publishes it through the
//! backend selected by [`ArchiverConfig::publish_mode`]. The result maps every
//! input link to a gateway URL or to [`FAILURE_MARKER`].

pub mod config;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod publish;
pub mod results;
pub mod snapshot;
pub mod store;
pub mod transport;
pub mod utils;
pub mod validate;

// Re-export commonly used types for convenience
pub use config::{ArchiverConfig, PinningConfig, PinningSlot, PublishMode};
pub use error::WaybackError;
pub use orchestrator::Wayback;
pub use results::{FAILURE_MARKER, Outcome, ResultMap};
