//! Error types emitted by the Thru CLI.

use std::path::PathBuf;

use thiserror::Error;
use thru_core::{AggregateError, DiscoveryError};

#[cfg(feature = "store-sqlite")]
use thru_core::SqliteStoreError;

/// Errors emitted by the Thru CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        /// The feature that is not compiled in.
        feature: &'static str,
        /// What the caller asked for.
        action: &'static str,
    },
    /// Opening the shop catalogue file failed.
    #[error("failed to open shop catalogue at {path:?}: {source}")]
    OpenShops {
        /// The catalogue path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The shop catalogue JSON could not be decoded.
    #[error("failed to parse shop catalogue at {path:?}: {source}")]
    ParseShops {
        /// The catalogue path.
        path: PathBuf,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Opening the trip request file failed.
    #[error("failed to open trip request at {path:?}: {source}")]
    OpenRequest {
        /// The request path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The trip request JSON could not be decoded.
    #[error("failed to parse trip request at {path:?}: {source}")]
    ParseRequest {
        /// The request path.
        path: PathBuf,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Candidate discovery failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Opening the orders database failed.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    OpenOrdersDb(#[from] SqliteStoreError),
    /// Rolling the plan into an order failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    /// Serialising the plan output failed.
    #[error("failed to serialize plan output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing the plan output failed.
    #[error("failed to write plan output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
