//! Centralized error types and handling

use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Docker API error: {0}")]
    Docker(#[from] DockerError),

    #[error("Network operation error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Docker-related errors
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("Failed to connect to Docker daemon: {0}")]
    ConnectionFailed(String),

    #[error("Docker API error: {0}")]
    ApiError(String),
}

/// Checkpoint file errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint file {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read checkpoint file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file {} unmarshal err: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("checkpoint file {} is unusable: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Network operation errors
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Failed to access network namespace {path}: {reason}")]
    NamespaceAccess { path: String, reason: String },

    #[error("link {name} not found")]
    LinkNotFound { name: String },

    #[error("{op}: {message}")]
    Netlink { op: String, message: String },

    #[error("failed to set sysctl {key}: {source}")]
    Sysctl {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid MAC address {0:?}")]
    InvalidMac(String),

    #[error("gratuitous ARP failed: {0}")]
    Announce(#[source] std::io::Error),

    #[error("Network operation failed: {0}")]
    OperationFailed(String),
}

impl NetworkError {
    pub(crate) fn netlink(op: impl Into<String>, err: impl std::fmt::Display) -> Self {
        NetworkError::Netlink {
            op: op.into(),
            message: err.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Failure of a single container's repair, tagged with the stage that failed
#[derive(Debug, Error)]
pub enum RepairError {
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("failed to open netns {path:?}: {source}")]
    Namespace {
        path: String,
        #[source]
        source: NetworkError,
    },

    #[error("failed to resolve uplink: {0}")]
    Uplink(#[source] NetworkError),

    #[error("create macvlanInterface failed: {0}")]
    Provision(#[source] NetworkError),

    #[error("failed to restore addresses: {0}")]
    Address(#[source] NetworkError),
}

impl RepairError {
    /// Short name of the stage that failed, used in summaries
    pub fn stage(&self) -> &'static str {
        match self {
            RepairError::Checkpoint(_) => "checkpoint",
            RepairError::Namespace { .. } => "namespace",
            RepairError::Uplink(_) => "uplink",
            RepairError::Provision(_) => "provision",
            RepairError::Address(_) => "address",
        }
    }
}
