pub mod aws;
pub mod cluster;
pub mod domain;
pub mod manifest;
pub mod poll;
pub mod scenario;

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while driving a domain through its lifecycle.
///
/// `TimedOut`, `FailedPrecondition` and `Malformed` are only produced when a
/// caller converts a [`poll::PollOutcome`] into a result; the poller itself
/// reports them as outcomes.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} {name} not found")]
    NotFound { kind: String, name: String },

    #[error("timed out waiting for {0}")]
    TimedOut(String),

    #[error("{0}")]
    FailedPrecondition(String),

    #[error("malformed status: {0}")]
    Malformed(String),

    #[error("invalid poll configuration: {0}")]
    InvalidPollConfig(String),

    #[error("custom resource {0} was never consumed by the controller")]
    NotConsumed(String),

    #[error("custom resource {0} does not exist after creation")]
    Missing(String),

    #[error("controller has not recorded an ARN for {0}")]
    MissingArn(String),

    #[error("invalid replacement {0:?}, expected KEY=VALUE")]
    InvalidReplacement(String),

    #[error("failed to read manifest {}: {source}", path.display())]
    ReadManifest {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    ParseManifest(#[from] serde_yaml::Error),

    #[error("failed to decode status: {0}")]
    DecodeStatus(#[from] serde_json::Error),

    #[error("Elasticsearch Service API error: {0}")]
    ElasticsearchService(
        #[source]
        aws_sdk_elasticsearch::operation::describe_elasticsearch_domain::DescribeElasticsearchDomainError,
    ),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl Error {
    /// Absence of the polled resource, either reported directly by a
    /// collaborator or as a 404 from the Kubernetes API.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Kube(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}
