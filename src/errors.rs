//! Error types returned by this crate's public and internal APIs.

use std::num::ParseIntError;

use thiserror::Error;

/// A raw token string could not be parsed in the active partitioner's
/// token format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{token}' is not a valid token")]
pub struct TokenParseError {
    /// The offending raw token string.
    pub token: String,
}

/// Invalid or unsupported replication strategy configuration of a keyspace.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum KeyspaceStrategyError {
    /// The replication options carry no "class" entry.
    #[error("\"class\" option is missing in replication strategy definition")]
    MissingClassForStrategyDefinition,

    /// SimpleStrategy was requested without a "replication_factor" entry.
    #[error("\"replication_factor\" option is missing in SimpleStrategy definition")]
    MissingReplicationFactorForSimpleStrategy,

    /// A replication factor value failed to parse as an unsigned integer.
    #[error("Failed to parse a replication factor as unsigned integer: {0}")]
    ReplicationFactorParseError(ParseIntError),

    /// NetworkTopologyStrategy got an option that is not a datacenter
    /// replication factor.
    #[error(
        "Unexpected option '{key}' with value '{value}' passed to \
         NetworkTopologyStrategy"
    )]
    UnexpectedNetworkTopologyStrategyOption {
        /// The option's key.
        key: String,
        /// The option's value.
        value: String,
    },

    /// The strategy class is not one this crate knows how to compute
    /// replicas for.
    #[error("replication strategy class '{0}' is not supported")]
    UnsupportedStrategy(String),
}

/// The operation needs a token map, but none has been built yet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("token map not computed yet")]
pub struct NotInitializedError;

/// Failure to obtain a [`Token`](crate::routing::Token) through the store.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum NewTokenError {
    /// No token map is available, so the partitioner in effect is unknown.
    #[error(transparent)]
    NotInitialized(#[from] NotInitializedError),

    /// The token string is malformed.
    #[error(transparent)]
    Parse(#[from] TokenParseError),
}
