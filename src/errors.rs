//! Errors
//!
//! Custom error types used throughout the `wattle` crate.
use thiserror::Error;

/// Errors that can occur while building, pruning or querying a tree.
#[derive(Debug, Error)]
pub enum WattleError {
    /// The tree protocol was used out of order, e.g. splitting a node
    /// which already has children.
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// An argument was malformed or referenced something that does not exist.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// Unable to write to file.
    #[error("Unable to write to file: {0}")]
    UnableToWrite(String),
    /// Unable to read from file.
    #[error("Unable to read from file: {0}")]
    UnableToRead(String),
}
