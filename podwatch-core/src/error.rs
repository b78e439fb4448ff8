use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Possible errors when working with [`podwatch_core`][crate]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An event type filter did not name a watchable event
    #[error("invalid event type {0:?}: options are 'ADDED', 'MODIFIED', 'DELETED' or 'BOOKMARK'")]
    InvalidEventKind(String),

    /// A status filter did not name a pod phase
    #[error("invalid status {0:?}: options are 'Pending', 'Running', 'Succeeded', 'Failed' or 'Unknown'")]
    InvalidPhase(String),

    /// A resource arrived without a field every snapshot requires
    #[error("resource is missing required field {0}")]
    MissingField(&'static str),

    /// A timestamp lies outside the range a snapshot can represent
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// An error status returned by the API server.
///
/// Delivered either as the body of a failed request or as the payload of an `ERROR` watch event.
#[derive(Error, Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[error("{message}: {reason}")]
pub struct ErrorResponse {
    /// The status
    pub status: String,
    /// A message about the error
    #[serde(default)]
    pub message: String,
    /// The reason for the error
    #[serde(default)]
    pub reason: String,
    /// The error code
    pub code: u16,
}

impl ErrorResponse {
    /// Whether the server has discarded the history needed to resume a watch.
    ///
    /// This is the `410 Gone` family: the requested resource version is older than what the
    /// server keeps, so resuming from it would skip events.
    pub fn is_gone(&self) -> bool {
        self.code == 410 || self.reason == "Expired" || self.reason == "Gone"
    }
}
