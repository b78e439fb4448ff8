//! Types for the watch api
//!
//! See <https://kubernetes.io/docs/reference/using-api/api-concepts/#efficient-detection-of-changes>

use crate::{error::ErrorResponse, snapshot::ResourceSnapshot, Error};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// An opaque position in the change log of a resource collection.
///
/// This is the `resourceVersion` of the last event seen on a watch. An empty token means
/// "start from the current state".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeToken(String);

impl ResumeToken {
    /// Creates a token from a resource version
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The token that starts a watch from the current state
    pub fn now() -> Self {
        Self::default()
    }

    /// Whether this token carries no position
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw resource version
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResumeToken {
    fn from(version: String) -> Self {
        Self(version)
    }
}

impl From<&str> for ResumeToken {
    fn from(version: &str) -> Self {
        Self(version.to_owned())
    }
}

/// The type of a watch event, as sent in the `type` field by the API server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    /// Resource was added
    Added,
    /// Resource was modified
    Modified,
    /// Resource was deleted
    Deleted,
    /// Resource version checkpoint without a resource
    Bookmark,
    /// The server reported an error on the stream
    Error,
}

impl EventKind {
    /// The wire name of the event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Added => "ADDED",
            EventKind::Modified => "MODIFIED",
            EventKind::Deleted => "DELETED",
            EventKind::Bookmark => "BOOKMARK",
            EventKind::Error => "ERROR",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the event types a user may filter on.
///
/// Matching is exact and case sensitive. `ERROR` is rejected since error events never reach
/// the filter stage.
impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADDED" => Ok(EventKind::Added),
            "MODIFIED" => Ok(EventKind::Modified),
            "DELETED" => Ok(EventKind::Deleted),
            "BOOKMARK" => Ok(EventKind::Bookmark),
            other => Err(Error::InvalidEventKind(other.to_owned())),
        }
    }
}

/// A decoded event from a watch stream
#[derive(Clone, Debug, PartialEq)]
pub enum RawEvent {
    /// Resource was added
    Added(ResourceSnapshot),
    /// Resource was modified
    Modified(ResourceSnapshot),
    /// Resource was deleted
    Deleted(ResourceSnapshot),
    /// Resource bookmark, carrying only the new resume position.
    ///
    /// From [Watch bookmarks](https://kubernetes.io/docs/reference/using-api/api-concepts/#watch-bookmarks).
    Bookmark(ResumeToken),
    /// There was some kind of error; the stream has to be re-opened
    Error(ErrorResponse),
}

impl RawEvent {
    /// The type of this event
    pub fn kind(&self) -> EventKind {
        match self {
            RawEvent::Added(_) => EventKind::Added,
            RawEvent::Modified(_) => EventKind::Modified,
            RawEvent::Deleted(_) => EventKind::Deleted,
            RawEvent::Bookmark(_) => EventKind::Bookmark,
            RawEvent::Error(_) => EventKind::Error,
        }
    }

    /// The resource carried by the event, if any
    pub fn object(&self) -> Option<&ResourceSnapshot> {
        match self {
            RawEvent::Added(obj) | RawEvent::Modified(obj) | RawEvent::Deleted(obj) => Some(obj),
            RawEvent::Bookmark(_) | RawEvent::Error(_) => None,
        }
    }

    /// The position this event advances the watch to.
    ///
    /// `None` for error events and for objects that arrived without a resource version.
    pub fn version(&self) -> Option<&ResumeToken> {
        let token = match self {
            RawEvent::Added(obj) | RawEvent::Modified(obj) | RawEvent::Deleted(obj) => {
                &obj.resource_version
            }
            RawEvent::Bookmark(token) => token,
            RawEvent::Error(_) => return None,
        };
        (!token.is_empty()).then_some(token)
    }
}
