//! Crate with the types shared by every part of podwatch
//!
//! Nothing in here performs I/O: the watch events, resource snapshots, filters and display
//! records are plain data so that they can be produced by any client and consumed by any sink.
//! The same information is re-exported from `podwatch` under `podwatch::core`.
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod age;
pub use age::Age;

pub mod filter;
pub use filter::FilterSpec;

pub mod record;
pub use record::{DisplayRecord, Readiness};

pub mod snapshot;
pub use snapshot::{ContainerState, Phase, ResourceSnapshot};

pub mod watch;
pub use watch::{EventKind, RawEvent, ResumeToken};

mod error;
pub use error::{Error, ErrorResponse};

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
