//! Crate with the podwatch runtime components
//!
//! This crate turns a [`ResourceClient`] into a resumable, filtered feed of display records:
//!
//! - the [`StreamSupervisor`] keeps one watch connection open at a time and reopens it from the
//!   last seen resume token whenever it drops
//! - the [`EventProjector`] filters the events and projects them into [`DisplayRecord`]s
//! - a [`WatchTask`] drives both on its own tokio task and hands records to a [`RecordSink`]
//!
//! [`DisplayRecord`]: podwatch_core::DisplayRecord

#![deny(unsafe_code)]

pub mod projector;
pub mod sink;
pub mod source;
pub mod supervisor;
pub mod task;
pub mod utils;

pub use projector::EventProjector;
pub use sink::RecordSink;
pub use source::{
    watch_fn, EventStream, NamespacedWatch, ResourceClient, ResourceList, SourceError, WatchFactory,
};
pub use supervisor::{supervise, StreamSupervisor};
pub use task::WatchTask;
