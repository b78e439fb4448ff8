//! Podwatch is a kubectl plugin that watches pod events and prints them as they happen.
//!
//! It keeps a single watch open against the API server and transparently reopens it from the
//! last seen resource version whenever the server or network drops it, so that no event is
//! shown twice and none is skipped. The building blocks live in two crates, re-exported here:
//!
//! - [`core`]: the event, pod snapshot, filter and display record types
//! - [`runtime`]: the reconnecting supervisor, the projector and the watch task
//!
//! This crate adds a [`kube`] backed [`ResourceClient`](runtime::ResourceClient), the command
//! line, and the table and JSON output writers.
//!
//! # Example
//!
//! ```no_run
//! use podwatch::{config::{OutputMode, WatchConfig}, core::FilterSpec, output, KubeClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = KubeClient::new(kube::Client::try_default().await?);
//!     let config = WatchConfig {
//!         namespace: "default".into(),
//!         filter: FilterSpec::default(),
//!         timeout: Duration::from_secs(60),
//!         output: OutputMode::Table,
//!     };
//!     let sink = output::sink(config.output, std::io::stdout())?;
//!     podwatch::start(client, &config, sink).await?.await?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub use podwatch_core as core;
pub use podwatch_runtime as runtime;

pub mod client;
pub mod config;
pub mod output;

pub use client::KubeClient;
pub use config::{App, WatchConfig};

use podwatch_runtime::{
    supervise, supervisor, EventProjector, NamespacedWatch, RecordSink, ResourceClient, SourceError,
    WatchTask,
};

/// Checks that `client` can reach the cluster, then starts watching as configured.
///
/// The connectivity check lists the namespace once, bounded by the configured timeout; its
/// failure is returned before any watch is opened. The watch itself starts from the current
/// state of the cluster and runs on its own task until cancelled or a fatal error occurs.
pub async fn start<C, K>(client: C, config: &WatchConfig, sink: K) -> Result<WatchTask, SourceError>
where
    C: ResourceClient + 'static,
    K: RecordSink + 'static,
{
    let listed = client.list(&config.namespace, config.timeout).await?;
    tracing::info!(
        namespace = %config.namespace,
        pods = listed.items.len(),
        version = %listed.version,
        "connected to the api server"
    );

    let factory = NamespacedWatch::new(client, config.namespace.clone(), config.timeout);
    let events = supervise(factory, supervisor::Config::default().timeout(config.timeout));
    Ok(WatchTask::spawn(events, EventProjector::new(config.filter.clone()), sink))
}
