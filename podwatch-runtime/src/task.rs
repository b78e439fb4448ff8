//! Running a supervised watch on its own task
use crate::{projector::EventProjector, sink::RecordSink, supervisor};
use futures::{pin_mut, FutureExt, Stream, StreamExt};
use podwatch_core::RawEvent;
use std::{
    future::Future,
    io,
    pin::Pin,
    task::{Context, Poll},
};
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

/// Reasons a watch task ends without being cancelled
#[derive(Error, Debug)]
pub enum Error {
    /// The supervised watch hit a fatal condition
    #[error("watch failed: {0}")]
    Watch(#[from] supervisor::Error),

    /// The sink could not be written to
    #[error("failed to write record: {0}")]
    Sink(#[source] io::Error),

    /// The task panicked
    #[error("watch task failed: {0}")]
    Join(#[from] JoinError),
}

/// Feeds `events` through `projector` into `sink` until cancelled or the events end.
///
/// Each event is projected and written before the next one is read, so server order is kept.
/// Cancellation is only observed between events: a record that is being written is finished
/// first. Returning drops `events`, which closes the underlying connection.
pub async fn run<S, K>(
    events: S,
    projector: &EventProjector,
    sink: &mut K,
    cancel: &CancellationToken,
) -> Result<(), Error>
where
    S: Stream<Item = supervisor::Result<RawEvent>>,
    K: RecordSink + ?Sized,
{
    pin_mut!(events);
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("watch cancelled");
                break;
            }
            next = events.next() => next,
        };
        match next {
            Some(Ok(event)) => {
                if let Some(record) = projector.process(&event) {
                    sink.write_record(&record).map_err(Error::Sink)?;
                }
            }
            Some(Err(err)) => {
                sink.flush().map_err(Error::Sink)?;
                return Err(err.into());
            }
            None => break,
        }
    }
    sink.flush().map_err(Error::Sink)
}

/// A handle to a watch running on its own tokio task.
///
/// Awaiting the handle waits for the watch to end: `Ok(())` after cancellation, or the fatal
/// [`Error`] that stopped it. Dropping the handle cancels the watch.
#[derive(Debug)]
pub struct WatchTask {
    inner: JoinHandle<Result<(), Error>>,
    cancel: CancellationToken,
}

impl WatchTask {
    /// Spawns `run` for `events` onto the current tokio runtime
    pub fn spawn<S, K>(events: S, projector: EventProjector, mut sink: K) -> Self
    where
        S: Stream<Item = supervisor::Result<RawEvent>> + Send + 'static,
        K: RecordSink + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let inner = tokio::spawn(async move { run(events, &projector, &mut sink, &token).await });
        Self { inner, cancel }
    }

    /// Asks the watch to stop after the event it is processing
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this watch, for wiring up signal handlers
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the watch has ended
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl Drop for WatchTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Future for WatchTask {
    type Output = Result<(), Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner
            .poll_unpin(cx)
            .map(|joined| joined.map_err(Error::Join).and_then(|res| res))
    }
}
