//! Watches the pod collection for changes, hiding reconnects from the consumer

use crate::{
    source::{EventStream, SourceError, WatchFactory},
    utils::{Reconnect, ReconnectPolicy},
};
use backon::ExponentialBuilder;
use futures::{Stream, StreamExt};
use podwatch_core::{RawEvent, ResumeToken};
use std::{fmt, time::Duration};
use thiserror::Error;
use tokio::time::Instant;

/// Fatal conditions that end a supervised watch.
///
/// Everything else (dropped connections, server side timeouts, `ERROR` events) is recovered
/// internally and never shows up here.
#[derive(Error, Debug)]
pub enum Error {
    /// The server no longer keeps the history needed to resume, so events would be skipped
    #[error("watch position lost: resume token {token:?} was rejected: {source}")]
    WatchPositionLost {
        /// The token the server refused
        token: ResumeToken,
        /// The server's answer
        #[source]
        source: SourceError,
    },

    /// A payload could not be decoded into a pod
    #[error("malformed resource on the watch stream: {0}")]
    MalformedObject(#[source] SourceError),

    /// The configured backoff ran out of attempts
    #[error("gave up reconnecting the watch from resume token {token:?}: {source}")]
    ReconnectGaveUp {
        /// The token the last attempt resumed from
        token: ResumeToken,
        /// The last transient failure
        #[source]
        source: SourceError,
    },
}

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Configuration for a [`StreamSupervisor`]
#[derive(Clone, Debug)]
pub struct Config {
    /// Upper bound on the lifetime of a single watch connection.
    ///
    /// The same bound should be given to the [`WatchFactory`] so that the server closes the
    /// connection itself; the supervisor additionally enforces it locally (plus `idle_grace`)
    /// in case the server never does.
    pub timeout: Duration,

    /// Slack added to `timeout` before the supervisor drops a connection on its own
    pub idle_grace: Duration,

    /// Where the first watch starts. Empty watches from the current state.
    pub initial_token: ResumeToken,

    /// Delays between reconnect attempts that follow a fault
    pub backoff: ExponentialBuilder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            idle_grace: Duration::from_secs(5),
            initial_token: ResumeToken::now(),
            backoff: ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(800))
                .with_max_delay(Duration::from_secs(30))
                .with_factor(2.0)
                .with_jitter()
                .with_max_times(usize::MAX),
        }
    }
}

impl Config {
    /// Bound each watch connection to `timeout`
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Slack before a silent connection is dropped locally
    #[must_use]
    pub fn idle_grace(mut self, grace: Duration) -> Self {
        self.idle_grace = grace;
        self
    }

    /// Resume from a known position instead of the current state
    #[must_use]
    pub fn initial_token(mut self, token: impl Into<ResumeToken>) -> Self {
        self.initial_token = token.into();
        self
    }

    /// Replace the reconnect backoff
    #[must_use]
    pub fn backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Where the supervisor stands between two steps
enum State {
    /// No connection is open; the next step opens one from `token`, after sleeping `delay`
    Disconnected {
        token: ResumeToken,
        delay: Option<Duration>,
    },
    /// A connection is open, and events are forwarded from it
    Watching {
        token: ResumeToken,
        stream: EventStream,
        deadline: Instant,
    },
    /// A fatal error was returned; nothing more will be produced
    Terminated,
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Disconnected { token, delay } => f
                .debug_struct("Disconnected")
                .field("token", token)
                .field("delay", delay)
                .finish(),
            State::Watching { token, deadline, .. } => f
                .debug_struct("Watching")
                .field("token", token)
                .field("deadline", deadline)
                .finish_non_exhaustive(),
            State::Terminated => f.write_str("Terminated"),
        }
    }
}

type Policy = ReconnectPolicy<ExponentialBuilder>;

/// Decides what a failure means for the watch.
///
/// Token rejections and undecodable payloads are fatal. Anything else schedules a reconnect
/// from the same token after the next backoff delay.
fn recover(token: ResumeToken, err: SourceError, policy: &mut Policy) -> (Option<Result<RawEvent>>, State) {
    if err.is_expired() {
        tracing::error!(%token, error = %err, "resume token rejected, watch position lost");
        return (Some(Err(Error::WatchPositionLost { token, source: err })), State::Terminated);
    }
    if let SourceError::Decode(_) = err {
        tracing::error!(error = %err, "undecodable resource on the watch stream");
        return (Some(Err(Error::MalformedObject(err))), State::Terminated);
    }
    match policy.failed() {
        Reconnect::Now => (None, State::Disconnected { token, delay: None }),
        Reconnect::After(delay) => {
            tracing::warn!(%token, error = %err, ?delay, "watch interrupted, reconnecting");
            (None, State::Disconnected {
                token,
                delay: Some(delay),
            })
        }
        Reconnect::GiveUp => {
            tracing::error!(%token, error = %err, "watch interrupted, backoff exhausted");
            (Some(Err(Error::ReconnectGaveUp { token, source: err })), State::Terminated)
        }
    }
}

/// The server ended the connection cleanly.
///
/// After at least one delivery the watch is reopened at once. An empty connection counts
/// against the backoff like a failure.
fn closed(token: ResumeToken, policy: &mut Policy) -> (Option<Result<RawEvent>>, State) {
    match policy.closed() {
        Reconnect::Now => {
            tracing::debug!(%token, "watch stream ended, reconnecting");
            (None, State::Disconnected { token, delay: None })
        }
        Reconnect::After(delay) => {
            tracing::warn!(%token, ?delay, "watch closed before delivering anything, reconnecting");
            (None, State::Disconnected {
                token,
                delay: Some(delay),
            })
        }
        Reconnect::GiveUp => {
            tracing::error!(%token, "watch keeps closing empty, backoff exhausted");
            let source = SourceError::transport("watch closed before delivering any event");
            (Some(Err(Error::ReconnectGaveUp { token, source })), State::Terminated)
        }
    }
}

/// Makes one transition, possibly yielding an event or a fatal error.
///
/// `None` only means nothing came out of this transition; [`step`] keeps calling until
/// something does.
async fn step_trampolined<F: WatchFactory>(
    factory: &F,
    config: &Config,
    policy: &mut Policy,
    state: State,
) -> (Option<Result<RawEvent>>, State) {
    match state {
        State::Disconnected { token, delay } => {
            if let Some(delay) = delay {
                tracing::debug!(?delay, "backing off before reconnecting");
                tokio::time::sleep(delay).await;
            }
            match factory.open(&token).await {
                Ok(stream) => {
                    policy.opened();
                    tracing::debug!(%token, "watch started");
                    let deadline = Instant::now() + config.timeout + config.idle_grace;
                    (None, State::Watching {
                        token,
                        stream,
                        deadline,
                    })
                }
                Err(err) => recover(token, err, policy),
            }
        }
        State::Watching {
            token,
            mut stream,
            deadline,
        } => match tokio::time::timeout_at(deadline, stream.next()).await {
            Err(_elapsed) => {
                tracing::debug!(%token, "watch deadline passed, reconnecting");
                (None, State::Disconnected { token, delay: None })
            }
            Ok(None) => closed(token, policy),
            Ok(Some(Ok(RawEvent::Bookmark(bookmark)))) => {
                policy.delivered();
                let token = if bookmark.is_empty() { token } else { bookmark };
                tracing::trace!(%token, "bookmark received");
                (None, State::Watching {
                    token,
                    stream,
                    deadline,
                })
            }
            Ok(Some(Ok(RawEvent::Error(resp)))) => recover(token, SourceError::Api(resp), policy),
            Ok(Some(Ok(event))) => {
                policy.delivered();
                let token = event.version().cloned().unwrap_or(token);
                (Some(Ok(event)), State::Watching {
                    token,
                    stream,
                    deadline,
                })
            }
            Ok(Some(Err(err))) => recover(token, err, policy),
        },
        State::Terminated => (None, State::Terminated),
    }
}

/// Runs transitions until one of them yields something
async fn step<F: WatchFactory>(
    factory: &F,
    config: &Config,
    policy: &mut Policy,
    mut state: State,
) -> (Result<RawEvent>, State) {
    loop {
        match step_trampolined(factory, config, policy, state).await {
            (Some(result), new_state) => return (result, new_state),
            (None, new_state) => state = new_state,
        }
    }
}

/// Turns a [`WatchFactory`] into one gap-free, never-ending sequence of events.
///
/// # Recovery
///
/// Whenever the connection ends (server timeout, local deadline, dropped connection) or the
/// server sends an `ERROR` event, the supervisor opens a new connection from the resume token
/// of the last event it forwarded. It never falls back to watching from the current state,
/// since that would silently skip whatever happened while disconnected.
///
/// Reconnects that follow a fault, or a connection the server closed before it delivered any
/// event or bookmark, wait for the configured backoff, which starts over as soon as something
/// comes through. A connection that delivered something or reached its deadline is reopened
/// right away.
///
/// Bookmarks advance the resume token but are not forwarded.
///
/// # Termination
///
/// The stream only ends after yielding a fatal [`Error`]:
/// - [`Error::WatchPositionLost`] when the server rejects the resume token as expired
/// - [`Error::MalformedObject`] when a payload cannot be decoded
/// - [`Error::ReconnectGaveUp`] when a bounded backoff runs out
///
/// Dropping the stream closes the open connection.
pub struct StreamSupervisor<F> {
    factory: F,
    config: Config,
}

impl<F: WatchFactory + 'static> StreamSupervisor<F> {
    /// Supervises watches opened by `factory`
    pub fn new(factory: F, config: Config) -> Self {
        Self { factory, config }
    }

    /// Starts watching from the configured initial token
    pub fn open(self) -> impl Stream<Item = Result<RawEvent>> + Send {
        let policy = ReconnectPolicy::new(self.config.backoff.clone());
        let state = State::Disconnected {
            token: self.config.initial_token.clone(),
            delay: None,
        };
        futures::stream::unfold(
            (self.factory, self.config, policy, state),
            |(factory, config, mut policy, state)| async move {
                if let State::Terminated = state {
                    return None;
                }
                let (event, state) = step(&factory, &config, &mut policy, state).await;
                Some((event, (factory, config, policy, state)))
            },
        )
    }
}

/// Shorthand for `StreamSupervisor::new(factory, config).open()`
pub fn supervise<F: WatchFactory + 'static>(
    factory: F,
    config: Config,
) -> impl Stream<Item = Result<RawEvent>> + Send {
    StreamSupervisor::new(factory, config).open()
}
