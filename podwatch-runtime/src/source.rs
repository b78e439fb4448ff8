//! The seam between the watch engine and whatever talks to the API server
use async_trait::async_trait;
use futures::{future::Future, stream::BoxStream};
use podwatch_core::{ErrorResponse, RawEvent, ResourceSnapshot, ResumeToken};
use std::time::Duration;
use thiserror::Error;

/// A type-erased error from the transport layer
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An open watch connection, yielding decoded events until the server closes it
pub type EventStream = BoxStream<'static, Result<RawEvent, SourceError>>;

/// Errors produced by a [`ResourceClient`] or a [`WatchFactory`]
#[derive(Error, Debug)]
pub enum SourceError {
    /// The API server answered with an error status
    #[error("api server returned an error: {0}")]
    Api(#[source] ErrorResponse),

    /// The connection failed or was dropped
    #[error("connection to the api server failed: {0}")]
    Transport(#[source] BoxError),

    /// A payload could not be decoded into a pod
    #[error("failed to decode resource: {0}")]
    Decode(String),
}

impl SourceError {
    /// Wraps any transport failure
    pub fn transport(err: impl Into<BoxError>) -> Self {
        SourceError::Transport(err.into())
    }

    /// Whether the server refused the resume token as too old to serve
    pub fn is_expired(&self) -> bool {
        matches!(self, SourceError::Api(resp) if resp.is_gone())
    }
}

/// Result of listing the watched collection once
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceList {
    /// Every pod present at the time of the list
    pub items: Vec<ResourceSnapshot>,
    /// The collection version the list was served at
    pub version: ResumeToken,
}

/// A configured client for the pod collection.
///
/// Implementations own credentials, cluster selection and transport. An empty `namespace`
/// addresses every namespace. Both calls are bounded by `timeout`: a list must fail once it
/// elapses, and a watch forwards it to the server so that it closes the stream on its own.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Lists the collection once
    async fn list(&self, namespace: &str, timeout: Duration) -> Result<ResourceList, SourceError>;

    /// Opens a watch starting after `token`
    async fn watch(
        &self,
        namespace: &str,
        timeout: Duration,
        token: &ResumeToken,
    ) -> Result<EventStream, SourceError>;
}

/// Opens a fresh watch stream from a resume token.
///
/// This is what the [`StreamSupervisor`](crate::StreamSupervisor) calls each time it (re)connects.
#[async_trait]
pub trait WatchFactory: Send + Sync {
    /// Opens a stream resuming after `token`; an empty token watches from the current state
    async fn open(&self, token: &ResumeToken) -> Result<EventStream, SourceError>;
}

/// A [`WatchFactory`] bound to one namespace of a [`ResourceClient`]
#[derive(Clone, Debug)]
pub struct NamespacedWatch<C> {
    client: C,
    namespace: String,
    timeout: Duration,
}

impl<C: ResourceClient> NamespacedWatch<C> {
    /// Watches `namespace` (empty for all namespaces), asking the server to close each
    /// connection after `timeout`
    pub fn new(client: C, namespace: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            timeout,
        }
    }

    /// The underlying client
    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: ResourceClient> WatchFactory for NamespacedWatch<C> {
    async fn open(&self, token: &ResumeToken) -> Result<EventStream, SourceError> {
        self.client.watch(&self.namespace, self.timeout, token).await
    }
}

/// A [`WatchFactory`] backed by an async closure, see [`watch_fn`]
#[derive(Clone, Debug)]
pub struct WatchFn<F>(F);

/// Builds a [`WatchFactory`] from a closure taking the resume token
pub fn watch_fn<F, Fut>(f: F) -> WatchFn<F>
where
    F: Fn(ResumeToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<EventStream, SourceError>> + Send,
{
    WatchFn(f)
}

#[async_trait]
impl<F, Fut> WatchFactory for WatchFn<F>
where
    F: Fn(ResumeToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<EventStream, SourceError>> + Send,
{
    async fn open(&self, token: &ResumeToken) -> Result<EventStream, SourceError> {
        (self.0)(token.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{stream, StreamExt};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<(String, Duration, ResumeToken)>>,
    }

    #[async_trait]
    impl ResourceClient for RecordingClient {
        async fn list(&self, _: &str, _: Duration) -> Result<ResourceList, SourceError> {
            Ok(ResourceList::default())
        }

        async fn watch(
            &self,
            namespace: &str,
            timeout: Duration,
            token: &ResumeToken,
        ) -> Result<EventStream, SourceError> {
            self.calls
                .lock()
                .unwrap()
                .push((namespace.to_owned(), timeout, token.clone()));
            Ok(stream::empty().boxed())
        }
    }

    #[tokio::test]
    async fn namespaced_watch_forwards_namespace_timeout_and_token() {
        let factory = NamespacedWatch::new(RecordingClient::default(), "kube-system", Duration::from_secs(60));
        factory.open(&ResumeToken::new("12")).await.unwrap();
        factory.open(&ResumeToken::now()).await.unwrap();

        let calls = factory.client().calls.lock().unwrap().clone();
        assert_eq!(calls, vec![
            ("kube-system".to_owned(), Duration::from_secs(60), ResumeToken::new("12")),
            ("kube-system".to_owned(), Duration::from_secs(60), ResumeToken::now()),
        ]);
    }

    #[test]
    fn only_gone_api_errors_are_expired() {
        let gone = SourceError::Api(ErrorResponse {
            status: "Failure".into(),
            message: "too old resource version".into(),
            reason: "Expired".into(),
            code: 410,
        });
        assert!(gone.is_expired());
        assert!(!SourceError::transport("connection reset by peer").is_expired());
        assert!(!SourceError::Decode("missing metadata.name".into()).is_expired());
    }
}
