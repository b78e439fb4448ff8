//! A [`ResourceClient`] backed by a [`kube::Client`]
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use jiff::Timestamp;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams, WatchEvent, WatchParams},
    Client,
};
use podwatch_core::{
    ContainerState, Error, ErrorResponse, Phase, RawEvent, ResourceSnapshot, ResumeToken,
};
use podwatch_runtime::{EventStream, ResourceClient, ResourceList, SourceError};
use std::time::Duration;

/// Lists and watches pods through a configured [`kube::Client`]
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    /// Wraps a client built from a kubeconfig or the in-cluster environment
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Pod> {
        if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        }
    }
}

#[async_trait]
impl ResourceClient for KubeClient {
    async fn list(&self, namespace: &str, timeout: Duration) -> Result<ResourceList, SourceError> {
        // list requests carry no server side timeout, so bound the call here
        let list = tokio::time::timeout(timeout, self.api(namespace).list(&ListParams::default()))
            .await
            .map_err(SourceError::transport)?
            .map_err(source_error)?;
        let version = list.metadata.resource_version.unwrap_or_default();
        let items = list
            .items
            .into_iter()
            .map(snapshot_from_pod)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| SourceError::Decode(err.to_string()))?;
        Ok(ResourceList {
            items,
            version: version.into(),
        })
    }

    async fn watch(
        &self,
        namespace: &str,
        timeout: Duration,
        token: &ResumeToken,
    ) -> Result<EventStream, SourceError> {
        let wp = WatchParams::default().timeout(timeout_secs(timeout));
        let stream = self
            .api(namespace)
            .watch(&wp, token.as_str())
            .await
            .map_err(source_error)?;
        Ok(stream
            .map_err(source_error)
            .and_then(|event| futures::future::ready(raw_event(event)))
            .boxed())
    }
}

fn timeout_secs(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX)
}

/// Classifies a client error the way the supervisor needs it
fn source_error(err: kube::Error) -> SourceError {
    match err {
        kube::Error::Api(resp) => SourceError::Api(error_response(resp)),
        kube::Error::SerdeError(err) => SourceError::Decode(err.to_string()),
        other => SourceError::transport(other),
    }
}

fn error_response(resp: kube::core::ErrorResponse) -> ErrorResponse {
    ErrorResponse {
        status: resp.status,
        message: resp.message,
        reason: resp.reason,
        code: resp.code,
    }
}

fn raw_event(event: WatchEvent<Pod>) -> Result<RawEvent, SourceError> {
    let snapshot = |pod| snapshot_from_pod(pod).map_err(|err| SourceError::Decode(err.to_string()));
    Ok(match event {
        WatchEvent::Added(pod) => RawEvent::Added(snapshot(pod)?),
        WatchEvent::Modified(pod) => RawEvent::Modified(snapshot(pod)?),
        WatchEvent::Deleted(pod) => RawEvent::Deleted(snapshot(pod)?),
        WatchEvent::Bookmark(bm) => RawEvent::Bookmark(bm.metadata.resource_version.into()),
        WatchEvent::Error(resp) => RawEvent::Error(error_response(resp)),
    })
}

/// Extracts the fields the watch displays from a full pod object.
///
/// A pod without a name or creation timestamp is rejected. A phase this client does not know
/// is reported as [`Phase::Unknown`].
pub fn snapshot_from_pod(pod: Pod) -> Result<ResourceSnapshot, Error> {
    let meta = pod.metadata;
    let name = meta.name.ok_or(Error::MissingField("metadata.name"))?;
    let created = meta
        .creation_timestamp
        .ok_or(Error::MissingField("metadata.creationTimestamp"))?
        .0;
    let nanos = i32::try_from(created.timestamp_subsec_nanos())
        .map_err(|err| Error::InvalidTimestamp(err.to_string()))?;
    let created = Timestamp::new(created.timestamp(), nanos)
        .map_err(|err| Error::InvalidTimestamp(err.to_string()))?;

    let mut snapshot = ResourceSnapshot::new(name)
        .version(meta.resource_version.unwrap_or_default())
        .created(created);
    if let Some(ns) = meta.namespace {
        snapshot = snapshot.namespace(ns);
    }
    for container in pod.spec.map(|spec| spec.containers).unwrap_or_default() {
        snapshot = snapshot.container(container.name);
    }

    let status = pod.status.unwrap_or_default();
    if let Some(raw) = status.phase.as_deref() {
        let phase = raw.parse().unwrap_or_else(|_| {
            tracing::warn!(phase = raw, name = %snapshot.name, "unrecognized pod phase");
            Phase::Unknown
        });
        snapshot = snapshot.phase(phase);
    }
    for cs in status.container_statuses.unwrap_or_default() {
        snapshot = snapshot.container_status(ContainerState {
            name: cs.name,
            ready: cs.ready,
            restart_count: u32::try_from(cs.restart_count).unwrap_or_default(),
        });
    }
    Ok(snapshot)
}
