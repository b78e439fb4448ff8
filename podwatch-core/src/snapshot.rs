//! Point-in-time state of a single pod
use crate::{watch::ResumeToken, Error};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The lifecycle phase reported in a pod's `status.phase`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Accepted, but not all containers have been created
    Pending,
    /// Bound to a node with at least one container running
    Running,
    /// All containers terminated successfully
    Succeeded,
    /// All containers terminated, at least one in failure
    Failed,
    /// The state of the pod could not be obtained
    Unknown,
}

impl Phase {
    /// The wire name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Phase::Pending),
            "Running" => Ok(Phase::Running),
            "Succeeded" => Ok(Phase::Succeeded),
            "Failed" => Ok(Phase::Failed),
            "Unknown" => Ok(Phase::Unknown),
            other => Err(Error::InvalidPhase(other.to_owned())),
        }
    }
}

/// The reported state of one container
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerState {
    /// Container name
    pub name: String,
    /// Whether the container passes its readiness checks
    pub ready: bool,
    /// How many times the container has been restarted
    pub restart_count: u32,
}

/// Point-in-time state of one pod, as carried by a watch event
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceSnapshot {
    /// `metadata.name`
    pub name: String,
    /// `metadata.namespace`
    pub namespace: Option<String>,
    /// `metadata.resourceVersion`
    pub resource_version: ResumeToken,
    /// `metadata.creationTimestamp`
    pub creation_timestamp: Timestamp,
    /// `status.phase`, absent while the pod is being scheduled
    pub phase: Option<Phase>,
    /// Names of the containers declared in `spec.containers`
    pub containers: Vec<String>,
    /// `status.containerStatuses`, in the order the server reports them
    pub container_statuses: Vec<ContainerState>,
}

impl ResourceSnapshot {
    /// An empty snapshot of the named pod created at the unix epoch
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            resource_version: ResumeToken::now(),
            creation_timestamp: Timestamp::UNIX_EPOCH,
            phase: None,
            containers: Vec::new(),
            container_statuses: Vec::new(),
        }
    }

    /// Sets the resource version
    #[must_use]
    pub fn version(mut self, version: impl Into<ResumeToken>) -> Self {
        self.resource_version = version.into();
        self
    }

    /// Sets the namespace
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the creation timestamp
    #[must_use]
    pub fn created(mut self, at: Timestamp) -> Self {
        self.creation_timestamp = at;
        self
    }

    /// Sets the phase
    #[must_use]
    pub fn phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Declares a container in the spec
    #[must_use]
    pub fn container(mut self, name: impl Into<String>) -> Self {
        self.containers.push(name.into());
        self
    }

    /// Appends a container status
    #[must_use]
    pub fn container_status(mut self, state: ContainerState) -> Self {
        self.container_statuses.push(state);
        self
    }

    /// Statuses correlated with the declared containers.
    ///
    /// Correlation is by position: the status at index `i` is taken to describe `spec.containers[i]`.
    /// Statuses beyond the declared containers are ignored, and containers without a status yet
    /// simply have no entry.
    fn correlated_statuses(&self) -> impl Iterator<Item = &ContainerState> {
        self.container_statuses.iter().take(self.containers.len())
    }

    /// Number of declared containers reporting ready
    pub fn ready_count(&self) -> usize {
        self.correlated_statuses().filter(|s| s.ready).count()
    }

    /// Sum of restarts across the correlated container statuses
    pub fn total_restarts(&self) -> u64 {
        self.correlated_statuses().map(|s| u64::from(s.restart_count)).sum()
    }
}
