//! Flat rows derived from watch events
use crate::{
    age::Age,
    snapshot::{Phase, ResourceSnapshot},
    watch::EventKind,
};
use jiff::Timestamp;
use serde::Serialize;
use std::fmt;

/// Ready containers out of declared containers, printed as `ready/total`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Readiness {
    /// Containers reporting ready
    pub ready: usize,
    /// Containers declared in the pod spec
    pub total: usize,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ready, self.total)
    }
}

/// One displayable row describing a single admitted watch event.
///
/// Records are derived fresh for every event and carry no identity of their own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
    /// The event type
    pub event: EventKind,
    /// Pod name
    pub name: String,
    /// Container readiness ratio
    pub ready: Readiness,
    /// Pod phase, if reported
    pub status: Option<Phase>,
    /// Total container restarts
    pub restarts: u64,
    /// Time since creation
    pub age: Age,
}

impl DisplayRecord {
    /// Derives the record for an event of type `event` carrying `object`, observed at `now`
    pub fn project(event: EventKind, object: &ResourceSnapshot, now: Timestamp) -> Self {
        Self {
            event,
            name: object.name.clone(),
            ready: Readiness {
                ready: object.ready_count(),
                total: object.containers.len(),
            },
            status: object.phase,
            restarts: object.total_restarts(),
            age: Age::between(object.creation_timestamp, now),
        }
    }

    /// The phase as printed in a table cell; empty while the pod has no phase
    pub fn status_str(&self) -> &'static str {
        self.status.as_ref().map_or("", Phase::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ContainerState;
    use jiff::SignedDuration;

    #[test]
    fn projects_two_container_pod() {
        let created = Timestamp::from_second(1_700_000_000).unwrap();
        let pod = ResourceSnapshot::new("web-0")
            .created(created)
            .phase(Phase::Running)
            .container("app")
            .container("proxy")
            .container_status(ContainerState {
                name: "app".into(),
                ready: true,
                restart_count: 1,
            })
            .container_status(ContainerState {
                name: "proxy".into(),
                ready: false,
                restart_count: 0,
            });

        let now = created + SignedDuration::from_secs(125);
        let record = DisplayRecord::project(EventKind::Modified, &pod, now);
        assert_eq!(record.ready.to_string(), "1/2");
        assert_eq!(record.restarts.to_string(), "1");
        assert_eq!(record.status_str(), "Running");
        assert_eq!(record.age.to_string(), "2m5s");
    }

    #[test]
    fn serializes_flat() {
        let pod = ResourceSnapshot::new("web-0").container("app");
        let record = DisplayRecord::project(EventKind::Added, &pod, Timestamp::UNIX_EPOCH);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({
                "event": "ADDED",
                "name": "web-0",
                "ready": {"ready": 0, "total": 1},
                "status": null,
                "restarts": 0,
                "age": "0s",
            })
        );
    }
}
