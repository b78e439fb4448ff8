//! Filters watch events and turns the admitted ones into display records
use jiff::Timestamp;
use podwatch_core::{DisplayRecord, FilterSpec, RawEvent};

/// A synchronous filter-then-map stage over [`RawEvent`]s.
///
/// Holds nothing but its [`FilterSpec`], so the same event always projects to the same record
/// for the same clock reading.
#[derive(Clone, Debug, Default)]
pub struct EventProjector {
    filter: FilterSpec,
}

impl EventProjector {
    /// Projects events admitted by `filter`
    pub fn new(filter: FilterSpec) -> Self {
        Self { filter }
    }

    /// The filter in use
    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    /// Filters and projects `event` against the current wall clock
    pub fn process(&self, event: &RawEvent) -> Option<DisplayRecord> {
        self.process_at(event, Timestamp::now())
    }

    /// Filters and projects `event`, computing ages relative to `now`.
    ///
    /// Bookmark and error events carry no pod and never produce a record.
    pub fn process_at(&self, event: &RawEvent, now: Timestamp) -> Option<DisplayRecord> {
        let object = event.object()?;
        let kind = event.kind();
        if !self.filter.matches(kind, object) {
            tracing::trace!(event = %kind, name = %object.name, "filtered out");
            return None;
        }
        Some(DisplayRecord::project(kind, object, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;
    use podwatch_core::{ContainerState, ErrorResponse, EventKind, Phase, ResourceSnapshot};

    fn now() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    fn pod(name: &str, phase: Phase) -> ResourceSnapshot {
        ResourceSnapshot::new(name)
            .phase(phase)
            .created(now() - SignedDuration::from_secs(30))
            .container("app")
    }

    fn every_kind_of_event() -> Vec<RawEvent> {
        vec![
            RawEvent::Added(pod("a", Phase::Pending)),
            RawEvent::Modified(pod("a", Phase::Running)),
            RawEvent::Deleted(pod("a", Phase::Succeeded)),
            RawEvent::Modified(pod("b", Phase::Failed)),
            RawEvent::Added(ResourceSnapshot::new("c")),
            RawEvent::Bookmark("12".into()),
            RawEvent::Error(ErrorResponse {
                status: "Failure".into(),
                message: "boom".into(),
                reason: "InternalError".into(),
                code: 500,
            }),
        ]
    }

    #[test]
    fn empty_filter_admits_every_pod_event() {
        let projector = EventProjector::default();
        let records: Vec<_> = every_kind_of_event()
            .iter()
            .map(|e| (e.kind(), projector.process_at(e, now())))
            .collect();

        for (kind, record) in records {
            match kind {
                EventKind::Bookmark | EventKind::Error => assert_eq!(record, None),
                _ => assert_eq!(record.map(|r| r.event), Some(kind)),
            }
        }
    }

    #[test]
    fn only_deleted_passes_a_deleted_filter() {
        let projector = EventProjector::new(FilterSpec::default().event_kind(EventKind::Deleted));
        let events = [
            RawEvent::Added(pod("a", Phase::Running)),
            RawEvent::Modified(pod("a", Phase::Running)),
            RawEvent::Deleted(pod("a", Phase::Running)),
        ];
        let records: Vec<_> = events.iter().filter_map(|e| projector.process_at(e, now())).collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, EventKind::Deleted);
        assert_eq!(records[0].event.to_string(), "DELETED");
    }

    #[test]
    fn status_mismatch_yields_nothing() {
        let projector = EventProjector::new(FilterSpec::default().status(Phase::Running));
        for event in every_kind_of_event() {
            let record = projector.process_at(&event, now());
            let running = event.object().and_then(|o| o.phase) == Some(Phase::Running);
            assert_eq!(record.is_some(), running, "{event:?}");
        }
    }

    #[test]
    fn name_filter_is_exact() {
        let projector = EventProjector::new(FilterSpec::default().name("a"));
        assert!(projector.process_at(&RawEvent::Added(pod("a", Phase::Running)), now()).is_some());
        assert!(projector.process_at(&RawEvent::Added(pod("ab", Phase::Running)), now()).is_none());
    }

    #[test]
    fn projection_is_idempotent() {
        let projector = EventProjector::new(FilterSpec::default().name("a"));
        let event = RawEvent::Modified(pod("a", Phase::Running));
        let first = projector.process_at(&event, now());
        assert!(first.is_some());
        assert_eq!(first, projector.process_at(&event, now()));
    }

    #[test]
    fn projects_ready_ratio_restarts_and_age() {
        let pod = ResourceSnapshot::new("web-0")
            .phase(Phase::Running)
            .created(now() - SignedDuration::from_secs(3725))
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
        let record = EventProjector::default()
            .process_at(&RawEvent::Added(pod), now())
            .unwrap();

        assert_eq!(record.name, "web-0");
        assert_eq!(record.ready.to_string(), "1/2");
        assert_eq!(record.restarts.to_string(), "1");
        assert_eq!(record.status_str(), "Running");
        assert_eq!(record.age.to_string(), "1h2m5s");
    }
}
