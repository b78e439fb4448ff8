//! Selecting which watch events a user wants to see
use crate::{
    snapshot::{Phase, ResourceSnapshot},
    watch::EventKind,
    Result,
};

/// An immutable set of exact-match criteria for watch events.
///
/// Every criterion is optional, and an unset criterion matches everything.
/// Set criteria are AND-combined.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Only admit events of this type
    pub event_kind: Option<EventKind>,
    /// Only admit pods in this phase
    pub status: Option<Phase>,
    /// Only admit the pod with this exact name
    pub name: Option<String>,
}

impl FilterSpec {
    /// Only admit events of the given type
    #[must_use]
    pub fn event_kind(mut self, kind: EventKind) -> Self {
        self.event_kind = Some(kind);
        self
    }

    /// Only admit pods in the given phase
    #[must_use]
    pub fn status(mut self, phase: Phase) -> Self {
        self.status = Some(phase);
        self
    }

    /// Only admit the named pod
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds a filter from user supplied strings.
    ///
    /// Empty strings are treated as unset. Event types and statuses are validated here so that a
    /// typo fails before any watch is started.
    pub fn parse(event: Option<&str>, status: Option<&str>, name: Option<&str>) -> Result<Self> {
        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.filter(|s| !s.is_empty())
        }
        Ok(Self {
            event_kind: non_empty(event).map(str::parse::<EventKind>).transpose()?,
            status: non_empty(status).map(str::parse::<Phase>).transpose()?,
            name: non_empty(name).map(str::to_owned),
        })
    }

    /// Whether no criterion is set
    pub fn is_empty(&self) -> bool {
        self.event_kind.is_none() && self.status.is_none() && self.name.is_none()
    }

    /// Tests an event of type `kind` carrying `object`.
    ///
    /// Checks run in order: event type, then phase, then name.
    /// A status criterion never matches a pod without a reported phase.
    pub fn matches(&self, kind: EventKind, object: &ResourceSnapshot) -> bool {
        if self.event_kind.is_some_and(|k| k != kind) {
            return false;
        }
        if self.status.is_some() && object.phase != self.status {
            return false;
        }
        match &self.name {
            Some(name) => *name == object.name,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn parse_treats_empty_as_unset() {
        let filter = FilterSpec::parse(Some(""), Some(""), Some("")).unwrap();
        assert!(filter.is_empty());

        let filter = FilterSpec::parse(Some("DELETED"), Some("Running"), Some("coredns")).unwrap();
        assert_eq!(
            filter,
            FilterSpec::default()
                .event_kind(EventKind::Deleted)
                .status(Phase::Running)
                .name("coredns")
        );
    }

    #[test]
    fn parse_rejects_bad_values() {
        assert_eq!(
            FilterSpec::parse(Some("CHANGED"), None, None),
            Err(Error::InvalidEventKind("CHANGED".into()))
        );
        assert_eq!(
            FilterSpec::parse(None, Some("Crashing"), None),
            Err(Error::InvalidPhase("Crashing".into()))
        );
    }

    #[test]
    fn criteria_are_and_combined() {
        let pod = ResourceSnapshot::new("coredns").phase(Phase::Running);
        let filter = FilterSpec::default().event_kind(EventKind::Modified).name("coredns");
        assert!(filter.matches(EventKind::Modified, &pod));
        assert!(!filter.matches(EventKind::Added, &pod));
        assert!(!filter.clone().name("other").matches(EventKind::Modified, &pod));
        assert!(filter.clone().status(Phase::Running).matches(EventKind::Modified, &pod));
        assert!(!filter.status(Phase::Failed).matches(EventKind::Modified, &pod));
    }

    #[test]
    fn status_never_matches_missing_phase() {
        let pending = ResourceSnapshot::new("web");
        assert!(!FilterSpec::default().status(Phase::Unknown).matches(EventKind::Added, &pending));
        assert!(FilterSpec::default().matches(EventKind::Added, &pending));
    }
}
