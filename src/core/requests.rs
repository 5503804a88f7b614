//! Per-concern request sequencing and loading flags.
//!
//! Provider fetches can overlap. For any one concern only the most recently
//! issued request may apply its response; older responses are discarded
//! when they arrive, whatever order they arrive in.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::ActorSlot;

/// Independent streams of provider requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Concern {
    /// Detail fetch for the inspected board node
    NodeDetail,
    /// Free-text actor search for a start slot
    ActorSearch(ActorSlot),
    /// Detail fetch for the actor chosen in a start slot
    ActorSelection(ActorSlot),
    /// The main multi search
    GeneralSearch,
}

/// Handle for one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub concern: Concern,
    pub sequence: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    latest: HashMap<Concern, u64>,
    loading: HashSet<Concern>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new request for `concern`, superseding any in flight
    pub fn begin(&mut self, concern: Concern) -> RequestTicket {
        let sequence = self.latest.entry(concern).or_insert(0);
        *sequence += 1;
        self.loading.insert(concern);
        RequestTicket {
            concern,
            sequence: *sequence,
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest.get(&ticket.concern) == Some(&ticket.sequence)
    }

    /// Mark a response as arrived. Returns whether it may be applied;
    /// stale tickets leave the loading flag of the newer request alone.
    pub fn complete(&mut self, ticket: RequestTicket) -> bool {
        if self.is_current(&ticket) {
            self.loading.remove(&ticket.concern);
            true
        } else {
            false
        }
    }

    /// Supersede whatever is in flight for `concern` without issuing a request
    pub fn cancel(&mut self, concern: Concern) {
        let ticket = self.begin(concern);
        self.complete(ticket);
    }

    pub fn is_loading(&self, concern: Concern) -> bool {
        self.loading.contains(&concern)
    }

    pub fn any_loading(&self) -> bool {
        !self.loading.is_empty()
    }

    /// Supersede every in-flight request
    pub fn invalidate_all(&mut self) {
        for sequence in self.latest.values_mut() {
            *sequence += 1;
        }
        self.loading.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_request_wins() {
        let mut tracker = RequestTracker::new();
        let first = tracker.begin(Concern::GeneralSearch);
        let second = tracker.begin(Concern::GeneralSearch);

        // Second resolves first, then the stale first arrives
        assert!(tracker.complete(second));
        assert!(!tracker.complete(first));
        assert!(!tracker.is_loading(Concern::GeneralSearch));
    }

    #[test]
    fn test_stale_response_keeps_loading_flag() {
        let mut tracker = RequestTracker::new();
        let first = tracker.begin(Concern::NodeDetail);
        let _second = tracker.begin(Concern::NodeDetail);

        assert!(!tracker.complete(first));
        assert!(tracker.is_loading(Concern::NodeDetail));
    }

    #[test]
    fn test_concerns_are_independent() {
        let mut tracker = RequestTracker::new();
        let slot0 = tracker.begin(Concern::ActorSearch(ActorSlot::First));
        let slot1 = tracker.begin(Concern::ActorSearch(ActorSlot::Second));

        assert!(tracker.complete(slot1));
        assert!(tracker.is_loading(Concern::ActorSearch(ActorSlot::First)));
        assert!(tracker.complete(slot0));
        assert!(!tracker.any_loading());
    }

    #[test]
    fn test_invalidate_all() {
        let mut tracker = RequestTracker::new();
        let pending = tracker.begin(Concern::GeneralSearch);
        tracker.invalidate_all();

        assert!(!tracker.any_loading());
        assert!(!tracker.complete(pending));
    }

    #[test]
    fn test_cancel() {
        let mut tracker = RequestTracker::new();
        let pending = tracker.begin(Concern::ActorSelection(ActorSlot::First));
        tracker.cancel(Concern::ActorSelection(ActorSlot::First));

        assert!(!tracker.is_loading(Concern::ActorSelection(ActorSlot::First)));
        assert!(!tracker.complete(pending));
    }
}
