use super::MatchEvent;

/// Receives match events emitted by the tracker.
///
/// Sinks are invoked synchronously on the consumption task, in emission
/// order. Anything that can be slow (network upload, rendering) should hand
/// the event off to its own task; the non-blocking path for that is the
/// broadcast channel on [`TrackerSession`](crate::TrackerSession).
pub trait EventSink {
    fn handle_event(&mut self, event: &MatchEvent);

    fn handle_events(&mut self, events: &[MatchEvent]) {
        for event in events {
            self.handle_event(event);
        }
    }
}

/// Collects events into a vector. Useful for tests and replay tooling.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<MatchEvent>,
}

impl EventSink for CollectingSink {
    fn handle_event(&mut self, event: &MatchEvent) {
        self.events.push(event.clone());
    }
}
