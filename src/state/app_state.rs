use showroom_api::{EventDescriptor, EventListing, ProbeResult};

/// The ranking last resolved, and for which event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingView {
    pub event: EventDescriptor,
    pub result: ProbeResult,
}

/// Session state owned by the caller and threaded through each command.
#[derive(Debug, Default)]
pub struct AppState {
    pub last_events: Option<EventListing>,
    pub last_ranking: Option<RankingView>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new listing replaces the previous one wholesale.
    pub fn on_events_loaded(&mut self, listing: EventListing) -> &EventListing {
        self.last_events.insert(listing)
    }

    pub fn on_ranking_resolved(&mut self, event: EventDescriptor, result: ProbeResult) -> &RankingView {
        self.last_ranking.insert(RankingView { event, result })
    }

    pub fn events(&self) -> &[EventDescriptor] {
        self.last_events
            .as_ref()
            .map(|l| l.events.as_slice())
            .unwrap_or_default()
    }

    /// Event by its position in the last listing.
    pub fn event_at(&self, index: usize) -> Option<&EventDescriptor> {
        self.events().get(index)
    }
}
