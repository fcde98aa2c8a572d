use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use anyhow::Context;
use log::debug;
use showroom_api::{EventDescriptor, EventFilter, EventListing, ProbeResult, ShowroomApi};

/// Upper bound on search pages per listing.
pub const MAX_EVENT_PAGES: u32 = 50;

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    api: ShowroomApi,
}

impl App {
    pub fn new(settings: AppSettings) -> anyhow::Result<Self> {
        let api = ShowroomApi::with_config(settings.api.clone())
            .context("could not configure the SHOWROOM client")?;
        Ok(Self {
            settings,
            state: AppState::new(),
            api,
        })
    }

    pub fn load_events(&mut self, pages: u32, filter: EventFilter) -> &EventListing {
        let pages = pages.clamp(1, MAX_EVENT_PAGES);
        debug!("loading {pages} event pages ({filter})");
        let listing = self.api.list_events(pages, filter);
        self.state.on_events_loaded(listing)
    }

    pub fn resolve(&mut self, event: EventDescriptor, max_pages: u32) -> &ProbeResult {
        let result = self
            .api
            .resolve_ranking(event.event_id, event.event_key.as_deref(), max_pages);
        &self.state.on_ranking_resolved(event, result).result
    }

    /// Resolve the event at `index` in the last listing.
    pub fn resolve_selected(&mut self, index: usize, max_pages: u32) -> Option<&ProbeResult> {
        let event = self.state.event_at(index)?.clone();
        Some(self.resolve(event, max_pages))
    }
}
