//! Type-ahead suggestions for partially typed city names.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::geocode::GeocodingApi;
use crate::query::normalize;
use crate::resolver::MAX_CANDIDATES;
use crate::types::Suggestion;

/// Input shorter than this (after normalization) hides the list
pub const MIN_SUGGEST_LEN: usize = 3;

/// Candidates for `raw`, labelled for display.
///
/// Short input returns nothing without touching the network, and a failed
/// request just clears the list.
pub async fn suggest(geocoder: &dyn GeocodingApi, raw: &str) -> Vec<Suggestion> {
    let query = normalize(raw);
    if query.len() < MIN_SUGGEST_LEN {
        return Vec::new();
    }

    match geocoder.search(query.as_str(), MAX_CANDIDATES).await {
        Ok(candidates) => candidates
            .into_iter()
            .take(MAX_CANDIDATES)
            .map(Suggestion::from)
            .collect(),
        Err(e) => {
            tracing::warn!("Suggestion fetch failed: {}", e);
            Vec::new()
        }
    }
}

/// Identifies one suggestion request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionTicket(u64);

/// Discards suggestion results that were overtaken by newer input.
///
/// Requests are never cancelled. Take a ticket before each request and show
/// the result only if the ticket is still current when it completes.
#[derive(Debug, Default)]
pub struct SuggestionFeed {
    latest: AtomicU64,
}

impl SuggestionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> SuggestionTicket {
        SuggestionTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: SuggestionTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Returns `results` only when `ticket` is the newest request.
    pub fn accept(
        &self,
        ticket: SuggestionTicket,
        results: Vec<Suggestion>,
    ) -> Option<Vec<Suggestion>> {
        if self.is_current(ticket) {
            Some(results)
        } else {
            tracing::debug!("Dropping stale suggestions for ticket {:?}", ticket);
            None
        }
    }
}
