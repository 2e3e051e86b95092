use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::FetchError;
use crate::listing::ApplyOutcome;
use crate::tmdb::{MoviePage, MovieSummary};

/// Quiescence interval before the in-progress input triggers a lookup.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Suggestions shown are the first matches of the first results page.
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub seq: u64,
    pub term: String,
}

#[derive(Debug)]
struct Pending {
    term: String,
    deadline: Instant,
}

/// Debounce + lookup for the autocomplete dropdown.
///
/// Every input change bumps a generation counter; the pending timer and any
/// in-flight request carry the generation they were issued under, and are
/// discarded when it no longer matches. Timing is injected (`now`) so tests
/// never sleep. Failures degrade silently to an empty list.
#[derive(Debug)]
pub struct SuggestionEngine {
    generation: u64,
    pending: Option<Pending>,
    suggestions: Vec<MovieSummary>,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self {
            generation: 0,
            pending: None,
            suggestions: Vec::new(),
        }
    }

    pub fn suggestions(&self) -> &[MovieSummary] {
        &self.suggestions
    }

    /// Raw keystroke update. Restarts the debounce timer; empty input clears
    /// the list synchronously without a network call and invalidates any
    /// in-flight lookup.
    pub fn on_input(&mut self, term: &str, now: Instant) {
        self.generation += 1;
        if term.trim().is_empty() {
            self.pending = None;
            self.suggestions.clear();
            return;
        }
        self.pending = Some(Pending {
            term: term.trim().to_string(),
            deadline: now + DEBOUNCE,
        });
    }

    /// Fires the pending lookup once its deadline has passed. Only the most
    /// recent timer ever reaches this point; earlier ones were overwritten.
    pub fn poll(&mut self, now: Instant) -> Option<SuggestionRequest> {
        if self.pending.as_ref()?.deadline > now {
            return None;
        }
        let pending = self.pending.take()?;
        debug!(term = %pending.term, "suggestion lookup due");
        Some(SuggestionRequest {
            seq: self.generation,
            term: pending.term,
        })
    }

    /// Feed a lookup result back. A response issued under an older
    /// generation is discarded; a failure empties the list and is never
    /// surfaced to the user.
    pub fn apply(
        &mut self,
        req: &SuggestionRequest,
        result: Result<MoviePage, FetchError>,
    ) -> ApplyOutcome {
        if req.seq != self.generation {
            debug!(seq = req.seq, "discarding stale suggestion response");
            return ApplyOutcome::Stale;
        }
        match result {
            Ok(page) => {
                self.suggestions = page.results;
                self.suggestions.truncate(MAX_SUGGESTIONS);
            }
            Err(err) => {
                debug!(error = %err, "suggestion fetch failed, degrading to empty list");
                self.suggestions.clear();
            }
        }
        ApplyOutcome::Current
    }

    /// Clear on blur, selection, or search commit.
    pub fn dismiss(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.suggestions.clear();
    }
}
