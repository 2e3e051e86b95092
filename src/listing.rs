use tracing::debug;

use crate::error::FetchError;
use crate::tmdb::{MoviePage, MovieSummary};

/// Committed query mode. Derived from the committed search term, never from
/// in-progress keystrokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMode {
    Trending,
    Search(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListingPhase {
    Idle,
    Loading(u32),
    Loaded,
    Error(String),
}

/// Tag carried by every page fetch. A response is applied only if its tag
/// still matches the controller's current sequence and committed mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub seq: u64,
    pub mode: QueryMode,
    pub page: u32,
}

/// Whether an incoming response still matched controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Current,
    Stale,
}

/// Owns the paginated movie collection and the fetch-on-scroll protocol.
///
/// The controller never performs IO: it hands out `PageRequest`s and the
/// shell feeds responses back through `apply`. At most one page fetch is
/// outstanding at any time.
#[derive(Debug)]
pub struct ListingController {
    mode: QueryMode,
    phase: ListingPhase,
    movies: Vec<MovieSummary>,
    last_fetched_page: u32,
    total_pages: Option<u32>,
    next_seq: u64,
    in_flight: Option<u64>,
}

impl Default for ListingController {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingController {
    pub fn new() -> Self {
        Self {
            mode: QueryMode::Trending,
            phase: ListingPhase::Idle,
            movies: Vec::new(),
            last_fetched_page: 0,
            total_pages: None,
            next_seq: 0,
            in_flight: None,
        }
    }

    pub fn movies(&self) -> &[MovieSummary] {
        &self.movies
    }

    pub fn phase(&self) -> &ListingPhase {
        &self.phase
    }

    pub fn mode(&self) -> &QueryMode {
        &self.mode
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.mode, QueryMode::Search(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            ListingPhase::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// False exactly when the API reported total pages <= last fetched page.
    pub fn has_more(&self) -> bool {
        self.total_pages
            .map_or(true, |total| total > self.last_fetched_page)
    }

    /// First load on mount: `Idle -> Loading(1)`.
    pub fn start(&mut self) -> PageRequest {
        self.issue(1)
    }

    /// Commit a search term. An empty or whitespace-only term is a clear.
    /// Resets the page cursor to 1; any in-flight response becomes stale.
    pub fn submit_search(&mut self, term: &str) -> PageRequest {
        let term = term.trim();
        if term.is_empty() {
            return self.clear_search();
        }
        debug!(term, "search committed");
        self.mode = QueryMode::Search(term.to_string());
        self.issue(1)
    }

    /// Drop the committed term and go back to trending, from page 1.
    pub fn clear_search(&mut self) -> PageRequest {
        debug!("search cleared, reverting to trending");
        self.mode = QueryMode::Trending;
        self.issue(1)
    }

    /// Scroll-proximity signal. Issues the next page only when no fetch is
    /// in flight and more pages remain; triggers while `Loading` are ignored
    /// so at most one fetch is ever outstanding. Firing from `Error` retries
    /// the page that failed.
    pub fn request_next_page(&mut self) -> Option<PageRequest> {
        let settled = matches!(self.phase, ListingPhase::Loaded | ListingPhase::Error(_));
        if !settled || !self.has_more() {
            return None;
        }
        Some(self.issue(self.last_fetched_page + 1))
    }

    /// Feed a tagged response back. Out-of-date responses are discarded, not
    /// reordered: page-append order always matches request-issue order.
    pub fn apply(
        &mut self,
        req: &PageRequest,
        result: Result<MoviePage, FetchError>,
    ) -> ApplyOutcome {
        if self.in_flight != Some(req.seq) || req.mode != self.mode {
            debug!(seq = req.seq, page = req.page, "discarding stale page response");
            return ApplyOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                if req.page == 1 {
                    self.movies = page.results;
                } else {
                    self.movies.extend(page.results);
                }
                self.last_fetched_page = req.page;
                self.total_pages = Some(page.total_pages);
                self.phase = ListingPhase::Loaded;
            }
            Err(err) => {
                // Keep the partially loaded collection so the user does not
                // lose scroll progress.
                self.phase = ListingPhase::Error(err.to_string());
            }
        }
        ApplyOutcome::Current
    }

    fn issue(&mut self, page: u32) -> PageRequest {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.in_flight = Some(seq);
        self.phase = ListingPhase::Loading(page);
        if page == 1 {
            self.last_fetched_page = 0;
            self.total_pages = None;
        }
        PageRequest {
            seq,
            mode: self.mode.clone(),
            page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: u64, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            poster_path: None,
            release_date: None,
            vote_average: Some(7.0),
        }
    }

    fn page(movies: Vec<MovieSummary>, total_pages: u32) -> MoviePage {
        MoviePage {
            results: movies,
            total_pages,
        }
    }

    fn failure() -> FetchError {
        FetchError::Upstream {
            op: crate::error::FetchOp::Trending,
            status: reqwest::StatusCode::BAD_GATEWAY,
        }
    }

    #[test]
    fn first_page_replaces_later_pages_append() {
        let mut listing = ListingController::new();
        let r1 = listing.start();
        assert_eq!(listing.phase(), &ListingPhase::Loading(1));

        listing.apply(&r1, Ok(page(vec![movie(1, "a"), movie(2, "b")], 3)));
        assert_eq!(listing.movies().len(), 2);

        let r2 = listing.request_next_page().unwrap();
        assert_eq!(r2.page, 2);
        listing.apply(&r2, Ok(page(vec![movie(3, "c")], 3)));

        let titles: Vec<_> = listing.movies().iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicate_ids_across_pages_are_preserved() {
        let mut listing = ListingController::new();
        let r1 = listing.start();
        listing.apply(&r1, Ok(page(vec![movie(1, "a"), movie(2, "b")], 2)));

        // Upstream repeats id 2 on the next page; no implicit de-duplication.
        let r2 = listing.request_next_page().unwrap();
        listing.apply(&r2, Ok(page(vec![movie(2, "b"), movie(4, "d")], 2)));

        let ids: Vec<_> = listing.movies().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 2, 4]);
    }

    #[test]
    fn concatenation_order_matches_issue_order_despite_reordered_arrival() {
        let mut listing = ListingController::new();
        let r1 = listing.start();
        listing.apply(&r1, Ok(page(vec![movie(1, "a")], 5)));

        // Page 2 issued, but before it lands a new search is committed.
        let r2 = listing.request_next_page().unwrap();
        let r3 = listing.submit_search("batman");

        // The old page-2 response arrives after the search was issued.
        assert_eq!(
            listing.apply(&r2, Ok(page(vec![movie(9, "late")], 5))),
            ApplyOutcome::Stale
        );
        assert!(listing.movies().iter().all(|m| m.id != 9));

        listing.apply(&r3, Ok(page(vec![movie(7, "batman")], 1)));
        let ids: Vec<_> = listing.movies().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![7]);
    }

    #[test]
    fn submitting_search_resets_cursor_and_discards_trending_tagged_response() {
        let mut listing = ListingController::new();
        let r1 = listing.start();
        listing.apply(&r1, Ok(page(vec![movie(1, "trending")], 10)));
        let trending_r2 = listing.request_next_page().unwrap();
        assert_eq!(trending_r2.mode, QueryMode::Trending);

        let search_r = listing.submit_search("batman");
        assert_eq!(search_r.page, 1);
        assert_eq!(search_r.mode, QueryMode::Search("batman".to_string()));

        // Trending response arriving after the commit is dropped.
        assert_eq!(
            listing.apply(&trending_r2, Ok(page(vec![movie(2, "stale")], 10))),
            ApplyOutcome::Stale
        );
        assert!(listing.is_searching());
    }

    #[test]
    fn clearing_search_reverts_to_trending_from_page_one() {
        let mut listing = ListingController::new();
        let r1 = listing.submit_search("batman");
        listing.apply(&r1, Ok(page(vec![movie(1, "batman")], 4)));

        let r2 = listing.clear_search();
        assert_eq!(r2.page, 1);
        assert_eq!(r2.mode, QueryMode::Trending);
        assert!(!listing.is_searching());
    }

    #[test]
    fn whitespace_only_submit_is_a_clear() {
        let mut listing = ListingController::new();
        let r = listing.submit_search("   ");
        assert_eq!(r.mode, QueryMode::Trending);
    }

    #[test]
    fn has_more_false_exactly_when_total_pages_reached() {
        let mut listing = ListingController::new();
        let r1 = listing.start();
        listing.apply(&r1, Ok(page(vec![movie(1, "a")], 2)));
        assert!(listing.has_more());

        let r2 = listing.request_next_page().unwrap();
        listing.apply(&r2, Ok(page(vec![movie(2, "b")], 2)));
        assert!(!listing.has_more());

        // Scroll proximity with no more pages issues nothing.
        assert!(listing.request_next_page().is_none());
    }

    #[test]
    fn scroll_trigger_while_loading_is_ignored() {
        let mut listing = ListingController::new();
        let r1 = listing.start();
        listing.apply(&r1, Ok(page(vec![movie(1, "a")], 9)));

        let r2 = listing.request_next_page();
        assert!(r2.is_some());
        // Second trigger while the page-2 fetch is in flight.
        assert!(listing.request_next_page().is_none());
        assert!(listing.request_next_page().is_none());
    }

    #[test]
    fn mid_session_failure_preserves_collection_and_surfaces_error() {
        let mut listing = ListingController::new();
        let r1 = listing.start();
        listing.apply(&r1, Ok(page(vec![movie(1, "a"), movie(2, "b")], 5)));

        let r2 = listing.request_next_page().unwrap();
        listing.apply(&r2, Err(failure()));

        assert_eq!(listing.movies().len(), 2);
        assert!(listing.error_message().is_some());

        // Scrolling again retries the page that failed.
        let retry = listing.request_next_page().unwrap();
        assert_eq!(retry.page, 2);
        listing.apply(&retry, Ok(page(vec![movie(3, "c")], 5)));
        assert_eq!(listing.movies().len(), 3);
        assert!(listing.error_message().is_none());
    }

    #[test]
    fn error_state_recovers_on_next_submit() {
        let mut listing = ListingController::new();
        let r1 = listing.start();
        listing.apply(&r1, Err(failure()));
        assert!(listing.error_message().is_some());

        let r2 = listing.submit_search("batman");
        assert_eq!(listing.phase(), &ListingPhase::Loading(1));
        listing.apply(&r2, Ok(page(vec![movie(3, "c")], 1)));
        assert!(listing.error_message().is_none());
    }
}
