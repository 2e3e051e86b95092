use tracing::debug;

use crate::error::FetchError;
use crate::listing::ApplyOutcome;
use crate::tmdb::{self, CrewMember, MovieDetail};

/// Sentinel for fields the upstream credits cannot answer. A missing rating
/// also renders this, never "0.0".
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub seq: u64,
    pub id: u64,
}

#[derive(Debug, Clone)]
pub enum DetailPhase {
    Idle,
    Loading,
    Loaded(MovieView),
    Error(String),
}

/// Single-shot fetch per movie id, sequence-guarded like the listing
/// controller so a late response for a previous movie never lands.
#[derive(Debug)]
pub struct DetailController {
    current_id: Option<u64>,
    phase: DetailPhase,
    seq: u64,
}

impl Default for DetailController {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailController {
    pub fn new() -> Self {
        Self {
            current_id: None,
            phase: DetailPhase::Idle,
            seq: 0,
        }
    }

    pub fn phase(&self) -> &DetailPhase {
        &self.phase
    }

    pub fn view(&self) -> Option<&MovieView> {
        match &self.phase {
            DetailPhase::Loaded(view) => Some(view),
            _ => None,
        }
    }

    /// Fetch the given movie. Re-fetches when the id changes or the previous
    /// attempt failed; a repeat load of an already loaded (or loading) id
    /// issues nothing.
    pub fn load(&mut self, id: u64) -> Option<DetailRequest> {
        let settled = matches!(self.phase, DetailPhase::Loading | DetailPhase::Loaded(_));
        if self.current_id == Some(id) && settled {
            return None;
        }
        debug!(id, "loading movie detail");
        self.current_id = Some(id);
        self.seq += 1;
        self.phase = DetailPhase::Loading;
        Some(DetailRequest { seq: self.seq, id })
    }

    pub fn apply(
        &mut self,
        req: &DetailRequest,
        result: Result<MovieDetail, FetchError>,
    ) -> ApplyOutcome {
        if req.seq != self.seq {
            debug!(seq = req.seq, "discarding stale detail response");
            return ApplyOutcome::Stale;
        }
        match result {
            Ok(detail) => self.phase = DetailPhase::Loaded(MovieView::from_detail(detail)),
            Err(err) => self.phase = DetailPhase::Error(err.to_string()),
        }
        ApplyOutcome::Current
    }

    /// Leaving the detail screen. The next `load` fetches fresh even for the
    /// same id.
    pub fn reset(&mut self) {
        self.current_id = None;
        self.phase = DetailPhase::Idle;
    }
}

/// A cast entry ready for presentation: name plus a resolved profile image
/// URL (placeholder when the member has none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastBubble {
    pub name: String,
    pub profile: String,
}

/// Display fields derived once from a fetched `MovieDetail`.
#[derive(Debug, Clone)]
pub struct MovieView {
    pub id: u64,
    pub title: String,
    pub overview: String,
    pub poster: String,
    pub release_date: String,
    pub runtime: Option<u32>,
    pub genres: String,
    pub rating: String,
    pub director: String,
    pub writers: String,
    pub trailer_url: Option<String>,
    pub cast: Vec<CastBubble>,
}

impl MovieView {
    pub fn from_detail(detail: MovieDetail) -> Self {
        let rating = format_rating(detail.vote_average);
        let director = director_of(&detail.credits.crew);
        let writers = writers_of(&detail.credits.crew);
        let trailer_url = detail
            .videos
            .results
            .first()
            .map(|video| format!("https://www.youtube.com/watch?v={}", video.key));
        let genres = detail
            .genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let cast = detail
            .credits
            .cast
            .iter()
            .take(10)
            .map(|member| CastBubble {
                name: member.name.clone(),
                profile: tmdb::profile_url(member.profile_path.as_deref()),
            })
            .collect();

        Self {
            id: detail.id,
            title: detail.title,
            overview: detail.overview.unwrap_or_default(),
            poster: tmdb::poster_url(detail.poster_path.as_deref()),
            release_date: detail.release_date.unwrap_or_default(),
            runtime: detail.runtime,
            genres,
            rating,
            director,
            writers,
            trailer_url,
            cast,
        }
    }

    pub fn has_trailer(&self) -> bool {
        self.trailer_url.is_some()
    }
}

/// Rating formatted to one decimal place; absent means unknown, not zero.
fn format_rating(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(v) => format!("{v:.1}"),
        None => UNKNOWN.to_string(),
    }
}

/// First crew entry whose job is "Director".
fn director_of(crew: &[CrewMember]) -> String {
    crew.iter()
        .find(|member| member.job == "Director")
        .map(|member| member.name.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Up to 3 distinct crew names from the Writing department, joined for
/// display.
fn writers_of(crew: &[CrewMember]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for member in crew {
        if member.department != "Writing" {
            continue;
        }
        if names.contains(&member.name.as_str()) {
            continue;
        }
        names.push(&member.name);
        if names.len() == 3 {
            break;
        }
    }
    if names.is_empty() {
        UNKNOWN.to_string()
    } else {
        names.join(", ")
    }
}
