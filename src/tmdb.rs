use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{FetchError, FetchOp};

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

const POSTER_PLACEHOLDER: &str = "https://via.placeholder.com/500x750?text=No+Image";
const PROFILE_PLACEHOLDER: &str = "https://via.placeholder.com/100x100?text=No+Image";

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: &str) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, TMDB_BASE_URL)
    }

    /// Overridable base URL so tests can point the client at a local server.
    pub fn with_base_url(api_key: &str, base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        op: FetchOp,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path);

        let mut params: Vec<(&str, String)> = vec![("api_key", self.api_key.clone())];
        params.extend(query.iter().cloned());

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|source| FetchError::Network { op, source })?;

        let status = response.status();
        if !status.is_success() {
            debug!(%op, %status, "upstream returned non-success");
            return Err(FetchError::Upstream { op, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Network { op, source })?;

        serde_json::from_str(&body).map_err(|source| FetchError::Malformed { op, source })
    }

    /// Globally trending movies for the current day, one page at a time.
    pub async fn list_trending(&self, page: u32) -> Result<MoviePage, FetchError> {
        debug!(page, "fetching trending movies");
        self.get_json(
            FetchOp::Trending,
            "trending/movie/day",
            &[("page", page.to_string())],
        )
        .await
    }

    /// Full-text movie search for a committed term.
    pub async fn search_movies(&self, term: &str, page: u32) -> Result<MoviePage, FetchError> {
        debug!(term, page, "searching movies");
        self.get_json(
            FetchOp::Search,
            "search/movie",
            &[("query", term.to_string()), ("page", page.to_string())],
        )
        .await
    }

    /// Lightweight autocomplete lookup: first search page for the raw,
    /// in-progress input. Same endpoint as `search_movies` but tagged as its
    /// own operation so failures are attributed to the suggestion flow.
    pub async fn suggest_movies(&self, term: &str) -> Result<MoviePage, FetchError> {
        debug!(term, "fetching suggestions");
        self.get_json(
            FetchOp::Suggest,
            "search/movie",
            &[("query", term.to_string()), ("page", "1".to_string())],
        )
        .await
    }

    /// Single movie with credits and videos embedded in one round trip.
    pub async fn movie_detail(&self, id: u64) -> Result<MovieDetail, FetchError> {
        debug!(id, "fetching movie detail");
        let path = format!("movie/{id}");
        let result = self
            .get_json(
                FetchOp::Detail,
                &path,
                &[("append_to_response", "credits,videos".to_string())],
            )
            .await;

        match result {
            Err(FetchError::Upstream { status, .. })
                if status == reqwest::StatusCode::NOT_FOUND =>
            {
                Err(FetchError::NotFound { id })
            }
            other => other,
        }
    }
}

/// Full-size poster URL, or the placeholder when the movie has none.
pub fn poster_url(path: Option<&str>) -> String {
    match path {
        Some(p) => format!("{TMDB_IMAGE_BASE}/w500{p}"),
        None => POSTER_PLACEHOLDER.to_string(),
    }
}

/// Cast profile image URL, or the placeholder.
pub fn profile_url(path: Option<&str>) -> String {
    match path {
        Some(p) => format!("{TMDB_IMAGE_BASE}/w185{p}"),
        None => PROFILE_PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    // Optional so a missing rating stays distinguishable from 0.0.
    #[serde(default)]
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoviePage {
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    #[serde(default = "default_total_pages")]
    pub total_pages: u32,
}

fn default_total_pages() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetail {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub videos: VideoList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrewMember {
    pub name: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub department: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub key: String,
}
