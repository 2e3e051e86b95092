use std::fmt;

use thiserror::Error;

/// The operation a fetch was issued for, carried inside every `FetchError`
/// so failures can be attributed to the flow that caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOp {
    Trending,
    Search,
    Detail,
    Suggest,
}

impl fmt::Display for FetchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchOp::Trending => "trending",
            FetchOp::Search => "search",
            FetchOp::Detail => "movie detail",
            FetchOp::Suggest => "suggestion",
        };
        f.write_str(name)
    }
}

/// All the ways a metadata fetch can fail. The client does not distinguish
/// transient from permanent failures; callers own any retry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{op} request failed: {source}")]
    Network {
        op: FetchOp,
        #[source]
        source: reqwest::Error,
    },

    #[error("{op} request returned HTTP {status}")]
    Upstream {
        op: FetchOp,
        status: reqwest::StatusCode,
    },

    #[error("{op} response could not be decoded: {source}")]
    Malformed {
        op: FetchOp,
        #[source]
        source: serde_json::Error,
    },

    #[error("movie {id} not found")]
    NotFound { id: u64 },
}

impl FetchError {
    pub fn op(&self) -> FetchOp {
        match self {
            FetchError::Network { op, .. }
            | FetchError::Upstream { op, .. }
            | FetchError::Malformed { op, .. } => *op,
            FetchError::NotFound { .. } => FetchOp::Detail,
        }
    }
}
