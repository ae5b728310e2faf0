pub mod client;
pub mod query;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TmdbError {
    /// Neither a v4 read token nor a v3 api key is configured.
    #[error("TMDB credentials missing: set TMDB_READ_TOKEN or TMDB_API_KEY")]
    Configuration,
    #[error("TMDB returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("parse JSON: {0}")]
    Decode(String),
}

pub use client::{TmdbAuth, TmdbClient};
pub use query::{DiscoverQuery, SearchQuery, TrendingQuery, strip_person_results};
