//! Trait definitions for movie metadata lookup services.
//!
//! The enrichment resolver only talks to a [`LookupService`], so the OMDb
//! client can be swapped for a scripted mock in tests or for another
//! title-indexed catalog.

use std::future::Future;

/// A title-indexed movie metadata service.
pub trait LookupService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Look up a single title, optionally constrained to a release year.
    ///
    /// `Ok(LookupOutcome::NotFound)` means the service answered and has no
    /// such title. `Err` is reserved for transport and HTTP-layer failures.
    fn lookup(
        &self,
        query: &LookupQuery,
    ) -> impl Future<Output = Result<LookupOutcome, Self::Error>> + Send;
}

/// Kind of media to ask the service for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    Movie,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request sent to a lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub title: String,
    pub year: Option<i32>,
    pub media_type: MediaType,
}

impl LookupQuery {
    pub fn movie(title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            title: title.into(),
            year,
            media_type: MediaType::Movie,
        }
    }
}

/// Metadata returned for a matched title. Fields are raw upstream strings;
/// interpreting sentinels such as `"N/A"` is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MovieDetails {
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub plot: Option<String>,
    pub director: Option<String>,
    pub box_office: Option<String>,
    pub runtime: Option<String>,
    pub imdb_rating: Option<String>,
}

/// Answer from a lookup service that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// The service confirmed a specific title.
    Matched(MovieDetails),
    /// The service is reachable but has no such title.
    NotFound,
}
