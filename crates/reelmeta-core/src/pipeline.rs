//! Extract → enrich → load orchestration.
//!
//! Entries are enriched strictly one after another in source order: the
//! lookup service's rate limit is global, so there is never more than one
//! request in flight.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use reelmeta_api::LookupService;

use crate::candidates::generate_candidates;
use crate::catalog;
use crate::error::ReelmetaError;
use crate::models::{CatalogEntry, EnrichedMovie};
use crate::resolver::Resolver;
use crate::storage::{LoadSummary, Storage};

/// Counts reported after a full run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Entries that received lookup data.
    pub enriched: usize,
    pub load: LoadSummary,
    pub elapsed: Duration,
}

/// Enriches catalog entries through a [`Resolver`] and hands them to storage.
pub struct Pipeline<S> {
    resolver: Resolver<S>,
    entry_delay: Duration,
}

impl<S: LookupService> Pipeline<S> {
    pub fn new(resolver: Resolver<S>, entry_delay: Duration) -> Self {
        Self {
            resolver,
            entry_delay,
        }
    }

    /// Enrich one entry. Always produces a record, falling back to the
    /// "not found" defaults.
    #[tracing::instrument(name = "enrich", skip(self, entry), fields(movie_id = entry.id))]
    pub async fn enrich_entry(&self, entry: CatalogEntry) -> EnrichedMovie {
        let candidates = generate_candidates(&entry.raw_title);
        debug!(raw_title = %entry.raw_title, ?candidates, "Generated candidates");
        let record = self
            .resolver
            .resolve(&candidates, entry.release_year())
            .await;
        EnrichedMovie::new(entry, record)
    }

    /// Enrich entries sequentially, pausing `entry_delay` between them.
    pub async fn enrich_catalog(&self, entries: Vec<CatalogEntry>) -> Vec<EnrichedMovie> {
        let total = entries.len();
        let mut enriched = Vec::with_capacity(total);

        for (i, entry) in entries.into_iter().enumerate() {
            if i > 0 && !self.entry_delay.is_zero() {
                tokio::time::sleep(self.entry_delay).await;
            }
            info!(movie_id = entry.id, progress = %format!("{}/{total}", i + 1), title = %entry.raw_title, "Processing");
            enriched.push(self.enrich_entry(entry).await);
        }

        let matched = enriched.iter().filter(|m| m.enrichment.is_enriched()).count();
        info!(total, matched, "Finished enriching catalog");
        enriched
    }

    /// Full run: read both CSV files, enrich movies, load everything.
    ///
    /// Both files are read before the first lookup, so a bad input path
    /// fails the run without spending any lookup quota.
    pub async fn run(
        &self,
        storage: &Storage,
        movies_csv: &Path,
        ratings_csv: &Path,
    ) -> Result<RunReport, ReelmetaError> {
        let start = std::time::Instant::now();

        let entries = catalog::read_movies(movies_csv)?;
        let ratings = catalog::read_ratings(ratings_csv)?;
        let movies = self.enrich_catalog(entries).await;
        let load = storage.load(&movies, &ratings)?;

        let report = RunReport {
            enriched: movies.iter().filter(|m| m.enrichment.is_enriched()).count(),
            load,
            elapsed: start.elapsed(),
        };
        info!(
            movies = report.load.movies,
            enriched = report.enriched,
            elapsed = ?report.elapsed,
            "Pipeline finished"
        );
        Ok(report)
    }
}
