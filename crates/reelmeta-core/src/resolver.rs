//! Enrichment resolution against a [`LookupService`].
//!
//! Search order is candidate × year variant × attempt:
//!
//! - candidates are tried in priority order;
//! - for each candidate the year-constrained query goes first (when a year is
//!   known), then the unconstrained one;
//! - a transport/HTTP failure is retried up to the policy's attempt budget,
//!   after which the pair counts as "no match";
//! - a "not found" answer moves on at once without touching the budget;
//! - the first match ends the whole search.
//!
//! Resolution never fails: running out of candidates yields
//! [`EnrichmentRecord::default`].

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use reelmeta_api::{LookupOutcome, LookupQuery, LookupService, MovieDetails};

use crate::models::EnrichmentRecord;

/// Retry budget and request pacing for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per (candidate, year variant) pair, including the first.
    pub max_attempts: u32,
    /// Minimum gap between two consecutive lookup calls.
    pub request_delay: Duration,
    /// Extra pause after a failed call before it is retried.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            request_delay: Duration::from_millis(100),
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Whether a query carries the release year hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearVariant {
    Constrained(i32),
    Unconstrained,
}

impl YearVariant {
    /// Variants to try, in order, for an optional release year.
    pub fn sequence(year: Option<i32>) -> Vec<YearVariant> {
        match year {
            Some(y) => vec![Self::Constrained(y), Self::Unconstrained],
            None => vec![Self::Unconstrained],
        }
    }

    pub fn year(self) -> Option<i32> {
        match self {
            Self::Constrained(y) => Some(y),
            Self::Unconstrained => None,
        }
    }
}

impl std::fmt::Display for YearVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constrained(y) => write!(f, "{y}"),
            Self::Unconstrained => write!(f, "none"),
        }
    }
}

/// Terminal state of one (candidate, year variant) pair.
#[derive(Debug)]
enum PairOutcome {
    Authoritative(MovieDetails),
    NoMatch,
    RetriesExhausted,
}

/// The query that produced an authoritative answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedQuery {
    pub candidate: String,
    pub year_variant: YearVariant,
}

/// Resolver output with enough context to report how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub record: EnrichmentRecord,
    pub matched: Option<MatchedQuery>,
    /// Lookup calls issued, retries included.
    pub calls: u32,
}

/// Drives lookups for candidate lists.
pub struct Resolver<S> {
    service: S,
    policy: RetryPolicy,
    last_call: Mutex<Option<Instant>>,
}

impl<S: LookupService> Resolver<S> {
    pub fn new(service: S, policy: RetryPolicy) -> Self {
        Self {
            service,
            policy,
            last_call: Mutex::new(None),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Resolve one entry's candidates to an enrichment record.
    pub async fn resolve(&self, candidates: &[String], year: Option<i32>) -> EnrichmentRecord {
        self.resolve_with_trace(candidates, year).await.record
    }

    /// Like [`Resolver::resolve`], also reporting the winning query and call count.
    #[tracing::instrument(name = "resolve", skip(self, candidates), fields(candidate_count = candidates.len()))]
    pub async fn resolve_with_trace(&self, candidates: &[String], year: Option<i32>) -> Resolution {
        let mut calls = 0;

        for candidate in candidates {
            for variant in YearVariant::sequence(year) {
                match self.resolve_pair(candidate, variant, &mut calls).await {
                    PairOutcome::Authoritative(details) => {
                        info!(candidate = %candidate, year = %variant, "Lookup match");
                        return Resolution {
                            record: EnrichmentRecord::from_details(details),
                            matched: Some(MatchedQuery {
                                candidate: candidate.clone(),
                                year_variant: variant,
                            }),
                            calls,
                        };
                    }
                    PairOutcome::NoMatch => {
                        debug!(candidate = %candidate, year = %variant, "No match");
                    }
                    PairOutcome::RetriesExhausted => {
                        debug!(candidate = %candidate, year = %variant, "Giving up on query");
                    }
                }
            }
        }

        let preview: Vec<&str> = candidates.iter().take(3).map(String::as_str).collect();
        warn!(candidates = ?preview, calls, "No lookup match for any candidate");
        Resolution {
            record: EnrichmentRecord::default(),
            matched: None,
            calls,
        }
    }

    async fn resolve_pair(
        &self,
        candidate: &str,
        variant: YearVariant,
        calls: &mut u32,
    ) -> PairOutcome {
        let query = LookupQuery::movie(candidate, variant.year());
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            self.throttle().await;
            *calls += 1;

            match self.service.lookup(&query).await {
                Ok(LookupOutcome::Matched(details)) => return PairOutcome::Authoritative(details),
                Ok(LookupOutcome::NotFound) => return PairOutcome::NoMatch,
                Err(e) => {
                    warn!(candidate, attempt, error = %e, "Lookup request failed");
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        PairOutcome::RetriesExhausted
    }

    /// Wait until at least `request_delay` has passed since the previous call.
    async fn throttle(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.policy.request_delay {
                tokio::time::sleep(self.policy.request_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
