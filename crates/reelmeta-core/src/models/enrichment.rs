use serde::{Deserialize, Serialize};

use reelmeta_api::MovieDetails;

/// Plot stored when the lookup service has none.
pub const UNKNOWN_PLOT: &str = "Not Available";
/// Director stored when the lookup service has none.
pub const UNKNOWN_DIRECTOR: &str = "Unknown";
/// Upstream marker for "no value" in rating fields.
const NOT_APPLICABLE: &str = "N/A";

/// External metadata resolved for one catalog entry.
///
/// Built once by the resolver; the default value is the "not found" record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub imdb_id: Option<String>,
    pub plot: String,
    pub director: String,
    pub box_office: Option<String>,
    pub runtime: Option<String>,
    pub imdb_rating: Option<f64>,
}

impl Default for EnrichmentRecord {
    fn default() -> Self {
        Self {
            imdb_id: None,
            plot: UNKNOWN_PLOT.to_string(),
            director: UNKNOWN_DIRECTOR.to_string(),
            box_office: None,
            runtime: None,
            imdb_rating: None,
        }
    }
}

impl EnrichmentRecord {
    /// Map an authoritative lookup response.
    ///
    /// Absent or empty plot/director fall back to the sentinels; the rating is
    /// parsed only when present and not `"N/A"`.
    pub fn from_details(details: MovieDetails) -> Self {
        Self {
            imdb_id: details.imdb_id,
            plot: non_empty(details.plot).unwrap_or_else(|| UNKNOWN_PLOT.to_string()),
            director: non_empty(details.director).unwrap_or_else(|| UNKNOWN_DIRECTOR.to_string()),
            box_office: details.box_office,
            runtime: details.runtime,
            imdb_rating: details.imdb_rating.as_deref().and_then(parse_rating),
        }
    }

    /// Whether this record carries data from the lookup service.
    pub fn is_enriched(&self) -> bool {
        self.imdb_id.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_rating(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw == NOT_APPLICABLE {
        return None;
    }
    raw.parse().ok()
}
