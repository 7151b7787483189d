use serde::Deserialize;

use crate::traits::{LookupOutcome, MovieDetails};

// ── OMDb response types ──────────────────────────────────────────

/// Body of an OMDb `?t=` lookup. Every field is optional because a
/// `"Response": "False"` body only carries `Response` and `Error`.
#[derive(Debug, Deserialize)]
pub struct OmdbResponse {
    #[serde(rename = "Response", default)]
    pub response: String,
    #[serde(rename = "Error")]
    pub error: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
    #[serde(rename = "Plot")]
    pub plot: Option<String>,
    #[serde(rename = "Director")]
    pub director: Option<String>,
    #[serde(rename = "BoxOffice")]
    pub box_office: Option<String>,
    #[serde(rename = "Runtime")]
    pub runtime: Option<String>,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
}

impl OmdbResponse {
    /// OMDb signals a match with the literal string `"True"`.
    pub fn is_match(&self) -> bool {
        self.response == "True"
    }

    pub fn into_outcome(self) -> LookupOutcome {
        if !self.is_match() {
            return LookupOutcome::NotFound;
        }
        LookupOutcome::Matched(MovieDetails {
            imdb_id: self.imdb_id,
            title: self.title,
            plot: self.plot,
            director: self.director,
            box_office: self.box_office,
            runtime: self.runtime,
            imdb_rating: self.imdb_rating,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matched_body() {
        let body = r#"{
            "Title": "The Matrix",
            "Year": "1999",
            "Runtime": "136 min",
            "Director": "Lana Wachowski, Lilly Wachowski",
            "Plot": "When a beautiful stranger leads computer hacker Neo...",
            "imdbRating": "8.7",
            "imdbID": "tt0133093",
            "Type": "movie",
            "BoxOffice": "$172,076,928",
            "Response": "True"
        }"#;
        let resp: OmdbResponse = serde_json::from_str(body).unwrap();
        match resp.into_outcome() {
            LookupOutcome::Matched(details) => {
                assert_eq!(details.imdb_id.as_deref(), Some("tt0133093"));
                assert_eq!(details.runtime.as_deref(), Some("136 min"));
                assert_eq!(details.box_office.as_deref(), Some("$172,076,928"));
                assert_eq!(details.imdb_rating.as_deref(), Some("8.7"));
            }
            other => panic!("Expected Matched, got {other:?}"),
        }
    }

    #[test]
    fn test_not_found_body() {
        let body = r#"{"Response":"False","Error":"Movie not found!"}"#;
        let resp: OmdbResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.error.as_deref(), Some("Movie not found!"));
        assert_eq!(resp.into_outcome(), LookupOutcome::NotFound);
    }

    #[test]
    fn test_response_flag_is_case_sensitive() {
        let body = r#"{"Response":"true","imdbID":"tt0000001"}"#;
        let resp: OmdbResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.is_match());
    }

    #[test]
    fn test_missing_optional_fields() {
        let body = r#"{"Response":"True","imdbID":"tt0114709"}"#;
        let resp: OmdbResponse = serde_json::from_str(body).unwrap();
        match resp.into_outcome() {
            LookupOutcome::Matched(details) => {
                assert!(details.plot.is_none());
                assert!(details.director.is_none());
                assert!(details.box_office.is_none());
            }
            other => panic!("Expected Matched, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_response_flag_is_not_found() {
        let body = r#"{"Title":"Heat","imdbID":"tt0113277"}"#;
        let resp: OmdbResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.into_outcome(), LookupOutcome::NotFound);
    }
}
