use serde::{Deserialize, Serialize};

use super::EnrichmentRecord;
use crate::normalize;

/// MovieLens marker for a movie without genres.
pub const NO_GENRES_PLACEHOLDER: &str = "(no genres listed)";

/// One movie row from the catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "movieId")]
    pub id: i64,
    #[serde(rename = "title")]
    pub raw_title: String,
    pub genres: Option<String>,
}

impl CatalogEntry {
    /// Year from the trailing `(YYYY)` annotation of the raw title.
    pub fn release_year(&self) -> Option<i32> {
        normalize::release_year(&self.raw_title)
    }

    /// Pipe-delimited genres, trimmed, without empties or the placeholder.
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres
            .as_deref()
            .map(|g| {
                g.split('|')
                    .map(str::trim)
                    .filter(|g| !g.is_empty() && *g != NO_GENRES_PLACEHOLDER)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A catalog entry merged with its enrichment record, ready for the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedMovie {
    pub entry: CatalogEntry,
    pub release_year: Option<i32>,
    pub enrichment: EnrichmentRecord,
}

impl EnrichedMovie {
    pub fn new(entry: CatalogEntry, enrichment: EnrichmentRecord) -> Self {
        let release_year = entry.release_year();
        Self {
            entry,
            release_year,
            enrichment,
        }
    }

    pub fn genres(&self) -> Vec<MovieGenre> {
        self.entry
            .genre_names()
            .into_iter()
            .map(|name| MovieGenre {
                movie_id: self.entry.id,
                genre_name: name.to_string(),
            })
            .collect()
    }
}

/// One movie-to-genre relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovieGenre {
    pub movie_id: i64,
    pub genre_name: String,
}

/// One user rating row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(genres: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            id: 1,
            raw_title: "Toy Story (1995)".into(),
            genres: genres.map(String::from),
        }
    }

    #[test]
    fn test_release_year() {
        assert_eq!(entry(None).release_year(), Some(1995));
    }

    #[test]
    fn test_genre_names() {
        let e = entry(Some("Adventure|Animation| Children ||Comedy"));
        assert_eq!(e.genre_names(), vec!["Adventure", "Animation", "Children", "Comedy"]);
    }

    #[test]
    fn test_no_genres_placeholder() {
        assert!(entry(Some("(no genres listed)")).genre_names().is_empty());
        assert!(entry(None).genre_names().is_empty());
    }

    #[test]
    fn test_enriched_movie_genres() {
        let movie = EnrichedMovie::new(entry(Some("Comedy|Drama")), EnrichmentRecord::default());
        assert_eq!(movie.release_year, Some(1995));
        let genres = movie.genres();
        assert_eq!(genres.len(), 2);
        assert_eq!(genres[1].genre_name, "Drama");
        assert!(genres.iter().all(|g| g.movie_id == 1));
    }
}
