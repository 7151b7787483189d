//! Catalog source: MovieLens-style `movies.csv` and `ratings.csv` readers.

use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ReelmetaError;
use crate::models::{CatalogEntry, Rating};

/// Read catalog entries (`movieId,title,genres`) from a CSV file.
pub fn read_movies(path: &Path) -> Result<Vec<CatalogEntry>, ReelmetaError> {
    let file = std::fs::File::open(path)?;
    let movies = parse_rows(file, "movie")?;
    tracing::info!(path = %path.display(), count = movies.len(), "Loaded catalog entries");
    Ok(movies)
}

/// Read ratings (`userId,movieId,rating,timestamp`) from a CSV file.
pub fn read_ratings(path: &Path) -> Result<Vec<Rating>, ReelmetaError> {
    let file = std::fs::File::open(path)?;
    let ratings = parse_rows(file, "rating")?;
    tracing::info!(path = %path.display(), count = ratings.len(), "Loaded ratings");
    Ok(ratings)
}

/// Parse catalog entries from CSV content.
pub fn parse_movies(content: &str) -> Result<Vec<CatalogEntry>, ReelmetaError> {
    parse_rows(content.as_bytes(), "movie")
}

/// Parse ratings from CSV content.
pub fn parse_ratings(content: &str) -> Result<Vec<Rating>, ReelmetaError> {
    parse_rows(content.as_bytes(), "rating")
}

/// Deserialize every row, skipping (and logging) the ones that don't fit.
///
/// A missing or unreadable header row is an error.
fn parse_rows<T: DeserializeOwned, R: Read>(
    reader: R,
    kind: &'static str,
) -> Result<Vec<T>, ReelmetaError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    reader.headers()?;

    let mut rows = Vec::new();
    for (line, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!(kind, row = line + 1, error = %e, "Skipping malformed CSV row");
            }
        }
    }
    Ok(rows)
}
