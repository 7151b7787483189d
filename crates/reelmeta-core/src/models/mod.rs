mod catalog;
mod enrichment;

pub use catalog::{CatalogEntry, EnrichedMovie, MovieGenre, Rating, NO_GENRES_PLACEHOLDER};
pub use enrichment::{EnrichmentRecord, UNKNOWN_DIRECTOR, UNKNOWN_PLOT};
