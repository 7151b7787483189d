use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::ReelmetaError;
use crate::models::{EnrichedMovie, Rating};
use crate::normalize;

const SCHEMA_V1: &str = include_str!("../../../migrations/001_initial.sql");

/// SQLite-backed sink for the enriched catalog.
pub struct Storage {
    conn: Connection,
}

/// A row of the `movies` table, cleaned for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRow {
    pub movie_id: i64,
    pub title: String,
    pub release_year: Option<i32>,
    pub imdb_id: Option<String>,
    pub director: String,
    pub plot: String,
    pub box_office_dollars: Option<i64>,
    pub runtime_mins: Option<i64>,
    pub imdb_rating: Option<f64>,
}

impl MovieRow {
    /// Flatten a merged entry, cleaning the title, box office and runtime.
    pub fn from_enriched(movie: &EnrichedMovie) -> Self {
        let e = &movie.enrichment;
        Self {
            movie_id: movie.entry.id,
            title: normalize::canonical_title(&movie.entry.raw_title),
            release_year: movie.release_year,
            imdb_id: e.imdb_id.clone(),
            director: e.director.clone(),
            plot: e.plot.clone(),
            box_office_dollars: e.box_office.as_deref().and_then(clean_box_office),
            runtime_mins: e.runtime.as_deref().and_then(clean_runtime),
            imdb_rating: e.imdb_rating,
        }
    }
}

/// Outcome of the append-once ratings load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingsLoad {
    Loaded(usize),
    /// The table already held rows; nothing was appended.
    Skipped { existing: i64 },
}

/// Counts written by [`Storage::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub movies: usize,
    pub genres: usize,
    pub links: usize,
    pub ratings: RatingsLoad,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TableStats {
    pub movies: i64,
    pub genres: i64,
    pub movie_genres: i64,
    pub ratings: i64,
    /// Movies that received an IMDb id from the lookup service.
    pub enriched: i64,
}

/// Result of one statement in [`Storage::run_script`].
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Executed {
        changed: usize,
    },
}

impl Storage {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, ReelmetaError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, ReelmetaError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    // ── Movies ──────────────────────────────────────────────────

    /// Insert or update a movie keyed by `movie_id`.
    pub fn upsert_movie(&self, movie: &MovieRow) -> Result<(), ReelmetaError> {
        upsert_movie(&self.conn, movie)
    }

    pub fn get_movie(&self, movie_id: i64) -> Result<Option<MovieRow>, ReelmetaError> {
        self.conn
            .query_row(
                "SELECT movie_id, title, release_year, imdb_id, director, plot,
                 box_office_dollars, runtime_mins, imdb_rating
                 FROM movies WHERE movie_id = ?1",
                params![movie_id],
                |row| {
                    Ok(MovieRow {
                        movie_id: row.get(0)?,
                        title: row.get(1)?,
                        release_year: row.get(2)?,
                        imdb_id: row.get(3)?,
                        director: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                        plot: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                        box_office_dollars: row.get(6)?,
                        runtime_mins: row.get(7)?,
                        imdb_rating: row.get(8)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    // ── Genres ──────────────────────────────────────────────────

    /// Insert a genre name if new; returns its id either way.
    pub fn insert_genre(&self, name: &str) -> Result<i64, ReelmetaError> {
        insert_genre(&self.conn, name)
    }

    /// Link a movie to a genre. Returns `false` if the link already existed.
    pub fn link_movie_genre(&self, movie_id: i64, genre_id: i64) -> Result<bool, ReelmetaError> {
        link_movie_genre(&self.conn, movie_id, genre_id)
    }

    /// Genre names linked to a movie, alphabetically.
    pub fn genres_for_movie(&self, movie_id: i64) -> Result<Vec<String>, ReelmetaError> {
        let mut stmt = self.conn.prepare(
            "SELECT g.genre_name FROM movie_genres mg
             JOIN genres g ON g.genre_id = mg.genre_id
             WHERE mg.movie_id = ?1 ORDER BY g.genre_name",
        )?;
        let rows = stmt
            .query_map(params![movie_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    // ── Ratings ─────────────────────────────────────────────────

    pub fn ratings_count(&self) -> Result<i64, ReelmetaError> {
        count_rows(&self.conn, "ratings")
    }

    /// Append ratings only if the table is empty.
    pub fn load_ratings_once(&self, ratings: &[Rating]) -> Result<RatingsLoad, ReelmetaError> {
        let tx = self.conn.unchecked_transaction()?;
        let outcome = load_ratings_once(&tx, ratings)?;
        tx.commit()?;
        Ok(outcome)
    }

    // ── Bulk load ───────────────────────────────────────────────

    /// Write movies, genres, movie-genre links and ratings in one transaction.
    ///
    /// Everything is rolled back if any write fails.
    pub fn load(
        &self,
        movies: &[EnrichedMovie],
        ratings: &[Rating],
    ) -> Result<LoadSummary, ReelmetaError> {
        let tx = self.conn.unchecked_transaction()?;

        for movie in movies {
            upsert_movie(&tx, &MovieRow::from_enriched(movie))?;
        }
        tracing::info!(count = movies.len(), "Loaded movies");

        let mut genre_names = std::collections::BTreeSet::new();
        let mut links = 0;
        for movie in movies {
            for genre in movie.genres() {
                let genre_id = insert_genre(&tx, &genre.genre_name)?;
                link_movie_genre(&tx, genre.movie_id, genre_id)?;
                genre_names.insert(genre.genre_name);
                links += 1;
            }
        }
        tracing::info!(genres = genre_names.len(), links, "Loaded genres");

        let ratings = load_ratings_once(&tx, ratings)?;
        tx.commit()?;

        Ok(LoadSummary {
            movies: movies.len(),
            genres: genre_names.len(),
            links,
            ratings,
        })
    }

    // ── Reporting ───────────────────────────────────────────────

    pub fn stats(&self) -> Result<TableStats, ReelmetaError> {
        let enriched = self.conn.query_row(
            "SELECT COUNT(*) FROM movies WHERE imdb_id IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(TableStats {
            movies: count_rows(&self.conn, "movies")?,
            genres: count_rows(&self.conn, "genres")?,
            movie_genres: count_rows(&self.conn, "movie_genres")?,
            ratings: count_rows(&self.conn, "ratings")?,
            enriched,
        })
    }

    /// Run `;`-separated statements. A failing statement reports its error
    /// and the remaining statements still run.
    pub fn run_script(&self, sql: &str) -> Vec<Result<StatementResult, String>> {
        sql.split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|stmt| run_statement(&self.conn, stmt).map_err(|e| e.to_string()))
            .collect()
    }
}

// ── Statements shared by direct calls and transactions ──────────

fn upsert_movie(conn: &Connection, movie: &MovieRow) -> Result<(), ReelmetaError> {
    conn.execute(
        "INSERT INTO movies (movie_id, title, release_year, imdb_id, director, plot,
         box_office_dollars, runtime_mins, imdb_rating)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(movie_id) DO UPDATE SET
            title = excluded.title,
            release_year = excluded.release_year,
            imdb_id = excluded.imdb_id,
            director = excluded.director,
            plot = excluded.plot,
            box_office_dollars = excluded.box_office_dollars,
            runtime_mins = excluded.runtime_mins,
            imdb_rating = excluded.imdb_rating",
        params![
            movie.movie_id,
            movie.title,
            movie.release_year,
            movie.imdb_id,
            movie.director,
            movie.plot,
            movie.box_office_dollars,
            movie.runtime_mins,
            movie.imdb_rating,
        ],
    )?;
    Ok(())
}

fn insert_genre(conn: &Connection, name: &str) -> Result<i64, ReelmetaError> {
    conn.execute(
        "INSERT OR IGNORE INTO genres (genre_name) VALUES (?1)",
        params![name],
    )?;
    let id = conn.query_row(
        "SELECT genre_id FROM genres WHERE genre_name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn link_movie_genre(conn: &Connection, movie_id: i64, genre_id: i64) -> Result<bool, ReelmetaError> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO movie_genres (movie_id, genre_id) VALUES (?1, ?2)",
        params![movie_id, genre_id],
    )?;
    Ok(changed > 0)
}

fn load_ratings_once(conn: &Connection, ratings: &[Rating]) -> Result<RatingsLoad, ReelmetaError> {
    let existing = count_rows(conn, "ratings")?;
    if existing > 0 {
        tracing::warn!(existing, "Ratings already present, skipping append");
        return Ok(RatingsLoad::Skipped { existing });
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO ratings (user_id, movie_id, rating, timestamp) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for r in ratings {
        stmt.execute(params![r.user_id, r.movie_id, r.rating, r.timestamp])?;
    }
    tracing::info!(count = ratings.len(), "Loaded ratings");
    Ok(RatingsLoad::Loaded(ratings.len()))
}

/// `table` is always one of our own table names, never user input.
fn count_rows(conn: &Connection, table: &str) -> Result<i64, ReelmetaError> {
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count)
}

fn run_statement(conn: &Connection, sql: &str) -> Result<StatementResult, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    if stmt.column_count() == 0 {
        let changed = stmt.execute([])?;
        return Ok(StatementResult::Executed { changed });
    }

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();
    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(display_value(row.get_ref(i)?));
        }
        rows.push(values);
    }
    Ok(StatementResult::Rows { columns, rows })
}

fn display_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn run_migrations(conn: &Connection) -> Result<(), ReelmetaError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

/// `"$172,076,928"` → `172076928`; anything unparsable (e.g. `"N/A"`) → `None`.
pub fn clean_box_office(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    digits.trim().parse().ok()
}

/// `"136 min"` → `136`; anything unparsable → `None`.
pub fn clean_runtime(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let number = raw
        .strip_suffix("mins")
        .or_else(|| raw.strip_suffix("min"))
        .unwrap_or(raw);
    number.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogEntry, EnrichmentRecord};

    fn entry(id: i64, title: &str, genres: &str) -> CatalogEntry {
        CatalogEntry {
            id,
            raw_title: title.into(),
            genres: Some(genres.into()),
        }
    }

    fn enriched_toy_story() -> EnrichedMovie {
        EnrichedMovie::new(
            entry(1, "Toy Story (1995)", "Adventure|Animation|Comedy"),
            EnrichmentRecord {
                imdb_id: Some("tt0114709".into()),
                plot: "A cowboy doll is profoundly threatened...".into(),
                director: "John Lasseter".into(),
                box_office: Some("$223,225,679".into()),
                runtime: Some("81 min".into()),
                imdb_rating: Some(8.3),
            },
        )
    }

    fn rating(user_id: i64, movie_id: i64) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: 4.0,
            timestamp: 964982703,
        }
    }

    #[test]
    fn test_movie_row_cleaning() {
        let row = MovieRow::from_enriched(&enriched_toy_story());
        assert_eq!(row.title, "Toy Story");
        assert_eq!(row.release_year, Some(1995));
        assert_eq!(row.box_office_dollars, Some(223225679));
        assert_eq!(row.runtime_mins, Some(81));
    }

    #[test]
    fn test_upsert_and_get_movie() {
        let db = Storage::open_memory().unwrap();
        let row = MovieRow::from_enriched(&enriched_toy_story());
        db.upsert_movie(&row).unwrap();

        let fetched = db.get_movie(1).unwrap().unwrap();
        assert_eq!(fetched, row);
        assert!(db.get_movie(2).unwrap().is_none());
    }

    #[test]
    fn test_upsert_default_record_is_idempotent() {
        let db = Storage::open_memory().unwrap();
        let movie = EnrichedMovie::new(
            entry(5, "Matrix, The (1999)", "Action"),
            EnrichmentRecord::default(),
        );
        let row = MovieRow::from_enriched(&movie);

        db.upsert_movie(&row).unwrap();
        let first = db.get_movie(5).unwrap();
        db.upsert_movie(&row).unwrap();
        let second = db.get_movie(5).unwrap();

        assert_eq!(first, second);
        assert_eq!(db.stats().unwrap().movies, 1);
        let stored = second.unwrap();
        assert_eq!(stored.title, "The Matrix");
        assert_eq!(stored.plot, "Not Available");
        assert_eq!(stored.director, "Unknown");
        assert_eq!(stored.imdb_id, None);
    }

    #[test]
    fn test_upsert_overwrites_fields() {
        let db = Storage::open_memory().unwrap();
        let mut row = MovieRow::from_enriched(&enriched_toy_story());
        db.upsert_movie(&row).unwrap();
        row.director = "Someone Else".into();
        db.upsert_movie(&row).unwrap();
        assert_eq!(db.get_movie(1).unwrap().unwrap().director, "Someone Else");
    }

    #[test]
    fn test_genres_are_deduplicated() {
        let db = Storage::open_memory().unwrap();
        db.upsert_movie(&MovieRow::from_enriched(&enriched_toy_story())).unwrap();

        let a = db.insert_genre("Comedy").unwrap();
        let b = db.insert_genre("Comedy").unwrap();
        assert_eq!(a, b);

        assert!(db.link_movie_genre(1, a).unwrap());
        assert!(!db.link_movie_genre(1, a).unwrap());
        assert_eq!(db.genres_for_movie(1).unwrap(), vec!["Comedy"]);
    }

    #[test]
    fn test_ratings_load_is_append_once() {
        let db = Storage::open_memory().unwrap();
        let ratings = vec![rating(1, 1), rating(2, 1)];

        assert_eq!(db.load_ratings_once(&ratings).unwrap(), RatingsLoad::Loaded(2));
        assert_eq!(
            db.load_ratings_once(&ratings).unwrap(),
            RatingsLoad::Skipped { existing: 2 }
        );
        assert_eq!(db.ratings_count().unwrap(), 2);
    }

    #[test]
    fn test_bulk_load_and_stats() {
        let db = Storage::open_memory().unwrap();
        let movies = vec![
            enriched_toy_story(),
            EnrichedMovie::new(
                entry(2, "Jumanji (1995)", "Adventure|Children|Fantasy"),
                EnrichmentRecord::default(),
            ),
        ];
        let summary = db.load(&movies, &[rating(1, 1)]).unwrap();

        assert_eq!(summary.movies, 2);
        assert_eq!(summary.genres, 5);
        assert_eq!(summary.links, 6);
        assert_eq!(summary.ratings, RatingsLoad::Loaded(1));

        let stats = db.stats().unwrap();
        assert_eq!(
            stats,
            TableStats {
                movies: 2,
                genres: 5,
                movie_genres: 6,
                ratings: 1,
                enriched: 1,
            }
        );

        // Reloading changes nothing.
        let again = db.load(&movies, &[rating(1, 1)]).unwrap();
        assert_eq!(again.ratings, RatingsLoad::Skipped { existing: 1 });
        assert_eq!(db.stats().unwrap(), stats);
    }

    #[test]
    fn test_run_script() {
        let db = Storage::open_memory().unwrap();
        db.upsert_movie(&MovieRow::from_enriched(&enriched_toy_story())).unwrap();

        let results = db.run_script(
            "SELECT title, imdb_rating, box_office_dollars FROM movies;
             SELECT * FROM no_such_table;
             UPDATE movies SET plot = NULL WHERE movie_id = 1;",
        );
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0],
            Ok(StatementResult::Rows {
                columns: vec!["title".into(), "imdb_rating".into(), "box_office_dollars".into()],
                rows: vec![vec!["Toy Story".into(), "8.3".into(), "223225679".into()]],
            })
        );
        assert!(results[1].is_err());
        assert_eq!(results[2], Ok(StatementResult::Executed { changed: 1 }));
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.db");
        {
            let db = Storage::open(&path).unwrap();
            db.insert_genre("Drama").unwrap();
        }
        let db = Storage::open(&path).unwrap();
        assert_eq!(db.stats().unwrap().genres, 1);
    }

    #[test]
    fn test_clean_box_office() {
        assert_eq!(clean_box_office("$172,076,928"), Some(172076928));
        assert_eq!(clean_box_office("N/A"), None);
        assert_eq!(clean_box_office(""), None);
    }

    #[test]
    fn test_clean_runtime() {
        assert_eq!(clean_runtime("136 min"), Some(136));
        assert_eq!(clean_runtime("90 mins"), Some(90));
        assert_eq!(clean_runtime("N/A"), None);
    }
}
