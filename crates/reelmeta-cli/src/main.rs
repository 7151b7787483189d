//! reelmeta CLI
//!
//! Enriches a MovieLens-style catalog with OMDb metadata and loads it into SQLite.

mod error;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reelmeta_api::OmdbClient;
use reelmeta_core::config::AppConfig;
use reelmeta_core::normalize;
use reelmeta_core::storage::{RatingsLoad, StatementResult};
use reelmeta_core::{generate_candidates, Pipeline, Resolver, Storage};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "reelmeta")]
#[command(about = "Enrich a movie catalog with OMDb metadata", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config file, if any)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// OMDb API key (overrides config and OMDB_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// SQLite database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log lookups and candidates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, enrich and load the whole catalog
    Run {
        /// Movies CSV (movieId,title,genres)
        #[arg(long)]
        movies: Option<PathBuf>,

        /// Ratings CSV (userId,movieId,rating,timestamp)
        #[arg(long)]
        ratings: Option<PathBuf>,
    },

    /// Show the lookup candidates generated for a raw title
    Candidates {
        /// Raw catalog title, e.g. "Matrix, The (1999)"
        title: String,
    },

    /// Resolve a single raw title against the lookup service
    Lookup {
        /// Raw catalog title, e.g. "Matrix, The (1999)"
        title: String,
    },

    /// Show table row counts
    Stats,

    /// Run a SQL script against the database and print the results
    Query {
        /// File of `;`-separated SQL statements
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_directive = if cli.verbose { "reelmeta=debug" } else { "reelmeta=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(key) = cli.api_key {
        config.lookup.api_key = key;
    }
    if let Some(db) = cli.db {
        config.paths.database = db;
    }
    tracing::debug!(
        database = %config.paths.database.display(),
        base_url = %config.lookup.base_url,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Run { movies, ratings } => {
            let movies = movies.unwrap_or_else(|| config.paths.movies_csv.clone());
            let ratings = ratings.unwrap_or_else(|| config.paths.ratings_csv.clone());
            cmd_run(&config, &movies, &ratings).await
        }
        Commands::Candidates { title } => {
            cmd_candidates(&title);
            Ok(())
        }
        Commands::Lookup { title } => cmd_lookup(&config, &title).await,
        Commands::Stats => cmd_stats(&config),
        Commands::Query { file } => cmd_query(&config, &file),
    }
}

fn build_resolver(config: &AppConfig) -> Result<Resolver<OmdbClient>, CliError> {
    let client = OmdbClient::new(
        &config.lookup.base_url,
        config.lookup.api_key.clone(),
        config.lookup.timeout(),
    )?;
    Ok(Resolver::new(client, config.lookup.retry_policy()))
}

async fn cmd_run(config: &AppConfig, movies: &Path, ratings: &Path) -> Result<(), CliError> {
    let pipeline = Pipeline::new(build_resolver(config)?, config.lookup.entry_delay());
    let storage = Storage::open(&config.paths.database)?;
    let report = pipeline.run(&storage, movies, ratings).await?;

    println!("Movies loaded:      {}", report.load.movies);
    println!("Enriched from OMDb: {}", report.enriched);
    println!("Unique genres:      {}", report.load.genres);
    println!("Movie-genre links:  {}", report.load.links);
    match report.load.ratings {
        RatingsLoad::Loaded(n) => println!("Ratings loaded:     {n}"),
        RatingsLoad::Skipped { existing } => {
            println!("Ratings skipped:    table already holds {existing} rows")
        }
    }
    println!("Completed in {:.1?}", report.elapsed);
    Ok(())
}

fn cmd_candidates(title: &str) {
    match normalize::release_year(title) {
        Some(year) => println!("Release year: {year}"),
        None => println!("Release year: none"),
    }
    let candidates = generate_candidates(title);
    if candidates.is_empty() {
        println!("No candidates (title is empty after cleaning)");
    }
    for (i, candidate) in candidates.iter().enumerate() {
        println!("{:>2}. {candidate}", i + 1);
    }
}

async fn cmd_lookup(config: &AppConfig, title: &str) -> Result<(), CliError> {
    let resolver = build_resolver(config)?;
    let candidates = generate_candidates(title);
    let resolution = resolver
        .resolve_with_trace(&candidates, normalize::release_year(title))
        .await;

    match &resolution.matched {
        Some(m) => println!(
            "Matched '{}' (year: {}) after {} call(s)",
            m.candidate, m.year_variant, resolution.calls
        ),
        None => println!("No match after {} call(s)", resolution.calls),
    }
    let r = &resolution.record;
    println!("IMDb id:    {}", r.imdb_id.as_deref().unwrap_or("-"));
    println!("Director:   {}", r.director);
    println!("Runtime:    {}", r.runtime.as_deref().unwrap_or("-"));
    println!("Box office: {}", r.box_office.as_deref().unwrap_or("-"));
    match r.imdb_rating {
        Some(rating) => println!("Rating:     {rating}"),
        None => println!("Rating:     -"),
    }
    println!("Plot:       {}", r.plot);
    Ok(())
}

fn cmd_stats(config: &AppConfig) -> Result<(), CliError> {
    let storage = Storage::open(&config.paths.database)?;
    let stats = storage.stats()?;
    println!("MOVIES: {}", stats.movies);
    println!("GENRES: {}", stats.genres);
    println!("MOVIE_GENRES: {}", stats.movie_genres);
    println!("RATINGS: {}", stats.ratings);
    println!("Movies enriched with OMDb data: {}", stats.enriched);
    Ok(())
}

fn cmd_query(config: &AppConfig, file: &Path) -> Result<(), CliError> {
    let sql = std::fs::read_to_string(file)?;
    let storage = Storage::open(&config.paths.database)?;

    for (i, result) in storage.run_script(&sql).into_iter().enumerate() {
        println!("\n=== Query {} ===", i + 1);
        match result {
            Ok(StatementResult::Rows { columns, rows }) => {
                println!("{}", columns.join("\t"));
                for row in rows {
                    println!("{}", row.join("\t"));
                }
            }
            Ok(StatementResult::Executed { changed }) => {
                println!("Executed ({changed} row(s) changed)");
            }
            Err(e) => println!("Error: {e}"),
        }
    }
    Ok(())
}
