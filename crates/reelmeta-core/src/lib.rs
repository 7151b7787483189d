pub mod candidates;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod resolver;
pub mod storage;

pub use candidates::generate_candidates;
pub use error::ReelmetaError;
pub use pipeline::{Pipeline, RunReport};
pub use resolver::{Resolution, Resolver, RetryPolicy, YearVariant};
pub use storage::Storage;
