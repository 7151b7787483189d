use thiserror::Error;

use reelmeta_api::OmdbError;
use reelmeta_core::ReelmetaError;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Core(#[from] ReelmetaError),

    #[error("lookup client error: {0}")]
    Lookup(#[from] OmdbError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
