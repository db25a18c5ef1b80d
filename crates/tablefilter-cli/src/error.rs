use std::path::PathBuf;

use snafu::Snafu;
use tablefilter_core::PathFilterError;
use tablefilter_core::config::ConfigError;
use tablefilter_core::path::PathError;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Failed to load config from {}: {source}", path.display()))]
    LoadConfig { path: PathBuf, source: ConfigError },

    #[snafu(display("Storage root does not exist or is not a directory: {}", path.display()))]
    RootMissing { path: PathBuf },

    #[snafu(display("Invalid path '{input}': {source}"))]
    InvalidPath { input: String, source: PathError },

    #[snafu(display("--concurrency must be at least 1"))]
    ZeroConcurrency,

    #[snafu(display("{source}"))]
    Filter {
        #[snafu(source(from(PathFilterError, Box::new)))]
        source: Box<PathFilterError>,
    },
}
