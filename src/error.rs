use std::path::PathBuf;

use thiserror::Error;

/// Failures reaching the backing file. A missing key is never an error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be opened or read while loading.
    #[error("Cannot find the configuration file: `{}`", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be opened or written while persisting.
    #[error("Cannot write the configuration file: `{}`", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The diagnostic dump sink rejected a write.
    #[error("Cannot write the configuration dump")]
    Dump {
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
