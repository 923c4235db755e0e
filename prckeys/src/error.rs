//! Error types for prc key generation and signing

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeyError>;

#[derive(Error, Debug)]
pub enum KeyError {
    /// Malformed or missing command-line input.
    #[error("{0}")]
    Usage(String),

    #[error("Unable to open {} for writing.", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to read {}.", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write {}.", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error occurred in crypto routines: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl KeyError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl From<rsa::Error> for KeyError {
    fn from(err: rsa::Error) -> Self {
        KeyError::Crypto(err.to_string())
    }
}

impl From<pkcs8::Error> for KeyError {
    fn from(err: pkcs8::Error) -> Self {
        KeyError::Crypto(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for KeyError {
    fn from(err: pkcs8::spki::Error) -> Self {
        KeyError::Crypto(err.to_string())
    }
}

impl From<rsa::signature::Error> for KeyError {
    fn from(err: rsa::signature::Error) -> Self {
        KeyError::Crypto(err.to_string())
    }
}
