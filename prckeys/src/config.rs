//! Configuration management for make-prc-key

use crate::error::{KeyError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Public table location baked in by the build, if any.
pub const COMPILED_PUBLIC_KEYS_FILENAME: Option<&str> = option_env!("PRC_PUBLIC_KEYS_FILENAME");

/// What to do for a key whose pass phrase was never given, neither with
/// `-p` nor inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PassPhrasePolicy {
    /// Ask on the terminal, with confirmation.
    #[default]
    Prompt,
    /// Refuse to generate the key.
    Fail,
    /// Write the private key unencrypted.
    Plain,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeygenConfig {
    /// Public key table to rewrite when `-a` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_keys_file: Option<PathBuf>,

    /// RSA modulus size in bits
    pub key_bits: usize,

    /// RSA public exponent
    pub public_exponent: u64,

    /// Behaviour for keys without any pass phrase
    pub missing_pass_phrase: PassPhrasePolicy,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        KeygenConfig {
            public_keys_file: None,
            key_bits: 1024,
            public_exponent: 7,
            missing_pass_phrase: PassPhrasePolicy::Prompt,
        }
    }
}

impl KeygenConfig {
    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("prckeys").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("prckeys.toml"))
    }

    /// Load configuration from file, or fall back to defaults.
    ///
    /// An explicitly named file must exist; the default location is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match config_path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(KeyError::Config(format!(
                    "configuration file {} does not exist",
                    path.display()
                )));
            }
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        info!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(&path)?;
        let config: KeygenConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.key_bits < 512 {
            return Err(KeyError::Config(format!(
                "key_bits must be at least 512, got {}",
                self.key_bits
            )));
        }
        if self.public_exponent < 3 || self.public_exponent % 2 == 0 {
            return Err(KeyError::Config(format!(
                "public_exponent must be an odd number >= 3, got {}",
                self.public_exponent
            )));
        }
        Ok(())
    }

    /// The public table path used when none is given on the command line.
    pub fn default_public_keys_file(&self) -> Option<PathBuf> {
        self.public_keys_file
            .clone()
            .or_else(|| COMPILED_PUBLIC_KEYS_FILENAME.map(PathBuf::from))
    }
}
