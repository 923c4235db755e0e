//! Trust-level keys for signed prc configuration files.
//!
//! `make-prc-key` generates one RSA key pair per trust level. Each private
//! key goes into a standalone signer source, and every public key goes into
//! one table source that is compiled into the host library. The signing and
//! verification helpers here are the Rust side of that same contract.

pub mod command;
pub mod config;
pub mod emit;
pub mod error;
pub mod provider;
pub mod registry;
pub mod request;
pub mod serializer;
pub mod signature;
pub mod table;
pub mod template;

pub use command::{KeyGenerator, KeygenOptions, RunSummary};
pub use config::{KeygenConfig, PassPhrasePolicy};
pub use error::{KeyError, Result};
pub use provider::{AsymmetricKeyProvider, RsaKeyProvider};
pub use registry::{KeyRecord, KeyRegistry};

/// Install the stderr log subscriber used by all binaries.
pub fn init_logging(verbose: u8) {
    use tracing::Level;
    use tracing_subscriber::EnvFilter;

    let log_level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
