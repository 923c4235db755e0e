//! Writers for the public key table and the per-level signer sources

use crate::error::{KeyError, Result};
use crate::provider::AsymmetricKeyProvider;
use crate::registry::KeyRegistry;
use crate::serializer::encode_c_string;
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Shared signer implementation pulled in by every private key source.
pub const SIGNER_SOURCE: &str = "signPrcFile_src.cxx";

/// How a private key is stored inside its source file.
#[derive(Debug, Clone)]
pub enum KeyProtection {
    /// Cleartext PKCS#8.
    Plain,
    /// PKCS#8 encrypted under the given pass phrase.
    Encrypted(Zeroizing<String>),
}

/// Render the public key table for every slot of `registry`.
pub fn render_public_keys(registry: &KeyRegistry) -> String {
    let mut out = String::from(
        "\n\
         // This file was generated by make-prc-key.  It defines the public keys\n\
         // that will be used to validate signed prc files.\n\
         \n\
         #include \"prcKeyRegistry.h\"\n\
         \n",
    );

    for (i, record) in registry.keys() {
        encode_c_string(&mut out, "prc_pubkey", i, &record.public_key);
        out.push('\n');
    }

    let num_keys = registry.num_slots();
    let _ = writeln!(
        out,
        "static PrcKeyRegistry::KeyDef const prc_pubkeys[{}] = {{",
        num_keys
    );
    for (i, slot) in registry.slots() {
        match slot {
            Some(record) => {
                let _ = writeln!(
                    out,
                    "  {{ prc_pubkey{i}_data, prc_pubkey{i}_length, {} }},",
                    record.generated_time
                );
            }
            None => out.push_str("  { nullptr, 0, 0 },\n"),
        }
    }
    let _ = write!(
        out,
        "}};\nstatic const int num_prc_pubkeys = {};\n\n",
        num_keys
    );
    out
}

/// Rewrite the public key table at `path`.
pub fn write_public_keys(path: &Path, registry: &KeyRegistry) -> Result<()> {
    info!("Rewriting {}", path.display());
    write_source(path, &render_public_keys(registry), false)
}

/// PKCS#8 PEM for `key`, encrypted or not per `protection`.
pub fn encode_private_key<P: AsymmetricKeyProvider>(
    provider: &P,
    key: &P::Key,
    protection: &KeyProtection,
) -> Result<Zeroizing<Vec<u8>>> {
    let pem = match protection {
        KeyProtection::Plain => provider.export_private_plain(key)?,
        KeyProtection::Encrypted(pass_phrase) => {
            provider.export_private_encrypted(key, pass_phrase.as_str())?
        }
    };
    Ok(Zeroizing::new(pem))
}

/// Render a standalone signer program for key number `n`.
pub fn render_private_key(path: &Path, n: u32, key_pem: &[u8], generated_time: i64) -> String {
    let progname = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut out = format!(
        "\n\
         // This file was generated by make-prc-key.  It can be compiled against\n\
         // dtool to produce a program that will sign a prc file using key number {}.\n\n",
        n
    );
    encode_c_string(&mut out, "prc_privkey", n, key_pem);
    let _ = write!(
        out,
        "\n\n\
         #define KEY_NUMBER {n}\n\
         #define KEY_DATA prc_privkey{n}_data\n\
         #define KEY_LENGTH prc_privkey{n}_length\n\
         #define PROGNAME \"{progname}\"\n\
         #define GENERATED_TIME {generated_time}\n\n\
         #include \"{SIGNER_SOURCE}\"\n\n"
    );
    out
}

/// Write the signer source for key number `n` to `path`.
pub fn write_private_key(path: &Path, n: u32, key_pem: &[u8], generated_time: i64) -> Result<()> {
    info!("Rewriting {}", path.display());
    if !key_pem.starts_with(b"-----BEGIN ENCRYPTED") {
        warn!("Private key {} is not encrypted", n);
    }
    let source = Zeroizing::new(render_private_key(path, n, key_pem, generated_time));
    write_source(path, &source, true)
}

fn write_source(path: &Path, contents: &str, private: bool) -> Result<()> {
    let file = open_for_write(path, private).map_err(|source| KeyError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut out = BufWriter::new(file);
    out.write_all(contents.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|source| KeyError::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn open_for_write(path: &Path, private: bool) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if private {
        owner_only(&mut options);
    }
    options.open(path)
}

#[cfg(unix)]
fn owner_only(options: &mut OpenOptions) {
    options.mode(0o600);
}

#[cfg(not(unix))]
fn owner_only(_options: &mut OpenOptions) {}
