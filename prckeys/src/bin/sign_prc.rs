//! prc-sign - sign prc files with a key embedded in a generated signer source

use anyhow::{bail, Context, Result};
use clap::Parser;
use prckeys::signature;
use prckeys::table::load_private_key_source;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "prc-sign")]
#[command(author, version, about = "Sign prc files with a trust-level private key")]
struct Cli {
    /// Private key source written by make-prc-key
    #[arg(short, long, value_name = "PRIV_OUTFILE.cxx")]
    key: PathBuf,

    /// Pass phrase of an encrypted key (prompted for if omitted)
    #[arg(short, long)]
    pass_phrase: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// prc files to sign in place
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    prckeys::init_logging(cli.verbose);

    let source = load_private_key_source(&cli.key)
        .with_context(|| format!("failed to read {}", cli.key.display()))?;

    let pass_phrase = match cli.pass_phrase {
        Some(pp) => Some(Zeroizing::new(pp)),
        None if source.is_encrypted() => Some(Zeroizing::new(rpassword::prompt_password(
            format!("Enter pass phrase for key {}: ", source.key_number),
        )?)),
        None => None,
    };

    let key = signature::decode_private_key(
        &source.key_data,
        pass_phrase.as_deref().map(String::as_str),
    )
    .context("unable to decode the private key (wrong pass phrase?)")?;

    for file in &cli.files {
        let contents = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
        let payload = signature::normalize_payload(signature::strip_signature(&contents));
        if payload.is_empty() {
            bail!("{} is empty", file.display());
        }

        let sig = signature::sign(&key, &payload)?;
        fs::write(file, signature::append_signature(&payload, &sig))
            .with_context(|| format!("failed to write {}", file.display()))?;
        info!("Signed {} with key {}", file.display(), source.key_number);
    }

    Ok(())
}
