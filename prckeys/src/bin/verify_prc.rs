//! prc-verify - check signed prc files against a public key table

use anyhow::{Context, Result};
use clap::Parser;
use prckeys::signature;
use prckeys::table::load_public_table;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "prc-verify")]
#[command(author, version, about = "Verify the trust level of signed prc files")]
struct Cli {
    /// Public key table written by make-prc-key
    #[arg(short = 'a', long, value_name = "PUB_OUTFILE.cxx")]
    public_keys: PathBuf,

    /// Require this exact trust level instead of reporting whichever matches
    #[arg(short, long)]
    level: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Signed prc files
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    prckeys::init_logging(cli.verbose);

    let registry = load_public_table(&cli.public_keys)
        .with_context(|| format!("failed to read {}", cli.public_keys.display()))?;

    let mut all_trusted = true;
    for file in &cli.files {
        let contents = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;

        let Some((payload, sig)) = signature::split_signed(&contents) else {
            println!("{}: unsigned", file.display());
            all_trusted = false;
            continue;
        };

        let level = match cli.level {
            Some(n) => signature::verify(&registry, n, payload, &sig).then_some(n),
            None => signature::trust_level(&registry, payload, &sig),
        };

        match level {
            Some(n) => println!("{}: trust level {}", file.display(), n),
            None => {
                println!("{}: signature not trusted", file.display());
                all_trusted = false;
            }
        }
    }

    Ok(if all_trusted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
