//! make-prc-key - generate trust-level keys for signing prc files

use clap::error::ErrorKind;
use clap::Parser;
use prckeys::command::{prompt_pass_phrase, KeyGenerator, KeygenOptions};
use prckeys::{KeyError, KeygenConfig, PassPhrasePolicy, RsaKeyProvider};
use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;
use zeroize::Zeroizing;

const LONG_ABOUT: &str = "\
This program generates one or more new keys to be used for signing a prc
file. Each key is divided into a public and a private key; the public key is
not secret and will be compiled into libdtool, while the private key should
be safeguarded and will be written into a .cxx file that can be compiled as a
standalone application.

The output is a public and private key pair for each trust level. The form of
the output for both public and private keys will be compilable C++ code; see
-a and -b below.

After the options, the remaining arguments list the individual trust level
keys to generate. For each integer specified, a different key will be created.
A typical application will only need one or two keys.";

const AFTER_HELP: &str = "\
If no pass phrase is given for a key, either with -p or inline, the
--missing-pass-phrase policy applies (interactive prompt by default). Every
user of the signing programs will need to know the pass phrase in order to
sign prc files. A pass phrase of \"\" stores the key unencrypted, and anyone can
run the signing program without one.";

#[derive(Parser)]
#[command(name = "make-prc-key")]
#[command(author, version, about = "Generate keys for signing prc files")]
#[command(long_about = LONG_ABOUT, after_help = AFTER_HELP)]
struct Cli {
    /// Public key output file. It is compiled into libdtool to verify
    /// signatures. Defaults to the configured or compiled-in table, whose
    /// existing keys are kept.
    #[arg(short = 'a', value_name = "PUB_OUTFILE.cxx")]
    public_out: Option<PathBuf>,

    /// Private key output file(s). A '#' in the name is replaced by the
    /// trust level; without one, every level but 1 gets its number appended.
    #[arg(short = 'b', value_name = "PRIV_OUTFILE#.cxx")]
    private_out: Option<PathBuf>,

    /// Pass phrase for every key that does not give its own
    #[arg(short = 'p', value_name = "PASS_PHRASE")]
    pass_phrase: Option<String>,

    /// What to do for a key with no pass phrase at all
    #[arg(long, value_enum)]
    missing_pass_phrase: Option<PassPhrasePolicy>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Trust levels to generate, each optionally followed by ,"pass phrase"
    #[arg(value_name = "LEVEL[,\"PASS PHRASE\"]", allow_negative_numbers = true)]
    keys: Vec<String>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    prckeys::init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> prckeys::Result<()> {
    let config = KeygenConfig::load(cli.config.as_deref())?;
    let provider = RsaKeyProvider::new(config.key_bits, config.public_exponent);

    let options = KeygenOptions {
        public_out: cli.public_out,
        private_template: cli.private_out,
        pass_phrase: cli.pass_phrase.map(Zeroizing::new),
        keys: cli.keys,
        missing_pass_phrase: cli.missing_pass_phrase,
    };

    KeyGenerator::new(&config, provider, prompt_pass_phrase).run(&options)?;
    Ok(())
}

/// Print the error followed by each underlying cause on its own line.
fn report(err: &KeyError) {
    eprintln!("{}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
    if matches!(err, KeyError::Usage(_)) {
        eprintln!("\nRun with -h for usage.");
    }
}
