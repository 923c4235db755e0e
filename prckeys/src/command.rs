//! The make-prc-key run: validate paths, parse the key list, generate each
//! key and its signer source, then rewrite the public table once.
//!
//! The first failure aborts the run. Private key files written before the
//! failure stay on disk and the public table is left untouched.

use crate::config::{KeygenConfig, PassPhrasePolicy};
use crate::emit::{self, KeyProtection};
use crate::error::{KeyError, Result};
use crate::provider::AsymmetricKeyProvider;
use crate::registry::KeyRegistry;
use crate::request::KeyRequest;
use crate::table;
use crate::template::{require_source_extension, OutputPathTemplate};
use std::path::PathBuf;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Inputs gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct KeygenOptions {
    /// `-a`
    pub public_out: Option<PathBuf>,
    /// `-b`
    pub private_template: Option<PathBuf>,
    /// `-p`
    pub pass_phrase: Option<Zeroizing<String>>,
    /// Positional `level[,"phrase"]` arguments
    pub keys: Vec<String>,
    /// Overrides the configured policy for keys without any phrase
    pub missing_pass_phrase: Option<PassPhrasePolicy>,
}

/// What a completed run wrote.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub private_files: Vec<PathBuf>,
    pub public_file: PathBuf,
    pub generated_time: i64,
}

/// Drives one run against a key provider and a pass phrase prompt.
pub struct KeyGenerator<'a, P, F> {
    config: &'a KeygenConfig,
    provider: P,
    prompt: F,
}

impl<'a, P, F> KeyGenerator<'a, P, F>
where
    P: AsymmetricKeyProvider,
    F: FnMut(u32) -> Result<Zeroizing<String>>,
{
    pub fn new(config: &'a KeygenConfig, provider: P, prompt: F) -> Self {
        Self {
            config,
            provider,
            prompt,
        }
    }

    pub fn run(&mut self, options: &KeygenOptions) -> Result<RunSummary> {
        let (public_file, mut registry) = self.resolve_public_file(options)?;
        let template = match &options.private_template {
            Some(path) => OutputPathTemplate::new(path)?,
            None => {
                return Err(KeyError::Usage(
                    "You must use the -b option to specify the private key output filenames."
                        .into(),
                ))
            }
        };

        let global = options.pass_phrase.as_deref().map(String::as_str);
        let requests = KeyRequest::parse_all(&options.keys, global)?;

        let policy = options
            .missing_pass_phrase
            .unwrap_or(self.config.missing_pass_phrase);
        let generated_time = chrono::Utc::now().timestamp();
        let mut private_files = Vec::with_capacity(requests.len());

        for request in &requests {
            let n = request.number;
            let protection = self.protection_for(request, policy)?;

            let key = self.provider.generate()?;
            registry.record(n, self.provider.export_public(&key)?, generated_time)?;

            let pem = emit::encode_private_key(&self.provider, &key, &protection)?;
            let path = template.path_for(n);
            emit::write_private_key(&path, n, &pem, generated_time)?;
            private_files.push(path);
        }

        emit::write_public_keys(&public_file, &registry)?;
        info!(
            "Generated {} key(s); public table now holds {} of {} slots",
            requests.len(),
            registry.count(),
            registry.num_slots()
        );

        Ok(RunSummary {
            private_files,
            public_file,
            generated_time,
        })
    }

    /// The public table to write and the keys it already holds.
    ///
    /// An explicit `-a` starts from an empty table. Otherwise the default
    /// table is reloaded so keys for other levels survive the rewrite.
    fn resolve_public_file(&self, options: &KeygenOptions) -> Result<(PathBuf, KeyRegistry)> {
        if let Some(path) = &options.public_out {
            require_source_extension(path, "Public key")?;
            return Ok((path.clone(), KeyRegistry::new()));
        }

        let path = self.config.default_public_keys_file().ok_or_else(|| {
            KeyError::Usage(
                "No -a specified, and no PRC_PUBLIC_KEYS_FILENAME configured or compiled in."
                    .into(),
            )
        })?;
        require_source_extension(&path, "Public key")?;

        if path.exists() {
            let registry = table::load_public_table(&path)?;
            info!(
                "Loaded {} existing public key(s) from {}",
                registry.count(),
                path.display()
            );
            Ok((path, registry))
        } else {
            debug!("{} does not exist yet; starting a new table", path.display());
            Ok((path, KeyRegistry::new()))
        }
    }

    fn protection_for(
        &mut self,
        request: &KeyRequest,
        policy: PassPhrasePolicy,
    ) -> Result<KeyProtection> {
        match &request.pass_phrase {
            Some(pp) if pp.is_empty() => Ok(KeyProtection::Plain),
            Some(pp) => Ok(KeyProtection::Encrypted(pp.clone())),
            None => match policy {
                PassPhrasePolicy::Plain => Ok(KeyProtection::Plain),
                PassPhrasePolicy::Fail => Err(KeyError::Usage(format!(
                    "No pass phrase given for key {}; use -p or {},\"pass phrase\".",
                    request.number, request.number
                ))),
                PassPhrasePolicy::Prompt => {
                    let pp = (self.prompt)(request.number)?;
                    if pp.is_empty() {
                        return Err(KeyError::Usage(format!(
                            "Empty pass phrase entered for key {}; pass {},\"\" to store it unencrypted.",
                            request.number, request.number
                        )));
                    }
                    Ok(KeyProtection::Encrypted(pp))
                }
            },
        }
    }
}

/// Ask for a pass phrase on the terminal, twice.
pub fn prompt_pass_phrase(n: u32) -> Result<Zeroizing<String>> {
    let pass_phrase = Zeroizing::new(rpassword::prompt_password(format!(
        "Enter pass phrase for key {}: ",
        n
    ))?);
    let confirm = Zeroizing::new(rpassword::prompt_password(format!(
        "Verifying - enter pass phrase for key {}: ",
        n
    ))?);
    if pass_phrase.as_str() != confirm.as_str() {
        return Err(KeyError::Usage("Pass phrases do not match.".into()));
    }
    Ok(pass_phrase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RsaKeyProvider;
    use crate::signature::decode_private_key;
    use std::fs;
    use std::path::Path;

    fn options(dir: &Path, keys: &[&str]) -> KeygenOptions {
        KeygenOptions {
            public_out: Some(dir.join("pub.cxx")),
            private_template: Some(dir.join("priv#.cxx")),
            pass_phrase: None,
            keys: keys.iter().map(|s| s.to_string()).collect(),
            missing_pass_phrase: Some(PassPhrasePolicy::Plain),
        }
    }

    fn no_prompt(_: u32) -> Result<Zeroizing<String>> {
        panic!("unexpected prompt")
    }

    #[test]
    fn test_sparse_levels_produce_aligned_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = KeygenConfig::default();
        let mut generator = KeyGenerator::new(&config, RsaKeyProvider::default(), no_prompt);

        let summary = generator.run(&options(dir.path(), &["3", "1"])).unwrap();
        assert_eq!(
            summary.private_files,
            vec![dir.path().join("priv3.cxx"), dir.path().join("priv1.cxx")]
        );

        let registry = table::load_public_table(&summary.public_file).unwrap();
        assert_eq!(registry.num_slots(), 4);
        assert_eq!(registry.count(), 2);
        assert!(registry.get(2).is_none());

        let text = fs::read_to_string(&summary.public_file).unwrap();
        assert_eq!(text.matches("{ nullptr, 0, 0 }").count(), 2);
    }

    #[test]
    fn test_prompted_phrase_encrypts() {
        let dir = tempfile::tempdir().unwrap();
        let config = KeygenConfig::default();
        let mut asked = Vec::new();
        let mut generator = KeyGenerator::new(&config, RsaKeyProvider::default(), |n| {
            asked.push(n);
            Ok(Zeroizing::new("typed".to_string()))
        });

        let mut opts = options(dir.path(), &["1", "2,"]);
        opts.missing_pass_phrase = None;
        generator.run(&opts).unwrap();
        drop(generator);
        assert_eq!(asked, vec![1]);

        let key1 = table::load_private_key_source(&dir.path().join("priv1.cxx")).unwrap();
        assert!(key1.is_encrypted());
        assert!(decode_private_key(&key1.key_data, Some("typed")).is_ok());

        let key2 = table::load_private_key_source(&dir.path().join("priv2.cxx")).unwrap();
        assert!(!key2.is_encrypted());
    }

    #[test]
    fn test_fail_policy_rejects_missing_phrase() {
        let dir = tempfile::tempdir().unwrap();
        let config = KeygenConfig::default();
        let mut generator = KeyGenerator::new(&config, RsaKeyProvider::default(), no_prompt);

        let mut opts = options(dir.path(), &["1"]);
        opts.missing_pass_phrase = Some(PassPhrasePolicy::Fail);
        let err = generator.run(&opts).unwrap_err();
        assert!(matches!(err, KeyError::Usage(_)));
        assert!(!dir.path().join("priv1.cxx").exists());
        assert!(!dir.path().join("pub.cxx").exists());
    }

    #[test]
    fn test_missing_private_template() {
        let dir = tempfile::tempdir().unwrap();
        let config = KeygenConfig::default();
        let mut generator = KeyGenerator::new(&config, RsaKeyProvider::default(), no_prompt);

        let mut opts = options(dir.path(), &["1"]);
        opts.private_template = None;
        let err = generator.run(&opts).unwrap_err();
        assert!(err.to_string().contains("-b"));
    }

    #[test]
    fn test_bad_key_argument_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = KeygenConfig::default();
        let mut generator = KeyGenerator::new(&config, RsaKeyProvider::default(), no_prompt);

        let err = generator.run(&options(dir.path(), &["1", "zero"])).unwrap_err();
        assert_eq!(err.to_string(), "Parameter 'zero' should be an integer.");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_later_failure_keeps_earlier_private_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = KeygenConfig::default();
        let mut generator = KeyGenerator::new(&config, RsaKeyProvider::default(), |_| {
            Err(KeyError::Usage("no terminal".into()))
        });

        let mut opts = options(dir.path(), &["1,", "2"]);
        opts.missing_pass_phrase = Some(PassPhrasePolicy::Prompt);
        assert!(generator.run(&opts).is_err());
        assert!(dir.path().join("priv1.cxx").exists());
        assert!(!dir.path().join("pub.cxx").exists());
    }

    #[test]
    fn test_no_public_table_anywhere() {
        let config = KeygenConfig::default();
        // A build with PRC_PUBLIC_KEYS_FILENAME set always has a table.
        if config.default_public_keys_file().is_some() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let mut generator = KeyGenerator::new(&config, RsaKeyProvider::default(), no_prompt);

        let mut opts = options(dir.path(), &["1"]);
        opts.public_out = None;
        let err = generator.run(&opts).unwrap_err();
        assert!(matches!(err, KeyError::Usage(_)));
        assert!(err.to_string().contains("No -a specified"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_default_table_is_extended() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("prcKeys.cxx");
        let config = KeygenConfig {
            public_keys_file: Some(public.clone()),
            ..KeygenConfig::default()
        };

        let mut first = options(dir.path(), &["1"]);
        first.public_out = None;
        KeyGenerator::new(&config, RsaKeyProvider::default(), no_prompt)
            .run(&first)
            .unwrap();
        let before = table::load_public_table(&public).unwrap();

        let mut second = options(dir.path(), &["2"]);
        second.public_out = None;
        KeyGenerator::new(&config, RsaKeyProvider::default(), no_prompt)
            .run(&second)
            .unwrap();
        let after = table::load_public_table(&public).unwrap();

        assert_eq!(after.count(), 2);
        assert_eq!(after.get(1), before.get(1));
    }
}
