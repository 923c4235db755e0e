//! Output file names for private key sources

use crate::error::{KeyError, Result};
use std::path::{Path, PathBuf};

/// Extension every generated source must carry.
pub const SOURCE_EXTENSION: &str = "cxx";

/// Replaced by the trust level in a private key file name.
pub const PLACEHOLDER: char = '#';

/// Fail unless `path` ends in `.cxx`. `what` names the file in the message.
pub fn require_source_extension(path: &Path, what: &str) -> Result<()> {
    if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
        return Err(KeyError::Usage(format!(
            "{} output file '{}' should have a .{} extension.",
            what,
            path.display(),
            SOURCE_EXTENSION
        )));
    }
    Ok(())
}

/// A private key file name such as `sign#.cxx`.
///
/// Without a placeholder the number is appended to the stem, except for
/// key 1, which gets no number at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPathTemplate {
    prefix: String,
    suffix: String,
    has_placeholder: bool,
}

impl OutputPathTemplate {
    pub fn new(path: &Path) -> Result<Self> {
        require_source_extension(path, "Private key")?;

        let full = path.with_extension("").to_string_lossy().into_owned();
        let ext = format!(".{}", SOURCE_EXTENSION);

        Ok(match full.find(PLACEHOLDER) {
            Some(pos) => Self {
                prefix: full[..pos].to_string(),
                suffix: format!("{}{}", &full[pos + PLACEHOLDER.len_utf8()..], ext),
                has_placeholder: true,
            },
            None => Self {
                prefix: full,
                suffix: ext,
                has_placeholder: false,
            },
        })
    }

    /// The file for trust level `n`.
    pub fn path_for(&self, n: u32) -> PathBuf {
        if self.has_placeholder || n != 1 {
            PathBuf::from(format!("{}{}{}", self.prefix, n, self.suffix))
        } else {
            PathBuf::from(format!("{}{}", self.prefix, self.suffix))
        }
    }
}
