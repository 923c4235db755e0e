//! RSA key generation and PKCS#8 export

use crate::error::Result;
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{BigUint, RsaPrivateKey};
use tracing::debug;

/// Key generation and export behind the emitters.
pub trait AsymmetricKeyProvider {
    type Key;

    /// Produce a fresh key pair.
    fn generate(&self) -> Result<Self::Key>;

    /// PEM SubjectPublicKeyInfo for the public half.
    fn export_public(&self, key: &Self::Key) -> Result<Vec<u8>>;

    /// PEM encrypted PKCS#8 for the private half.
    fn export_private_encrypted(&self, key: &Self::Key, pass_phrase: &str) -> Result<Vec<u8>>;

    /// PEM cleartext PKCS#8 for the private half.
    fn export_private_plain(&self, key: &Self::Key) -> Result<Vec<u8>>;
}

/// RSA keys drawn from the operating system's entropy source.
#[derive(Debug, Clone)]
pub struct RsaKeyProvider {
    bits: usize,
    exponent: u64,
}

impl RsaKeyProvider {
    pub fn new(bits: usize, exponent: u64) -> Self {
        Self { bits, exponent }
    }
}

impl Default for RsaKeyProvider {
    fn default() -> Self {
        Self::new(1024, 7)
    }
}

impl AsymmetricKeyProvider for RsaKeyProvider {
    type Key = RsaPrivateKey;

    fn generate(&self) -> Result<RsaPrivateKey> {
        debug!("Generating {}-bit RSA key, e = {}", self.bits, self.exponent);
        let exponent = BigUint::from(self.exponent);
        let key = RsaPrivateKey::new_with_exp(&mut OsRng, self.bits, &exponent)?;
        Ok(key)
    }

    fn export_public(&self, key: &RsaPrivateKey) -> Result<Vec<u8>> {
        let pem = key.to_public_key().to_public_key_pem(LineEnding::LF)?;
        Ok(pem.into_bytes())
    }

    fn export_private_encrypted(&self, key: &RsaPrivateKey, pass_phrase: &str) -> Result<Vec<u8>> {
        let pem = key.to_pkcs8_encrypted_pem(&mut OsRng, pass_phrase.as_bytes(), LineEnding::LF)?;
        Ok(pem.as_bytes().to_vec())
    }

    fn export_private_plain(&self, key: &RsaPrivateKey) -> Result<Vec<u8>> {
        let pem = key.to_pkcs8_pem(LineEnding::LF)?;
        Ok(pem.as_bytes().to_vec())
    }
}
