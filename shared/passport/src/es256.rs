//! ES256 over the JWT signing input, with raw `r‖s` signatures.

use p256::ecdsa::signature::{DigestVerifier, RandomizedDigestSigner};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;
use p256::SecretKey;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// ECDSA P-256 signatures are always `r‖s`, 32 bytes each.
pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum Es256Error {
    #[error("ES256 signature must be {SIGNATURE_LEN} bytes, got {0}")]
    SignatureLength(usize),
    #[error("unable to verify ES256 signature")]
    SignatureInvalid,
    #[error("ES256 signing failed: {0}")]
    SigningFailed(String),
    #[error("not an EC P-256 private key: {0}")]
    PrivateKey(String),
}

/// Signs `b64(header) '.' b64(claims)`: SHA-256 over the ASCII input, then
/// ECDSA with a CSPRNG. Both components come back zero-padded to 32 bytes.
pub fn sign(signing_input: &str, key: &SigningKey) -> Result<Vec<u8>, Es256Error> {
    let mut digest = Sha256::new();
    digest.update(signing_input.as_bytes());
    let signature: Signature = key
        .try_sign_digest_with_rng(&mut OsRng, digest)
        .map_err(|e| Es256Error::SigningFailed(e.to_string()))?;
    Ok(signature.to_bytes().to_vec())
}

/// Verifies a raw 64-byte `r‖s` signature over the signing input.
pub fn verify(signing_input: &str, signature: &[u8], key: &VerifyingKey) -> Result<(), Es256Error> {
    if signature.len() != SIGNATURE_LEN {
        return Err(Es256Error::SignatureLength(signature.len()));
    }
    let signature =
        Signature::from_slice(signature).map_err(|_| Es256Error::SignatureInvalid)?;
    let mut digest = Sha256::new();
    digest.update(signing_input.as_bytes());
    key.verify_digest(digest, &signature)
        .map_err(|_| Es256Error::SignatureInvalid)
}

/// KMA-issued private keys arrive as PKCS#8 or SEC1 PEM depending on the
/// authority's vintage; accept both.
pub fn signing_key_from_pem(pem: &str) -> Result<SigningKey, Es256Error> {
    if let Ok(key) = SigningKey::from_pkcs8_pem(pem) {
        return Ok(key);
    }
    SecretKey::from_sec1_pem(pem)
        .map(SigningKey::from)
        .map_err(|e| Es256Error::PrivateKey(e.to_string()))
}
