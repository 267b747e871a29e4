//! X.509 handling for the signer's certificate: PEM parsing, validity
//! window, chain verification against a trusted root pool, and extraction
//! of the EC P-256 verifying key.

use p256::ecdsa::VerifyingKey;
use thiserror::Error;
use webpki::{EndEntityCert, Time, TlsServerTrustAnchors, TrustAnchor};
use x509_cert::der::{DecodePem, Encode};
use x509_cert::Certificate;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("no PEM data is found")]
    NoPemData,
    #[error("unable to parse certificate: {0}")]
    CertParse(String),
    #[error("certificate has expired or is not yet valid")]
    Expired,
    #[error("certificate signed by unknown authority")]
    UnknownAuthority,
    #[error("certificate is not authorized to sign other certificates")]
    NotAuthorizedToSign,
    #[error("issuer name does not match subject from issuing certificate")]
    IssuerMismatch,
    #[error("certificate chain verification failed: {0}")]
    Chain(String),
    #[error("certificate public key is not an EC P-256 key")]
    NotEcP256,
    #[error("untrusted root certificate: {0}")]
    BadRoot(String),
}

/// Parses a PEM leaf certificate, checks its validity window at `now`
/// (seconds since epoch), optionally verifies the chain against the DER
/// root pool, and returns the end-entity's EC P-256 verifying key.
///
/// The validity window is enforced even when chain verification is off.
pub fn verify_cert_and_extract_key(
    leaf_pem: &str,
    roots_der: &[Vec<u8>],
    now: u64,
    verify_chain: bool,
) -> Result<VerifyingKey, ChainError> {
    if !leaf_pem.contains("-----BEGIN") {
        return Err(ChainError::NoPemData);
    }
    let cert = Certificate::from_pem(leaf_pem.as_bytes())
        .map_err(|e| ChainError::CertParse(e.to_string()))?;

    let validity = &cert.tbs_certificate.validity;
    let not_before = validity.not_before.to_unix_duration().as_secs();
    let not_after = validity.not_after.to_unix_duration().as_secs();
    if now < not_before || now > not_after {
        return Err(ChainError::Expired);
    }

    if verify_chain {
        let leaf_der = cert
            .to_der()
            .map_err(|e| ChainError::CertParse(e.to_string()))?;
        let anchors = roots_der
            .iter()
            .map(|der| TrustAnchor::try_from_cert_der(der))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ChainError::BadRoot(e.to_string()))?;
        let end_entity = EndEntityCert::try_from(leaf_der.as_slice())
            .map_err(|e| ChainError::CertParse(e.to_string()))?;
        end_entity
            .verify_is_valid_tls_server_cert(
                &[
                    &webpki::ECDSA_P256_SHA256,
                    &webpki::ECDSA_P256_SHA384,
                    &webpki::ECDSA_P384_SHA256,
                    &webpki::ECDSA_P384_SHA384,
                ],
                &TlsServerTrustAnchors(&anchors),
                &[],
                Time::from_seconds_since_unix_epoch(now),
            )
            .map_err(map_webpki_error)?;
    }

    extract_p256_key(&cert)
}

/// Parses a PEM bundle into the DER certificates that form a root pool.
pub fn roots_from_pem_bundle(bundle: &str) -> Result<Vec<Vec<u8>>, ChainError> {
    if bundle.trim().is_empty() {
        return Err(ChainError::NoPemData);
    }
    let certs = Certificate::load_pem_chain(bundle.as_bytes())
        .map_err(|e| ChainError::CertParse(e.to_string()))?;
    if certs.is_empty() {
        return Err(ChainError::NoPemData);
    }
    certs
        .iter()
        .map(|cert| {
            cert.to_der()
                .map_err(|e| ChainError::CertParse(e.to_string()))
        })
        .collect()
}

fn map_webpki_error(err: webpki::Error) -> ChainError {
    use webpki::Error;
    match err {
        Error::CertExpired | Error::CertNotValidYet | Error::InvalidCertValidity => {
            ChainError::Expired
        }
        Error::UnknownIssuer => ChainError::UnknownAuthority,
        Error::CaUsedAsEndEntity | Error::EndEntityUsedAsCa => ChainError::NotAuthorizedToSign,
        Error::InvalidSignatureForPublicKey | Error::SignatureAlgorithmMismatch => {
            ChainError::IssuerMismatch
        }
        other => ChainError::Chain(format!("{other:?}")),
    }
}

fn extract_p256_key(cert: &Certificate) -> Result<VerifyingKey, ChainError> {
    let spki = &cert.tbs_certificate.subject_public_key_info;
    let key_bytes = spki
        .subject_public_key
        .as_bytes()
        .ok_or(ChainError::NotEcP256)?;
    VerifyingKey::from_sec1_bytes(key_bytes).map_err(|_| ChainError::NotEcP256)
}
