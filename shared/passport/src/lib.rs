//! PASSporT (RFC 8225) token mechanics for SHAKEN call authentication.
//!
//! This crate owns everything needed to mint and check a SHAKEN PASSporT
//! without touching the network: typed header and claim records, the
//! canonical JSON form that participates in signing, the unpadded base64url
//! codec, raw `r‖s` ES256 signatures, the SIP `Identity` composite grammar,
//! and X.509 chain verification for the signer's certificate.

pub mod b64;
pub mod canonical;
pub mod chain;
pub mod es256;
pub mod identity;
pub mod types;

pub use p256::ecdsa::{SigningKey, VerifyingKey};
