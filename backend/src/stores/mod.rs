//! The service's shared stores: trust material, signing credentials, the
//! certificate-repository locator, and the two verification caches. Each
//! is a self-contained value under single-writer / many-reader exclusion;
//! refreshers do their I/O and parsing before taking the write lock, and
//! the swap itself is a single assignment.

mod cert_repo;
mod public_keys;
mod replay;
mod root_certs;
mod signing_creds;

pub use cert_repo::CertRepoLocator;
pub use public_keys::PublicKeyCache;
pub use replay::ReplayCache;
pub use root_certs::RootCertStore;
pub use signing_creds::{SigningCredsStore, SigningMaterial};
