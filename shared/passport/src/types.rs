//! Typed PASSporT header and claims.

use serde::{Deserialize, Serialize};

/// The only signature algorithm SHAKEN permits.
pub const ALG_ES256: &str = "ES256";
/// PASSporT extension identifier for SHAKEN.
pub const PPT_SHAKEN: &str = "shaken";
/// Token type carried in the JWT header.
pub const TYP_PASSPORT: &str = "passport";

/// SHAKEN PASSporT header.
///
/// Field order is the canonical serialization order (alg, ppt, typ, x5u);
/// the derived serializer emits exactly the byte sequence that is signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PassportHeader {
    pub alg: String,
    pub ppt: String,
    pub typ: String,
    pub x5u: String,
}

impl PassportHeader {
    /// Header for a token minted by this service.
    #[must_use]
    pub fn shaken(x5u: impl Into<String>) -> Self {
        Self {
            alg: ALG_ES256.to_owned(),
            ppt: PPT_SHAKEN.to_owned(),
            typ: TYP_PASSPORT.to_owned(),
            x5u: x5u.into(),
        }
    }
}

/// SHAKEN PASSporT claims.
///
/// Fields are declared in lexicographic order so the derived serializer
/// already produces the canonical top-level key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PassportClaims {
    pub attest: String,
    pub dest: Dest,
    pub iat: i64,
    pub orig: Orig,
    pub origid: String,
}

/// Destination telephone numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dest {
    pub tn: Vec<String>,
}

/// Originating telephone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Orig {
    pub tn: OrigTn,
}

/// `orig.tn` is a plain string in tokens minted here; legacy signers emit a
/// one-element array instead. Re-serializing preserves whichever form the
/// token carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrigTn {
    Tn(String),
    Legacy(Vec<String>),
}

impl OrigTn {
    /// The underlying telephone number, if the shape is valid.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Tn(tn) => Some(tn),
            Self::Legacy(tns) if tns.len() == 1 => Some(&tns[0]),
            Self::Legacy(_) => None,
        }
    }
}
