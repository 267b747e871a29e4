//! Canonical JSON for signing and replay bookkeeping.
//!
//! The canonical form has top-level keys in lexicographic ascending order,
//! nested objects structurally unchanged, and integral numbers without a
//! fraction or exponent. `serde_json`'s object map is ordered by key (the
//! `preserve_order` feature must stay off), so serializing a `Value` emits
//! every object's keys sorted; the typed claim record declares its fields
//! in lexicographic order and serializes canonically by construction.

use serde_json::Value;

use crate::types::PassportClaims;

/// Canonical byte form of an arbitrary JSON value.
pub fn canonicalize(value: &Value) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(value)
}

/// The exact byte sequence of the claim set that participates in signing.
pub fn claims_bytes(claims: &PassportClaims) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(claims)
}

/// Canonical claim string, used as the replay-cache value.
pub fn claims_string(claims: &PassportClaims) -> serde_json::Result<String> {
    serde_json::to_string(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_keys_are_sorted() {
        let value: Value = serde_json::from_str(
            r#"{"origid":"id","orig":{"tn":"+1"},"iat":7,"dest":{"tn":["+2"]},"attest":"A"}"#,
        )
        .unwrap();
        let canon = String::from_utf8(canonicalize(&value).unwrap()).unwrap();
        assert_eq!(
            canon,
            r#"{"attest":"A","dest":{"tn":["+2"]},"iat":7,"orig":{"tn":"+1"},"origid":"id"}"#
        );
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let value: Value =
            serde_json::from_str(r#"{"b":2,"a":{"y":1,"x":2},"c":[3,1,2]}"#).unwrap();
        let once = canonicalize(&value).unwrap();
        let reparsed: Value = serde_json::from_slice(&once).unwrap();
        let twice = canonicalize(&reparsed).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn canonical_form_is_permutation_invariant() {
        let a: Value = serde_json::from_str(r#"{"attest":"A","iat":1,"origid":"x"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"origid":"x","attest":"A","iat":1}"#).unwrap();
        assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn integral_numbers_stay_integral() {
        let value: Value = serde_json::from_str(r#"{"iat":1517847072}"#).unwrap();
        let canon = String::from_utf8(canonicalize(&value).unwrap()).unwrap();
        assert_eq!(canon, r#"{"iat":1517847072}"#);
    }

    #[test]
    fn typed_claims_serialize_canonically() {
        use crate::types::{Dest, Orig, OrigTn};

        let claims = PassportClaims {
            attest: "A".to_owned(),
            dest: Dest {
                tn: vec!["+12155551213".to_owned()],
            },
            iat: 1_517_847_072,
            orig: Orig {
                tn: OrigTn::Tn("+12155551212".to_owned()),
            },
            origid: "de305d54-75b4-431b-adb2-eb6b9e546014".to_owned(),
        };
        let typed = claims_bytes(&claims).unwrap();

        let reparsed: Value = serde_json::from_slice(&typed).unwrap();
        assert_eq!(canonicalize(&reparsed).unwrap(), typed);
    }
}
