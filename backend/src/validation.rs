//! Payload-shape validation with stable per-field reason codes.
//!
//! Each validator is an explicit match over the decoded JSON value that
//! either produces a typed request or names the first defect it finds.
//! Check order is fixed, so a payload with several defects always reports
//! the same code.

use serde_json::{Map, Value};

use passport::types::{Dest, Orig, OrigTn, PassportClaims, PassportHeader};

use crate::types::Reason;

/// A validated signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub attest: String,
    pub dest_tns: Vec<String>,
    pub iat: i64,
    pub orig_tn: String,
    pub origid: String,
}

impl SignRequest {
    /// The claim set this request signs into.
    #[must_use]
    pub fn into_claims(self) -> PassportClaims {
        PassportClaims {
            attest: self.attest,
            dest: Dest { tn: self.dest_tns },
            iat: self.iat,
            orig: Orig {
                tn: OrigTn::Tn(self.orig_tn),
            },
            origid: self.origid,
        }
    }
}

/// A validated verification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRequest {
    pub dest_tns: Vec<String>,
    pub iat: i64,
    pub orig_tn: String,
    pub identity: String,
}

/// Validates a signing payload: exactly {attest, dest, iat, orig, origid}.
pub fn validate_sign_payload(payload: &Value) -> Result<SignRequest, Reason> {
    let fields = payload.as_object().ok_or(Reason::MalformedBody)?;
    for key in ["attest", "dest", "iat", "orig", "origid"] {
        if !fields.contains_key(key) {
            return Err(Reason::MissingFields);
        }
    }
    if fields.len() != 5 {
        return Err(Reason::ExtraFields);
    }

    let attest = validate_attest(&fields["attest"])?;
    let dest_tns = validate_dest(&fields["dest"], SIGN_REASONS)?;
    let iat = validate_iat(&fields["iat"], SIGN_REASONS)?;
    let orig_tn = validate_orig_string(&fields["orig"])?;
    let origid = validate_origid(&fields["origid"])?;

    Ok(SignRequest {
        attest,
        dest_tns,
        iat,
        orig_tn,
        origid,
    })
}

/// Validates a verification payload: exactly {dest, iat, orig, identity},
/// with `orig.tn` a singleton array of one non-empty string.
pub fn validate_verify_payload(payload: &Value) -> Result<VerifyRequest, Reason> {
    let fields = payload.as_object().ok_or(Reason::VerifyMalformedBody)?;
    for key in ["dest", "iat", "orig", "identity"] {
        if !fields.contains_key(key) {
            return Err(Reason::VerifyMissingFields);
        }
    }
    if fields.len() != 4 {
        return Err(Reason::VerifyExtraFields);
    }

    let iat = validate_iat(&fields["iat"], VERIFY_REASONS)?;
    let identity = match &fields["identity"] {
        Value::String(identity) => {
            if identity.trim().is_empty() {
                return Err(Reason::IdentityEmpty);
            }
            identity.clone()
        }
        _ => return Err(Reason::IdentityNotString),
    };
    let orig_tn = validate_orig_singleton(&fields["orig"])?;
    let dest_tns = validate_dest(&fields["dest"], VERIFY_REASONS)?;

    Ok(VerifyRequest {
        dest_tns,
        iat,
        orig_tn,
        identity,
    })
}

/// Validates the claim set recovered from a JWT. The rules are the signing
/// rules, except `orig.tn` also accepts the legacy one-element array and a
/// missing `origid` is reported as the empty-origid defect.
pub fn validate_claim_set(claims: &Value) -> Result<PassportClaims, Reason> {
    let fields = claims.as_object().ok_or(Reason::ClaimsNotJson)?;
    if !fields.contains_key("origid") {
        return Err(Reason::OrigidEmpty);
    }
    for key in ["attest", "dest", "iat", "orig"] {
        if !fields.contains_key(key) {
            return Err(Reason::MissingFields);
        }
    }
    if fields.len() != 5 {
        return Err(Reason::ExtraFields);
    }

    let attest = validate_attest(&fields["attest"])?;
    let dest_tns = validate_dest(&fields["dest"], SIGN_REASONS)?;
    let iat = validate_iat(&fields["iat"], SIGN_REASONS)?;
    let orig = validate_orig_claim(&fields["orig"])?;
    let origid = validate_origid(&fields["origid"])?;

    Ok(PassportClaims {
        attest,
        dest: Dest { tn: dest_tns },
        iat,
        orig,
        origid,
    })
}

/// Validates a decoded JWT header: exactly {alg, ppt, typ, x5u}, all
/// strings, with the SHAKEN literals.
pub fn validate_passport_header(header: &Value) -> Result<PassportHeader, Reason> {
    let fields = header.as_object().ok_or(Reason::HeaderNotJson)?;
    if fields.len() != 4 {
        return Err(Reason::HeaderWrongFields);
    }
    for key in ["alg", "ppt", "typ", "x5u"] {
        if !fields.contains_key(key) {
            return Err(Reason::HeaderWrongFields);
        }
    }

    let alg = header_string(&fields["alg"])?;
    if alg != passport::types::ALG_ES256 {
        return Err(Reason::HeaderAlgNotEs256);
    }
    let ppt = header_string(&fields["ppt"])?;
    if ppt != passport::types::PPT_SHAKEN {
        return Err(Reason::HeaderPptNotShaken);
    }
    let typ = header_string(&fields["typ"])?;
    if typ != passport::types::TYP_PASSPORT {
        return Err(Reason::HeaderTypNotPassport);
    }
    let x5u = header_string(&fields["x5u"])?;

    Ok(PassportHeader { alg, ppt, typ, x5u })
}

fn header_string(value: &Value) -> Result<String, Reason> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or(Reason::HeaderFieldNotString)
}

/// Context-dependent codes for the checks shared between the signing and
/// verification payload shapes.
struct ShapeReasons {
    iat_not_positive: Reason,
    iat_not_number: Reason,
    dest_not_object: Reason,
    dest_empty_object: Reason,
    dest_extra_fields: Reason,
    dest_missing_tn: Reason,
    dest_tn_not_array: Reason,
    dest_tn_empty_array: Reason,
    dest_tn_entry_not_string: Reason,
    dest_tn_entry_empty: Reason,
}

const SIGN_REASONS: &ShapeReasons = &ShapeReasons {
    iat_not_positive: Reason::IatNotPositive,
    iat_not_number: Reason::IatNotNumber,
    dest_not_object: Reason::DestNotObject,
    dest_empty_object: Reason::DestEmptyObject,
    dest_extra_fields: Reason::DestExtraFields,
    dest_missing_tn: Reason::DestMissingTn,
    dest_tn_not_array: Reason::DestTnNotArray,
    dest_tn_empty_array: Reason::DestTnEmptyArray,
    dest_tn_entry_not_string: Reason::DestTnEntryNotString,
    dest_tn_entry_empty: Reason::DestTnEntryEmpty,
};

const VERIFY_REASONS: &ShapeReasons = &ShapeReasons {
    iat_not_positive: Reason::VerifyIatNotPositive,
    iat_not_number: Reason::VerifyIatNotNumber,
    dest_not_object: Reason::VerifyDestNotObject,
    dest_empty_object: Reason::VerifyDestEmptyObject,
    dest_extra_fields: Reason::VerifyDestExtraFields,
    dest_missing_tn: Reason::VerifyDestMissingTn,
    dest_tn_not_array: Reason::VerifyDestTnNotArray,
    dest_tn_empty_array: Reason::VerifyDestTnEmptyArray,
    dest_tn_entry_not_string: Reason::VerifyDestTnEntryNotString,
    dest_tn_entry_empty: Reason::VerifyDestTnEntryEmpty,
};

fn validate_attest(value: &Value) -> Result<String, Reason> {
    let attest = value.as_str().ok_or(Reason::AttestNotString)?;
    if attest.trim().is_empty() {
        return Err(Reason::AttestEmpty);
    }
    match attest {
        "A" | "B" | "C" => Ok(attest.to_owned()),
        _ => Err(Reason::AttestNotShaken),
    }
}

fn validate_iat(value: &Value, reasons: &ShapeReasons) -> Result<i64, Reason> {
    let iat = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or(reasons.iat_not_number)?,
        _ => return Err(reasons.iat_not_number),
    };
    if iat <= 0 {
        return Err(reasons.iat_not_positive);
    }
    Ok(iat)
}

fn validate_origid(value: &Value) -> Result<String, Reason> {
    let origid = value.as_str().ok_or(Reason::OrigidNotString)?;
    if origid.trim().is_empty() {
        return Err(Reason::OrigidEmpty);
    }
    Ok(origid.to_owned())
}

fn single_tn_field<'a>(
    value: &'a Value,
    not_object: Reason,
    empty_object: Reason,
    extra_fields: Reason,
    missing_tn: Reason,
) -> Result<&'a Value, Reason> {
    let object: &Map<String, Value> = value.as_object().ok_or(not_object)?;
    match object.len() {
        0 => Err(empty_object),
        1 => object.get("tn").ok_or(missing_tn),
        _ => Err(extra_fields),
    }
}

fn validate_orig_string(value: &Value) -> Result<String, Reason> {
    let tn = single_tn_field(
        value,
        Reason::OrigNotObject,
        Reason::OrigEmptyObject,
        Reason::OrigExtraFields,
        Reason::OrigMissingTn,
    )?;
    let tn = tn.as_str().ok_or(Reason::OrigTnNotString)?;
    if tn.trim().is_empty() {
        return Err(Reason::OrigTnEmpty);
    }
    Ok(tn.to_owned())
}

fn validate_orig_singleton(value: &Value) -> Result<String, Reason> {
    let tn = single_tn_field(
        value,
        Reason::VerifyOrigNotObject,
        Reason::VerifyOrigEmptyObject,
        Reason::VerifyOrigExtraFields,
        Reason::VerifyOrigMissingTn,
    )?;
    let entries = tn.as_array().ok_or(Reason::VerifyOrigTnNotSingleton)?;
    let [entry] = entries.as_slice() else {
        return Err(Reason::VerifyOrigTnNotSingleton);
    };
    let entry = entry.as_str().ok_or(Reason::VerifyOrigTnNotSingleton)?;
    if entry.trim().is_empty() {
        return Err(Reason::VerifyOrigTnEmpty);
    }
    Ok(entry.to_owned())
}

fn validate_orig_claim(value: &Value) -> Result<Orig, Reason> {
    let tn = single_tn_field(
        value,
        Reason::OrigNotObject,
        Reason::OrigEmptyObject,
        Reason::OrigExtraFields,
        Reason::OrigMissingTn,
    )?;
    match tn {
        Value::String(tn) => {
            if tn.trim().is_empty() {
                return Err(Reason::OrigTnEmpty);
            }
            Ok(Orig {
                tn: OrigTn::Tn(tn.clone()),
            })
        }
        Value::Array(entries) => {
            let [entry] = entries.as_slice() else {
                return Err(Reason::OrigTnNotString);
            };
            let entry = entry.as_str().ok_or(Reason::OrigTnNotString)?;
            if entry.trim().is_empty() {
                return Err(Reason::OrigTnEmpty);
            }
            Ok(Orig {
                tn: OrigTn::Legacy(vec![entry.to_owned()]),
            })
        }
        _ => Err(Reason::OrigTnNotString),
    }
}

fn validate_dest(value: &Value, reasons: &ShapeReasons) -> Result<Vec<String>, Reason> {
    let tn = single_tn_field(
        value,
        reasons.dest_not_object,
        reasons.dest_empty_object,
        reasons.dest_extra_fields,
        reasons.dest_missing_tn,
    )?;
    let entries = tn.as_array().ok_or(reasons.dest_tn_not_array)?;
    if entries.is_empty() {
        return Err(reasons.dest_tn_empty_array);
    }
    let mut tns = Vec::with_capacity(entries.len());
    for entry in entries {
        let tn = entry.as_str().ok_or(reasons.dest_tn_entry_not_string)?;
        if tn.trim().is_empty() {
            return Err(reasons.dest_tn_entry_empty);
        }
        tns.push(tn.to_owned());
    }
    Ok(tns)
}
