//! The SIP `Identity` composite: `JWT;info=<url>;alg=ES256;ppt=shaken`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity must carry a JWT and an info parameter")]
    MissingInfo,
    #[error("malformed info parameter")]
    MalformedInfo,
    #[error("alg parameter must be alg=ES256")]
    BadAlgParam,
    #[error("ppt parameter must be ppt=shaken")]
    BadPptParam,
    #[error("JWT must have exactly three segments")]
    JwtSegments,
}

/// Composite identity string in the order conformant producers emit.
#[must_use]
pub fn build(jwt: &str, x5u: &str) -> String {
    format!("{jwt};info=<{x5u}>;alg=ES256;ppt=shaken")
}

/// The JWT and info URL split out of a composite identity string.
///
/// Parameters may appear in any order. `alg` and `ppt`, when present, must
/// be the exact literals; unknown parameters are ignored.
#[derive(Debug, PartialEq, Eq)]
pub struct IdentityParts<'a> {
    pub jwt: &'a str,
    pub info_url: &'a str,
}

impl<'a> TryFrom<&'a str> for IdentityParts<'a> {
    type Error = IdentityError;

    fn try_from(identity: &'a str) -> Result<Self, Self::Error> {
        let mut fields = identity.split(';');
        let jwt = fields.next().unwrap_or_default();
        if jwt.is_empty() {
            return Err(IdentityError::MissingInfo);
        }
        let mut info_url = None;
        for field in fields {
            if let Some(value) = field.strip_prefix("info=") {
                let url = value
                    .strip_prefix('<')
                    .and_then(|rest| rest.strip_suffix('>'))
                    .filter(|url| !url.is_empty())
                    .ok_or(IdentityError::MalformedInfo)?;
                info_url = Some(url);
            } else if field.starts_with("alg=") {
                if field != "alg=ES256" {
                    return Err(IdentityError::BadAlgParam);
                }
            } else if field.starts_with("ppt=") && field != "ppt=shaken" {
                return Err(IdentityError::BadPptParam);
            }
        }
        let info_url = info_url.ok_or(IdentityError::MissingInfo)?;
        Ok(Self { jwt, info_url })
    }
}

/// Borrowing view over a compact JWT, split into its three segments.
#[derive(Debug, PartialEq, Eq)]
pub struct JwtSegments<'a> {
    pub header_b64: &'a str,
    pub claims_b64: &'a str,
    pub signature_b64: &'a str,
}

impl<'a> TryFrom<&'a str> for JwtSegments<'a> {
    type Error = IdentityError;

    fn try_from(jwt: &'a str) -> Result<Self, Self::Error> {
        let mut parts = jwt.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(header_b64), Some(claims_b64), Some(signature_b64))
                if parts.next().is_none() =>
            {
                Ok(Self {
                    header_b64,
                    claims_b64,
                    signature_b64,
                })
            }
            _ => Err(IdentityError::JwtSegments),
        }
    }
}

impl JwtSegments<'_> {
    /// `b64(header) '.' b64(claims)` — the bytes the signature covers.
    #[must_use]
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header_b64, self.claims_b64)
    }
}
