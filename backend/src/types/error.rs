//! The VESPER error taxonomy and the HTTP error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Which response envelope an error is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Signing,
    Verification,
}

impl Action {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Signing => "signingResponse",
            Self::Verification => "verificationResponse",
        }
    }
}

/// Stable reason codes. The numbering is part of the external contract:
/// 4001–4025 signing payload shape (shared with JWT-claims validation),
/// 4100–4125 verification payload shape, 4126–4140 identity/JWT header
/// shape, 4150–4155 claims decode and cross-checks, 4156–4169 certificate,
/// signature, freshness and replay, 5050–5052 internal signing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    // Signing payload shape.
    EmptyBody,
    MalformedBody,
    MissingFields,
    ExtraFields,
    AttestEmpty,
    AttestNotShaken,
    AttestNotString,
    IatNotPositive,
    IatNotNumber,
    OrigidEmpty,
    OrigidNotString,
    OrigEmptyObject,
    OrigExtraFields,
    OrigMissingTn,
    OrigTnNotString,
    OrigTnEmpty,
    OrigNotObject,
    DestEmptyObject,
    DestExtraFields,
    DestMissingTn,
    DestTnEmptyArray,
    DestTnEntryNotString,
    DestTnEntryEmpty,
    DestTnNotArray,
    DestNotObject,
    // Verification payload shape.
    VerifyEmptyBody,
    VerifyMalformedBody,
    VerifyMissingFields,
    VerifyExtraFields,
    VerifyIatNotPositive,
    VerifyIatNotNumber,
    IdentityEmpty,
    IdentityNotString,
    VerifyOrigEmptyObject,
    VerifyOrigExtraFields,
    VerifyOrigMissingTn,
    VerifyOrigTnNotSingleton,
    VerifyOrigTnEmpty,
    VerifyOrigNotObject,
    VerifyDestEmptyObject,
    VerifyDestExtraFields,
    VerifyDestMissingTn,
    VerifyDestTnEmptyArray,
    VerifyDestTnEntryNotString,
    VerifyDestTnEntryEmpty,
    VerifyDestTnNotArray,
    VerifyDestNotObject,
    // Identity composite and JWT header shape.
    IdentityMissingInfo,
    IdentityMalformedInfo,
    IdentityBadAlgParam,
    IdentityBadPptParam,
    JwtNotThreeSegments,
    X5uInfoMismatch,
    HeaderNotBase64,
    HeaderNotJson,
    HeaderWrongFields,
    HeaderAlgNotEs256,
    HeaderPptNotShaken,
    HeaderTypNotPassport,
    HeaderFieldNotString,
    // Claims decode and cross-checks.
    ClaimsNotBase64,
    ClaimsNotJson,
    OrigTnMismatch,
    DestTnMismatch,
    // Certificate, signature, freshness, replay.
    CertFetchFailed,
    CertReadFailed,
    CertNoPemData,
    CertParseFailed,
    CertExpired,
    CertUnknownAuthority,
    CertNotAuthorizedToSign,
    CertIssuerMismatch,
    CertChainFailed,
    CertNotEcP256,
    SignatureInvalid,
    IatStale,
    IatInFuture,
    ReplayDetected,
    // Internal signing failures.
    HeaderEncodeFailed,
    ClaimsEncodeFailed,
    SigningFailed,
}

impl Reason {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EmptyBody => "VESPER-4001",
            Self::MalformedBody => "VESPER-4002",
            Self::MissingFields => "VESPER-4003",
            Self::ExtraFields => "VESPER-4004",
            Self::AttestEmpty => "VESPER-4005",
            Self::AttestNotShaken => "VESPER-4006",
            Self::AttestNotString => "VESPER-4007",
            Self::IatNotPositive => "VESPER-4008",
            Self::IatNotNumber => "VESPER-4009",
            Self::OrigidEmpty => "VESPER-4010",
            Self::OrigidNotString => "VESPER-4011",
            Self::OrigEmptyObject => "VESPER-4012",
            Self::OrigExtraFields => "VESPER-4013",
            Self::OrigMissingTn => "VESPER-4014",
            Self::OrigTnNotString => "VESPER-4015",
            Self::OrigTnEmpty => "VESPER-4016",
            Self::OrigNotObject => "VESPER-4017",
            Self::DestEmptyObject => "VESPER-4018",
            Self::DestExtraFields => "VESPER-4019",
            Self::DestMissingTn => "VESPER-4020",
            Self::DestTnEmptyArray => "VESPER-4021",
            Self::DestTnEntryNotString => "VESPER-4022",
            Self::DestTnEntryEmpty => "VESPER-4023",
            Self::DestTnNotArray => "VESPER-4024",
            Self::DestNotObject => "VESPER-4025",
            Self::VerifyEmptyBody => "VESPER-4100",
            Self::VerifyMalformedBody => "VESPER-4102",
            Self::VerifyMissingFields => "VESPER-4103",
            Self::VerifyExtraFields => "VESPER-4104",
            Self::VerifyIatNotPositive => "VESPER-4105",
            Self::VerifyIatNotNumber => "VESPER-4106",
            Self::IdentityEmpty => "VESPER-4107",
            Self::IdentityNotString => "VESPER-4108",
            Self::VerifyOrigEmptyObject => "VESPER-4109",
            Self::VerifyOrigExtraFields => "VESPER-4110",
            Self::VerifyOrigMissingTn => "VESPER-4111",
            Self::VerifyOrigTnNotSingleton => "VESPER-4112",
            Self::VerifyOrigTnEmpty => "VESPER-4113",
            Self::VerifyOrigNotObject => "VESPER-4114",
            Self::VerifyDestEmptyObject => "VESPER-4115",
            Self::VerifyDestExtraFields => "VESPER-4116",
            Self::VerifyDestMissingTn => "VESPER-4117",
            Self::VerifyDestTnEmptyArray => "VESPER-4118",
            Self::VerifyDestTnEntryNotString => "VESPER-4119",
            Self::VerifyDestTnEntryEmpty => "VESPER-4120",
            Self::VerifyDestTnNotArray => "VESPER-4121",
            Self::VerifyDestNotObject => "VESPER-4122",
            Self::IdentityMissingInfo => "VESPER-4126",
            Self::IdentityMalformedInfo => "VESPER-4127",
            Self::IdentityBadAlgParam => "VESPER-4128",
            Self::IdentityBadPptParam => "VESPER-4129",
            Self::JwtNotThreeSegments => "VESPER-4130",
            Self::X5uInfoMismatch => "VESPER-4131",
            Self::HeaderNotBase64 => "VESPER-4132",
            Self::HeaderNotJson => "VESPER-4133",
            Self::HeaderWrongFields => "VESPER-4134",
            Self::HeaderAlgNotEs256 => "VESPER-4135",
            Self::HeaderPptNotShaken => "VESPER-4136",
            Self::HeaderTypNotPassport => "VESPER-4137",
            Self::HeaderFieldNotString => "VESPER-4138",
            Self::ClaimsNotBase64 => "VESPER-4150",
            Self::ClaimsNotJson => "VESPER-4151",
            Self::OrigTnMismatch => "VESPER-4154",
            Self::DestTnMismatch => "VESPER-4155",
            Self::CertFetchFailed => "VESPER-4156",
            Self::CertReadFailed => "VESPER-4157",
            Self::CertNoPemData => "VESPER-4158",
            Self::CertParseFailed => "VESPER-4159",
            Self::CertExpired => "VESPER-4160",
            Self::CertUnknownAuthority => "VESPER-4161",
            Self::CertNotAuthorizedToSign => "VESPER-4162",
            Self::CertIssuerMismatch => "VESPER-4163",
            Self::CertChainFailed => "VESPER-4164",
            Self::CertNotEcP256 => "VESPER-4165",
            Self::SignatureInvalid => "VESPER-4166",
            Self::IatStale => "VESPER-4167",
            Self::IatInFuture => "VESPER-4168",
            Self::ReplayDetected => "VESPER-4169",
            Self::HeaderEncodeFailed => "VESPER-5050",
            Self::ClaimsEncodeFailed => "VESPER-5051",
            Self::SigningFailed => "VESPER-5052",
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::EmptyBody | Self::VerifyEmptyBody => "empty request body",
            Self::MalformedBody | Self::VerifyMalformedBody => "unable to parse request body",
            Self::MissingFields | Self::VerifyMissingFields => {
                "one or more of the required fields missing in request payload"
            }
            Self::ExtraFields | Self::VerifyExtraFields => {
                "request payload has more than expected fields"
            }
            Self::AttestEmpty => "attest field in request payload is an empty string",
            Self::AttestNotShaken => "attest field in request payload is not as per SHAKEN spec",
            Self::AttestNotString => "attest field in request payload MUST be a string",
            Self::IatNotPositive | Self::VerifyIatNotPositive => {
                "iat value in request payload is not a positive number"
            }
            Self::IatNotNumber | Self::VerifyIatNotNumber => {
                "iat field in request payload MUST be a number"
            }
            Self::OrigidEmpty => "origid field is missing or an empty string",
            Self::OrigidNotString => "origid field in request payload MUST be a string",
            Self::OrigEmptyObject | Self::VerifyOrigEmptyObject => {
                "orig in request payload is an empty object"
            }
            Self::OrigExtraFields | Self::VerifyOrigExtraFields => {
                "orig in request payload should contain only one field"
            }
            Self::OrigMissingTn | Self::VerifyOrigMissingTn => {
                "orig in request payload does not contain field \"tn\""
            }
            Self::OrigTnNotString => "orig tn in request payload is not of type string",
            Self::VerifyOrigTnNotSingleton => {
                "orig tn in request payload is not an array with one string"
            }
            Self::OrigTnEmpty | Self::VerifyOrigTnEmpty => {
                "orig tn in request payload is an empty string"
            }
            Self::OrigNotObject | Self::VerifyOrigNotObject => {
                "orig field in request payload MUST be a JSON object"
            }
            Self::DestEmptyObject | Self::VerifyDestEmptyObject => {
                "dest in request payload is an empty object"
            }
            Self::DestExtraFields | Self::VerifyDestExtraFields => {
                "dest in request payload should contain only one field"
            }
            Self::DestMissingTn | Self::VerifyDestMissingTn => {
                "dest in request payload does not contain field \"tn\""
            }
            Self::DestTnEmptyArray | Self::VerifyDestTnEmptyArray => {
                "dest tn in request payload is an empty array"
            }
            Self::DestTnEntryNotString | Self::VerifyDestTnEntryNotString => {
                "one or more dest tns in request payload is not a string"
            }
            Self::DestTnEntryEmpty | Self::VerifyDestTnEntryEmpty => {
                "one or more dest tns in request payload is an empty string"
            }
            Self::DestTnNotArray | Self::VerifyDestTnNotArray => {
                "dest tn in request payload is not an array"
            }
            Self::DestNotObject | Self::VerifyDestNotObject => {
                "dest field in request payload MUST be a JSON object"
            }
            Self::IdentityEmpty => "identity field in request payload is an empty string",
            Self::IdentityNotString => "identity field in request payload MUST be a string",
            Self::IdentityMissingInfo => {
                "identity header must carry a JWT and an info parameter"
            }
            Self::IdentityMalformedInfo => "info parameter in identity header is malformed",
            Self::IdentityBadAlgParam => "alg parameter in identity header is not \"alg=ES256\"",
            Self::IdentityBadPptParam => "ppt parameter in identity header is not \"ppt=shaken\"",
            Self::JwtNotThreeSegments => "invalid JWT format in identity header",
            Self::X5uInfoMismatch => {
                "x5u in JWT header does not match info parameter in identity header"
            }
            Self::HeaderNotBase64 => "unable to base64 url decode header part of JWT",
            Self::HeaderNotJson => "unable to parse decoded JWT header",
            Self::HeaderWrongFields => {
                "decoded JWT header does not have the expected fields (alg, ppt, typ, x5u)"
            }
            Self::HeaderAlgNotEs256 => "alg field value in JWT header is not \"ES256\"",
            Self::HeaderPptNotShaken => "ppt field value in JWT header is not \"shaken\"",
            Self::HeaderTypNotPassport => "typ field value in JWT header is not \"passport\"",
            Self::HeaderFieldNotString => "one or more JWT header field values is not a string",
            Self::ClaimsNotBase64 => "unable to base64 url decode claims part of JWT",
            Self::ClaimsNotJson => "unable to parse decoded JWT claims",
            Self::OrigTnMismatch => "orig tn in request payload does not match JWT claims",
            Self::DestTnMismatch => "dest tns in request payload do not match JWT claims",
            Self::CertFetchFailed => "unable to fetch certificate referenced by x5u",
            Self::CertReadFailed => "unable to read certificate response body",
            Self::CertNoPemData => "no PEM data is found in certificate",
            Self::CertParseFailed => "unable to parse certificate",
            Self::CertExpired => "certificate has expired or is not yet valid",
            Self::CertUnknownAuthority => "certificate signed by unknown authority",
            Self::CertNotAuthorizedToSign => {
                "certificate is not authorized to sign other certificates"
            }
            Self::CertIssuerMismatch => {
                "issuer name does not match subject from issuing certificate"
            }
            Self::CertChainFailed => "certificate chain verification failed",
            Self::CertNotEcP256 => "certificate public key is not an EC P-256 public key",
            Self::SignatureInvalid => "unable to verify ES256 signature",
            Self::IatStale => "iat in JWT claims is older than the valid period",
            Self::IatInFuture => "iat in JWT claims is in the future",
            Self::ReplayDetected => "replay attack detected",
            Self::HeaderEncodeFailed => "error in converting header to byte array",
            Self::ClaimsEncodeFailed => "error in converting claims to byte array",
            Self::SigningFailed => "error in signing request payload",
        }
    }

    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::SignatureInvalid => StatusCode::UNAUTHORIZED,
            Self::HeaderEncodeFailed | Self::ClaimsEncodeFailed | Self::SigningFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// A failed request, rendered as the action-keyed JSON envelope.
#[derive(Debug)]
pub struct AppError {
    action: Action,
    reason: Reason,
}

impl AppError {
    #[must_use]
    pub const fn new(action: Action, reason: Reason) -> Self {
        Self { action, reason }
    }

    #[must_use]
    pub const fn signing(reason: Reason) -> Self {
        Self::new(Action::Signing, reason)
    }

    #[must_use]
    pub const fn verification(reason: Reason) -> Self {
        Self::new(Action::Verification, reason)
    }

    #[must_use]
    pub const fn reason(&self) -> Reason {
        self.reason
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.reason.status();
        match status.as_u16() {
            400..=499 => tracing::warn!(
                code = self.reason.code(),
                "client error: {}",
                self.reason.message()
            ),
            _ => tracing::error!(
                code = self.reason.code(),
                "server error: {}",
                self.reason.message()
            ),
        }
        let mut envelope = serde_json::Map::new();
        envelope.insert(
            self.action.key().to_owned(),
            json!({ "code": self.reason.code(), "message": self.reason.message() }),
        );
        (status, Json(serde_json::Value::Object(envelope))).into_response()
    }
}
