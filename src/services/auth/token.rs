//! Bearer token verification pipeline (compact JWS, HS256).
//!
//! Each stage consumes the previous one, so claims can only be read from a token whose
//! header and signature have already been checked:
//!
//! ```text
//! &str ──parse──▶ ParsedToken ──check_header──▶ HeaderChecked
//!      ──verify_signature──▶ SignatureVerified ──check_claims──▶ Claims
//! ```

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use josekit::jwk::Jwk;
use josekit::jws::{HS256, JwsVerifier as _};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// The only signing algorithm accepted.
pub const SUPPORTED_ALGORITHM: Algorithm = Algorithm::HS256;

const MANDATORY_CLAIMS: [&str; 3] = ["iss", "sub", "aud"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Header,
    Signature,
    Claims,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(&'static str),
    #[error("unsupported algorithm: {0:?}")]
    UnsupportedAlgorithm(String),
    #[error("verification key unavailable: {0}")]
    KeyUnavailable(String),
    #[error("signature mismatch")]
    BadSignature,
    #[error("claims payload is not a json object")]
    InvalidPayload,
    #[error("missing claim: {0}")]
    MissingClaim(&'static str),
    #[error("invalid claim: {0}")]
    InvalidClaim(&'static str),
    #[error("audience mismatch")]
    AudienceMismatch,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("token issued in the future")]
    IssuedInFuture,
}

impl TokenError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Malformed(_) => Stage::Parse,
            Self::UnsupportedAlgorithm(_) => Stage::Header,
            Self::KeyUnavailable(_) | Self::BadSignature => Stage::Signature,
            Self::InvalidPayload
            | Self::MissingClaim(_)
            | Self::InvalidClaim(_)
            | Self::AudienceMismatch
            | Self::Expired
            | Self::NotYetValid
            | Self::IssuedInFuture => Stage::Claims,
        }
    }
}

/// JOSE header. `alg` is kept as text so unknown values reach the header check.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
}

/// Verified claim set handed to handlers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get("iss").and_then(Value::as_str)
    }
}

/// Claim expectations. Leeway widens every time comparison.
#[derive(Debug, Clone)]
pub struct ClaimPolicy {
    pub audience: String,
    pub leeway_seconds: i64,
}

#[derive(Debug)]
pub struct ParsedToken {
    header: TokenHeader,
    signing_input: String,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

#[derive(Debug)]
pub struct HeaderChecked(ParsedToken);

#[derive(Debug)]
pub struct SignatureVerified(ParsedToken);

impl ParsedToken {
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed("expected three segments"));
        };

        if header.is_empty() || payload.is_empty() {
            return Err(TokenError::Malformed("empty segment"));
        }

        let header_json = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| TokenError::Malformed("header is not base64url"))?;
        let parsed_header: TokenHeader = serde_json::from_slice(&header_json)
            .map_err(|_| TokenError::Malformed("header is not a jose header"))?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed("payload is not base64url"))?;
        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed("signature is not base64url"))?;

        Ok(Self {
            header: parsed_header,
            signing_input: format!("{header}.{payload}"),
            payload: payload_bytes,
            signature: signature_bytes,
        })
    }

    pub fn check_header(self) -> Result<HeaderChecked, TokenError> {
        match self.header.alg.parse::<Algorithm>() {
            Ok(alg) if alg == SUPPORTED_ALGORITHM => Ok(HeaderChecked(self)),
            _ => Err(TokenError::UnsupportedAlgorithm(self.header.alg)),
        }
    }
}

impl HeaderChecked {
    pub fn verify_signature(self, key: &Jwk) -> Result<SignatureVerified, TokenError> {
        let verifier = HS256
            .verifier_from_jwk(key)
            .map_err(|e| TokenError::KeyUnavailable(e.to_string()))?;

        verifier
            .verify(self.0.signing_input.as_bytes(), &self.0.signature)
            .map_err(|_| TokenError::BadSignature)?;

        Ok(SignatureVerified(self.0))
    }
}

impl SignatureVerified {
    /// `now` is unix seconds.
    pub fn check_claims(self, policy: &ClaimPolicy, now: i64) -> Result<Claims, TokenError> {
        let Value::Object(claims) =
            serde_json::from_slice(&self.0.payload).map_err(|_| TokenError::InvalidPayload)?
        else {
            return Err(TokenError::InvalidPayload);
        };

        for name in MANDATORY_CLAIMS {
            if !claims.contains_key(name) {
                return Err(TokenError::MissingClaim(name));
            }
        }

        if !audience_matches(&claims["aud"], &policy.audience) {
            return Err(TokenError::AudienceMismatch);
        }

        let leeway = policy.leeway_seconds;
        if let Some(iat) = numeric_claim(&claims, "iat")? {
            if now < iat.saturating_sub(leeway) {
                return Err(TokenError::IssuedInFuture);
            }
        }
        if let Some(nbf) = numeric_claim(&claims, "nbf")? {
            if now < nbf.saturating_sub(leeway) {
                return Err(TokenError::NotYetValid);
            }
        }
        if let Some(exp) = numeric_claim(&claims, "exp")? {
            if now > exp.saturating_add(leeway) {
                return Err(TokenError::Expired);
            }
        }

        Ok(Claims(claims))
    }
}

fn audience_matches(aud: &Value, expected: &str) -> bool {
    match aud {
        Value::String(s) => s == expected,
        Value::Array(values) => values.iter().any(|v| v.as_str() == Some(expected)),
        _ => false,
    }
}

fn numeric_claim(claims: &Map<String, Value>, name: &'static str) -> Result<Option<i64>, TokenError> {
    match claims.get(name) {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f.floor() as i64))
            .map(Some)
            .ok_or(TokenError::InvalidClaim(name)),
    }
}
