use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::{Map, Value};
use url::Url;

use crate::errors::{RaAuthError, Result};
use crate::session::{SessionField, SessionUpdate};

/// Access token claim → session field pairs
pub type ClaimMapping = [(&'static str, SessionField)];

/// Claims the Riot access token carries for the session
pub static DEFAULT_CLAIM_MAPPING: &ClaimMapping = &[
    ("sub", SessionField::UserId),
    ("exp", SessionField::ExpiresAt),
];

/// base64url that accepts payloads with or without `=` padding
const URL_SAFE_ANY_PADDING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// URL component the provider put the tokens in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Query,
    Fragment,
}

impl RedirectMode {
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "query" => Ok(Self::Query),
            "fragment" => Ok(Self::Fragment),
            other => Err(RaAuthError::MalformedResponse(format!(
                "unknown redirect mode `{other}`"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Fragment => "fragment",
        }
    }
}

/// Pick the component named by `mode` out of a redirect URI and parse it
pub fn parse_redirect(uri: &str, mode: RedirectMode) -> Result<Vec<(String, String)>> {
    let url = Url::parse(uri)?;
    let component = match mode {
        RedirectMode::Query => url.query(),
        RedirectMode::Fragment => url.fragment(),
    }
    .ok_or_else(|| {
        RaAuthError::MalformedResponse(format!("redirect URI has no {} component", mode.as_str()))
    })?;

    Ok(parse_pairs(component))
}

/// Ordered `key=value` pairs of a form-encoded string; blank values are dropped
pub fn parse_pairs(encoded: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(encoded.as_bytes())
        .into_owned()
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

/// Read claims out of the payload segment of an access token.
///
/// The signature is not checked. The claims are only as trustworthy as the
/// TLS connection the token arrived over.
pub fn extract_claims(access_token: &str, mapping: &ClaimMapping) -> Result<SessionUpdate> {
    let segments: Vec<&str> = access_token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(RaAuthError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let decoded = URL_SAFE_ANY_PADDING
        .decode(payload)
        .map_err(|e| RaAuthError::MalformedToken(format!("payload is not base64url: {e}")))?;
    let claims: Map<String, Value> = serde_json::from_slice(&decoded)
        .map_err(|e| RaAuthError::MalformedToken(format!("payload is not a JSON object: {e}")))?;

    let mut update = SessionUpdate::default();
    for (claim, field) in mapping {
        if let Some(value) = claims.get(*claim) {
            update.set_json(*field, value);
        }
    }
    Ok(update)
}
