use serde::{Deserialize, Serialize};

use crate::errors::{RaAuthError, Result};

/// Opens (or, with valid cookies, resumes) an authorization session
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationSessionRequest {
    pub acr_values: String,
    pub claims: String,
    pub client_id: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub nonce: String,
    pub redirect_uri: String,
    pub response_type: String,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mode: Option<String>,
}

/// Username/password submission
#[derive(Debug, Clone, Serialize)]
pub struct CredentialsRequest<'a> {
    pub language: &'a str,
    pub password: &'a str,
    pub region: Option<&'a str>,
    pub remember: bool,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub username: &'a str,
}

/// Body of both the session and the credentials responses
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub response: Option<RedirectResponse>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RedirectResponse {
    pub mode: String,
    pub parameters: RedirectParameters,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RedirectParameters {
    pub uri: String,
}

/// Entitlements token response
#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementsResponse {
    #[serde(default)]
    pub entitlements_token: Option<String>,
}

/// What the provider made of a credential submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    Success(RedirectResponse),
    InvalidCredentials { error: Option<String> },
    MultifactorRequired,
    Unknown(String),
}

impl AuthorizationResult {
    /// Classify a decoded response body by its `type` field
    pub fn classify(body: serde_json::Value) -> Result<Self> {
        let response: AuthorizationResponse = serde_json::from_value(body).map_err(|e| {
            RaAuthError::MalformedResponse(format!("unexpected authorization body: {e}"))
        })?;

        Ok(match response.kind.as_str() {
            "response" => Self::Success(response.response.ok_or_else(|| {
                RaAuthError::MalformedResponse("response type without redirect data".to_string())
            })?),
            "auth" => Self::InvalidCredentials {
                error: response.error,
            },
            "multifactor" => Self::MultifactorRequired,
            _ => Self::Unknown(response.kind),
        })
    }

    /// Turn every outcome but a redirect into its error
    pub fn into_redirect(self) -> Result<RedirectResponse> {
        match self {
            Self::Success(redirect) => Ok(redirect),
            Self::InvalidCredentials { error } => Err(RaAuthError::InvalidCredentials { error }),
            Self::MultifactorRequired => Err(RaAuthError::UnsupportedFlow(
                "multifactor authentication not supported".to_string(),
            )),
            Self::Unknown(kind) => Err(RaAuthError::UnsupportedFlow(format!(
                "unhandled auth response type: {kind}"
            ))),
        }
    }
}
