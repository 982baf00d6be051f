use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::TOKEN_EXPIRY_SKEW;
use crate::errors::{RaAuthError, Result};

/// The attributes of a [`CredentialSession`] that outside data may set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    AccessToken,
    TokenType,
    IdToken,
    Scope,
    ExpiresAt,
    UserId,
    EntitlementsToken,
}

impl SessionField {
    pub const ALL: [SessionField; 7] = [
        Self::AccessToken,
        Self::TokenType,
        Self::IdToken,
        Self::Scope,
        Self::ExpiresAt,
        Self::UserId,
        Self::EntitlementsToken,
    ];

    /// Key used for the field in redirect parameters
    pub fn name(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::TokenType => "token_type",
            Self::IdToken => "id_token",
            Self::Scope => "scope",
            Self::ExpiresAt => "expires_at",
            Self::UserId => "user_id",
            Self::EntitlementsToken => "entitlements_token",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

/// A set of optional values to assign to a session in one step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub id_token: Option<String>,
    pub scope: Option<String>,
    pub expires_at: Option<i64>,
    pub user_id: Option<String>,
    pub entitlements_token: Option<String>,
}

impl SessionUpdate {
    /// Keep the pairs whose key names a session field, drop the rest
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut update = Self::default();
        for (key, value) in pairs {
            match SessionField::from_name(&key) {
                Some(field) => update.set_str(field, value),
                None => debug!(key = %key, "Ignoring unrecognized redirect parameter"),
            }
        }
        update
    }

    pub fn set_str(&mut self, field: SessionField, value: String) {
        match field {
            SessionField::AccessToken => self.access_token = Some(value),
            SessionField::TokenType => self.token_type = Some(value),
            SessionField::IdToken => self.id_token = Some(value),
            SessionField::Scope => self.scope = Some(value),
            SessionField::ExpiresAt => self.expires_at = value.parse().ok(),
            SessionField::UserId => self.user_id = Some(value),
            SessionField::EntitlementsToken => self.entitlements_token = Some(value),
        }
    }

    pub fn set_json(&mut self, field: SessionField, value: &Value) {
        match (field, value) {
            (_, Value::Null) => {}
            (SessionField::ExpiresAt, Value::Number(n)) => {
                self.expires_at = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64));
            }
            (field, Value::String(s)) => self.set_str(field, s.clone()),
            (field, other) => self.set_str(field, other.to_string()),
        }
    }

    /// Values from `other` win where both are set
    pub fn merge(self, other: SessionUpdate) -> Self {
        Self {
            access_token: other.access_token.or(self.access_token),
            token_type: other.token_type.or(self.token_type),
            id_token: other.id_token.or(self.id_token),
            scope: other.scope.or(self.scope),
            expires_at: other.expires_at.or(self.expires_at),
            user_id: other.user_id.or(self.user_id),
            entitlements_token: other.entitlements_token.or(self.entitlements_token),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Credentials of one login lifecycle.
///
/// Starts empty and is only changed by the authentication client after a
/// flow finished. Token material is wiped from memory on drop.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CredentialSession {
    access_token: Option<String>,
    token_type: Option<String>,
    id_token: Option<String>,
    scope: Option<String>,
    expires_at: i64,
    user_id: Option<String>,
    entitlements_token: Option<String>,
}

impl CredentialSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Epoch seconds the access token stops being valid, 0 if unknown
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        match self.expires_at {
            0 => None,
            secs => DateTime::from_timestamp(secs, 0),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn entitlements_token(&self) -> Option<&str> {
        self.entitlements_token.as_deref()
    }

    /// Assign the fields set in `update`.
    ///
    /// A new access token invalidates everything derived from the old one:
    /// expiry and entitlements are reset unless `update` carries them too.
    pub(crate) fn apply(&mut self, update: SessionUpdate) {
        if let Some(access_token) = update.access_token {
            if self.access_token.as_ref() != Some(&access_token) {
                self.expires_at = 0;
                self.entitlements_token = None;
            }
            self.access_token = Some(access_token);
        }
        if let Some(token_type) = update.token_type {
            self.token_type = Some(token_type);
        }
        if let Some(id_token) = update.id_token {
            self.id_token = Some(id_token);
        }
        if let Some(scope) = update.scope {
            self.scope = Some(scope);
        }
        if let Some(expires_at) = update.expires_at {
            self.expires_at = expires_at;
        }
        if let Some(user_id) = update.user_id {
            self.user_id = Some(user_id);
        }
        if let Some(entitlements_token) = update.entitlements_token {
            self.entitlements_token = Some(entitlements_token);
        }
    }

    /// Check if the access token is missing or past its expiry
    pub fn is_expired(&self) -> bool {
        self.access_token.is_none() || Utc::now().timestamp() >= self.expires_at
    }

    /// Check if the access token should be refreshed via reauthorization
    pub fn needs_refresh(&self) -> bool {
        let skew = TOKEN_EXPIRY_SKEW.as_secs() as i64;
        self.access_token.is_none() || Utc::now().timestamp() + skew >= self.expires_at
    }

    /// `Authorization` header value, `Bearer` when the provider sent no type
    pub fn authorization_header(&self) -> Option<String> {
        let access_token = self.access_token.as_deref()?;
        let token_type = self.token_type.as_deref().unwrap_or("Bearer");
        Some(format!("{token_type} {access_token}"))
    }

    /// Headers downstream game services expect from an authenticated client
    pub fn downstream_headers(&self, client_platform: &str) -> Result<HeaderMap> {
        let authorization = self
            .authorization_header()
            .ok_or_else(|| RaAuthError::MalformedResponse("no access token yet".to_string()))?;
        let entitlements = self
            .entitlements_token
            .as_deref()
            .ok_or_else(|| RaAuthError::MalformedResponse("no entitlements token yet".to_string()))?;

        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&authorization)?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        let mut entitlements = HeaderValue::from_str(entitlements)?;
        entitlements.set_sensitive(true);
        headers.insert("x-riot-entitlements-jwt", entitlements);
        headers.insert("x-riot-clientplatform", HeaderValue::from_str(client_platform)?);
        Ok(headers)
    }
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() { "[REDACTED]" } else { "None" }
}

impl std::fmt::Debug for CredentialSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSession")
            .field("access_token", &redact(&self.access_token))
            .field("token_type", &self.token_type)
            .field("id_token", &redact(&self.id_token))
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .field("user_id", &self.user_id)
            .field("entitlements_token", &redact(&self.entitlements_token))
            .finish()
    }
}
