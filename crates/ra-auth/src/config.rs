use std::time::Duration;

use url::Url;

use crate::claims::{ClaimMapping, DEFAULT_CLAIM_MAPPING};

/// Riot authentication endpoints
pub mod endpoints {
    pub const AUTHORIZATION: &str = "https://auth.riotgames.com/api/v1/authorization";
    pub const ENTITLEMENTS: &str = "https://entitlements.auth.riotgames.com/api/token/v1";

    pub const AUTHORIZATION_PATH: &str = "/api/v1/authorization";
    pub const ENTITLEMENTS_PATH: &str = "/api/token/v1";
}

/// Values the official Riot client sends
pub mod official {
    pub const CLIENT_ID: &str = "riot-client";
    /// Marker the provider embeds tokens into; nothing listens there
    pub const REDIRECT_URI: &str = "http://localhost/redirect";
    pub const RESPONSE_TYPE: &str = "token id_token";
    pub const SCOPE: &str = "openid link ban lol_region account";
    pub const LANGUAGE: &str = "en_US";

    pub const CLIENT_VERSION: &str = "53.0.0.4494832.4470164";
    pub const USER_AGENT_TAG: &str = "rso-auth";
    pub const CLIENT_PLATFORM: &str = "ew0KCSJwbGF0Zm9ybVR5cGUiOiAiUEMiLA0KCSJwbGF0Zm9ybU9TIjogIldpbmRvd3MiLA0KCSJwbGF0Zm9ybU9TVmVyc2lvbiI6ICIxMC4wLjE5MDQyLjEuMjU2LjY0Yml0IiwNCgkicGxhdGZvcm1DaGlwc2V0IjogIlVua25vd24iDQp9";

    /// Headers sent with every request, in the order the client sends them
    pub const ACCEPT_ENCODING: &str = "deflate, gzip, zstd";
    pub const CACHE_CONTROL: &str = "no-cache";
    pub const ACCEPT: &str = "application/json";
}

/// Length of the nonce sent when opening an authorization session
pub const NONCE_LENGTH: usize = 22;

/// Time skew for token expiration (refresh 5 minutes early)
pub const TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(300);

/// Riot client user agent with `tag` naming the client subsystem
pub fn riot_client_user_agent(version: &str, tag: &str) -> String {
    format!("RiotClient/{version} {tag} (Windows;10;;Professional, x64)")
}

/// Where the authentication flow sends its requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub authorization: Url,
    pub entitlements: Url,
}

impl Endpoints {
    pub fn official() -> Self {
        Self {
            authorization: Url::parse(endpoints::AUTHORIZATION).expect("valid authorization URL"),
            entitlements: Url::parse(endpoints::ENTITLEMENTS).expect("valid entitlements URL"),
        }
    }

    /// Same paths as the official endpoints on other hosts
    pub fn with_base_urls(authorization_base: &str, entitlements_base: &str) -> crate::Result<Self> {
        Ok(Self {
            authorization: Url::parse(authorization_base)?.join(endpoints::AUTHORIZATION_PATH)?,
            entitlements: Url::parse(entitlements_base)?.join(endpoints::ENTITLEMENTS_PATH)?,
        })
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::official()
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

/// Configuration for RiotAuthClient
#[derive(Debug, Clone)]
pub struct RaAuthConfig {
    pub endpoints: Endpoints,

    /// OAuth client ID (use official::CLIENT_ID)
    pub client_id: String,

    /// Redirect URI the tokens get attached to
    pub redirect_uri: String,

    pub scope: String,

    /// Locale sent with the credentials
    pub language: String,

    /// Full user agent header value
    pub user_agent: String,

    /// HTTP client timeouts
    pub http_timeouts: HttpTimeouts,

    /// Claims copied from the access token onto the session
    pub claim_mapping: &'static ClaimMapping,
}

impl RaAuthConfig {
    /// Create config matching the official Riot client
    pub fn official() -> Self {
        Self {
            endpoints: Endpoints::official(),
            client_id: official::CLIENT_ID.to_string(),
            redirect_uri: official::REDIRECT_URI.to_string(),
            scope: official::SCOPE.to_string(),
            language: official::LANGUAGE.to_string(),
            user_agent: riot_client_user_agent(official::CLIENT_VERSION, official::USER_AGENT_TAG),
            http_timeouts: HttpTimeouts::default(),
            claim_mapping: DEFAULT_CLAIM_MAPPING,
        }
    }

    /// Official config talking to other hosts, e.g. a local test double
    pub fn with_base_urls(authorization_base: &str, entitlements_base: &str) -> crate::Result<Self> {
        Ok(Self {
            endpoints: Endpoints::with_base_urls(authorization_base, entitlements_base)?,
            ..Self::official()
        })
    }
}

impl Default for RaAuthConfig {
    fn default() -> Self {
        Self::official()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_official_user_agent() {
        let config = RaAuthConfig::official();
        assert_eq!(
            config.user_agent,
            "RiotClient/53.0.0.4494832.4470164 rso-auth (Windows;10;;Professional, x64)"
        );
    }

    #[test]
    fn test_base_urls_keep_paths() {
        let config = RaAuthConfig::with_base_urls("http://127.0.0.1:4000", "http://127.0.0.1:5000/")
            .unwrap();
        assert_eq!(
            config.endpoints.authorization.as_str(),
            "http://127.0.0.1:4000/api/v1/authorization"
        );
        assert_eq!(
            config.endpoints.entitlements.as_str(),
            "http://127.0.0.1:5000/api/token/v1"
        );
        assert_eq!(config.client_id, official::CLIENT_ID);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(RaAuthConfig::with_base_urls("not a url", "http://localhost").is_err());
    }
}
