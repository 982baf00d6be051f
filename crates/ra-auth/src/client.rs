use std::sync::Arc;

use ra_tls::{RIOT_CLIENT_PROFILE, TlsContext, build_tls_context};
use rand::Rng;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{debug, info, instrument, warn};

use crate::claims::{RedirectMode, extract_claims, parse_redirect};
use crate::config::{NONCE_LENGTH, RaAuthConfig, official};
use crate::entitlements::exchange_entitlements;
use crate::errors::{RaAuthError, Result};
use crate::http::{HttpResponse, HttpSession};
use crate::models::{AuthorizationResult, AuthorizationSessionRequest, CredentialsRequest};
use crate::session::{CredentialSession, SessionUpdate};

const NONCE_ALPHABET: &[u8] = b"_abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random nonce in the alphabet the official client uses
pub fn generate_nonce(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| NONCE_ALPHABET[rng.random_range(0..NONCE_ALPHABET.len())] as char)
        .collect()
}

/// Where a client is in the login lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    AwaitingCredentials,
    Authorized,
    Error,
    MfaRequired,
    Reauthorized,
}

/// Authentication client for one Riot account.
///
/// Owns the cookie jar of the authorization session, so the same client must
/// be used for `authorize` and every later `reauthorize`.
#[derive(Debug)]
pub struct RiotAuthClient {
    config: RaAuthConfig,
    http: HttpSession,
    session: CredentialSession,
    state: AuthState,
    query_response_mode: bool,
}

impl RiotAuthClient {
    /// Create a new authentication client on a shared TLS context
    pub fn new(config: RaAuthConfig, tls: Arc<TlsContext>) -> Result<Self> {
        let http = HttpSession::new(tls, &config)?;

        Ok(Self {
            config,
            http,
            session: CredentialSession::new(),
            state: AuthState::Idle,
            query_response_mode: false,
        })
    }

    /// Create a client with its own context built from the official profile
    pub fn with_official_fingerprint(config: RaAuthConfig) -> Result<Self> {
        let tls = Arc::new(build_tls_context(&RIOT_CLIENT_PROFILE)?);
        Self::new(config, tls)
    }

    pub fn session(&self) -> &CredentialSession {
        &self.session
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn config(&self) -> &RaAuthConfig {
        &self.config
    }

    pub fn tls(&self) -> &Arc<TlsContext> {
        self.http.tls()
    }

    /// Log in with username and password.
    ///
    /// On success the session holds fresh access, ID and entitlements tokens.
    /// On any failure the session is left exactly as it was.
    #[instrument(skip(self, password))]
    pub async fn authorize(
        &mut self,
        username: &str,
        password: &str,
        use_query_response_mode: bool,
    ) -> Result<()> {
        info!("Starting authorization");
        self.query_response_mode = use_query_response_mode;
        self.transition(AuthState::AwaitingCredentials);

        let outcome = self.open_and_submit(username, password).await;
        let failure = if matches!(outcome, Ok(AuthorizationResult::MultifactorRequired)) {
            AuthState::MfaRequired
        } else {
            AuthState::Error
        };

        let result = match outcome {
            Ok(outcome) => self.complete(outcome).await,
            Err(e) => Err(e),
        };
        self.finish(result, AuthState::Authorized, failure)
    }

    /// Refresh the tokens through the cookies of the authorization session.
    ///
    /// No credentials are sent. An expired session is reported by the
    /// provider as `InvalidCredentials`.
    #[instrument(skip(self))]
    pub async fn reauthorize(&mut self) -> Result<()> {
        info!("Starting reauthorization");

        let result = match self.open_session().await {
            Ok(response) => match response.json().and_then(AuthorizationResult::classify) {
                Ok(outcome) => self.complete(outcome).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        self.finish(result, AuthState::Reauthorized, AuthState::Error)
    }

    /// Open the authorization session; the answer only matters for its cookies
    async fn open_session(&self) -> Result<HttpResponse> {
        let request = AuthorizationSessionRequest {
            acr_values: String::new(),
            claims: String::new(),
            client_id: self.config.client_id.clone(),
            code_challenge: String::new(),
            code_challenge_method: String::new(),
            nonce: generate_nonce(NONCE_LENGTH),
            redirect_uri: self.config.redirect_uri.clone(),
            response_type: official::RESPONSE_TYPE.to_string(),
            scope: self.config.scope.clone(),
            response_mode: self
                .query_response_mode
                .then(|| RedirectMode::Query.as_str().to_string()),
        };

        debug!("Opening authorization session");
        self.http
            .post(&self.config.endpoints.authorization, &request, HeaderMap::new())
            .await
    }

    async fn open_and_submit(&self, username: &str, password: &str) -> Result<AuthorizationResult> {
        self.open_session().await?;

        let request = CredentialsRequest {
            language: &self.config.language,
            password,
            region: None,
            remember: false,
            kind: "auth",
            username,
        };

        debug!("Submitting credentials");
        let response = self
            .http
            .put(&self.config.endpoints.authorization, &request, HeaderMap::new())
            .await?;
        AuthorizationResult::classify(response.json()?)
    }

    /// Turn a provider outcome into the full session update, entitlements included
    async fn complete(&self, outcome: AuthorizationResult) -> Result<SessionUpdate> {
        let redirect = outcome.into_redirect()?;
        let mode = RedirectMode::parse(&redirect.mode)?;
        debug!(mode = mode.as_str(), "Reading tokens from redirect");

        let pairs = parse_redirect(&redirect.parameters.uri, mode)?;
        let update = SessionUpdate::from_pairs(pairs);
        let access_token = update.access_token.clone().ok_or_else(|| {
            RaAuthError::MalformedResponse("redirect carried no access_token".to_string())
        })?;
        let claims = extract_claims(&access_token, self.config.claim_mapping)?;
        let mut update = update.merge(claims);

        let token_type = update.token_type.as_deref().unwrap_or("Bearer");
        let mut authorization = HeaderValue::from_str(&format!("{token_type} {access_token}"))?;
        authorization.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let entitlements_token =
            exchange_entitlements(&self.http, &self.config.endpoints.entitlements, headers).await?;
        update.entitlements_token = Some(entitlements_token);
        Ok(update)
    }

    fn finish(
        &mut self,
        result: Result<SessionUpdate>,
        success: AuthState,
        failure: AuthState,
    ) -> Result<()> {
        match result {
            Ok(update) => {
                self.session.apply(update);
                self.transition(success);
                info!(
                    user_id = self.session.user_id().unwrap_or_default(),
                    expires_at = self.session.expires_at(),
                    "Authorization complete"
                );
                Ok(())
            }
            Err(e) => {
                warn!("Authorization failed: {}", e);
                self.transition(failure);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: AuthState) {
        debug!(from = ?self.state, to = ?next, "Auth state change");
        self.state = next;
    }
}
