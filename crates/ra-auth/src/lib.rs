//! Riot client authentication
//!
//! This crate logs a Riot account in the way the official Riot client does
//! and yields the short-lived tokens downstream game APIs expect.
//!
//! # Authentication Flow
//!
//! The authentication flow consists of several steps:
//!
//! 1. Open an authorization session (sets the session cookies)
//! 2. Submit username and password
//! 3. Read the access and ID tokens from the redirect URI in the answer
//! 4. Decode the access token claims (user id, expiry)
//! 5. Exchange the access token for an entitlements token
//!
//! Every request goes out over the fingerprinted TLS config from `ra-tls`,
//! with the official client's headers and user agent.
//!
//! # Example
//!
//! ```no_run
//! use ra_auth::{RaAuthConfig, RiotAuthClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ra_auth::RaAuthError> {
//!     let mut client = RiotAuthClient::with_official_fingerprint(RaAuthConfig::official())?;
//!
//!     client.authorize("username", "password", false).await?;
//!     let session = client.session();
//!     println!("User ID: {:?}", session.user_id());
//!
//!     // Later, refresh the tokens without sending the password again
//!     if session.needs_refresh() {
//!         client.reauthorize().await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Sharing the TLS context
//!
//! Building the fingerprinted config is deterministic, so it is done once and
//! shared between clients. Each client keeps its own cookie jar and session.
//!
//! ```
//! use std::sync::Arc;
//! use ra_auth::{RaAuthConfig, RiotAuthClient, AuthState};
//! use ra_tls::{build_tls_context, RIOT_CLIENT_PROFILE};
//!
//! # async fn example() -> Result<(), ra_auth::RaAuthError> {
//! let tls = Arc::new(build_tls_context(&RIOT_CLIENT_PROFILE)?);
//! let alice = RiotAuthClient::new(RaAuthConfig::official(), Arc::clone(&tls))?;
//! let bob = RiotAuthClient::new(RaAuthConfig::official(), tls)?;
//!
//! assert_eq!(alice.state(), AuthState::Idle);
//! assert!(bob.session().access_token().is_none());
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```
//!
//! # Important Notes
//!
//! - Multifactor authentication is not supported and fails with `UnsupportedFlow`
//! - Tokens are kept in memory only and should never be logged
//! - The access token claims are decoded without signature verification

pub mod claims;
pub mod client;
pub mod config;
pub mod entitlements;
pub mod errors;
pub mod http;
pub mod models;
pub mod session;

// Re-export main types
pub use claims::{ClaimMapping, DEFAULT_CLAIM_MAPPING, RedirectMode, extract_claims, parse_redirect};
pub use client::{AuthState, RiotAuthClient};
pub use config::{Endpoints, HttpTimeouts, RaAuthConfig};
pub use errors::{RaAuthError, Result};
pub use http::{HttpResponse, HttpSession};
pub use models::AuthorizationResult;
pub use session::{CredentialSession, SessionField, SessionUpdate};
