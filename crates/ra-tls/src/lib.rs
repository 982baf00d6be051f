//! TLS client fingerprinting for the Riot client identity provider
//!
//! The identity provider blocks clients whose TLS handshake does not look like
//! the official Riot client. This crate describes that handshake as a static
//! [`FingerprintProfile`] and turns it into a rustls [`rustls::ClientConfig`].
//!
//! rustls does not implement everything the official client offers (TLS 1.0,
//! CBC suites, SHA-1 signatures). Those entries are never swapped for
//! defaults: they are reported as [`FingerprintGap`]s so callers can see how far
//! the handshake deviates.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ra_tls::{build_tls_context, RIOT_CLIENT_PROFILE};
//!
//! let tls = Arc::new(build_tls_context(&RIOT_CLIENT_PROFILE)?);
//! for gap in tls.gaps() {
//!     println!("not reproducible: {:?} {}", gap.kind, gap.entry);
//! }
//! # Ok::<(), ra_tls::TlsError>(())
//! ```

pub mod context;
pub mod errors;
pub mod profile;

pub use context::{FingerprintGap, GapKind, TlsContext, build_tls_context};
pub use errors::{Result, TlsError};
pub use profile::{FingerprintProfile, RIOT_CLIENT_PROFILE, TlsVersion};
