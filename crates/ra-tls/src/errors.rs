use thiserror::Error;

/// Errors raised while turning a fingerprint profile into a TLS client config
#[derive(Error, Debug)]
pub enum TlsError {
    #[error("TLS fingerprint cannot be applied on this platform: {0}")]
    PlatformUnsupported(String),

    #[error("Failed to build certificate verifier: {0}")]
    Verifier(String),
}

pub type Result<T> = std::result::Result<T, TlsError>;
