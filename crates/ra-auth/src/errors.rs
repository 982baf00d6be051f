use thiserror::Error;

/// Riot authentication error types
#[derive(Error, Debug)]
pub enum RaAuthError {
    #[error(transparent)]
    PlatformUnsupported(#[from] ra_tls::TlsError),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("HTTP error {status}: {body_snippet}")]
    Http {
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("Wrong credentials; `{}`", .error.as_deref().unwrap_or("no error code"))]
    InvalidCredentials { error: Option<String> },

    #[error("Unsupported authentication flow: {0}")]
    UnsupportedFlow(String),

    #[error("Malformed access token: {0}")]
    MalformedToken(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl From<reqwest::Error> for RaAuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Network(err)
        }
    }
}

impl RaAuthError {
    /// HTTP status attached to the error, if the provider answered at all
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(err) | Self::Timeout(err) => err.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RaAuthError>;
