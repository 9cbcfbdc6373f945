//! Error taxonomy and verification outcomes

use thiserror::Error;

/// Classification of a failed verification attempt.
///
/// Every failure path in the verifier terminates in exactly one of these
/// kinds; none is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UrlError,
    NoInternet,
    Timeout,
    NetworkError,
    UnsupportedAlgorithm,
    ConnectionNotSecure,
    UnknownError,
}

impl ErrorKind {
    /// Wire code reported to the host bridge.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UrlError => "URL_ERROR",
            Self::NoInternet => "NO_INTERNET",
            Self::Timeout => "TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::UnsupportedAlgorithm => "UNSUPPORTED_ALGORITHM",
            Self::ConnectionNotSecure => "CONNECTION_NOT_SECURE",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Human-readable message reported alongside the code.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::UrlError => "Malformed URL",
            Self::NoInternet => "No Internet Connection",
            Self::Timeout => "Connection Timeout",
            Self::NetworkError => "Network Error",
            Self::UnsupportedAlgorithm => "Unsupported Hash Algorithm",
            Self::ConnectionNotSecure => "Connection is not secure",
            Self::UnknownError => "An Unknown Error Occurred",
        }
    }
}

#[derive(Error, Debug)]
pub enum PinningError {
    #[error("malformed URL: {0}")]
    Url(String),

    #[error("host resolution failed: {0}")]
    NoInternet(String),

    #[error("connect timeout elapsed")]
    Timeout,

    #[error("network fault: {0}")]
    Network(String),

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("certificate fingerprint is not in the allow-list")]
    NotSecure,

    #[error("unexpected fault: {0}")]
    Unknown(String),
}

impl PinningError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Url(_) => ErrorKind::UrlError,
            Self::NoInternet(_) => ErrorKind::NoInternet,
            Self::Timeout => ErrorKind::Timeout,
            Self::Network(_) => ErrorKind::NetworkError,
            Self::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            Self::NotSecure => ErrorKind::ConnectionNotSecure,
            Self::Unknown(_) => ErrorKind::UnknownError,
        }
    }
}

pub type Result<T> = std::result::Result<T, PinningError>;

/// Final result of one verification attempt.
///
/// Exactly one outcome is produced per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Secure,
    Failure {
        kind: ErrorKind,
        message: String,
        detail: String,
    },
}

impl VerificationOutcome {
    /// Build a failure with the kind's canonical message.
    pub fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: kind.default_message().to_string(),
            detail: detail.into(),
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure)
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Secure => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<PinningError> for VerificationOutcome {
    fn from(err: PinningError) -> Self {
        let detail = match &err {
            PinningError::NotSecure => "Fingerprint doesn't match".to_string(),
            PinningError::Timeout => String::new(),
            PinningError::Url(cause)
            | PinningError::NoInternet(cause)
            | PinningError::Network(cause)
            | PinningError::UnsupportedAlgorithm(cause)
            | PinningError::Unknown(cause) => cause.clone(),
        };
        Self::failure(err.kind(), detail)
    }
}
