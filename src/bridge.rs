//! Host-bridge call contract
//!
//! Field-exact request/response shapes for the embedding platform: a
//! `"check"` call carries `{url, fingerprints, headers, timeout, type}` and
//! resolves to either the literal `"CONNECTION_SECURE"` token or a
//! `{code, message, detail}` error. Unrecognized methods report
//! not-implemented rather than an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ErrorKind, VerificationOutcome};
use crate::service::VerifierService;
use crate::verifier::VerificationRequest;

pub const METHOD_CHECK: &str = "check";
pub const CONNECTION_SECURE: &str = "CONNECTION_SECURE";
pub const NOT_IMPLEMENTED: &str = "NOT_IMPLEMENTED";

/// Arguments of a `"check"` call.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckArgs {
    pub url: String,
    #[serde(default)]
    pub fingerprints: Vec<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub timeout: u64,
    #[serde(rename = "type")]
    pub algorithm: String,
}

impl From<CheckArgs> for VerificationRequest {
    fn from(args: CheckArgs) -> Self {
        Self {
            url: args.url,
            fingerprints: args.fingerprints,
            headers: args.headers,
            timeout: args.timeout,
            algorithm: args.algorithm,
        }
    }
}

/// Reply sent back across the bridge.
///
/// Serializes untagged: success and not-implemented are bare strings,
/// failures are `{code, message, detail}` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    Token(String),
    Error {
        code: String,
        message: String,
        detail: String,
    },
}

impl BridgeResponse {
    pub fn secure() -> Self {
        Self::Token(CONNECTION_SECURE.to_string())
    }

    pub fn not_implemented() -> Self {
        Self::Token(NOT_IMPLEMENTED.to_string())
    }

    fn invalid_arguments(cause: impl Into<String>) -> Self {
        let kind = ErrorKind::UnknownError;
        Self::Error {
            code: kind.code().to_string(),
            message: kind.default_message().to_string(),
            detail: cause.into(),
        }
    }
}

impl From<VerificationOutcome> for BridgeResponse {
    fn from(outcome: VerificationOutcome) -> Self {
        match outcome {
            VerificationOutcome::Secure => Self::secure(),
            VerificationOutcome::Failure {
                kind,
                message,
                detail,
            } => Self::Error {
                code: kind.code().to_string(),
                message,
                detail,
            },
        }
    }
}

/// Dispatch one bridge call against the verification service.
pub async fn handle_call(
    service: &VerifierService,
    method: &str,
    arguments: Value,
) -> BridgeResponse {
    match method {
        METHOD_CHECK => {
            let args: CheckArgs = match serde_json::from_value(arguments) {
                Ok(args) => args,
                Err(e) => return BridgeResponse::invalid_arguments(e.to_string()),
            };
            service.submit(args.into()).await.into()
        }
        other => {
            debug!(method = other, "unrecognized bridge method");
            BridgeResponse::not_implemented()
        }
    }
}
