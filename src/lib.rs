//! # Certificate Pinning
//!
//! Leaf-certificate fingerprint pinning over TLS: given a URL, an allow-list
//! of certificate fingerprints, and a hash algorithm, establish a connection,
//! extract the server's leaf certificate, and report whether its digest is in
//! the allow-list.
//!
//! ## Verification Flow
//!
//! 1. Parse the algorithm name and the HTTPS URL
//! 2. Resolve the host and open a TCP connection, bounding the connect phase
//!    by the request timeout when one is set
//! 3. Complete the TLS handshake (handshake only — no application data)
//! 4. Take chain element 0 as the leaf certificate and hash its DER encoding
//! 5. Compare against the normalized allow-list
//!
//! Every failure maps to exactly one [`ErrorKind`]; nothing is retried.
//! Requests run strictly sequentially on a dedicated worker owned by
//! [`VerifierService`], never on the caller's task.
//!
//! Pinning replaces chain validation here: the probe accepts any server
//! certificate in order to read the leaf, and trust comes solely from the
//! fingerprint match. Full X.509 chain validation and revocation checking
//! are out of scope.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cert_pinning::{VerificationRequest, VerifierService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = VerifierService::new();
//!
//!     let request = VerificationRequest {
//!         url: "https://example.com/".into(),
//!         fingerprints: vec!["aa:bb:cc".into()],
//!         headers: Default::default(),
//!         timeout: 10,
//!         algorithm: "SHA-256".into(),
//!     };
//!
//!     let outcome = service.submit(request).await;
//!     println!("secure: {}", outcome.is_secure());
//!
//!     service.shutdown();
//! }
//! ```

pub mod bridge;
pub mod error;
pub mod fingerprint;
pub mod service;
pub mod verifier;

pub use error::{ErrorKind, PinningError, Result, VerificationOutcome};
pub use fingerprint::{Fingerprint, HashAlgorithm};
pub use service::VerifierService;
pub use verifier::{PinningVerifier, VerificationRequest};
