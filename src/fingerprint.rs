//! Certificate fingerprint computation and normalization
//!
//! A fingerprint is the hex-encoded digest of a certificate's DER encoding,
//! canonicalized to uppercase with all whitespace and `:` separators removed.

use std::fmt;
use std::str::FromStr;

use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::PinningError;

/// Digest algorithm selected by its wire name (e.g. `"SHA-256"`).
///
/// Parsing is tolerant of case and `-`/`_` punctuation so that the names
/// produced by different host platforms all resolve to the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Compute the fingerprint of `bytes`.
    ///
    /// Pure function of its inputs; the output is already in canonical form
    /// (uppercase hex, two characters per byte, digest byte order).
    pub fn digest(&self, bytes: &[u8]) -> Fingerprint {
        let hex = match self {
            Self::Sha1 => hex::encode_upper(Sha1::digest(bytes)),
            Self::Sha256 => hex::encode_upper(Sha256::digest(bytes)),
            Self::Sha384 => hex::encode_upper(Sha384::digest(bytes)),
            Self::Sha512 => hex::encode_upper(Sha512::digest(bytes)),
        };
        Fingerprint(hex)
    }
}

impl FromStr for HashAlgorithm {
    type Err = PinningError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let canonical: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match canonical.as_str() {
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            "SHA384" => Ok(Self::Sha384),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(PinningError::UnsupportedAlgorithm(name.trim().to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        };
        write!(f, "{}", name)
    }
}

/// A normalized certificate fingerprint.
///
/// Two fingerprints are equal iff their normalized forms are byte-identical,
/// so `" aa:bb:cc "` and `"AABBCC"` compare equal after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Normalize an allow-list entry: uppercase, strip whitespace and `:`.
    pub fn normalize(raw: &str) -> Self {
        let cleaned = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Fingerprint(cleaned)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
