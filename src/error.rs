//! Error types for the searchable encryption schemes.
//!
//! Lookup misses (unknown search tags, short substring patterns) are not errors: they produce an
//! empty result. Everything in here is either a configuration defect or an integrity fault.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Scheme parameters were rejected before any cryptographic work was done.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A query needs at least one keyword to act as the pivot.
    #[error("query contains no keywords")]
    EmptyQuery,

    /// The group modulus is not usable (too small or even).
    #[error("invalid group modulus")]
    InvalidModulus,

    /// `gcd(a, m) != 1`, so no modular inverse exists.
    #[error("value is not invertible modulo the group order")]
    NotInvertible,

    /// None of the small generator candidates passed the subgroup-order test.
    #[error("no generator found for the given modulus")]
    NoGeneratorFound,

    /// Symmetric encryption of an identifier failed.
    #[error("identifier encryption failed")]
    Encryption,

    /// A ciphertext did not authenticate under the derived key, or did not decode.
    ///
    /// This never happens for honestly built indices and indicates a key/tag mismatch.
    #[error("integrity fault: ciphertext does not match the derived key")]
    Integrity,

    /// Persisted state could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = Error::InvalidConfig("q_min must be at least 2".to_string());
        let msg = err.to_string();
        assert!(msg.contains("invalid configuration"));
        assert!(msg.contains("q_min"));
    }

    #[test]
    fn test_error_from_bincode() {
        let bad: std::result::Result<Vec<u8>, _> = bincode::deserialize::<Vec<u8>>(&[0xff]);
        let err: Error = bad.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
