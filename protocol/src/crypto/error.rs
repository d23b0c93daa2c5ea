//! Error taxonomy for key material parsing and construction.
//!
//! Every parse path in [`crate::crypto`] returns one of these instead of
//! panicking, so that bulk loaders can skip a bad key and keep going. Curve
//! library errors are mapped into this enum at the boundary where they occur.
//!
//! Messages describe *what* was wrong with the input, never the key bytes
//! themselves.

use thiserror::Error;

use super::material::Encoding;

/// Errors that can occur while parsing, validating or building key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Bytes do not decode as a valid point or ASN.1 structure on the
    /// stated or detected curve.
    #[error("invalid key format: {0}")]
    InvalidFormat(String),

    /// An X or Y coordinate is missing, empty, or does not form a point.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// More than one text encoding decodes the input and no tie-break rule
    /// applies.
    #[error("ambiguous encoding: input decodes as {}", format_encodings(.0))]
    AmbiguousEncoding(Vec<Encoding>),

    /// No supported encoding produced decodable bytes.
    #[error("unparseable key material: {0}")]
    Unparseable(String),

    /// The curve name or OID does not map to supported curve parameters.
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The private half of a key pair cannot be bound to the curve.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The public half of a key pair cannot be bound to the curve.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Both halves decode, but the public point is not `private * G`.
    #[error("key pair mismatch: public key does not match private key")]
    KeyPairMismatch,

    /// The JSON representation is structurally wrong (missing fields,
    /// wrong types).
    #[error("invalid key JSON: {0}")]
    Json(String),
}

fn format_encodings(encodings: &[Encoding]) -> String {
    encodings
        .iter()
        .map(|e| e.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
