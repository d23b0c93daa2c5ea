//! # Key Material Tags
//!
//! The three orthogonal tags that describe a piece of key material, plus the
//! tagged [`KeyMaterial`] value itself:
//!
//! - [`Algorithm`]: which named curve the bytes belong to.
//! - [`Serialization`]: how the bytes are structured (SEC1 point, DER
//!   SubjectPublicKeyInfo, or a bare `X||Y` coordinate pair).
//! - [`Encoding`]: how those bytes are rendered as text.
//!
//! A key either is bound to a curve (the point decoded successfully) or it
//! is an opaque byte string. There is no third, half-decoded state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use spki::ObjectIdentifier;

use super::curve::EcPoint;
use super::error::KeyError;

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// Named elliptic curves understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Secp192r1,
    #[default]
    Secp256r1,
    Secp256k1,
    Secp384r1,
    Secp521r1,
    /// A curve name we do not recognise. Never carries parameters.
    #[serde(other)]
    Unknown,
}

/// Static domain information for a named curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveParams {
    /// Canonical lowercase curve name.
    pub name: &'static str,
    /// Named-curve OID as used in SubjectPublicKeyInfo parameters.
    pub oid: ObjectIdentifier,
    /// Size of a field element (and of one coordinate) in bytes.
    pub field_size: usize,
}

impl CurveParams {
    /// Length of an uncompressed SEC1 point: `1 + 2 * field_size`.
    pub fn uncompressed_len(&self) -> usize {
        1 + 2 * self.field_size
    }

    /// Length of a compressed SEC1 point: `1 + field_size`.
    pub fn compressed_len(&self) -> usize {
        1 + self.field_size
    }
}

const SECP192R1: CurveParams = CurveParams {
    name: "secp192r1",
    oid: ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.1"),
    field_size: 24,
};

const SECP256R1: CurveParams = CurveParams {
    name: "secp256r1",
    oid: ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7"),
    field_size: 32,
};

const SECP256K1: CurveParams = CurveParams {
    name: "secp256k1",
    oid: ObjectIdentifier::new_unwrap("1.3.132.0.10"),
    field_size: 32,
};

const SECP384R1: CurveParams = CurveParams {
    name: "secp384r1",
    oid: ObjectIdentifier::new_unwrap("1.3.132.0.34"),
    field_size: 48,
};

const SECP521R1: CurveParams = CurveParams {
    name: "secp521r1",
    oid: ObjectIdentifier::new_unwrap("1.3.132.0.35"),
    field_size: 66,
};

impl Algorithm {
    /// Every supported curve, in the order used for algorithm auto-detection.
    pub const SUPPORTED: [Algorithm; 5] = [
        Algorithm::Secp192r1,
        Algorithm::Secp256r1,
        Algorithm::Secp256k1,
        Algorithm::Secp384r1,
        Algorithm::Secp521r1,
    ];

    /// Curve parameters, or `None` for [`Algorithm::Unknown`].
    pub fn params(self) -> Option<CurveParams> {
        match self {
            Algorithm::Secp192r1 => Some(SECP192R1),
            Algorithm::Secp256r1 => Some(SECP256R1),
            Algorithm::Secp256k1 => Some(SECP256K1),
            Algorithm::Secp384r1 => Some(SECP384R1),
            Algorithm::Secp521r1 => Some(SECP521R1),
            Algorithm::Unknown => None,
        }
    }

    /// Like [`params`](Self::params) but failing with `UnknownAlgorithm`.
    pub fn require_params(self) -> Result<CurveParams, KeyError> {
        self.params()
            .ok_or_else(|| KeyError::UnknownAlgorithm(self.as_str().to_string()))
    }

    /// Maps a named-curve OID back to its algorithm.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::SUPPORTED
            .into_iter()
            .find(|alg| alg.params().map(|p| &p.oid == oid).unwrap_or(false))
    }

    /// Lenient name parsing: unrecognised names become `Unknown`.
    ///
    /// Accepts the common aliases `p-256`, `prime256v1` and friends so that
    /// configuration written for other tooling still loads.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "secp192r1" | "prime192v1" | "p-192" | "p192" => Algorithm::Secp192r1,
            "secp256r1" | "prime256v1" | "p-256" | "p256" => Algorithm::Secp256r1,
            "secp256k1" | "k256" => Algorithm::Secp256k1,
            "secp384r1" | "p-384" | "p384" => Algorithm::Secp384r1,
            "secp521r1" | "p-521" | "p521" => Algorithm::Secp521r1,
            _ => Algorithm::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Unknown => "unknown",
            known => known.params().map(|p| p.name).unwrap_or("unknown"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Structure of the key bytes, independent of their text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Serialization {
    /// SEC1 point bytes (`0x04||X||Y` when we write them).
    #[default]
    #[serde(rename = "raw")]
    Raw,
    /// DER-encoded SubjectPublicKeyInfo.
    #[serde(rename = "asn1_der")]
    AsnDer,
    /// Bare `X||Y`, each coordinate padded to the field size.
    #[serde(rename = "ecc_x_y")]
    EccXY,
}

impl Serialization {
    pub fn as_str(self) -> &'static str {
        match self {
            Serialization::Raw => "raw",
            Serialization::AsnDer => "asn1_der",
            Serialization::EccXY => "ecc_x_y",
        }
    }
}

impl FromStr for Serialization {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Serialization::Raw),
            "asn1_der" | "asn1" | "der" => Ok(Serialization::AsnDer),
            "ecc_x_y" | "xy" => Ok(Serialization::EccXY),
            other => Err(KeyError::Json(format!("unknown serialization '{other}'"))),
        }
    }
}

impl fmt::Display for Serialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Text encoding of a byte payload. Orthogonal to [`Serialization`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Binary payload with no text form. Rendered as Base64 when text is
    /// unavoidable (JSON).
    None,
    Hex,
    Base32,
    #[default]
    Base64,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::None => "none",
            Encoding::Hex => "hex",
            Encoding::Base32 => "base32",
            Encoding::Base64 => "base64",
        }
    }

    /// The encoding actually used when this one has to produce text.
    pub fn text_form(self) -> Self {
        match self {
            Encoding::None => Encoding::Base64,
            other => other,
        }
    }
}

impl FromStr for Encoding {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Encoding::None),
            "hex" => Ok(Encoding::Hex),
            "base32" => Ok(Encoding::Base32),
            "base64" => Ok(Encoding::Base64),
            other => Err(KeyError::Json(format!("unknown encoding '{other}'"))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// KeyMaterial
// ---------------------------------------------------------------------------

/// Public key material: either bound to a curve or an opaque byte string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// Bytes we could not (or were not asked to) bind to a curve.
    /// Never empty.
    RawBytes(Vec<u8>),
    /// A point that decoded successfully on its curve.
    EllipticCurve(EcPoint),
}

impl KeyMaterial {
    /// Curve of the material, `None` for unbound bytes.
    pub fn algorithm(&self) -> Option<Algorithm> {
        match self {
            KeyMaterial::RawBytes(_) => None,
            KeyMaterial::EllipticCurve(point) => Some(point.algorithm()),
        }
    }

    pub fn point(&self) -> Option<&EcPoint> {
        match self {
            KeyMaterial::RawBytes(_) => None,
            KeyMaterial::EllipticCurve(point) => Some(point),
        }
    }
}
