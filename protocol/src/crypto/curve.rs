//! # Curve Points and Scalars
//!
//! Thin typed wrappers over the RustCrypto curve crates. Each supported
//! curve gets one variant, so a decoded point can never end up paired with
//! the wrong domain parameters.
//!
//! All fallible operations map curve-library errors into [`KeyError`] here,
//! at the boundary. Nothing in this module panics on untrusted input.

use std::fmt;

use elliptic_curve::sec1::ToEncodedPoint;
use elliptic_curve::{PublicKey, SecretKey};
use k256::Secp256k1;
use p192::NistP192;
use p256::NistP256;
use p384::NistP384;
use p521::NistP521;
use rand::rngs::OsRng;

use super::error::KeyError;
use super::material::Algorithm;

// ---------------------------------------------------------------------------
// EcPoint
// ---------------------------------------------------------------------------

/// A public point that decoded successfully on its curve.
#[derive(Clone, PartialEq, Eq)]
pub enum EcPoint {
    Secp192r1(PublicKey<NistP192>),
    Secp256r1(PublicKey<NistP256>),
    Secp256k1(PublicKey<Secp256k1>),
    Secp384r1(PublicKey<NistP384>),
    Secp521r1(PublicKey<NistP521>),
}

impl EcPoint {
    /// Decodes SEC1 bytes (compressed or uncompressed) on `algorithm`.
    pub fn from_sec1(algorithm: Algorithm, bytes: &[u8]) -> Result<Self, KeyError> {
        let invalid = |_: elliptic_curve::Error| {
            KeyError::InvalidFormat(format!(
                "{} bytes are not a point on {}",
                bytes.len(),
                algorithm
            ))
        };

        match algorithm {
            Algorithm::Secp192r1 => PublicKey::from_sec1_bytes(bytes)
                .map(Self::Secp192r1)
                .map_err(invalid),
            Algorithm::Secp256r1 => PublicKey::from_sec1_bytes(bytes)
                .map(Self::Secp256r1)
                .map_err(invalid),
            Algorithm::Secp256k1 => PublicKey::from_sec1_bytes(bytes)
                .map(Self::Secp256k1)
                .map_err(invalid),
            Algorithm::Secp384r1 => PublicKey::from_sec1_bytes(bytes)
                .map(Self::Secp384r1)
                .map_err(invalid),
            Algorithm::Secp521r1 => PublicKey::from_sec1_bytes(bytes)
                .map(Self::Secp521r1)
                .map_err(invalid),
            Algorithm::Unknown => Err(KeyError::UnknownAlgorithm(algorithm.to_string())),
        }
    }

    /// Rebuilds a point from two big-endian coordinates that are already
    /// padded to the field size.
    pub fn from_coordinates(algorithm: Algorithm, x: &[u8], y: &[u8]) -> Result<Self, KeyError> {
        let mut sec1 = Vec::with_capacity(1 + x.len() + y.len());
        sec1.push(0x04);
        sec1.extend_from_slice(x);
        sec1.extend_from_slice(y);
        Self::from_sec1(algorithm, &sec1)
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            EcPoint::Secp192r1(_) => Algorithm::Secp192r1,
            EcPoint::Secp256r1(_) => Algorithm::Secp256r1,
            EcPoint::Secp256k1(_) => Algorithm::Secp256k1,
            EcPoint::Secp384r1(_) => Algorithm::Secp384r1,
            EcPoint::Secp521r1(_) => Algorithm::Secp521r1,
        }
    }

    /// SEC1 encoding of the point.
    pub fn to_sec1(&self, compress: bool) -> Vec<u8> {
        match self {
            EcPoint::Secp192r1(pk) => pk.to_encoded_point(compress).as_bytes().to_vec(),
            EcPoint::Secp256r1(pk) => pk.to_encoded_point(compress).as_bytes().to_vec(),
            EcPoint::Secp256k1(pk) => pk.to_encoded_point(compress).as_bytes().to_vec(),
            EcPoint::Secp384r1(pk) => pk.to_encoded_point(compress).as_bytes().to_vec(),
            EcPoint::Secp521r1(pk) => pk.to_encoded_point(compress).as_bytes().to_vec(),
        }
    }

    /// Uncompressed `0x04||X||Y`.
    pub fn to_uncompressed(&self) -> Vec<u8> {
        self.to_sec1(false)
    }

    /// `(X, Y)`, each exactly `field_size` bytes.
    pub fn coordinates(&self) -> (Vec<u8>, Vec<u8>) {
        let sec1 = self.to_uncompressed();
        let coords = &sec1[1..];
        let half = coords.len() / 2;
        (coords[..half].to_vec(), coords[half..].to_vec())
    }
}

impl fmt::Debug for EcPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = hex::encode(self.to_sec1(true));
        write!(f, "EcPoint({}, {}..)", self.algorithm(), &hex_str[..16])
    }
}

// ---------------------------------------------------------------------------
// EcScalar
// ---------------------------------------------------------------------------

/// A private scalar bound to its curve.
///
/// `Debug` intentionally prints only the curve. Key bytes never reach logs.
#[derive(Clone)]
pub enum EcScalar {
    Secp192r1(SecretKey<NistP192>),
    Secp256r1(SecretKey<NistP256>),
    Secp256k1(SecretKey<Secp256k1>),
    Secp384r1(SecretKey<NistP384>),
    Secp521r1(SecretKey<NistP521>),
}

impl EcScalar {
    /// Fresh scalar from the OS RNG.
    pub fn random(algorithm: Algorithm) -> Result<Self, KeyError> {
        let mut rng = OsRng;
        match algorithm {
            Algorithm::Secp192r1 => Ok(Self::Secp192r1(SecretKey::random(&mut rng))),
            Algorithm::Secp256r1 => Ok(Self::Secp256r1(SecretKey::random(&mut rng))),
            Algorithm::Secp256k1 => Ok(Self::Secp256k1(SecretKey::random(&mut rng))),
            Algorithm::Secp384r1 => Ok(Self::Secp384r1(SecretKey::random(&mut rng))),
            Algorithm::Secp521r1 => Ok(Self::Secp521r1(SecretKey::random(&mut rng))),
            Algorithm::Unknown => Err(KeyError::UnknownAlgorithm(algorithm.to_string())),
        }
    }

    /// Parses a big-endian unsigned integer as a scalar on `algorithm`.
    ///
    /// Shorter input is left-padded. Longer input is accepted only when the
    /// extra leading bytes are zero (sign bytes written by big-integer
    /// libraries). Zero and values `>= n` are rejected.
    pub fn from_be_bytes(algorithm: Algorithm, bytes: &[u8]) -> Result<Self, KeyError> {
        let params = algorithm.require_params()?;
        let padded = left_pad(bytes, params.field_size).ok_or_else(|| {
            KeyError::InvalidPrivateKey(format!(
                "{} bytes do not fit a {}-byte {} scalar",
                bytes.len(),
                params.field_size,
                algorithm
            ))
        })?;
        let invalid = |_: elliptic_curve::Error| {
            KeyError::InvalidPrivateKey(format!("scalar out of range for {}", algorithm))
        };

        match algorithm {
            Algorithm::Secp192r1 => SecretKey::from_slice(&padded)
                .map(Self::Secp192r1)
                .map_err(invalid),
            Algorithm::Secp256r1 => SecretKey::from_slice(&padded)
                .map(Self::Secp256r1)
                .map_err(invalid),
            Algorithm::Secp256k1 => SecretKey::from_slice(&padded)
                .map(Self::Secp256k1)
                .map_err(invalid),
            Algorithm::Secp384r1 => SecretKey::from_slice(&padded)
                .map(Self::Secp384r1)
                .map_err(invalid),
            Algorithm::Secp521r1 => SecretKey::from_slice(&padded)
                .map(Self::Secp521r1)
                .map_err(invalid),
            Algorithm::Unknown => Err(KeyError::UnknownAlgorithm(algorithm.to_string())),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            EcScalar::Secp192r1(_) => Algorithm::Secp192r1,
            EcScalar::Secp256r1(_) => Algorithm::Secp256r1,
            EcScalar::Secp256k1(_) => Algorithm::Secp256k1,
            EcScalar::Secp384r1(_) => Algorithm::Secp384r1,
            EcScalar::Secp521r1(_) => Algorithm::Secp521r1,
        }
    }

    /// Big-endian scalar, padded to the field size.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        match self {
            EcScalar::Secp192r1(sk) => sk.to_bytes().to_vec(),
            EcScalar::Secp256r1(sk) => sk.to_bytes().to_vec(),
            EcScalar::Secp256k1(sk) => sk.to_bytes().to_vec(),
            EcScalar::Secp384r1(sk) => sk.to_bytes().to_vec(),
            EcScalar::Secp521r1(sk) => sk.to_bytes().to_vec(),
        }
    }

    /// `self * G`.
    pub fn public_point(&self) -> EcPoint {
        match self {
            EcScalar::Secp192r1(sk) => EcPoint::Secp192r1(sk.public_key()),
            EcScalar::Secp256r1(sk) => EcPoint::Secp256r1(sk.public_key()),
            EcScalar::Secp256k1(sk) => EcPoint::Secp256k1(sk.public_key()),
            EcScalar::Secp384r1(sk) => EcPoint::Secp384r1(sk.public_key()),
            EcScalar::Secp521r1(sk) => EcPoint::Secp521r1(sk.public_key()),
        }
    }
}

impl PartialEq for EcScalar {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm() == other.algorithm() && self.to_be_bytes() == other.to_be_bytes()
    }
}

impl Eq for EcScalar {}

impl fmt::Debug for EcScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcScalar({}, <redacted>)", self.algorithm())
    }
}

/// Left-pads `bytes` with zeros to `size`, stripping surplus leading zeros.
/// Returns `None` when a non-zero byte would have to be dropped.
pub(crate) fn left_pad(bytes: &[u8], size: usize) -> Option<Vec<u8>> {
    if bytes.len() > size {
        let (surplus, rest) = bytes.split_at(bytes.len() - size);
        if surplus.iter().any(|b| *b != 0) {
            return None;
        }
        return Some(rest.to_vec());
    }
    let mut padded = vec![0u8; size - bytes.len()];
    padded.extend_from_slice(bytes);
    Some(padded)
}
