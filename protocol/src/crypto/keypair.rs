//! # Key Pairs
//!
//! EC key pairs for chargemesh participants: generation, construction from
//! bytes, private-key parsing and canonical JSON.
//!
//! A [`KeyPair`] always holds a decoded public point. The private scalar is
//! optional, so the same type carries "our key" and "their key plus the
//! metadata we keep about it". When both halves are present they are checked
//! against each other at construction; a pair that made it into memory is
//! consistent.
//!
//! ## Security considerations
//!
//! - Fresh scalars come from `OsRng`.
//! - `Debug` never prints the scalar. Neither does any log line here.
//! - `to_json` does write the scalar. Serializing a private key is a
//!   deliberate act; don't put a `KeyPair` into a response body.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::curve::{EcPoint, EcScalar};
use super::encoding;
use super::error::KeyError;
use super::material::{Algorithm, Encoding, Serialization};
use super::public_key::{deserialize_point, omit_default, serialize_point, PublicKey};

/// An EC key pair, or a public-only holder when `private` is absent.
#[derive(Clone)]
pub struct KeyPair {
    public: EcPoint,
    private: Option<EcScalar>,
    serialization: Serialization,
    encoding: Encoding,
    custom_data: Option<Map<String, Value>>,
}

impl KeyPair {
    /// Generates a fresh pair on `algorithm`.
    pub fn generate(algorithm: Algorithm) -> Result<Self, KeyError> {
        let scalar = EcScalar::random(algorithm)?;
        debug!(%algorithm, "generated key pair");
        Ok(Self::from_scalar(scalar))
    }

    /// Wraps a scalar, deriving its public point.
    pub fn from_scalar(scalar: EcScalar) -> Self {
        Self {
            public: scalar.public_point(),
            private: Some(scalar),
            serialization: Serialization::default(),
            encoding: Encoding::default(),
            custom_data: None,
        }
    }

    /// A public-only holder.
    pub fn from_public(public: EcPoint) -> Self {
        Self {
            public,
            private: None,
            serialization: Serialization::default(),
            encoding: Encoding::default(),
            custom_data: None,
        }
    }

    /// Builds a pair from byte forms.
    ///
    /// `public` is decoded in `serialization`. `private`, when given, is a
    /// big-endian unsigned scalar and must match `public`.
    pub fn from_bytes(
        algorithm: Algorithm,
        public: &[u8],
        private: Option<&[u8]>,
        serialization: Serialization,
    ) -> Result<Self, KeyError> {
        algorithm.require_params()?;
        let point = deserialize_point(public, algorithm, serialization)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;

        let scalar = match private {
            Some(bytes) => {
                let scalar = EcScalar::from_be_bytes(algorithm, bytes)?;
                if scalar.public_point() != point {
                    return Err(KeyError::KeyPairMismatch);
                }
                Some(scalar)
            }
            None => None,
        };

        Ok(Self {
            public: point,
            private: scalar,
            serialization,
            encoding: Encoding::default(),
            custom_data: None,
        })
    }

    /// Parses a private scalar from text and derives its public point.
    ///
    /// The public half is never read from input. Without `encoding` the
    /// text goes through the same auto-detection table as public keys.
    /// Without `algorithm` the curve is inferred from the scalar length.
    pub fn try_parse_private_key(
        text: &str,
        algorithm: Option<Algorithm>,
        encoding: Option<Encoding>,
    ) -> Result<Self, KeyError> {
        let (encoding, bytes) = match encoding {
            Some(enc) => (enc, encoding::decode(text, enc)?),
            None => encoding::decode_auto(text)?,
        };
        if bytes.is_empty() {
            return Err(KeyError::InvalidPrivateKey("private key is empty".to_string()));
        }

        let algorithm = match algorithm {
            Some(alg) => alg,
            None => algorithm_for_scalar_len(bytes.len())?,
        };

        let scalar = EcScalar::from_be_bytes(algorithm, &bytes)?;
        debug!(%algorithm, %encoding, "parsed private key");
        Ok(Self::from_scalar(scalar).with_encoding(encoding))
    }

    // -- accessors ----------------------------------------------------------

    pub fn algorithm(&self) -> Algorithm {
        self.public.algorithm()
    }

    pub fn serialization(&self) -> Serialization {
        self.serialization
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn custom_data(&self) -> Option<&Map<String, Value>> {
        self.custom_data.as_ref()
    }

    pub fn has_private_key(&self) -> bool {
        self.private.is_some()
    }

    pub fn public_point(&self) -> &EcPoint {
        &self.public
    }

    /// The public half as a standalone [`PublicKey`] with this pair's
    /// serialization and encoding.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_point(self.public.clone(), self.serialization, self.encoding)
    }

    /// Public key bytes in this pair's serialization.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        serialize_point(&self.public, self.serialization)
    }

    /// Big-endian scalar, padded to the field size.
    ///
    /// **Handle with care.** Don't log it.
    pub fn private_key_bytes(&self) -> Option<Vec<u8>> {
        self.private.as_ref().map(EcScalar::to_be_bytes)
    }

    // -- builders -----------------------------------------------------------

    pub fn with_serialization(mut self, serialization: Serialization) -> Self {
        self.serialization = serialization;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_custom_data(mut self, custom_data: Map<String, Value>) -> Self {
        self.custom_data = Some(custom_data);
        self
    }

    // -- JSON ---------------------------------------------------------------

    pub fn to_json(&self) -> Value {
        serde_json::to_value(KeyPairJson::from(self)).unwrap_or(Value::Null)
    }

    pub fn from_json(value: &Value) -> Result<Self, KeyError> {
        let wire: KeyPairJson =
            serde_json::from_value(value.clone()).map_err(|e| KeyError::Json(e.to_string()))?;
        Self::try_from(wire)
    }
}

/// Curve implied by the byte length of a bare scalar.
///
/// 32 bytes is ambiguous between secp256r1 and secp256k1; secp256r1 wins.
/// 65 covers secp521r1 scalars whose top byte happened to be zero.
pub fn algorithm_for_scalar_len(len: usize) -> Result<Algorithm, KeyError> {
    match len {
        24 => Ok(Algorithm::Secp192r1),
        32 => Ok(Algorithm::Secp256r1),
        48 => Ok(Algorithm::Secp384r1),
        65 | 66 => Ok(Algorithm::Secp521r1),
        other => Err(KeyError::UnknownAlgorithm(format!(
            "no curve has {other}-byte scalars"
        ))),
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm() == other.algorithm()
            && self.serialization == other.serialization
            && self.encoding == other.encoding
            && self.private_key_bytes() == other.private_key_bytes()
            && self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for KeyPair {}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private", &self.private.as_ref().map(|_| "<redacted>"))
            .field("serialization", &self.serialization)
            .field("encoding", &self.encoding)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyPairJson {
    private: String,
    public: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    serialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_data: Option<Map<String, Value>>,
}

impl From<&KeyPair> for KeyPairJson {
    fn from(pair: &KeyPair) -> Self {
        let encoding = pair.encoding.text_form();
        let private = pair.private_key_bytes().unwrap_or_default();
        KeyPairJson {
            private: encoding::encode(&private, encoding),
            public: encoding::encode(&pair.public_key_bytes(), encoding),
            algorithm: omit_default(pair.algorithm(), Algorithm::Secp256r1)
                .map(|a| a.as_str().to_string()),
            serialization: omit_default(pair.serialization, Serialization::Raw)
                .map(|s| s.as_str().to_string()),
            encoding: omit_default(encoding, Encoding::Base64).map(|e| e.as_str().to_string()),
            custom_data: pair.custom_data.clone(),
        }
    }
}

impl TryFrom<KeyPairJson> for KeyPair {
    type Error = KeyError;

    fn try_from(wire: KeyPairJson) -> Result<Self, Self::Error> {
        let algorithm = wire
            .algorithm
            .as_deref()
            .map(Algorithm::parse)
            .unwrap_or_default();
        let serialization = match wire.serialization.as_deref() {
            Some(s) => s.parse()?,
            None => Serialization::default(),
        };
        let encoding = match wire.encoding.as_deref() {
            Some(e) => e.parse()?,
            None => Encoding::default(),
        };

        let public = encoding::decode(&wire.public, encoding)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        let private = encoding::decode(&wire.private, encoding)
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        let private = (!private.is_empty()).then_some(private);

        let pair = KeyPair::from_bytes(algorithm, &public, private.as_deref(), serialization)?;
        Ok(KeyPair {
            encoding,
            custom_data: wire.custom_data,
            ..pair
        })
    }
}

impl Serialize for KeyPair {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        KeyPairJson::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KeyPair {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = KeyPairJson::deserialize(deserializer)?;
        KeyPair::try_from(wire).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generate_every_curve() {
        for alg in Algorithm::SUPPORTED {
            let pair = KeyPair::generate(alg).unwrap();
            assert_eq!(pair.algorithm(), alg);
            assert!(pair.has_private_key());
            let field_size = alg.params().unwrap().field_size;
            assert_eq!(pair.private_key_bytes().unwrap().len(), field_size);
        }
    }

    #[test]
    fn generate_unknown_fails() {
        assert!(matches!(
            KeyPair::generate(Algorithm::Unknown),
            Err(KeyError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn from_bytes_accepts_consistent_pair() {
        let pair = KeyPair::generate(Algorithm::Secp384r1).unwrap();
        let rebuilt = KeyPair::from_bytes(
            Algorithm::Secp384r1,
            &pair.public_key_bytes(),
            pair.private_key_bytes().as_deref(),
            Serialization::Raw,
        )
        .unwrap();
        assert_eq!(rebuilt, pair);
    }

    #[test]
    fn from_bytes_rejects_mismatched_halves() {
        let a = KeyPair::generate(Algorithm::Secp256r1).unwrap();
        let b = KeyPair::generate(Algorithm::Secp256r1).unwrap();
        let err = KeyPair::from_bytes(
            Algorithm::Secp256r1,
            &a.public_key_bytes(),
            b.private_key_bytes().as_deref(),
            Serialization::Raw,
        )
        .unwrap_err();
        assert_eq!(err, KeyError::KeyPairMismatch);
    }

    #[test]
    fn from_bytes_rejects_garbage_public() {
        let err =
            KeyPair::from_bytes(Algorithm::Secp256r1, &[0x04, 1, 2, 3], None, Serialization::Raw)
                .unwrap_err();
        assert!(matches!(err, KeyError::InvalidPublicKey(_)));
    }

    #[test]
    fn from_bytes_rejects_zero_scalar() {
        let pair = KeyPair::generate(Algorithm::Secp256r1).unwrap();
        let err = KeyPair::from_bytes(
            Algorithm::Secp256r1,
            &pair.public_key_bytes(),
            Some(&[0u8; 32]),
            Serialization::Raw,
        )
        .unwrap_err();
        assert!(matches!(err, KeyError::InvalidPrivateKey(_)));
    }

    #[test]
    fn private_key_derivation_matches_generation() {
        for alg in Algorithm::SUPPORTED {
            let pair = KeyPair::generate(alg).unwrap();
            let hex_scalar = hex::encode(pair.private_key_bytes().unwrap());
            let parsed =
                KeyPair::try_parse_private_key(&hex_scalar, Some(alg), Some(Encoding::Hex))
                    .unwrap();
            assert_eq!(parsed.public_point(), pair.public_point());
        }
    }

    #[test]
    fn scalar_length_picks_curve() {
        let pair = KeyPair::generate(Algorithm::Secp384r1).unwrap();
        let text = hex::encode(pair.private_key_bytes().unwrap());
        let parsed = KeyPair::try_parse_private_key(&text, None, Some(Encoding::Hex)).unwrap();
        assert_eq!(parsed.algorithm(), Algorithm::Secp384r1);
        assert_eq!(parsed.public_point(), pair.public_point());
    }

    #[test]
    fn scalar_length_mapping() {
        assert_eq!(algorithm_for_scalar_len(24).unwrap(), Algorithm::Secp192r1);
        assert_eq!(algorithm_for_scalar_len(32).unwrap(), Algorithm::Secp256r1);
        assert_eq!(algorithm_for_scalar_len(48).unwrap(), Algorithm::Secp384r1);
        assert_eq!(algorithm_for_scalar_len(65).unwrap(), Algorithm::Secp521r1);
        assert_eq!(algorithm_for_scalar_len(66).unwrap(), Algorithm::Secp521r1);
        assert!(matches!(
            algorithm_for_scalar_len(20),
            Err(KeyError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn private_key_with_auto_detected_encoding() {
        let pair = KeyPair::generate(Algorithm::Secp256r1).unwrap();
        // 44 base64 chars with '=' padding: not hex, not base32.
        let text = encoding::encode(&pair.private_key_bytes().unwrap(), Encoding::Base64);
        let parsed = KeyPair::try_parse_private_key(&text, None, None).unwrap();
        assert_eq!(parsed.encoding(), Encoding::Base64);
        assert_eq!(parsed, pair);
    }

    #[test]
    fn json_roundtrip_with_defaults_omitted() {
        let pair = KeyPair::generate(Algorithm::Secp256r1).unwrap();
        let json = pair.to_json();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("private"));
        assert!(obj.contains_key("public"));
        assert_eq!(KeyPair::from_json(&json).unwrap(), pair);
    }

    #[test]
    fn json_roundtrip_non_defaults() {
        let mut extra = Map::new();
        extra.insert("owner".to_string(), json!("DE*GEF"));
        let pair = KeyPair::generate(Algorithm::Secp521r1)
            .unwrap()
            .with_serialization(Serialization::AsnDer)
            .with_encoding(Encoding::Base32)
            .with_custom_data(extra);
        let json = pair.to_json();
        assert_eq!(json["algorithm"], "secp521r1");
        assert_eq!(json["serialization"], "asn1_der");
        assert_eq!(json["encoding"], "base32");
        assert_eq!(json["customData"]["owner"], "DE*GEF");

        let back = KeyPair::from_json(&json).unwrap();
        assert_eq!(back, pair);
        assert_eq!(back.custom_data(), pair.custom_data());
    }

    #[test]
    fn public_only_json_has_empty_private() {
        let pair = KeyPair::generate(Algorithm::Secp256k1).unwrap();
        let public_only = KeyPair::from_public(pair.public_point().clone())
            .with_serialization(Serialization::EccXY)
            .with_encoding(Encoding::Hex);
        let json = public_only.to_json();
        assert_eq!(json["private"], "");
        let back = KeyPair::from_json(&json).unwrap();
        assert!(!back.has_private_key());
        assert_eq!(back, public_only);
    }

    #[test]
    fn equality_covers_encoding() {
        let pair = KeyPair::generate(Algorithm::Secp256r1).unwrap();
        let hex = pair.clone().with_encoding(Encoding::Hex);
        assert_ne!(pair, hex);
    }

    #[test]
    fn public_key_view() {
        let pair = KeyPair::generate(Algorithm::Secp256r1)
            .unwrap()
            .with_serialization(Serialization::AsnDer);
        let public = pair.public_key();
        assert_eq!(public.serialization(), Serialization::AsnDer);
        assert_eq!(public.value(), pair.public_key_bytes());
        assert_eq!(public.algorithm(), Some(Algorithm::Secp256r1));
    }

    #[test]
    fn debug_never_prints_scalar() {
        let pair = KeyPair::generate(Algorithm::Secp256r1).unwrap();
        let scalar_hex = hex::encode(pair.private_key_bytes().unwrap());
        let dbg = format!("{:?}", pair);
        assert!(!dbg.contains(&scalar_hex));
        assert!(dbg.contains("<redacted>"));
    }
}
