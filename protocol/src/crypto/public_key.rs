//! # Public Key Codec
//!
//! Turns untrusted text or bytes into a validated [`PublicKey`], or fails
//! with a precise [`KeyError`]. Key material reaches us from config files,
//! peer-supplied JSON and command lines, with no shared convention about
//! how it is written, so [`PublicKey::try_parse`] accepts every supported
//! encoding and serialization and works out which one it got.
//!
//! ## Interpretation pipeline
//!
//! ```text
//! text ──decode──> bytes ──ASN.1?──> curve-bound point
//!        (hex/b32/b64)      └─no──> raw bytes ──hint / auto-detect──> point
//!                                                └─neither──> opaque bytes
//! ```
//!
//! ## Canonical JSON
//!
//! `algorithm`, `serialization` and `encoding` are left out when they hold
//! the defaults (secp256r1 / raw / base64). Parsing fills the same defaults
//! back in, so a default key survives a round trip byte-for-byte.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::asn1;
use super::curve::{left_pad, EcPoint};
use super::encoding;
use super::error::KeyError;
use super::material::{Algorithm, Encoding, KeyMaterial, Serialization};

// ---------------------------------------------------------------------------
// Parse options
// ---------------------------------------------------------------------------

/// Hints for [`PublicKey::try_parse`]. Everything defaults to "unknown".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Curve the bytes are expected to be on.
    pub algorithm: Option<Algorithm>,
    /// Byte structure. `None` means "raw, or ASN.1 if it parses as such".
    pub serialization: Option<Serialization>,
    /// Text encoding. `None` runs auto-detection.
    pub encoding: Option<Encoding>,
    /// Try every supported curve when no algorithm is known.
    pub auto_detect_algorithm: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn serialization(mut self, serialization: Serialization) -> Self {
        self.serialization = Some(serialization);
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn auto_detect_algorithm(mut self) -> Self {
        self.auto_detect_algorithm = true;
        self
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A public key: key material plus how it is (and should be) written.
///
/// Equality compares the serialized value, algorithm, serialization and
/// encoding. `custom_data` is carried along but does not affect identity.
#[derive(Debug, Clone)]
pub struct PublicKey {
    material: KeyMaterial,
    serialization: Serialization,
    encoding: Encoding,
    custom_data: Option<Map<String, Value>>,
}

/// One decoded interpretation of the input, before hints are applied.
enum Interpretation {
    Asn1(EcPoint),
    Bytes(Vec<u8>),
}

impl PublicKey {
    /// Wraps an already-decoded point.
    pub fn from_point(point: EcPoint, serialization: Serialization, encoding: Encoding) -> Self {
        Self {
            material: KeyMaterial::EllipticCurve(point),
            serialization,
            encoding,
            custom_data: None,
        }
    }

    /// Parses a DER SubjectPublicKeyInfo.
    pub fn parse_asn1(der: &[u8]) -> Result<Self, KeyError> {
        let point = asn1::decode_spki(der)?;
        Ok(Self::from_point(point, Serialization::AsnDer, Encoding::None))
    }

    /// Parses a text-encoded DER SubjectPublicKeyInfo.
    pub fn parse_asn1_text(text: &str, encoding: Encoding) -> Result<Self, KeyError> {
        let der = encoding::decode(text, encoding)?;
        let mut key = Self::parse_asn1(&der)?;
        key.encoding = encoding;
        Ok(key)
    }

    /// Rebuilds a key from text-encoded X and Y coordinates.
    pub fn parse_xy(
        x: &str,
        y: &str,
        algorithm: Algorithm,
        encoding: Encoding,
    ) -> Result<Self, KeyError> {
        let params = algorithm.require_params()?;

        let decode_coordinate = |name: &str, text: &str| -> Result<Vec<u8>, KeyError> {
            if text.trim().is_empty() {
                return Err(KeyError::InvalidCoordinate(format!("{name} is empty")));
            }
            let bytes = encoding::decode(text, encoding).map_err(|_| {
                KeyError::InvalidCoordinate(format!("{name} is not valid {encoding}"))
            })?;
            left_pad(&bytes, params.field_size).ok_or_else(|| {
                KeyError::InvalidCoordinate(format!(
                    "{name} is longer than the {}-byte field of {algorithm}",
                    params.field_size
                ))
            })
        };

        let x = decode_coordinate("x", x)?;
        let y = decode_coordinate("y", y)?;

        let point = EcPoint::from_coordinates(algorithm, &x, &y).map_err(|_| {
            KeyError::InvalidCoordinate(format!("(x, y) is not a point on {algorithm}"))
        })?;

        Ok(Self::from_point(point, Serialization::EccXY, encoding))
    }

    /// General entry point for text input. See the module docs for the
    /// interpretation order.
    pub fn try_parse(text: &str, options: ParseOptions) -> Result<Self, KeyError> {
        let (encoding, interpretation) = match options.encoding {
            Some(encoding) => {
                let bytes = encoding::decode(text, encoding)?;
                if bytes.is_empty() {
                    return Err(KeyError::Unparseable("input is empty".to_string()));
                }
                (encoding, interpret(bytes, options.serialization)?)
            }
            None => {
                // First structural rejection, reported when no decode survives.
                let mut rejected = None;
                let candidates: Vec<_> = encoding::detect(text)
                    .into_iter()
                    .filter_map(|(enc, bytes)| match interpret(bytes, options.serialization) {
                        Ok(interp) => Some((enc, interp)),
                        Err(e) => {
                            rejected.get_or_insert(e);
                            None
                        }
                    })
                    .collect();
                if candidates.is_empty() {
                    if let Some(err) = rejected {
                        return Err(err);
                    }
                }
                let (encoding, interpretation) = encoding::resolve(candidates)?;
                debug!(%encoding, "auto-detected public key encoding");
                (encoding, interpretation)
            }
        };

        let key = bind(interpretation, options)?;
        Ok(Self { encoding, ..key })
    }

    /// Binary entry point. Same rules as [`try_parse`](Self::try_parse)
    /// without the text decoding step.
    pub fn from_bytes(bytes: &[u8], options: ParseOptions) -> Result<Self, KeyError> {
        if bytes.is_empty() {
            return Err(KeyError::Unparseable("input is empty".to_string()));
        }
        let interpretation = interpret(bytes.to_vec(), options.serialization)?;
        let key = bind(interpretation, options)?;
        Ok(Self {
            encoding: options.encoding.unwrap_or(Encoding::None),
            ..key
        })
    }

    // -- accessors ----------------------------------------------------------

    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Curve of the key, `None` when the bytes are not bound to one.
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.material.algorithm()
    }

    pub fn point(&self) -> Option<&EcPoint> {
        self.material.point()
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

    /// Key bytes in this key's serialization. Unbound bytes are returned
    /// exactly as they were given.
    pub fn value(&self) -> Vec<u8> {
        match &self.material {
            KeyMaterial::RawBytes(bytes) => bytes.clone(),
            KeyMaterial::EllipticCurve(point) => serialize_point(point, self.serialization),
        }
    }

    /// The value rendered in this key's text encoding.
    pub fn encoded_value(&self) -> String {
        encoding::encode(&self.value(), self.encoding)
    }

    /// X coordinate, derived from the point.
    pub fn x(&self) -> Option<Vec<u8>> {
        self.point().map(|p| p.coordinates().0)
    }

    /// Y coordinate, derived from the point.
    pub fn y(&self) -> Option<Vec<u8>> {
        self.point().map(|p| p.coordinates().1)
    }

    // -- builders -----------------------------------------------------------

    /// Same key, written with a different serialization. Unbound bytes
    /// cannot be restructured and keep `Raw`.
    pub fn with_serialization(mut self, serialization: Serialization) -> Self {
        if self.point().is_some() {
            self.serialization = serialization;
        }
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

    /// Canonical JSON object for this key.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(PublicKeyJson::from(self)).unwrap_or(Value::Null)
    }

    /// Parses the canonical JSON object.
    pub fn from_json(value: &Value) -> Result<Self, KeyError> {
        let wire: PublicKeyJson =
            serde_json::from_value(value.clone()).map_err(|e| KeyError::Json(e.to_string()))?;
        Self::try_from(wire)
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm() == other.algorithm()
            && self.serialization == other.serialization
            && self.encoding == other.encoding
            && self.value() == other.value()
    }
}

impl Eq for PublicKey {}

/// Bytes of `point` in `serialization`.
pub(crate) fn serialize_point(point: &EcPoint, serialization: Serialization) -> Vec<u8> {
    match serialization {
        Serialization::Raw => point.to_uncompressed(),
        // Encoding a point we already decoded cannot fail for a supported
        // curve; fall back to SEC1 rather than lose the key.
        Serialization::AsnDer => {
            asn1::encode_spki(point).unwrap_or_else(|_| point.to_uncompressed())
        }
        Serialization::EccXY => point.to_uncompressed()[1..].to_vec(),
    }
}

/// Decodes `bytes` of a known `serialization` on `algorithm`.
pub(crate) fn deserialize_point(
    bytes: &[u8],
    algorithm: Algorithm,
    serialization: Serialization,
) -> Result<EcPoint, KeyError> {
    match serialization {
        Serialization::Raw => EcPoint::from_sec1(algorithm, bytes),
        Serialization::AsnDer => {
            let point = asn1::decode_spki(bytes)?;
            if point.algorithm() != algorithm {
                return Err(KeyError::InvalidFormat(format!(
                    "ASN.1 key is on {}, expected {algorithm}",
                    point.algorithm()
                )));
            }
            Ok(point)
        }
        Serialization::EccXY => {
            let (x, y) = split_xy(bytes)?;
            EcPoint::from_coordinates(algorithm, x, y).map_err(|_| {
                KeyError::InvalidCoordinate(format!("(x, y) is not a point on {algorithm}"))
            })
        }
    }
}

fn split_xy(bytes: &[u8]) -> Result<(&[u8], &[u8]), KeyError> {
    if bytes.is_empty() || bytes.len() % 2 == 1 {
        return Err(KeyError::InvalidCoordinate(format!(
            "{} bytes cannot be split into equal X and Y",
            bytes.len()
        )));
    }
    Ok(bytes.split_at(bytes.len() / 2))
}

/// Structural interpretation of decoded bytes.
fn interpret(
    bytes: Vec<u8>,
    serialization: Option<Serialization>,
) -> Result<Interpretation, KeyError> {
    match serialization {
        Some(Serialization::AsnDer) => asn1::decode_spki(&bytes).map(Interpretation::Asn1),
        Some(Serialization::EccXY) => {
            split_xy(&bytes)?;
            Ok(Interpretation::Bytes(bytes))
        }
        Some(Serialization::Raw) => Ok(Interpretation::Bytes(bytes)),
        None => Ok(match asn1::decode_spki(&bytes) {
            Ok(point) => Interpretation::Asn1(point),
            Err(_) => Interpretation::Bytes(bytes),
        }),
    }
}

/// Applies algorithm hints and auto-detection to an interpretation.
fn bind(interpretation: Interpretation, options: ParseOptions) -> Result<PublicKey, KeyError> {
    let bytes = match interpretation {
        Interpretation::Asn1(point) => {
            if let Some(hint) = options.algorithm {
                if hint != point.algorithm() {
                    return Err(KeyError::InvalidFormat(format!(
                        "ASN.1 key is on {}, expected {hint}",
                        point.algorithm()
                    )));
                }
            }
            return Ok(PublicKey::from_point(point, Serialization::AsnDer, Encoding::None));
        }
        Interpretation::Bytes(bytes) => bytes,
    };

    let serialization = options.serialization.unwrap_or(Serialization::Raw);

    if let Some(algorithm) = options.algorithm {
        algorithm.require_params()?;
        let point = deserialize_point(&bytes, algorithm, serialization)?;
        return Ok(PublicKey::from_point(point, serialization, Encoding::None));
    }

    if options.auto_detect_algorithm {
        let detected = Algorithm::SUPPORTED
            .into_iter()
            .find_map(|alg| deserialize_point(&bytes, alg, serialization).ok());
        if let Some(point) = detected {
            debug!(algorithm = %point.algorithm(), "auto-detected public key curve");
            return Ok(PublicKey::from_point(point, serialization, Encoding::None));
        }
        debug!(len = bytes.len(), "no supported curve matched, keeping raw bytes");
    }

    Ok(PublicKey {
        material: KeyMaterial::RawBytes(bytes),
        serialization: Serialization::Raw,
        encoding: Encoding::None,
        custom_data: None,
    })
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// JSON shape of a public key. Defaults are omitted on output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    serialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_data: Option<Map<String, Value>>,
}

impl From<&PublicKey> for PublicKeyJson {
    fn from(key: &PublicKey) -> Self {
        let encoding = key.encoding.text_form();
        let mut wire = PublicKeyJson {
            algorithm: omit_default_algorithm(key.algorithm()),
            serialization: omit_default(key.serialization, Serialization::Raw)
                .map(|s| s.as_str().to_string()),
            encoding: omit_default(encoding, Encoding::Base64).map(|e| e.as_str().to_string()),
            custom_data: key.custom_data.clone(),
            ..Default::default()
        };

        match (key.serialization, key.point()) {
            (Serialization::EccXY, Some(point)) => {
                let (x, y) = point.coordinates();
                wire.x = Some(encoding::encode(&x, encoding));
                wire.y = Some(encoding::encode(&y, encoding));
            }
            _ => wire.value = Some(encoding::encode(&key.value(), encoding)),
        }
        wire
    }
}

impl TryFrom<PublicKeyJson> for PublicKey {
    type Error = KeyError;

    fn try_from(wire: PublicKeyJson) -> Result<Self, Self::Error> {
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

        let key = match (wire.value, wire.x, wire.y) {
            (_, Some(x), Some(y)) => PublicKey::parse_xy(&x, &y, algorithm, encoding)?,
            (_, Some(_), None) | (_, None, Some(_)) => {
                return Err(KeyError::InvalidCoordinate(
                    "both x and y are required".to_string(),
                ))
            }
            (Some(value), None, None) if algorithm == Algorithm::Unknown => {
                let bytes = encoding::decode(&value, encoding)?;
                if bytes.is_empty() {
                    return Err(KeyError::Json("value is empty".to_string()));
                }
                PublicKey {
                    material: KeyMaterial::RawBytes(bytes),
                    serialization: Serialization::Raw,
                    encoding,
                    custom_data: None,
                }
            }
            (Some(value), None, None) => PublicKey::try_parse(
                &value,
                ParseOptions::new()
                    .algorithm(algorithm)
                    .serialization(serialization)
                    .encoding(encoding),
            )?,
            (None, None, None) => {
                return Err(KeyError::Json("missing 'value' or 'x'/'y'".to_string()))
            }
        };

        Ok(PublicKey {
            custom_data: wire.custom_data,
            ..key
        })
    }
}

impl Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PublicKeyJson::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = PublicKeyJson::deserialize(deserializer)?;
        PublicKey::try_from(wire).map_err(serde::de::Error::custom)
    }
}

/// `None` for the default curve. Unbound keys write `unknown` so that a
/// parser does not assume secp256r1 for them.
pub(crate) fn omit_default_algorithm(algorithm: Option<Algorithm>) -> Option<String> {
    match algorithm {
        Some(Algorithm::Secp256r1) => None,
        Some(alg) => Some(alg.as_str().to_string()),
        None => Some(Algorithm::Unknown.as_str().to_string()),
    }
}

pub(crate) fn omit_default<T: PartialEq>(value: T, default: T) -> Option<T> {
    if value == default {
        None
    } else {
        Some(value)
    }
}
