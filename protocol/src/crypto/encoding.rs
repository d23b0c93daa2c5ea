//! # Text Encodings
//!
//! Hex, Base32 and Base64 for key payloads, and the fixed decoder list used
//! when the caller does not say which one a string is in.
//!
//! The three alphabets overlap: `"ABCDEF12"` is valid in all of them. The
//! decoder list therefore never stops at the first hit. [`detect`] collects
//! every successful decode and [`resolve`] applies an explicit tie-break
//! table on the full set:
//!
//! | candidates        | winner    |
//! |-------------------|-----------|
//! | one               | that one  |
//! | {Hex, Base64}     | Hex       |
//! | {Base32, Base64}  | Base64    |
//! | anything else     | ambiguous |

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use data_encoding::BASE32;

use super::error::KeyError;
use super::material::Encoding;

/// A text decoder paired with the tag it stands for.
pub struct EncodingDecoder {
    pub encoding: Encoding,
    pub decode: fn(&str) -> Option<Vec<u8>>,
}

/// Decoders evaluated, in order, during auto-detection.
pub const DECODERS: [EncodingDecoder; 3] = [
    EncodingDecoder {
        encoding: Encoding::Hex,
        decode: decode_hex,
    },
    EncodingDecoder {
        encoding: Encoding::Base32,
        decode: decode_base32,
    },
    EncodingDecoder {
        encoding: Encoding::Base64,
        decode: decode_base64,
    },
];

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    hex::decode(text).ok()
}

fn decode_base32(text: &str) -> Option<Vec<u8>> {
    BASE32.decode(text.as_bytes()).ok()
}

fn decode_base64(text: &str) -> Option<Vec<u8>> {
    BASE64.decode(text).ok()
}

/// Decodes `text` with exactly `encoding`. No fallback.
///
/// [`Encoding::None`] takes the UTF-8 bytes of the text as they are.
pub fn decode(text: &str, encoding: Encoding) -> Result<Vec<u8>, KeyError> {
    let text = text.trim();
    let decoded = match encoding {
        Encoding::None => Some(text.as_bytes().to_vec()),
        Encoding::Hex => decode_hex(text),
        Encoding::Base32 => decode_base32(text),
        Encoding::Base64 => decode_base64(text),
    };
    decoded.ok_or_else(|| KeyError::Unparseable(format!("input is not valid {encoding}")))
}

/// Encodes `bytes` as text. [`Encoding::None`] falls back to Base64.
pub fn encode(bytes: &[u8], encoding: Encoding) -> String {
    match encoding.text_form() {
        Encoding::Hex => hex::encode(bytes),
        Encoding::Base32 => BASE32.encode(bytes),
        _ => BASE64.encode(bytes),
    }
}

/// Runs every decoder over `text` and returns all non-empty decodes, in
/// decoder order.
pub fn detect(text: &str) -> Vec<(Encoding, Vec<u8>)> {
    let text = text.trim();
    DECODERS
        .iter()
        .filter_map(|decoder| {
            (decoder.decode)(text)
                .filter(|bytes| !bytes.is_empty())
                .map(|bytes| (decoder.encoding, bytes))
        })
        .collect()
}

/// Applies the tie-break table to a candidate set.
///
/// Generic over the candidate payload so the public key codec can resolve
/// candidates that already carry parsed key material.
pub fn resolve<T>(mut candidates: Vec<(Encoding, T)>) -> Result<(Encoding, T), KeyError> {
    let tags: Vec<Encoding> = candidates.iter().map(|(e, _)| *e).collect();

    let winner = match tags.as_slice() {
        [] => {
            return Err(KeyError::Unparseable(
                "input is not valid hex, base32 or base64".to_string(),
            ))
        }
        [_] => 0,
        _ if is_pair(&tags, Encoding::Hex, Encoding::Base64) => position(&tags, Encoding::Hex),
        _ if is_pair(&tags, Encoding::Base32, Encoding::Base64) => {
            position(&tags, Encoding::Base64)
        }
        _ => return Err(KeyError::AmbiguousEncoding(tags)),
    };

    Ok(candidates.swap_remove(winner))
}

/// Detects and resolves in one step.
pub fn decode_auto(text: &str) -> Result<(Encoding, Vec<u8>), KeyError> {
    resolve(detect(text))
}

fn is_pair(tags: &[Encoding], a: Encoding, b: Encoding) -> bool {
    tags.len() == 2 && tags.contains(&a) && tags.contains(&b)
}

fn position(tags: &[Encoding], wanted: Encoding) -> usize {
    tags.iter().position(|e| *e == wanted).unwrap_or(0)
}
