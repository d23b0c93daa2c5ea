//! # Key Material for chargemesh
//!
//! Everything that turns bytes and strings into elliptic-curve keys, and
//! back. Charging-network peers hand us keys in whatever shape their stack
//! produces: SEC1 points, DER SubjectPublicKeyInfo blobs, bare X/Y pairs,
//! written as hex, Base32 or Base64. This module accepts all of them and
//! writes one canonical JSON form.
//!
//! Layering, leaf first:
//!
//! - **material** / **curve**: the tags and the typed point/scalar wrappers
//!   over the RustCrypto curve crates.
//! - **encoding**: text codecs and the auto-detection tie-break table.
//! - **asn1**: SubjectPublicKeyInfo for named curves.
//! - **public_key** / **keypair**: the codecs callers actually use.
//!
//! The curve math itself is not ours. Everything here is a typed wrapper
//! around audited implementations.

pub mod asn1;
pub mod curve;
pub mod encoding;
pub mod error;
pub mod keypair;
pub mod material;
pub mod public_key;

pub use curve::{EcPoint, EcScalar};
pub use error::KeyError;
pub use keypair::KeyPair;
pub use material::{Algorithm, CurveParams, Encoding, KeyMaterial, Serialization};
pub use public_key::{ParseOptions, PublicKey};
