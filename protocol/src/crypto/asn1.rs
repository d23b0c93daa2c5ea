//! ASN.1 DER SubjectPublicKeyInfo for named EC curves.
//!
//! ```text
//! SEQUENCE {
//!   SEQUENCE { OID id-ecPublicKey, OID <named curve> }
//!   BIT STRING <SEC1 point>
//! }
//! ```
//!
//! DER itself is handled by the `spki`/`der` crates; this module only maps
//! the algorithm identifier to our curves and the bit string to a point.

use spki::der::asn1::{AnyRef, BitStringRef};
use spki::der::{Decode, Encode};
use spki::{AlgorithmIdentifierRef, ObjectIdentifier, SubjectPublicKeyInfoRef};
use tracing::debug;

use super::curve::EcPoint;
use super::error::KeyError;
use super::material::Algorithm;

/// `id-ecPublicKey` from RFC 5480.
pub const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// DER tag of a constructed SEQUENCE.
pub const SEQUENCE_TAG: u8 = 0x30;

/// Decodes a DER SubjectPublicKeyInfo into a curve-bound point.
pub fn decode_spki(der: &[u8]) -> Result<EcPoint, KeyError> {
    if der.first() != Some(&SEQUENCE_TAG) {
        return Err(KeyError::InvalidFormat(
            "ASN.1 input does not start with a SEQUENCE".to_string(),
        ));
    }

    let spki = SubjectPublicKeyInfoRef::from_der(der).map_err(|e| {
        KeyError::InvalidFormat(format!("malformed SubjectPublicKeyInfo: {e}"))
    })?;

    if spki.algorithm.oid != ID_EC_PUBLIC_KEY {
        return Err(KeyError::InvalidFormat(format!(
            "algorithm {} is not id-ecPublicKey",
            spki.algorithm.oid
        )));
    }

    let curve_oid = spki
        .algorithm
        .parameters_oid()
        .map_err(|_| KeyError::InvalidFormat("missing named-curve parameters".to_string()))?;

    let algorithm = Algorithm::from_oid(&curve_oid).ok_or_else(|| {
        KeyError::InvalidFormat(format!("unsupported named curve {curve_oid}"))
    })?;

    let point_bytes = spki.subject_public_key.as_bytes().ok_or_else(|| {
        KeyError::InvalidFormat("public key bit string has unused bits".to_string())
    })?;

    debug!(%algorithm, "decoded SubjectPublicKeyInfo");
    EcPoint::from_sec1(algorithm, point_bytes)
}

/// Encodes a point as DER SubjectPublicKeyInfo with its named-curve OID.
pub fn encode_spki(point: &EcPoint) -> Result<Vec<u8>, KeyError> {
    let params = point.algorithm().require_params()?;
    let sec1 = point.to_uncompressed();

    let spki = SubjectPublicKeyInfoRef {
        algorithm: AlgorithmIdentifierRef {
            oid: ID_EC_PUBLIC_KEY,
            parameters: Some(AnyRef::from(&params.oid)),
        },
        subject_public_key: BitStringRef::from_bytes(&sec1)
            .map_err(|e| KeyError::InvalidFormat(e.to_string()))?,
    };

    spki.to_der()
        .map_err(|e| KeyError::InvalidFormat(format!("DER encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::curve::EcScalar;

    #[test]
    fn spki_roundtrip_all_curves() {
        for alg in Algorithm::SUPPORTED {
            let point = EcScalar::random(alg).unwrap().public_point();
            let der = encode_spki(&point).unwrap();
            assert_eq!(der[0], SEQUENCE_TAG);
            assert_eq!(decode_spki(&der).unwrap(), point);
        }
    }

    #[test]
    fn p256_spki_has_expected_length() {
        // 26-byte header + 65-byte uncompressed point, the classic 91-byte blob.
        let point = EcScalar::random(Algorithm::Secp256r1).unwrap().public_point();
        assert_eq!(encode_spki(&point).unwrap().len(), 91);
    }

    #[test]
    fn rejects_non_sequence() {
        assert!(matches!(
            decode_spki(&[0x04, 0x01, 0x02]),
            Err(KeyError::InvalidFormat(_))
        ));
        assert!(matches!(decode_spki(&[]), Err(KeyError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_truncated_der() {
        let point = EcScalar::random(Algorithm::Secp256r1).unwrap().public_point();
        let der = encode_spki(&point).unwrap();
        assert!(matches!(
            decode_spki(&der[..der.len() - 5]),
            Err(KeyError::InvalidFormat(_))
        ));
    }

    #[test]
    fn rejects_unsupported_curve_oid() {
        let point = EcScalar::random(Algorithm::Secp256r1).unwrap().public_point();
        let sec1 = point.to_uncompressed();
        // brainpoolP256r1
        let brainpool = ObjectIdentifier::new_unwrap("1.3.36.3.3.2.8.1.1.7");
        let spki = SubjectPublicKeyInfoRef {
            algorithm: AlgorithmIdentifierRef {
                oid: ID_EC_PUBLIC_KEY,
                parameters: Some(AnyRef::from(&brainpool)),
            },
            subject_public_key: BitStringRef::from_bytes(&sec1).unwrap(),
        };
        let der = spki.to_der().unwrap();
        assert!(matches!(decode_spki(&der), Err(KeyError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_unassigned_prime_curve_arc() {
        let point = EcScalar::random(Algorithm::Secp256r1).unwrap().public_point();
        let mut der = encode_spki(&point).unwrap();
        // Named-curve OID 1.2.840.10045.3.1.7 becomes 1.2.840.10045.3.1.9.
        let p256_oid = [0x06, 0x08, 0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
        let at = der
            .windows(p256_oid.len())
            .position(|w| w == &p256_oid[..])
            .unwrap();
        der[at + p256_oid.len() - 1] = 0x09;

        match decode_spki(&der) {
            Err(KeyError::InvalidFormat(msg)) => assert!(msg.contains("1.2.840.10045.3.1.9")),
            other => panic!("expected InvalidFormat, got {:?}", other),
        }
    }

    #[test]
    fn rejects_point_not_on_declared_curve() {
        let point = EcScalar::random(Algorithm::Secp256k1).unwrap().public_point();
        let sec1 = point.to_uncompressed();
        let p256_oid = Algorithm::Secp256r1.params().unwrap().oid;
        let spki = SubjectPublicKeyInfoRef {
            algorithm: AlgorithmIdentifierRef {
                oid: ID_EC_PUBLIC_KEY,
                parameters: Some(AnyRef::from(&p256_oid)),
            },
            subject_public_key: BitStringRef::from_bytes(&sec1).unwrap(),
        };
        let der = spki.to_der().unwrap();
        assert!(matches!(decode_spki(&der), Err(KeyError::InvalidFormat(_))));
    }
}
