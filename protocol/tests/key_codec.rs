//! Integration tests for the key material codecs.
//!
//! Keys go out through one public API and come back in through another:
//! key pair → text → public key parser, key pair → JSON → key pair. Each
//! test generates its own keys; nothing is shared between tests.

use chargemesh_protocol::crypto::{
    Algorithm, Encoding, KeyError, KeyPair, ParseOptions, PublicKey, Serialization,
};

const SERIALIZATIONS: [Serialization; 3] = [
    Serialization::Raw,
    Serialization::AsnDer,
    Serialization::EccXY,
];

const TEXT_ENCODINGS: [Encoding; 3] = [Encoding::Hex, Encoding::Base32, Encoding::Base64];

#[test]
fn public_key_text_roundtrip_every_combination() {
    for alg in Algorithm::SUPPORTED {
        let pair = KeyPair::generate(alg).unwrap();
        for serialization in SERIALIZATIONS {
            for enc in TEXT_ENCODINGS {
                let public = pair
                    .clone()
                    .with_serialization(serialization)
                    .with_encoding(enc)
                    .public_key();
                let text = public.encoded_value();

                let options = ParseOptions::new()
                    .algorithm(alg)
                    .serialization(serialization)
                    .encoding(enc);
                let parsed = PublicKey::try_parse(&text, options).unwrap_or_else(|e| {
                    panic!("{alg}/{serialization}/{enc} failed to parse: {e}")
                });

                assert_eq!(parsed.point(), Some(pair.public_point()));
                let expected = pair
                    .clone()
                    .with_serialization(serialization)
                    .public_key_bytes();
                assert_eq!(parsed.value(), expected);
            }
        }
    }
}

#[test]
fn key_pair_json_roundtrip_every_combination() {
    for alg in Algorithm::SUPPORTED {
        for serialization in SERIALIZATIONS {
            for enc in TEXT_ENCODINGS {
                let pair = KeyPair::generate(alg)
                    .unwrap()
                    .with_serialization(serialization)
                    .with_encoding(enc);
                let json = pair.to_json();
                let back = KeyPair::from_json(&json).unwrap();
                assert_eq!(back, pair, "{alg}/{serialization}/{enc}");
            }
        }
    }
}

#[test]
fn default_pair_writes_only_private_and_public() {
    let pair = KeyPair::generate(Algorithm::Secp256r1).unwrap();
    let json = serde_json::to_string(&pair).unwrap();
    assert!(!json.contains("algorithm"));
    assert!(!json.contains("serialization"));
    assert!(!json.contains("encoding"));
    assert!(!json.contains("customData"));

    let back: KeyPair = serde_json::from_str(&json).unwrap();
    assert_eq!(back, pair);
}

#[test]
fn derived_public_key_matches_generated_one() {
    for alg in Algorithm::SUPPORTED {
        let pair = KeyPair::generate(alg).unwrap();
        let text = hex::encode(pair.private_key_bytes().unwrap());
        let derived =
            KeyPair::try_parse_private_key(&text, Some(alg), Some(Encoding::Hex)).unwrap();
        assert_eq!(derived.public_key_bytes(), pair.public_key_bytes());
    }
}

#[test]
fn asn1_blob_is_recognised_without_hints() {
    let pair = KeyPair::generate(Algorithm::Secp384r1)
        .unwrap()
        .with_serialization(Serialization::AsnDer)
        .with_encoding(Encoding::Base64);
    let text = pair.public_key().encoded_value();

    let parsed = PublicKey::try_parse(&text, ParseOptions::new()).unwrap();
    assert_eq!(parsed.algorithm(), Some(Algorithm::Secp384r1));
    assert_eq!(parsed.serialization(), Serialization::AsnDer);
    assert_eq!(parsed, pair.public_key());
}

#[test]
fn encoding_tie_breaks() {
    let hex_wins = PublicKey::try_parse("deadbeef", ParseOptions::new()).unwrap();
    assert_eq!(hex_wins.encoding(), Encoding::Hex);

    let base64_wins = PublicKey::try_parse("MZXW6YTB", ParseOptions::new()).unwrap();
    assert_eq!(base64_wins.encoding(), Encoding::Base64);

    match PublicKey::try_parse("ABCDEFAB", ParseOptions::new()) {
        Err(KeyError::AmbiguousEncoding(tags)) => {
            assert_eq!(
                tags,
                vec![Encoding::Hex, Encoding::Base32, Encoding::Base64]
            )
        }
        other => panic!("expected ambiguity, got {:?}", other),
    }
}

#[test]
fn garbage_is_unparseable() {
    for input in ["", "   ", "!!!", "zz::yy"] {
        assert!(
            matches!(
                PublicKey::try_parse(input, ParseOptions::new()),
                Err(KeyError::Unparseable(_))
            ),
            "{input:?} should be unparseable"
        );
    }
}

#[test]
fn curve_auto_detection_binds_raw_point() {
    let pair = KeyPair::generate(Algorithm::Secp521r1).unwrap();
    let text = hex::encode(pair.public_key_bytes());
    let parsed = PublicKey::try_parse(&text, ParseOptions::new().auto_detect_algorithm()).unwrap();
    assert_eq!(parsed.algorithm(), Some(Algorithm::Secp521r1));

    let unbound = PublicKey::try_parse(&text, ParseOptions::new()).unwrap();
    assert_eq!(unbound.algorithm(), None);
    assert_eq!(unbound.value(), pair.public_key_bytes());
}
