//! Signing helpers shared by the integration tests, the benchmark and the demo
#![allow(dead_code)]

use k1::VerificationRequest;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use lanes::NostrEvent;
use rand::Rng;

/// A random signing key whose public point has even y, with its x coordinate
pub fn even_key(rng: &mut impl Rng) -> (SigningKey, [u8; 32]) {
    loop {
        let Ok(key) = SigningKey::from_slice(&rng.random::<[u8; 32]>()) else {
            continue;
        };
        let point = key.verifying_key().as_affine().to_encoded_point(true);
        if point.as_bytes()[0] != 0x02 {
            continue;
        }
        let mut x = [0u8; 32];
        x.copy_from_slice(&point.as_bytes()[1..33]);
        return (key, x);
    }
}

pub fn sign(key: &SigningKey, hash: &[u8; 32]) -> [u8; 64] {
    let sig: Signature = key.sign_prehash(hash).expect("signing failed");
    let mut out = [0u8; 64];
    out.copy_from_slice(&sig.to_bytes());
    out
}

/// A valid request over a random hash
pub fn valid_request(rng: &mut impl Rng) -> VerificationRequest {
    let (key, pubkey_x) = even_key(rng);
    let hash: [u8; 32] = rng.random();
    VerificationRequest::new(hash, sign(&key, &hash), pubkey_x)
}

/// A request whose signature was made over a different hash
pub fn invalid_request(rng: &mut impl Rng) -> VerificationRequest {
    let mut request = valid_request(rng);
    request.message_hash[0] ^= 0x80;
    request
}

/// A signed Nostr event with a correct id
pub fn signed_event(rng: &mut impl Rng, content: &str) -> NostrEvent {
    let (key, pubkey_x) = even_key(rng);
    let mut event = NostrEvent {
        id: String::new(),
        pubkey: hex::encode(pubkey_x),
        created_at: 1_700_000_000 + rng.random_range(0..1_000_000u64),
        kind: 1,
        tags: vec![vec!["t".to_string(), "test".to_string()]],
        content: content.to_string(),
        sig: String::new(),
    };
    let id = event.canonical_id().expect("serializable event");
    event.id = hex::encode(id);
    event.sig = hex::encode(sign(&key, &id));
    event
}
