//! Relay validation hook
//!
//! A relay hands over the events received in one validation cycle. Each
//! event exposes a 32-byte id (the signed digest), a 64-byte r || s
//! signature and a 32-byte x-only public key, all as hex strings on the
//! wire. The whole cycle goes to the dispatcher as one batch.
//!
//! Failure handling is fail-closed: an event whose fields do not decode is
//! rejected on its own, and a batch-level failure rejects every event of the
//! cycle. Nothing is retried here; resubmission is the relay's decision.

use crate::batch::{BatchBuffers, BatchVerifier};
use crate::error::{BatchError, ValidationError};
use k1::{CurveConstants, VerificationRequest};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An event as seen by the validation hook
pub trait SignedEvent {
    /// The signed 32-byte digest, `None` if it does not decode
    fn id_bytes(&self) -> Option<[u8; 32]>;

    /// The compact r || s signature, `None` if it does not decode
    fn sig_bytes(&self) -> Option<[u8; 64]>;

    /// The x-only public key, `None` if it does not decode
    fn pubkey_bytes(&self) -> Option<[u8; 32]>;

    fn request(&self) -> Option<VerificationRequest> {
        Some(VerificationRequest::new(
            self.id_bytes()?,
            self.sig_bytes()?,
            self.pubkey_bytes()?,
        ))
    }
}

/// A Nostr event (NIP-01 wire format)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NostrEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u32,
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    #[serde(default)]
    pub content: String,
    pub sig: String,
}

impl NostrEvent {
    /// Computes the NIP-01 event id:
    /// `sha256(json([0, pubkey, created_at, kind, tags, content]))`
    pub fn canonical_id(&self) -> Result<[u8; 32], serde_json::Error> {
        let payload = serde_json::json!([
            0,
            self.pubkey,
            self.created_at,
            self.kind,
            self.tags,
            self.content
        ]);
        let serialized = serde_json::to_string(&payload)?;
        Ok(Sha256::digest(serialized.as_bytes()).into())
    }

    /// Whether the `id` field equals the id computed from the contents
    pub fn id_matches(&self) -> bool {
        match (self.canonical_id(), self.id_bytes()) {
            (Ok(expected), Some(actual)) => expected == actual,
            _ => false,
        }
    }
}

fn decode_fixed<const L: usize>(hex_str: &str) -> Option<[u8; L]> {
    let mut out = [0u8; L];
    hex::decode_to_slice(hex_str, &mut out).ok()?;
    Some(out)
}

impl SignedEvent for NostrEvent {
    fn id_bytes(&self) -> Option<[u8; 32]> {
        decode_fixed(&self.id)
    }

    fn sig_bytes(&self) -> Option<[u8; 64]> {
        decode_fixed(&self.sig)
    }

    fn pubkey_bytes(&self) -> Option<[u8; 32]> {
        decode_fixed(&self.pubkey)
    }
}

/// Batch validation hook for a relay
pub struct EventValidator {
    verifier: BatchVerifier,
}

impl EventValidator {
    pub fn new(verifier: BatchVerifier) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &BatchVerifier {
        &self.verifier
    }

    /// Verifies one validation cycle
    ///
    /// Returns one flag per event, aligned with `events`. Never returns
    /// `true` for an event that was not positively verified.
    pub fn validate<E: SignedEvent>(&self, events: &[E]) -> Vec<bool> {
        match self.try_validate(events) {
            Ok(flags) => flags,
            Err(err) => {
                log::warn!(
                    "Batch verification failed (code {}), rejecting {} events: {}",
                    err.code(),
                    events.len(),
                    err
                );
                vec![false; events.len()]
            }
        }
    }

    /// Like `validate`, but surfaces a batch-level failure to the caller
    pub fn try_validate<E: SignedEvent>(&self, events: &[E]) -> Result<Vec<bool>, BatchError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        // Undecodable events still occupy a slot (all-zero request, which
        // fails the r != 0 check) so verdicts stay aligned with the input.
        let mut buffers = BatchBuffers::with_capacity(events.len())?;
        let mut decoded = Vec::new();
        decoded
            .try_reserve_exact(events.len())
            .map_err(|_| BatchError::Allocation {
                what: "decode flags",
                bytes: events.len() as u128,
            })?;
        let blank = VerificationRequest::new([0; 32], [0; 64], [0; 32]);

        for (i, event) in events.iter().enumerate() {
            match event.request() {
                Some(request) => {
                    buffers.push(&request);
                    decoded.push(true);
                }
                None => {
                    log::debug!("Event {} has malformed id, sig or pubkey", i);
                    buffers.push(&blank);
                    decoded.push(false);
                }
            }
        }

        let verdicts = self.verifier.verify_input(&buffers.as_input()?)?;
        Ok(verdicts
            .iter()
            .zip(decoded)
            .map(|(&verdict, ok)| ok && verdict == 1)
            .collect())
    }
}

/// Single-event hook
///
/// Verifies on the calling thread and reports a rejection in the relay's
/// error-message format.
pub fn validate_event<E: SignedEvent>(event: &E) -> Result<(), ValidationError> {
    let id = event
        .id_bytes()
        .ok_or_else(|| ValidationError::Malformed("id is not 32 bytes of hex".into()))?;
    let sig = event
        .sig_bytes()
        .ok_or_else(|| ValidationError::Malformed("sig is not 64 bytes of hex".into()))?;
    let pubkey = event
        .pubkey_bytes()
        .ok_or_else(|| ValidationError::Malformed("pubkey is not 32 bytes of hex".into()))?;

    let request = VerificationRequest::new(id, sig, pubkey);
    k1::verify(CurveConstants::get(), &request).map_err(|reason| {
        log::trace!("Event rejected: {}", reason);
        ValidationError::BadSignature
    })
}
