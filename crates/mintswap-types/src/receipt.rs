//! Signed settlement receipts.
//!
//! Every settled trade produces a [`SettlementReceipt`] that the redeemer
//! (or anyone holding the instance's verifying key) can check offline.

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Amount, InstanceId, ItemBag, SeatId, SettlementId, TicketId, constants};

/// Proof that one trade ticket settled: what was paid and what was minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub settlement_id: SettlementId,
    pub instance_id: InstanceId,
    pub ticket_id: TicketId,
    /// The redeemer's seat.
    pub seat_id: SeatId,
    /// 1-based position of this settlement in the instance's history.
    pub sequence: u64,
    /// Everything moved into the proceeds escrow.
    pub paid: Amount,
    /// Exactly the bag the redeemer asked for.
    pub minted: ItemBag,
    /// Unit count of `minted`.
    pub total_items: u64,
    pub settled_at: DateTime<Utc>,
    /// SHA-256 of [`SettlementReceipt::signing_payload`].
    pub payload_hash: [u8; 32],
    /// Ed25519 signature over `payload_hash`.
    pub signature: Vec<u8>,
}

impl SettlementReceipt {
    /// Canonical bytes covered by the signature.
    ///
    /// Format: `domain || settlement_id || instance_id || ticket_id || seat_id || sequence || paid || minted || total_items || settled_at_ms`
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(256);
        payload.extend_from_slice(constants::RECEIPT_DOMAIN);
        payload.extend_from_slice(self.settlement_id.0.as_bytes());
        payload.extend_from_slice(self.instance_id.0.as_bytes());
        payload.extend_from_slice(self.ticket_id.0.as_bytes());
        payload.extend_from_slice(self.seat_id.0.as_bytes());
        payload.extend_from_slice(&self.sequence.to_le_bytes());
        payload.extend_from_slice(self.paid.to_string().as_bytes());
        payload.extend_from_slice(self.minted.to_string().as_bytes());
        payload.extend_from_slice(&self.total_items.to_le_bytes());
        payload.extend_from_slice(&self.settled_at.timestamp_millis().to_le_bytes());
        payload
    }

    #[must_use]
    pub fn compute_hash(&self) -> [u8; 32] {
        let digest = Sha256::digest(self.signing_payload());
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        hash
    }

    /// Check the hash matches the contents and the signature matches the hash.
    #[must_use]
    pub fn verify(&self, key: &VerifyingKey) -> bool {
        if self.compute_hash() != self.payload_hash {
            return false;
        }
        let Ok(signature) = Signature::from_slice(&self.signature) else {
            return false;
        };
        key.verify(&self.payload_hash, &signature).is_ok()
    }

    /// Short hex form of the payload hash for logs.
    #[must_use]
    pub fn short_hash(&self) -> String {
        hex::encode(&self.payload_hash[..8])
    }
}
