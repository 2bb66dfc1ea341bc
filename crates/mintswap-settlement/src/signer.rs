//! Receipt signing with the instance's ed25519 key.

use chrono::Utc;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use mintswap_types::{
    Amount, InstanceId, ItemBag, SeatId, SettlementId, SettlementReceipt, TicketId,
};

/// Holds the signing key of one instance.
pub struct ReceiptSigner {
    key: SigningKey,
}

impl ReceiptSigner {
    /// Deterministic key from a 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }

    /// Fresh random key from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Build, hash and sign the receipt for one settlement.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn issue(
        &self,
        instance_id: InstanceId,
        sequence: u64,
        ticket_id: TicketId,
        seat_id: SeatId,
        paid: Amount,
        minted: ItemBag,
        total_items: u64,
    ) -> SettlementReceipt {
        let mut receipt = SettlementReceipt {
            settlement_id: SettlementId::deterministic(instance_id, sequence),
            instance_id,
            ticket_id,
            seat_id,
            sequence,
            paid,
            minted,
            total_items,
            settled_at: Utc::now(),
            payload_hash: [0u8; 32],
            signature: Vec::new(),
        };
        receipt.payload_hash = receipt.compute_hash();
        receipt.signature = self.key.sign(&receipt.payload_hash).to_bytes().to_vec();
        receipt
    }
}

impl std::fmt::Debug for ReceiptSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptSigner")
            .field("verifying_key", &hex::encode(self.verifying_key().as_bytes()))
            .finish_non_exhaustive()
    }
}
