//! Identifiers used throughout mintswap.
//!
//! Entity IDs use UUIDv7 for time-ordered sorting, except `SettlementId`
//! which is derived deterministically from the instance and sequence.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants;

// ---------------------------------------------------------------------------
// InstanceId
// ---------------------------------------------------------------------------

/// Identifies one running contract instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TicketId
// ---------------------------------------------------------------------------

/// Unique identifier for a trade ticket (invitation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TicketId(pub Uuid);

impl TicketId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticket:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SeatId
// ---------------------------------------------------------------------------

/// Unique identifier for a seat in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SeatId(pub Uuid);

impl SeatId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SeatId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SettlementId
// ---------------------------------------------------------------------------

/// Identifier of a settled trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SettlementId(pub Uuid);

impl SettlementId {
    /// Deterministic `SettlementId` from the instance and its settlement
    /// sequence number. Replaying the same instance history reproduces the
    /// same identifiers.
    #[must_use]
    pub fn deterministic(instance: InstanceId, sequence: u64) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(constants::SETTLEMENT_ID_DOMAIN);
        hasher.update(instance.0.as_bytes());
        hasher.update(sequence.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_id_uniqueness() {
        assert_ne!(TicketId::new(), TicketId::new());
    }

    #[test]
    fn seat_id_ordering() {
        let a = SeatId::new();
        let b = SeatId::new();
        assert!(a < b);
    }

    #[test]
    fn settlement_id_deterministic() {
        let instance = InstanceId::new();
        let a = SettlementId::deterministic(instance, 7);
        let b = SettlementId::deterministic(instance, 7);
        assert_eq!(a, b);
        assert_ne!(a, SettlementId::deterministic(instance, 8));
        assert_ne!(a, SettlementId::deterministic(InstanceId::new(), 7));
    }

    #[test]
    fn display_prefixes() {
        assert!(TicketId::new().to_string().starts_with("ticket:"));
        assert!(SeatId::new().to_string().starts_with("seat:"));
        assert!(InstanceId::new().to_string().starts_with("instance:"));
    }
}
