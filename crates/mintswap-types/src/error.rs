//! Error types for the mintswap settlement engine.
//!
//! All errors use the `MS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Proposal / shape errors
//! - 2xx: Amount and brand errors
//! - 3xx: Trade ticket errors
//! - 4xx: Seat errors
//! - 5xx: Offer handler errors
//! - 6xx: Fatal invariant violations
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{InstanceId, SeatId, TicketId};

/// Central error enum for all mintswap operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MintswapError {
    // =================================================================
    // Proposal Errors (1xx)
    // =================================================================
    /// The proposal doesn't conform to the ticket's declared shape.
    #[error("MS_ERR_100: Proposal shape mismatch: {reason}")]
    ShapeMismatch { reason: String },

    /// The payments handed over don't match the proposal's `give`.
    #[error("MS_ERR_101: Payment mismatch: {reason}")]
    PaymentMismatch { reason: String },

    // =================================================================
    // Amount Errors (2xx)
    // =================================================================
    /// Two amounts of different brands were combined.
    #[error("MS_ERR_200: Brand mismatch: expected {expected}, got {actual}")]
    BrandMismatch { expected: String, actual: String },

    /// Subtraction would take more than is held.
    #[error("MS_ERR_201: Insufficient amount: need {needed}, have {available}")]
    InsufficientAmount { needed: String, available: String },

    /// An item count or value overflowed.
    #[error("MS_ERR_202: Amount overflow")]
    AmountOverflow,

    // =================================================================
    // Ticket Errors (3xx)
    // =================================================================
    /// The ticket isn't outstanding: never issued here, or already spent.
    #[error("MS_ERR_300: Ticket not outstanding: {0}")]
    TicketNotOutstanding(TicketId),

    /// The ticket belongs to a different contract instance.
    #[error("MS_ERR_301: Ticket {ticket} was issued by {issuer}, not {instance}")]
    ForeignTicket {
        ticket: TicketId,
        issuer: InstanceId,
        instance: InstanceId,
    },

    // =================================================================
    // Seat Errors (4xx)
    // =================================================================
    /// No seat with this ID exists in the ledger.
    #[error("MS_ERR_400: Seat not found: {0}")]
    SeatNotFound(SeatId),

    /// The seat has already exited and holds nothing further.
    #[error("MS_ERR_401: Seat already exited: {0}")]
    SeatExited(SeatId),

    /// The seat only ever receives; it can't give or exit.
    #[error("MS_ERR_402: Seat {0} is receive-only")]
    ReceiveOnlySeat(SeatId),

    // =================================================================
    // Offer Handler Errors (5xx)
    // =================================================================
    /// The requested bag exceeds the per-trade unit cap.
    #[error("MS_ERR_500: Requested {requested} items, cap is {max_items}")]
    CapExceeded { requested: u128, max_items: u64 },

    // =================================================================
    // Fatal Invariant Violations (6xx)
    // =================================================================
    /// The mint produced something other than the requested bag.
    #[error("MS_ERR_600: Mint invariant violation: {reason}")]
    MintMismatch { reason: String },

    /// An atomic rearrangement would apply partially or create/destroy value.
    #[error("MS_ERR_601: Rearrangement invariant violation: {reason}")]
    RearrangeInvariant { reason: String },

    /// Supply conservation invariant violated.
    #[error("MS_ERR_602: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// A previous fatal error halted this instance.
    #[error("MS_ERR_603: Instance {0} halted after invariant violation")]
    InstanceHalted(InstanceId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("MS_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("MS_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config, bad terms, etc.).
    #[error("MS_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl MintswapError {
    /// Fatal errors mean the engine itself is inconsistent; they are never
    /// the redeemer's fault and must abort the whole transaction.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MintMismatch { .. }
                | Self::RearrangeInvariant { .. }
                | Self::SupplyInvariantViolation { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, MintswapError>;

impl From<serde_json::Error> for MintswapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_exceeded_display() {
        let err = MintswapError::CapExceeded {
            requested: 4,
            max_items: 3,
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("MS_ERR_500"), "Got: {msg}");
        assert!(msg.contains('4'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn fatal_classification() {
        assert!(MintswapError::MintMismatch { reason: "x".into() }.is_fatal());
        assert!(MintswapError::RearrangeInvariant { reason: "x".into() }.is_fatal());
        assert!(MintswapError::SupplyInvariantViolation { reason: "x".into() }.is_fatal());
        assert!(
            !MintswapError::CapExceeded {
                requested: 9,
                max_items: 3
            }
            .is_fatal()
        );
        assert!(!MintswapError::ShapeMismatch { reason: "x".into() }.is_fatal());
    }

    #[test]
    fn all_errors_have_ms_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(MintswapError::TicketNotOutstanding(TicketId::new())),
            Box::new(MintswapError::SeatExited(SeatId::new())),
            Box::new(MintswapError::AmountOverflow),
            Box::new(MintswapError::InstanceHalted(InstanceId::new())),
            Box::new(MintswapError::Internal("test".into())),
            Box::new(MintswapError::BrandMismatch {
                expected: "a".into(),
                actual: "b".into(),
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("MS_ERR_"),
                "Error missing MS_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn json_errors_convert() {
        let err: MintswapError = serde_json::from_str::<u64>("nope").unwrap_err().into();
        assert!(matches!(err, MintswapError::Serialization(_)));
    }
}
