//! System-wide constants for the mintswap settlement engine.

/// Default per-trade unit cap when the terms don't name one.
pub const DEFAULT_MAX_ITEMS: u64 = 3;

/// Allocation keyword for the payment leg of a proposal.
pub const KEYWORD_PRICE: &str = "Price";

/// Allocation keyword for the item leg of a proposal.
pub const KEYWORD_ITEMS: &str = "Items";

/// Completion signal returned to a redeemer whose trade settled.
pub const TRADE_COMPLETE: &str = "trade complete";

/// Description carried by every trade ticket.
pub const TRADE_INVITATION_DESCRIPTION: &str = "trade";

/// Default tracing filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Domain separator for deterministic settlement identifiers.
pub const SETTLEMENT_ID_DOMAIN: &[u8] = b"mintswap:settlement_id:v1:";

/// Domain separator for the receipt signing payload.
pub const RECEIPT_DOMAIN: &[u8] = b"mintswap:receipt:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Mintswap";
