//! # mintswap-settlement
//!
//! **Contract plane**: trade tickets, the offer handler, the hosted
//! redemption flow and signed settlement receipts.
//!
//! ## Architecture
//!
//! A [`SwapInstance`] is started from an [`InstanceConfig`](mintswap_types::InstanceConfig)
//! and exposes a [`PublicFacet`] whose only operation hands out
//! single-use [`TradeTicket`]s. Redeeming a ticket:
//! 1. Consumes the ticket (ISSUED → SPENT, dropped from the table)
//! 2. Checks the proposal shape and the payments
//! 3. Runs the [`TradeHandler`]: cap check, exact mint, atomic swap
//! 4. Commits the ledger transaction under supply conservation
//! 5. Signs a [`SettlementReceipt`](mintswap_types::SettlementReceipt)
//!
//! Any failure before the commit refunds the redeemer in full.

pub mod facet;
pub mod handler;
pub mod instance;
pub mod signer;
pub mod telemetry;
pub mod ticket;

pub use facet::PublicFacet;
pub use handler::{OfferPhase, SettledOffer, TradeHandler};
pub use instance::{SwapInstance, UserSeat};
pub use signer::ReceiptSigner;
pub use ticket::{TicketRegistry, TradeTicket};
