//! # mintswap-types
//!
//! Shared types, errors, and configuration for the **mintswap** settlement
//! engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`InstanceId`], [`TicketId`], [`SeatId`], [`SettlementId`]
//! - **Item bags**: [`ItemBag`] and the counting utility [`count_items`]
//! - **Amounts**: [`Brand`], [`AssetKind`], [`Amount`], [`Allocation`]
//! - **Proposals**: [`Proposal`], [`ExitRule`], [`ProposalShape`], [`AmountPattern`]
//! - **Configuration**: [`Terms`], [`InstanceConfig`], [`TelemetryConfig`]
//! - **Receipts**: [`SettlementReceipt`]
//! - **Errors**: [`MintswapError`] with `MS_ERR_` prefix codes
//! - **Constants**: keywords and defaults

pub mod amount;
pub mod bag;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod proposal;
pub mod receipt;

pub use amount::*;
pub use bag::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use proposal::*;
pub use receipt::*;

// Constants are accessed via `mintswap_types::constants::FOO`
// (not re-exported to avoid name collisions).
