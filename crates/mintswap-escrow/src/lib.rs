//! # mintswap-escrow
//!
//! **Custody plane**: seats, staged ledger transactions, the unit mint and
//! the proceeds escrow.
//!
//! ## Architecture
//!
//! 1. **SeatLedger**: holds every seat's allocation for one instance
//! 2. **Transaction**: stages mints, transfers and exits; commits all or nothing
//! 3. **UnitMint**: creates exactly the requested item bag on an internal seat
//! 4. **ProceedsEscrow**: receive-only seat that collects payments
//! 5. **SupplyConservation**: `Σ holdings == Σ inflows - Σ outflows`, checked on every commit
//!
//! ## Flow
//!
//! ```text
//! open_seat(deposit) → transaction() → mint_exact() → rearrange() → exit() → commit()
//! ```

pub mod ledger;
pub mod mint;
pub mod proceeds;
pub mod seat;
pub mod supply_conservation;

pub use ledger::{SeatLedger, Transaction, Transfer};
pub use mint::UnitMint;
pub use proceeds::ProceedsEscrow;
pub use seat::{Seat, SeatRole, SeatState};
pub use supply_conservation::SupplyConservation;
