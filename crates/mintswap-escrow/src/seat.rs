//! # Seats: per-party holdings inside a contract instance
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐   exit (payout)   ┌────────┐
//!   │ ACTIVE ├──────────────────▶│ EXITED │
//!   └────────┘                   └────────┘
//! ```
//!
//! An exited seat holds nothing and can't take part in transfers again.
//! Proceeds seats are receive-only and never exit.

use mintswap_types::{Allocation, MintswapError, Proposal, Result, SeatId};

/// Who a seat belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeatRole {
    /// An external party that redeemed a trade ticket.
    Redeemer,
    /// Contract-internal seat holding freshly minted units.
    Mint,
    /// Contract-owned escrow that only ever receives.
    Proceeds,
}

impl std::fmt::Display for SeatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redeemer => write!(f, "REDEEMER"),
            Self::Mint => write!(f, "MINT"),
            Self::Proceeds => write!(f, "PROCEEDS"),
        }
    }
}

/// Lifecycle state of a seat. `Active → Exited` is irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeatState {
    Active,
    Exited,
}

impl SeatState {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Active, Self::Exited))
    }
}

impl std::fmt::Display for SeatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Exited => write!(f, "EXITED"),
        }
    }
}

/// Holdings of one participant for the life of one offer (or, for the
/// proceeds seat, the life of the instance).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    id: SeatId,
    role: SeatRole,
    proposal: Option<Proposal>,
    allocation: Allocation,
    state: SeatState,
}

impl Seat {
    #[must_use]
    pub fn new(role: SeatRole, proposal: Option<Proposal>, allocation: Allocation) -> Self {
        Self {
            id: SeatId::new(),
            role,
            proposal,
            allocation,
            state: SeatState::Active,
        }
    }

    #[must_use]
    pub fn id(&self) -> SeatId {
        self.id
    }

    #[must_use]
    pub fn role(&self) -> SeatRole {
        self.role
    }

    /// The proposal this seat was opened with, for redeemer seats.
    #[must_use]
    pub fn proposal(&self) -> Option<&Proposal> {
        self.proposal.as_ref()
    }

    #[must_use]
    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    #[must_use]
    pub fn state(&self) -> SeatState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SeatState::Active
    }

    #[must_use]
    pub fn is_receive_only(&self) -> bool {
        self.role == SeatRole::Proceeds
    }

    /// Fails unless the seat is active.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(MintswapError::SeatExited(self.id))
        }
    }

    pub(crate) fn allocation_mut(&mut self) -> &mut Allocation {
        &mut self.allocation
    }

    /// Exit the seat, handing back everything it holds.
    pub(crate) fn mark_exited(&mut self) -> Result<Allocation> {
        if self.is_receive_only() {
            return Err(MintswapError::ReceiveOnlySeat(self.id));
        }
        if !self.state.can_transition_to(SeatState::Exited) {
            return Err(MintswapError::SeatExited(self.id));
        }
        self.state = SeatState::Exited;
        Ok(self.allocation.take())
    }
}
