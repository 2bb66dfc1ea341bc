//! Proceeds escrow: the contract-owned seat that collects payments.
//!
//! The escrow only ever receives. The ledger refuses any transfer out of
//! it and refuses to exit it, so its balance is monotonically
//! non-decreasing for the life of the instance.

use mintswap_types::{Allocation, Amount, AssetKind, Brand, MintswapError, Result, SeatId, constants};

use crate::ledger::{SeatLedger, Transfer};
use crate::seat::SeatRole;

/// Handle on the proceeds seat of one instance.
#[derive(Debug, Clone)]
pub struct ProceedsEscrow {
    seat: SeatId,
    brand: Brand,
}

impl ProceedsEscrow {
    /// Open the (empty) proceeds seat for a payment brand.
    pub fn open(ledger: &mut SeatLedger, brand: Brand) -> Result<Self> {
        if brand.kind != AssetKind::Fungible {
            return Err(MintswapError::Configuration(format!(
                "proceeds brand {brand} must be fungible"
            )));
        }
        let seat = ledger.open_seat(
            SeatRole::Proceeds,
            None,
            Allocation::new().with(constants::KEYWORD_PRICE, Amount::empty(&brand)),
        )?;
        Ok(Self { seat, brand })
    }

    #[must_use]
    pub fn seat_id(&self) -> SeatId {
        self.seat
    }

    /// The leg that moves `amount` from `payer`'s `Price` into the escrow.
    /// It takes effect only as part of a rearrangement.
    #[must_use]
    pub fn receive(&self, payer: SeatId, amount: Amount) -> Transfer {
        Transfer::new(payer, self.seat, constants::KEYWORD_PRICE, amount)
    }

    /// Everything collected so far.
    pub fn balance(&self, ledger: &SeatLedger) -> Result<Amount> {
        Ok(ledger
            .allocation(self.seat)?
            .get_or_empty(constants::KEYWORD_PRICE, &self.brand))
    }
}
