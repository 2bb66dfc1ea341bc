//! Unit mint: the only source of new item units.
//!
//! The mint holds minting authority for one bag brand. It enforces no cap;
//! callers decide how much may be minted. What it does guarantee is that a
//! mint produces exactly the requested bag, kind for kind and count for
//! count, on a fresh contract seat inside the caller's transaction.

use mintswap_types::{
    Allocation, Amount, AssetKind, Brand, ItemBag, MintswapError, Result, SeatId, constants,
};
use tracing::debug;

use crate::ledger::{SeatLedger, Transaction};
use crate::seat::SeatRole;

/// Minting authority for an item brand.
#[derive(Debug)]
pub struct UnitMint {
    brand: Brand,
}

impl UnitMint {
    /// Create the mint for a bag brand.
    pub fn new(brand: Brand) -> Result<Self> {
        if brand.kind != AssetKind::Bag {
            return Err(MintswapError::Configuration(format!(
                "mint brand {brand} must be a bag brand"
            )));
        }
        Ok(Self { brand })
    }

    #[must_use]
    pub fn brand(&self) -> &Brand {
        &self.brand
    }

    /// Stage a mint of exactly `bag` onto a new internal seat.
    ///
    /// The new units count as an inflow when the transaction commits; if
    /// it is dropped instead, the mint never happened.
    ///
    /// # Errors
    /// Returns [`MintswapError::MintMismatch`] if the staged seat doesn't
    /// hold exactly `bag`.
    pub fn mint_exact(&self, txn: &mut Transaction<'_>, bag: &ItemBag) -> Result<SeatId> {
        let amount = Amount::bag(self.brand.clone(), bag.clone())?;
        let seat = txn.open_seat(
            SeatRole::Mint,
            Allocation::new().with(constants::KEYWORD_ITEMS, amount.clone()),
        );
        txn.record_inflow(amount);

        let minted = txn
            .seat(seat)?
            .allocation()
            .get(constants::KEYWORD_ITEMS)
            .and_then(Amount::as_bag);
        if minted != Some(bag) {
            return Err(MintswapError::MintMismatch {
                reason: format!(
                    "requested {bag}, mint seat holds {}",
                    minted.map_or_else(|| "nothing".to_string(), ToString::to_string)
                ),
            });
        }

        debug!(seat = %seat, bag = %bag, units = bag.total(), "Units minted");
        Ok(seat)
    }

    /// Total units ever minted: the outstanding supply of the brand.
    #[must_use]
    pub fn total_supply(&self, ledger: &SeatLedger) -> ItemBag {
        ledger
            .supply()
            .total_inflows(&self.brand)
            .as_bag()
            .cloned()
            .unwrap_or_default()
    }
}
