//! Offer handler: the mint-and-swap transition.
//!
//! Runs once per redeemed ticket, inside a ledger transaction:
//! 1. Validate the cap: `count(want.Items) <= max_items`
//! 2. Mint exactly `want.Items` onto an internal seat
//! 3. Rearrange atomically: payment → proceeds, minted bag → redeemer
//! 4. Exit the redeemer seat (payout) and the emptied mint seat
//!
//! ```text
//!   PROPOSED ──▶ VALIDATED ──┬──▶ SETTLED
//!                            ├──▶ REJECTED (cap exceeded)
//!                            └──▶ ABORTED  (invariant violation)
//! ```
//!
//! Every step stages into the transaction. If any step fails the caller
//! drops the transaction and nothing has happened.

use mintswap_escrow::{ProceedsEscrow, Transaction, Transfer, UnitMint};
use mintswap_types::{
    Allocation, Amount, ItemBag, MintswapError, Result, SeatId, Terms, constants, count_items,
};
use tracing::debug;

/// Where one offer ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OfferPhase {
    Proposed,
    Validated,
    Settled,
    /// Over the unit cap.
    Rejected,
    /// The engine failed after the seat was opened.
    Aborted,
}

impl std::fmt::Display for OfferPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proposed => write!(f, "PROPOSED"),
            Self::Validated => write!(f, "VALIDATED"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// Staged result of a successful handler run.
#[derive(Debug, Clone)]
pub struct SettledOffer {
    /// Everything the redeemer gave; all of it goes to proceeds.
    pub paid: Amount,
    /// The bag minted and handed to the redeemer.
    pub minted: ItemBag,
    pub total_items: u64,
    /// The redeemer's final holdings.
    pub payout: Allocation,
}

/// The trade handler bound to one instance's terms, mint and escrow.
pub struct TradeHandler<'a> {
    terms: &'a Terms,
    mint: &'a UnitMint,
    proceeds: &'a ProceedsEscrow,
}

impl<'a> TradeHandler<'a> {
    #[must_use]
    pub fn new(terms: &'a Terms, mint: &'a UnitMint, proceeds: &'a ProceedsEscrow) -> Self {
        Self {
            terms,
            mint,
            proceeds,
        }
    }

    /// Cap check on its own, with no side effects.
    pub fn check_cap(&self, want: &ItemBag) -> Result<u128> {
        let total = count_items(want);
        if total > u128::from(self.terms.max_items) {
            return Err(MintswapError::CapExceeded {
                requested: total,
                max_items: self.terms.max_items,
            });
        }
        Ok(total)
    }

    /// Run the full transition for `seat`, staging everything in `txn`.
    ///
    /// The seat's proposal must already have passed the ticket's shape.
    ///
    /// # Errors
    /// - `CapExceeded` if the requested bag is over the cap (nothing staged)
    /// - fatal invariant errors if the mint or rearrangement misbehaves
    pub fn handle(&self, txn: &mut Transaction<'_>, seat: SeatId) -> Result<SettledOffer> {
        let want = txn
            .seat(seat)?
            .proposal()
            .and_then(|p| p.want.get(constants::KEYWORD_ITEMS))
            .and_then(Amount::as_bag)
            .cloned()
            .ok_or_else(|| MintswapError::ShapeMismatch {
                reason: format!("{seat} has no want.{} bag", constants::KEYWORD_ITEMS),
            })?;

        let total_items =
            u64::try_from(self.check_cap(&want)?).map_err(|_| MintswapError::AmountOverflow)?;
        debug!(%seat, total_items, phase = %OfferPhase::Validated, "Cap check passed");

        let mint_seat = self.mint.mint_exact(txn, &want)?;

        let paid = txn
            .seat(seat)?
            .allocation()
            .get_or_empty(constants::KEYWORD_PRICE, self.terms.payment_brand());
        let minted = Amount::bag(self.mint.brand().clone(), want.clone())?;
        txn.rearrange(&[
            self.proceeds.receive(seat, paid.clone()),
            Transfer::new(mint_seat, seat, constants::KEYWORD_ITEMS, minted),
        ])?;

        let payout = txn.exit(seat)?;
        let leftover = txn.exit(mint_seat)?;
        if !leftover.is_empty() {
            return Err(MintswapError::MintMismatch {
                reason: format!("mint seat {mint_seat} kept units after the swap"),
            });
        }
        let received = payout
            .get(constants::KEYWORD_ITEMS)
            .and_then(Amount::as_bag);
        if received != Some(&want) {
            return Err(MintswapError::RearrangeInvariant {
                reason: format!(
                    "redeemer asked for {want}, payout holds {}",
                    received.map_or_else(|| "nothing".to_string(), ToString::to_string)
                ),
            });
        }

        Ok(SettledOffer {
            paid,
            minted: want,
            total_items,
            payout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintswap_escrow::{SeatLedger, SeatRole};
    use mintswap_types::Proposal;
    use mintswap_types::fixtures::{credits, credits_brand, items, items_brand};

    struct Fixture {
        terms: Terms,
        mint: UnitMint,
        ledger: SeatLedger,
        proceeds: ProceedsEscrow,
    }

    fn fixture() -> Fixture {
        let terms = Terms::new(credits(100), items_brand());
        let mut ledger = SeatLedger::new();
        let proceeds = ProceedsEscrow::open(&mut ledger, credits_brand()).unwrap();
        Fixture {
            mint: UnitMint::new(items_brand()).unwrap(),
            terms,
            ledger,
            proceeds,
        }
    }

    fn redeemer(ledger: &mut SeatLedger, price: i64, want: &[(&str, u64)]) -> SeatId {
        let proposal = Proposal::trade(credits(price), items(want));
        let give = proposal.give.clone();
        ledger
            .open_seat(SeatRole::Redeemer, Some(proposal), give)
            .unwrap()
    }

    #[test]
    fn settles_exact_bag() {
        let mut f = fixture();
        let seat = redeemer(&mut f.ledger, 100, &[("sword", 2), ("shield", 1)]);

        let handler = TradeHandler::new(&f.terms, &f.mint, &f.proceeds);
        let mut txn = f.ledger.transaction();
        let settled = handler.handle(&mut txn, seat).unwrap();
        txn.commit().unwrap();

        assert_eq!(settled.paid, credits(100));
        assert_eq!(settled.total_items, 3);
        assert_eq!(settled.payout.get("Items"), Some(&items(&[("sword", 2), ("shield", 1)])));
        assert_eq!(settled.payout.get("Price"), Some(&credits(0)));
        assert_eq!(f.proceeds.balance(&f.ledger).unwrap(), credits(100));
        assert!(matches!(
            f.ledger.seat(seat),
            Err(MintswapError::SeatNotFound(_))
        ));
        assert_eq!(f.ledger.seat_count(), 1);
        f.ledger.verify_supply().unwrap();
    }

    #[test]
    fn cap_violation_stages_nothing() {
        let mut f = fixture();
        let seat = redeemer(&mut f.ledger, 100, &[("sword", 4)]);

        let handler = TradeHandler::new(&f.terms, &f.mint, &f.proceeds);
        let mut txn = f.ledger.transaction();
        let err = handler.handle(&mut txn, seat).unwrap_err();
        drop(txn);

        assert_eq!(
            err,
            MintswapError::CapExceeded {
                requested: 4,
                max_items: 3
            }
        );
        assert!(f.mint.total_supply(&f.ledger).is_empty());
        assert!(f.proceeds.balance(&f.ledger).unwrap().is_empty());
        assert_eq!(
            f.ledger.allocation(seat).unwrap().get("Price"),
            Some(&credits(100))
        );
        assert!(f.ledger.seat(seat).unwrap().is_active());
    }

    #[test]
    fn cap_is_inclusive() {
        let f = fixture();
        let handler = TradeHandler::new(&f.terms, &f.mint, &f.proceeds);
        let three = ItemBag::from_pairs([("sword", 3)]).unwrap();
        let four = ItemBag::from_pairs([("sword", 3), ("shield", 1)]).unwrap();
        assert_eq!(handler.check_cap(&three).unwrap(), 3);
        assert_eq!(handler.check_cap(&ItemBag::new()).unwrap(), 0);
        assert!(handler.check_cap(&four).is_err());
    }

    #[test]
    fn overpayment_goes_to_proceeds() {
        let mut f = fixture();
        let seat = redeemer(&mut f.ledger, 150, &[("shield", 1)]);
        let handler = TradeHandler::new(&f.terms, &f.mint, &f.proceeds);
        let mut txn = f.ledger.transaction();
        let settled = handler.handle(&mut txn, seat).unwrap();
        txn.commit().unwrap();
        assert_eq!(settled.paid, credits(150));
        assert_eq!(f.proceeds.balance(&f.ledger).unwrap(), credits(150));
    }

    #[test]
    fn seat_without_proposal_is_rejected() {
        let mut f = fixture();
        let seat = f
            .ledger
            .open_seat(
                SeatRole::Redeemer,
                None,
                Allocation::new().with("Price", credits(100)),
            )
            .unwrap();
        let handler = TradeHandler::new(&f.terms, &f.mint, &f.proceeds);
        let mut txn = f.ledger.transaction();
        let err = handler.handle(&mut txn, seat).unwrap_err();
        assert!(matches!(err, MintswapError::ShapeMismatch { .. }));
    }

    #[test]
    fn offer_phase_display() {
        assert_eq!(OfferPhase::Settled.to_string(), "SETTLED");
        assert_eq!(OfferPhase::Rejected.to_string(), "REJECTED");
        assert_eq!(OfferPhase::Aborted.to_string(), "ABORTED");
    }
}
