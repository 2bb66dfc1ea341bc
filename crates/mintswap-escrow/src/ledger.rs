//! Seat ledger with staged, all-or-nothing transactions.
//!
//! Every mutation of seat holdings goes through a [`Transaction`]:
//! 1. Touched seats are copied into a staging area (copy-on-write)
//! 2. Mints, transfers and exits are applied to the staged copies only
//! 3. `commit()` checks supply conservation on the prospective state
//! 4. Only then are the staged seats written back; exited seats are
//!    dropped, since they hold nothing and their payouts are already
//!    recorded as outflows
//!
//! Dropping a transaction without committing discards everything, so a
//! failure at any step leaves the ledger exactly as it was.

use std::collections::HashMap;

use mintswap_types::{Allocation, Amount, Brand, MintswapError, Proposal, Result, SeatId};
use tracing::debug;

use crate::seat::{Seat, SeatRole};
use crate::supply_conservation::SupplyConservation;

/// One leg of an atomic rearrangement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: SeatId,
    pub from_keyword: String,
    pub to: SeatId,
    pub to_keyword: String,
    pub amount: Amount,
}

impl Transfer {
    /// Move `amount` between seats under the same keyword on both sides.
    #[must_use]
    pub fn new(from: SeatId, to: SeatId, keyword: &str, amount: Amount) -> Self {
        Self {
            from,
            from_keyword: keyword.to_string(),
            to,
            to_keyword: keyword.to_string(),
            amount,
        }
    }

    /// Land the amount under a different keyword on the receiving seat.
    #[must_use]
    pub fn into_keyword(mut self, keyword: &str) -> Self {
        self.to_keyword = keyword.to_string();
        self
    }
}

/// Per-brand sum of everything in a set of allocations.
fn add_holdings<'a>(
    totals: &mut HashMap<Brand, Amount>,
    allocations: impl IntoIterator<Item = &'a Allocation>,
) -> Result<()> {
    for allocation in allocations {
        for (_, amount) in allocation.iter() {
            let next = match totals.get(&amount.brand) {
                Some(current) => current.checked_add(amount)?,
                None => amount.clone(),
            };
            totals.insert(amount.brand.clone(), next);
        }
    }
    Ok(())
}

fn sub_holdings(totals: &mut HashMap<Brand, Amount>, allocation: &Allocation) -> Result<()> {
    for (_, amount) in allocation.iter() {
        let current = totals
            .get(&amount.brand)
            .cloned()
            .unwrap_or_else(|| Amount::empty(&amount.brand));
        let next = current
            .checked_sub(amount)
            .map_err(|e| MintswapError::SupplyInvariantViolation {
                reason: format!("holdings of {} would go negative: {e}", amount.brand),
            })?;
        totals.insert(amount.brand.clone(), next);
    }
    Ok(())
}

fn non_empty(totals: HashMap<Brand, Amount>) -> HashMap<Brand, Amount> {
    totals.into_iter().filter(|(_, a)| !a.is_empty()).collect()
}

/// Source of truth for all seats of one contract instance.
#[derive(Debug, Default)]
pub struct SeatLedger {
    seats: HashMap<SeatId, Seat>,
    /// Running per-brand total of everything held in seats.
    holdings: HashMap<Brand, Amount>,
    supply: SupplyConservation,
}

impl SeatLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a seat funded with `deposit`. The deposit counts as an inflow.
    pub fn open_seat(
        &mut self,
        role: SeatRole,
        proposal: Option<Proposal>,
        deposit: Allocation,
    ) -> Result<SeatId> {
        let mut supply = self.supply.clone();
        for (_, amount) in deposit.iter() {
            supply.record_inflow(amount)?;
        }
        let mut holdings = self.holdings.clone();
        add_holdings(&mut holdings, [&deposit])?;

        let seat = Seat::new(role, proposal, deposit);
        let id = seat.id();
        self.seats.insert(id, seat);
        self.holdings = holdings;
        self.supply = supply;
        debug!(seat = %id, %role, "Seat opened");
        Ok(id)
    }

    pub fn seat(&self, id: SeatId) -> Result<&Seat> {
        self.seats.get(&id).ok_or(MintswapError::SeatNotFound(id))
    }

    pub fn allocation(&self, id: SeatId) -> Result<&Allocation> {
        self.seat(id).map(Seat::allocation)
    }

    /// Begin a staged transaction.
    pub fn transaction(&mut self) -> Transaction<'_> {
        Transaction {
            ledger: self,
            staged: HashMap::new(),
            inflows: Vec::new(),
            outflows: Vec::new(),
        }
    }

    /// Single-step atomic rearrangement.
    pub fn rearrange(&mut self, transfers: &[Transfer]) -> Result<()> {
        let mut txn = self.transaction();
        txn.rearrange(transfers)?;
        txn.commit()
    }

    /// Single-step exit, returning the payout.
    pub fn exit(&mut self, id: SeatId) -> Result<Allocation> {
        let mut txn = self.transaction();
        let payout = txn.exit(id)?;
        txn.commit()?;
        Ok(payout)
    }

    /// Everything currently held of `brand`, across all seats.
    #[must_use]
    pub fn total_held(&self, brand: &Brand) -> Amount {
        self.holdings
            .get(brand)
            .cloned()
            .unwrap_or_else(|| Amount::empty(brand))
    }

    /// Full scan: recompute holdings from every seat and check them
    /// against the recorded inflows and outflows.
    pub fn verify_supply(&self) -> Result<()> {
        let mut actual = HashMap::new();
        add_holdings(&mut actual, self.seats.values().map(Seat::allocation))?;
        let actual = non_empty(actual);
        let mut brands = self.supply.tracked_brands();
        brands.extend(actual.keys().cloned());
        for brand in &brands {
            let held = actual
                .get(brand)
                .cloned()
                .unwrap_or_else(|| Amount::empty(brand));
            self.supply.verify(brand, &held)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }

    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }
}

/// Staged changes against a [`SeatLedger`]. Nothing is visible in the
/// ledger until [`Transaction::commit`] succeeds.
#[must_use = "a transaction does nothing unless committed"]
pub struct Transaction<'l> {
    ledger: &'l mut SeatLedger,
    staged: HashMap<SeatId, Seat>,
    inflows: Vec<Amount>,
    outflows: Vec<Amount>,
}

impl Transaction<'_> {
    /// Current view of a seat, including staged changes.
    pub fn seat(&self, id: SeatId) -> Result<&Seat> {
        match self.staged.get(&id) {
            Some(seat) => Ok(seat),
            None => self.ledger.seat(id),
        }
    }

    fn staged_mut(&mut self, id: SeatId) -> Result<&mut Seat> {
        if !self.staged.contains_key(&id) {
            let seat = self.ledger.seat(id)?.clone();
            self.staged.insert(id, seat);
        }
        self.staged.get_mut(&id).ok_or(MintswapError::SeatNotFound(id))
    }

    /// Stage a new contract-owned seat. Whoever fills it is responsible
    /// for recording the matching inflow.
    pub(crate) fn open_seat(&mut self, role: SeatRole, allocation: Allocation) -> SeatId {
        let seat = Seat::new(role, None, allocation);
        let id = seat.id();
        self.staged.insert(id, seat);
        id
    }

    pub(crate) fn record_inflow(&mut self, amount: Amount) {
        self.inflows.push(amount);
    }

    /// Apply every leg or none of them.
    ///
    /// Legs are applied to scratch copies of the involved seats; the copies
    /// replace the staged seats only if every leg succeeded and each brand's
    /// total across those seats is unchanged.
    pub fn rearrange(&mut self, transfers: &[Transfer]) -> Result<()> {
        let mut scratch: HashMap<SeatId, Seat> = HashMap::new();
        for transfer in transfers {
            for id in [transfer.from, transfer.to] {
                if !scratch.contains_key(&id) {
                    scratch.insert(id, self.seat(id)?.clone());
                }
            }
        }

        let mut before = HashMap::new();
        add_holdings(&mut before, scratch.values().map(Seat::allocation))?;

        for transfer in transfers {
            let brand = &transfer.amount.brand;
            let from = scratch
                .get_mut(&transfer.from)
                .ok_or(MintswapError::SeatNotFound(transfer.from))?;
            from.ensure_active()?;
            if from.is_receive_only() {
                return Err(MintswapError::ReceiveOnlySeat(transfer.from));
            }
            let held = from.allocation().get_or_empty(&transfer.from_keyword, brand);
            let remaining = held.checked_sub(&transfer.amount)?;
            from.allocation_mut().set(transfer.from_keyword.clone(), remaining);

            let to = scratch
                .get_mut(&transfer.to)
                .ok_or(MintswapError::SeatNotFound(transfer.to))?;
            to.ensure_active()?;
            let current = to.allocation().get_or_empty(&transfer.to_keyword, brand);
            let credited = current.checked_add(&transfer.amount)?;
            to.allocation_mut().set(transfer.to_keyword.clone(), credited);
        }

        let mut after = HashMap::new();
        add_holdings(&mut after, scratch.values().map(Seat::allocation))?;
        if non_empty(before) != non_empty(after) {
            return Err(MintswapError::RearrangeInvariant {
                reason: format!("{} legs changed total holdings", transfers.len()),
            });
        }

        debug!(legs = transfers.len(), seats = scratch.len(), "Rearrangement staged");
        self.staged.extend(scratch);
        Ok(())
    }

    /// Stage an exit. The returned payout leaves the ledger on commit.
    pub fn exit(&mut self, id: SeatId) -> Result<Allocation> {
        let payout = self.staged_mut(id)?.mark_exited()?;
        for (_, amount) in payout.iter() {
            if !amount.is_empty() {
                self.outflows.push(amount.clone());
            }
        }
        Ok(payout)
    }

    /// Verify conservation on the prospective state, then write it back.
    ///
    /// # Errors
    /// Returns [`MintswapError::SupplyInvariantViolation`] (and changes
    /// nothing) if the staged holdings don't match inflows - outflows.
    pub fn commit(self) -> Result<()> {
        let Self {
            ledger,
            staged,
            inflows,
            outflows,
        } = self;

        let mut supply = ledger.supply.clone();
        for amount in &inflows {
            supply.record_inflow(amount)?;
        }
        for amount in &outflows {
            supply.record_outflow(amount)?;
        }

        let mut holdings = ledger.holdings.clone();
        add_holdings(&mut holdings, staged.values().map(Seat::allocation))?;
        for id in staged.keys() {
            if let Some(original) = ledger.seats.get(id) {
                sub_holdings(&mut holdings, original.allocation())?;
            }
        }

        let holdings = non_empty(holdings);
        let mut brands = supply.tracked_brands();
        brands.extend(holdings.keys().cloned());
        for brand in &brands {
            let held = holdings
                .get(brand)
                .cloned()
                .unwrap_or_else(|| Amount::empty(brand));
            supply.verify(brand, &held)?;
        }

        debug!(
            seats = staged.len(),
            inflows = inflows.len(),
            outflows = outflows.len(),
            "Transaction committed"
        );
        for (id, seat) in staged {
            if seat.is_active() {
                ledger.seats.insert(id, seat);
            } else {
                ledger.seats.remove(&id);
            }
        }
        ledger.holdings = holdings;
        ledger.supply = supply;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn inject_inflow_for_test(&mut self, amount: Amount) {
        self.inflows.push(amount);
    }
}
