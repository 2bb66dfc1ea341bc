//! Supply conservation invariant checker.
//!
//! Invariant enforced on every ledger commit:
//! ```text
//! ∀ brand: Σ(seat holdings) == Σ(inflows) - Σ(outflows)
//! ```
//!
//! Inflows are redeemer deposits and mints; outflows are payouts when a
//! seat exits. A break here means value was created or destroyed somewhere
//! other than the mint, and is always fatal.

use std::collections::{HashMap, HashSet};

use mintswap_types::{Amount, Brand, MintswapError, Result};

/// Per-brand inflow/outflow totals.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    inflows: HashMap<Brand, Amount>,
    outflows: HashMap<Brand, Amount>,
}

fn accumulate(totals: &mut HashMap<Brand, Amount>, amount: &Amount) -> Result<()> {
    let next = match totals.get(&amount.brand) {
        Some(current) => current.checked_add(amount)?,
        None => amount.clone(),
    };
    totals.insert(amount.brand.clone(), next);
    Ok(())
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record value entering the ledger (deposit or mint).
    pub fn record_inflow(&mut self, amount: &Amount) -> Result<()> {
        accumulate(&mut self.inflows, amount)
    }

    /// Record value leaving the ledger (payout on exit).
    pub fn record_outflow(&mut self, amount: &Amount) -> Result<()> {
        accumulate(&mut self.outflows, amount)
    }

    #[must_use]
    pub fn total_inflows(&self, brand: &Brand) -> Amount {
        self.inflows
            .get(brand)
            .cloned()
            .unwrap_or_else(|| Amount::empty(brand))
    }

    #[must_use]
    pub fn total_outflows(&self, brand: &Brand) -> Amount {
        self.outflows
            .get(brand)
            .cloned()
            .unwrap_or_else(|| Amount::empty(brand))
    }

    /// Expected holdings for a brand: inflows - outflows.
    pub fn expected_supply(&self, brand: &Brand) -> Result<Amount> {
        self.total_inflows(brand)
            .checked_sub(&self.total_outflows(brand))
            .map_err(|e| MintswapError::SupplyInvariantViolation {
                reason: format!("brand {brand}: more paid out than ever came in ({e})"),
            })
    }

    /// Verify that what seats actually hold matches the expected supply.
    ///
    /// # Errors
    /// Returns [`MintswapError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, brand: &Brand, actual: &Amount) -> Result<()> {
        let expected = self.expected_supply(brand)?;
        if &expected != actual {
            return Err(MintswapError::SupplyInvariantViolation {
                reason: format!(
                    "brand {brand}: actual holdings {actual} != expected {expected} \
                     (inflows={}, outflows={})",
                    self.total_inflows(brand),
                    self.total_outflows(brand),
                ),
            });
        }
        Ok(())
    }

    /// Every brand that has ever flowed in or out.
    #[must_use]
    pub fn tracked_brands(&self) -> Vec<Brand> {
        let brands: HashSet<&Brand> = self.inflows.keys().chain(self.outflows.keys()).collect();
        brands.into_iter().cloned().collect()
    }
}
