//! Proposals and the structural shape a proposal must satisfy.
//!
//! A [`ProposalShape`] is checked by the host before any handler runs, so
//! handlers only ever see proposals whose keywords, brands and price floor
//! are already known to be right.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Allocation, Amount, Brand, Keyword, MintswapError, Result, Terms, constants};

/// How a seat may be exited. Every rule is accepted; the engine settles
/// synchronously so no rule changes settlement behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitRule {
    /// The redeemer may exit whenever they like.
    OnDemand,
    /// The redeemer gives up the right to exit early.
    WaiveExit,
    /// The seat exits automatically after the deadline.
    AfterDeadline { deadline: DateTime<Utc> },
}

/// What a redeemer offers and what they want in return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub give: Allocation,
    pub want: Allocation,
    pub exit: ExitRule,
}

impl Proposal {
    /// The standard trade proposal: pay `price`, want `items`.
    #[must_use]
    pub fn trade(price: Amount, items: Amount) -> Self {
        Self {
            give: Allocation::new().with(constants::KEYWORD_PRICE, price),
            want: Allocation::new().with(constants::KEYWORD_ITEMS, items),
            exit: ExitRule::OnDemand,
        }
    }

    #[must_use]
    pub fn with_exit(mut self, exit: ExitRule) -> Self {
        self.exit = exit;
        self
    }
}

/// Constraint on the amount under one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountPattern {
    /// Same brand, and at least this much.
    AtLeast(Amount),
    /// Any amount of this brand.
    OfBrand(Brand),
}

impl AmountPattern {
    fn check(&self, side: &str, keyword: &str, amount: &Amount) -> Result<()> {
        let brand = match self {
            Self::AtLeast(floor) => &floor.brand,
            Self::OfBrand(brand) => brand,
        };
        if &amount.brand != brand {
            return Err(MintswapError::ShapeMismatch {
                reason: format!("{side}.{keyword} must be {brand}, got {}", amount.brand),
            });
        }
        if !amount.is_well_formed() {
            return Err(MintswapError::ShapeMismatch {
                reason: format!("{side}.{keyword} value is not a {:?} value", brand.kind),
            });
        }
        if let Self::AtLeast(floor) = self {
            if !amount.is_gte(floor)? {
                return Err(MintswapError::ShapeMismatch {
                    reason: format!("{side}.{keyword} must be at least {floor}, got {amount}"),
                });
            }
        }
        Ok(())
    }
}

/// Keyword → pattern constraints for both sides of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalShape {
    pub give: BTreeMap<Keyword, AmountPattern>,
    pub want: BTreeMap<Keyword, AmountPattern>,
}

impl ProposalShape {
    /// `{ give: { Price: ≥ tradePrice }, want: { Items: any bag of the item brand }, exit: any }`
    #[must_use]
    pub fn for_trade(terms: &Terms) -> Self {
        Self {
            give: BTreeMap::from([(
                constants::KEYWORD_PRICE.to_string(),
                AmountPattern::AtLeast(terms.trade_price.clone()),
            )]),
            want: BTreeMap::from([(
                constants::KEYWORD_ITEMS.to_string(),
                AmountPattern::OfBrand(terms.item_brand.clone()),
            )]),
        }
    }

    /// Check a proposal against this shape. Keywords must match exactly.
    pub fn check(&self, proposal: &Proposal) -> Result<()> {
        check_side("give", &self.give, &proposal.give)?;
        check_side("want", &self.want, &proposal.want)
    }
}

fn check_side(
    side: &str,
    patterns: &BTreeMap<Keyword, AmountPattern>,
    allocation: &Allocation,
) -> Result<()> {
    if let Some(extra) = allocation.keywords().find(|k| !patterns.contains_key(*k)) {
        return Err(MintswapError::ShapeMismatch {
            reason: format!("unexpected keyword {side}.{extra}"),
        });
    }
    for (keyword, pattern) in patterns {
        let amount = allocation
            .get(keyword)
            .ok_or_else(|| MintswapError::ShapeMismatch {
                reason: format!("missing keyword {side}.{keyword}"),
            })?;
        pattern.check(side, keyword, amount)?;
    }
    Ok(())
}
