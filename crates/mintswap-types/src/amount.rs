//! Typed amounts of an asset brand, and per-keyword allocations.
//!
//! Two asset kinds exist: fungible payment brands (decimal values) and
//! bag brands whose values are [`ItemBag`]s. All arithmetic checks the
//! brand first; mixing brands is always an error.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ItemBag, MintswapError, Result};

/// How values of a brand are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Divisible quantity (payment currency).
    Fungible,
    /// Multiset of item kinds.
    Bag,
}

/// The type of an asset: a name plus how its amounts are represented.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
    pub kind: AssetKind,
}

impl Brand {
    #[must_use]
    pub fn fungible(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AssetKind::Fungible,
        }
    }

    #[must_use]
    pub fn bag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AssetKind::Bag,
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The value part of an [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountValue {
    Fungible(Decimal),
    Bag(ItemBag),
}

/// A quantity of one specific brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub brand: Brand,
    pub value: AmountValue,
}

impl Amount {
    /// A fungible amount. Negative values are rejected.
    pub fn fungible(brand: Brand, value: Decimal) -> Result<Self> {
        if brand.kind != AssetKind::Fungible {
            return Err(MintswapError::BrandMismatch {
                expected: format!("fungible brand, got {brand}"),
                actual: "fungible value".into(),
            });
        }
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MintswapError::InsufficientAmount {
                needed: value.to_string(),
                available: Decimal::ZERO.to_string(),
            });
        }
        Ok(Self {
            brand,
            value: AmountValue::Fungible(value),
        })
    }

    /// A bag amount.
    pub fn bag(brand: Brand, bag: ItemBag) -> Result<Self> {
        if brand.kind != AssetKind::Bag {
            return Err(MintswapError::BrandMismatch {
                expected: format!("bag brand, got {brand}"),
                actual: "bag value".into(),
            });
        }
        Ok(Self {
            brand,
            value: AmountValue::Bag(bag),
        })
    }

    /// The empty amount of a brand.
    #[must_use]
    pub fn empty(brand: &Brand) -> Self {
        let value = match brand.kind {
            AssetKind::Fungible => AmountValue::Fungible(Decimal::ZERO),
            AssetKind::Bag => AmountValue::Bag(ItemBag::new()),
        };
        Self {
            brand: brand.clone(),
            value,
        }
    }

    /// `true` if the value is of the kind its brand declares. Amounts built
    /// through [`Amount::fungible`] or [`Amount::bag`] always are; the fields
    /// are public, so anything else must be checked.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        matches!(
            (self.brand.kind, &self.value),
            (AssetKind::Fungible, AmountValue::Fungible(_)) | (AssetKind::Bag, AmountValue::Bag(_))
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.value {
            AmountValue::Fungible(v) => v.is_zero(),
            AmountValue::Bag(bag) => bag.is_empty(),
        }
    }

    /// The decimal value, if this is a fungible amount.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match &self.value {
            AmountValue::Fungible(v) => Some(*v),
            AmountValue::Bag(_) => None,
        }
    }

    /// The bag value, if this is a bag amount.
    #[must_use]
    pub fn as_bag(&self) -> Option<&ItemBag> {
        match &self.value {
            AmountValue::Bag(bag) => Some(bag),
            AmountValue::Fungible(_) => None,
        }
    }

    fn same_brand(&self, other: &Self) -> Result<()> {
        if self.brand != other.brand {
            return Err(MintswapError::BrandMismatch {
                expected: self.brand.to_string(),
                actual: other.brand.to_string(),
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        self.same_brand(other)?;
        let value = match (&self.value, &other.value) {
            (AmountValue::Fungible(a), AmountValue::Fungible(b)) => {
                AmountValue::Fungible(a.checked_add(*b).ok_or(MintswapError::AmountOverflow)?)
            }
            (AmountValue::Bag(a), AmountValue::Bag(b)) => AmountValue::Bag(a.checked_add(b)?),
            _ => return Err(value_kind_mismatch(&self.brand)),
        };
        Ok(Self {
            brand: self.brand.clone(),
            value,
        })
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        self.same_brand(other)?;
        let value = match (&self.value, &other.value) {
            (AmountValue::Fungible(a), AmountValue::Fungible(b)) => {
                if a < b {
                    return Err(MintswapError::InsufficientAmount {
                        needed: b.to_string(),
                        available: a.to_string(),
                    });
                }
                AmountValue::Fungible(a - b)
            }
            (AmountValue::Bag(a), AmountValue::Bag(b)) => AmountValue::Bag(a.checked_sub(b)?),
            _ => return Err(value_kind_mismatch(&self.brand)),
        };
        Ok(Self {
            brand: self.brand.clone(),
            value,
        })
    }

    /// `self >= other`. For bags this is multiset containment.
    pub fn is_gte(&self, other: &Self) -> Result<bool> {
        self.same_brand(other)?;
        match (&self.value, &other.value) {
            (AmountValue::Fungible(a), AmountValue::Fungible(b)) => Ok(a >= b),
            (AmountValue::Bag(a), AmountValue::Bag(b)) => Ok(a.contains(b)),
            _ => Err(value_kind_mismatch(&self.brand)),
        }
    }
}

fn value_kind_mismatch(brand: &Brand) -> MintswapError {
    MintswapError::BrandMismatch {
        expected: format!("{brand} ({:?})", brand.kind),
        actual: "value of another kind".into(),
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            AmountValue::Fungible(v) => write!(f, "{v} {}", self.brand),
            AmountValue::Bag(bag) => write!(f, "{bag} {}", self.brand),
        }
    }
}

/// Type alias for allocation keywords (e.g., "Price", "Items").
pub type Keyword = String;

/// Amounts held or proposed, indexed by keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation(BTreeMap<Keyword, Amount>);

impl Allocation {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder form of [`Allocation::set`].
    #[must_use]
    pub fn with(mut self, keyword: impl Into<Keyword>, amount: Amount) -> Self {
        self.set(keyword, amount);
        self
    }

    /// Replace the amount under `keyword`.
    pub fn set(&mut self, keyword: impl Into<Keyword>, amount: Amount) {
        self.0.insert(keyword.into(), amount);
    }

    /// Remove and return the amount under `keyword`.
    pub fn remove(&mut self, keyword: &str) -> Option<Amount> {
        self.0.remove(keyword)
    }

    #[must_use]
    pub fn get(&self, keyword: &str) -> Option<&Amount> {
        self.0.get(keyword)
    }

    /// The amount under `keyword`, or the brand's empty amount.
    #[must_use]
    pub fn get_or_empty(&self, keyword: &str, brand: &Brand) -> Amount {
        self.0
            .get(keyword)
            .cloned()
            .unwrap_or_else(|| Amount::empty(brand))
    }

    pub fn keywords(&self) -> impl Iterator<Item = &Keyword> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Keyword, &Amount)> {
        self.0.iter()
    }

    /// `true` if no keyword holds anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Amount::is_empty)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Take everything, leaving this allocation empty.
    pub fn take(&mut self) -> Self {
        Self(std::mem::take(&mut self.0))
    }
}

/// Fixture brands and amounts for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
pub mod fixtures {
    use super::{Amount, Brand, Decimal, ItemBag};

    #[must_use]
    pub fn credits_brand() -> Brand {
        Brand::fungible("Credits")
    }

    #[must_use]
    pub fn items_brand() -> Brand {
        Brand::bag("Items")
    }

    #[must_use]
    pub fn credits(value: i64) -> Amount {
        Amount::fungible(credits_brand(), Decimal::new(value, 0)).expect("non-negative credits")
    }

    #[must_use]
    pub fn items(pairs: &[(&str, u64)]) -> Amount {
        let bag = ItemBag::from_pairs(pairs.iter().map(|(k, v)| (*k, *v))).expect("bag fits u64");
        Amount::bag(items_brand(), bag).expect("items brand is a bag")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn well_formed_requires_matching_value_kind() {
        assert!(credits(5).is_well_formed());
        assert!(items(&[("sword", 1)]).is_well_formed());
        let forged = Amount {
            brand: items_brand(),
            value: AmountValue::Fungible(Decimal::new(5, 0)),
        };
        assert!(!forged.is_well_formed());
    }

    #[test]
    fn fungible_arithmetic() {
        let a = credits(150);
        let b = credits(100);
        assert_eq!(a.checked_sub(&b).unwrap(), credits(50));
        assert_eq!(a.checked_add(&b).unwrap(), credits(250));
        assert!(a.is_gte(&b).unwrap());
        assert!(!b.is_gte(&a).unwrap());
    }

    #[test]
    fn fungible_underflow() {
        let err = credits(10).checked_sub(&credits(11)).unwrap_err();
        assert!(matches!(err, MintswapError::InsufficientAmount { .. }));
    }

    #[test]
    fn negative_fungible_rejected() {
        assert!(Amount::fungible(credits_brand(), Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn brands_never_mix() {
        let err = credits(1).checked_add(&items(&[("sword", 1)])).unwrap_err();
        assert!(matches!(err, MintswapError::BrandMismatch { .. }));

        let other = Amount::fungible(Brand::fungible("Gold"), Decimal::ONE).unwrap();
        assert!(credits(1).is_gte(&other).is_err());
    }

    #[test]
    fn kind_checked_at_construction() {
        assert!(Amount::fungible(items_brand(), Decimal::ONE).is_err());
        assert!(Amount::bag(credits_brand(), ItemBag::new()).is_err());
    }

    #[test]
    fn bag_is_gte_means_containment() {
        let held = items(&[("sword", 2), ("shield", 1)]);
        assert!(held.is_gte(&items(&[("sword", 2)])).unwrap());
        assert!(!held.is_gte(&items(&[("sword", 3)])).unwrap());
    }

    #[test]
    fn empty_amounts() {
        assert!(Amount::empty(&credits_brand()).is_empty());
        assert!(Amount::empty(&items_brand()).is_empty());
        assert!(!credits(1).is_empty());
    }

    #[test]
    fn allocation_keeps_empty_keywords() {
        let mut alloc = Allocation::new().with("Price", credits(100));
        assert_eq!(alloc.get("Price"), Some(&credits(100)));
        alloc.set("Price", Amount::empty(&credits_brand()));
        assert!(alloc.is_empty());
        assert_eq!(alloc.len(), 1);
        assert_eq!(alloc.get_or_empty("Items", &items_brand()), items(&[]));
    }

    #[test]
    fn allocation_take_empties() {
        let mut alloc = Allocation::new().with("Items", items(&[("sword", 1)]));
        let taken = alloc.take();
        assert!(alloc.is_empty());
        assert_eq!(taken.get("Items"), Some(&items(&[("sword", 1)])));
    }

    #[test]
    fn amount_serde_roundtrip() {
        let amt = credits(100);
        let json = serde_json::to_string(&amt).unwrap();
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(amt, back);
    }
}
