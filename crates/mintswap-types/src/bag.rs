//! Item bags: multisets of item kinds with non-negative counts.
//!
//! A bag never stores a zero count, so `{sword: 0}` and `{}` are the same
//! bag. Order of kinds is irrelevant; only counts matter.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MintswapError, Result};

/// Type alias for item kind identifiers (e.g., "sword", "shield").
pub type ItemKind = String;

/// A multiset mapping item kind → count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ItemKind, u64>", into = "BTreeMap<ItemKind, u64>")]
pub struct ItemBag(BTreeMap<ItemKind, u64>);

impl ItemBag {
    /// The empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a bag from `(kind, count)` pairs. Repeated kinds accumulate.
    pub fn from_pairs<K, I>(pairs: I) -> Result<Self>
    where
        K: Into<ItemKind>,
        I: IntoIterator<Item = (K, u64)>,
    {
        let mut bag = Self::new();
        for (kind, count) in pairs {
            bag.insert(kind, count)?;
        }
        Ok(bag)
    }

    /// Add `count` units of `kind`.
    pub fn insert(&mut self, kind: impl Into<ItemKind>, count: u64) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let slot = self.0.entry(kind.into()).or_insert(0);
        *slot = slot.checked_add(count).ok_or(MintswapError::AmountOverflow)?;
        Ok(())
    }

    /// Count held for one kind (zero if absent).
    #[must_use]
    pub fn count(&self, kind: &str) -> u64 {
        self.0.get(kind).copied().unwrap_or(0)
    }

    /// Sum of all counts. See [`count_items`].
    #[must_use]
    pub fn total(&self) -> u128 {
        count_items(self)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct kinds held.
    #[must_use]
    pub fn kind_count(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemKind, u64)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    /// `true` if every count in `other` is covered by this bag.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.iter().all(|(kind, count)| self.count(kind) >= count)
    }

    /// Multiset union (counts add).
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        for (kind, count) in other.iter() {
            out.insert(kind.clone(), count)?;
        }
        Ok(out)
    }

    /// Multiset difference. Fails if `other` isn't contained in `self`.
    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        if !self.contains(other) {
            return Err(MintswapError::InsufficientAmount {
                needed: other.to_string(),
                available: self.to_string(),
            });
        }
        let mut out = self.0.clone();
        for (kind, count) in other.iter() {
            if let Some(slot) = out.get_mut(kind) {
                *slot -= count;
                if *slot == 0 {
                    out.remove(kind);
                }
            }
        }
        Ok(Self(out))
    }
}

impl From<BTreeMap<ItemKind, u64>> for ItemBag {
    fn from(mut map: BTreeMap<ItemKind, u64>) -> Self {
        map.retain(|_, count| *count > 0);
        Self(map)
    }
}

impl From<ItemBag> for BTreeMap<ItemKind, u64> {
    fn from(bag: ItemBag) -> Self {
        bag.0
    }
}

impl fmt::Display for ItemBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (kind, count)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{kind}: {count}")?;
        }
        write!(f, "}}")
    }
}

/// Total number of units across every kind in the bag.
///
/// Summed in `u128` so any bag of `u64` counts has a finite total.
#[must_use]
pub fn count_items(bag: &ItemBag) -> u128 {
    bag.0.values().map(|&count| u128::from(count)).sum()
}

/// Random bag for property-style tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
pub fn random_bag<R: rand::Rng>(rng: &mut R, kinds: &[&str], max_count: u64) -> ItemBag {
    let mut bag = ItemBag::new();
    for kind in kinds {
        let count = rng.gen_range(0..=max_count);
        // Counts are bounded by max_count, so this can't overflow.
        let _ = bag.insert(*kind, count);
    }
    bag
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, u64)]) -> ItemBag {
        ItemBag::from_pairs(pairs.iter().map(|(k, v)| (*k, *v))).unwrap()
    }

    #[test]
    fn count_items_sums_every_kind() {
        assert_eq!(count_items(&bag(&[("sword", 2), ("shield", 1)])), 3);
        assert_eq!(count_items(&ItemBag::new()), 0);
    }

    #[test]
    fn count_items_never_overflows() {
        let b = bag(&[("a", u64::MAX), ("b", u64::MAX)]);
        assert_eq!(b.total(), u128::from(u64::MAX) * 2);
    }

    #[test]
    fn zero_counts_are_dropped() {
        let b = bag(&[("sword", 0)]);
        assert!(b.is_empty());
        assert_eq!(b, ItemBag::new());
    }

    #[test]
    fn repeated_kinds_accumulate() {
        let b = bag(&[("sword", 1), ("sword", 2)]);
        assert_eq!(b.count("sword"), 3);
        assert_eq!(b.kind_count(), 1);
    }

    #[test]
    fn insert_overflow_rejected() {
        let mut b = bag(&[("sword", u64::MAX)]);
        assert_eq!(b.insert("sword", 1), Err(MintswapError::AmountOverflow));
        assert_eq!(b.count("sword"), u64::MAX);
    }

    #[test]
    fn add_and_sub() {
        let a = bag(&[("sword", 2), ("shield", 1)]);
        let b = bag(&[("sword", 1)]);
        assert_eq!(a.checked_add(&b).unwrap(), bag(&[("sword", 3), ("shield", 1)]));
        assert_eq!(a.checked_sub(&b).unwrap(), bag(&[("sword", 1), ("shield", 1)]));
        assert_eq!(a.checked_sub(&a).unwrap(), ItemBag::new());
    }

    #[test]
    fn sub_underflow_rejected() {
        let a = bag(&[("sword", 1)]);
        let err = a.checked_sub(&bag(&[("sword", 2)])).unwrap_err();
        assert!(matches!(err, MintswapError::InsufficientAmount { .. }));
        let err = a.checked_sub(&bag(&[("shield", 1)])).unwrap_err();
        assert!(matches!(err, MintswapError::InsufficientAmount { .. }));
    }

    #[test]
    fn display_is_sorted() {
        let b = bag(&[("sword", 2), ("shield", 1)]);
        assert_eq!(b.to_string(), "{shield: 1, sword: 2}");
    }

    #[test]
    fn serde_strips_zero_counts() {
        let b: ItemBag = serde_json::from_str(r#"{"sword": 2, "axe": 0}"#).unwrap();
        assert_eq!(b, bag(&[("sword", 2)]));
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, r#"{"sword":2}"#);
    }

    #[test]
    fn random_bag_respects_bound() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let b = random_bag(&mut rng, &["sword", "shield"], 4);
            assert!(b.total() <= 8);
        }
    }
}
