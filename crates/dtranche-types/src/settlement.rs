//! Tranche indices and the per-period settlement inputs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Amount, TRANCHE_COUNT};

/// A vault tranche. The discriminant is the on-chain tranche index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tranche {
    /// Senior tranche (index 0).
    Senior = 0,
    /// Junior tranche (index 1).
    Junior = 1,
}

impl Tranche {
    /// Both tranches in index order.
    pub const ALL: [Tranche; TRANCHE_COUNT] = [Tranche::Senior, Tranche::Junior];

    /// On-chain tranche index.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tranche {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Senior => f.write_str("senior"),
            Self::Junior => f.write_str("junior"),
        }
    }
}

/// Profits and losses realised by each tranche during one period.
///
/// Amounts are fixed-point and non-negative by construction. A batch is
/// submitted at most once per period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementBatch {
    /// Profit per tranche, indexed by [`Tranche::index`].
    pub profits: [Amount; TRANCHE_COUNT],
    /// Loss per tranche, indexed by [`Tranche::index`].
    pub losses: [Amount; TRANCHE_COUNT],
}

impl SettlementBatch {
    /// Build a batch from per-tranche profits and losses.
    pub fn new(profits: [Amount; TRANCHE_COUNT], losses: [Amount; TRANCHE_COUNT]) -> Self {
        Self { profits, losses }
    }

    /// Whether every entry is zero (the first settlement of a fresh vault).
    pub fn is_empty(&self) -> bool {
        self.profits.iter().chain(self.losses.iter()).all(|a| a.is_zero())
    }
}

/// Capital redeployed into each tranche after a settlement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation(pub [Amount; TRANCHE_COUNT]);

impl Allocation {
    /// Amount for one tranche.
    pub fn get(&self, tranche: Tranche) -> Amount {
        self.0[tranche.index()]
    }

    /// Sum over both tranches, `None` on overflow.
    pub fn total(&self) -> Option<Amount> {
        self.0.iter().try_fold(Amount::ZERO, |acc, a| acc.checked_add(*a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tranche_indices() {
        assert_eq!(Tranche::Senior.index(), 0);
        assert_eq!(Tranche::Junior.index(), 1);
        assert_eq!(Tranche::ALL.map(Tranche::index), [0, 1]);
    }

    #[test]
    fn test_empty_batch() {
        assert!(SettlementBatch::default().is_empty());
        let zero = Amount::ZERO;
        assert!(!SettlementBatch::new([Amount::from(10), zero], [zero, zero]).is_empty());
        assert!(!SettlementBatch::new([zero, zero], [zero, Amount::from(9)]).is_empty());
    }

    #[test]
    fn test_allocation_total() {
        let allocation = Allocation([Amount::from(3), Amount::from(4)]);
        assert_eq!(allocation.get(Tranche::Junior), Amount::from(4));
        assert_eq!(allocation.total(), Some(Amount::from(7)));
        assert_eq!(Allocation([Amount::MAX, Amount::from(1)]).total(), None);
    }
}
