//! Combination counting and enumeration over card pools

use num::{Integer, PrimInt};

use crate::deck::{Card, CardMask};
use crate::error::EngineError;

/// Binomial coefficient C(n, k)
pub fn binom<T: PrimInt + Integer>(n: T, k: T) -> T {
    // check out-of-bounds cases, which are considered to be 0
    if k < T::zero() || k > n {
        return T::zero();
    }

    // compute it iteratively by multiplying and dividing
    let mut res = T::one();
    let mut i = T::zero();
    while i < k {
        res = res * (n - i) / (i + T::one());
        i = i + T::one();
    }
    res
}

/// Enumerates every way to draw a sequence of disjoint unordered card sets
/// from a pool.
///
/// Each yielded item is one set per requested size, with no card reused
/// across the sets of one item and no item repeated. Within a slot, order
/// does not matter. The walk is exhaustive and deterministic, and
/// [`Completions::total`] gives its length up front without enumerating.
///
/// All sizes being zero (or no sizes at all) yields exactly one item of
/// empty sets, so a fully specified scenario still counts as one case.
#[derive(Debug, Clone)]
pub struct Completions {
    pool: Vec<Card>,
    sizes: Vec<usize>,
    // per slot: the pool left over after the earlier slots, and the
    // strictly increasing indices into it currently picked
    pools: Vec<Vec<Card>>,
    picks: Vec<Vec<usize>>,
    started: bool,
    done: bool,
}

impl Completions {
    /// Set up the walk over a pool, drawing `sizes[i]` cards for slot `i`.
    ///
    /// Fails with [`EngineError::OverconstrainedHand`] if the pool cannot
    /// cover the total draw.
    pub fn new(pool: CardMask, sizes: &[usize]) -> Result<Self, EngineError> {
        let total: usize = sizes.iter().sum();
        if total > pool.count() {
            return Err(EngineError::OverconstrainedHand(format!(
                "pool of {} cards cannot fill {} open slots",
                pool.count(),
                total
            )));
        }
        Ok(Self {
            pool: pool.iter().collect(),
            sizes: sizes.to_vec(),
            pools: Vec::new(),
            picks: Vec::new(),
            started: false,
            done: false,
        })
    }

    /// The number of items the full walk yields.
    ///
    /// Fails with [`EngineError::OverconstrainedHand`] when the count does
    /// not fit in a u64; such a walk could never finish anyway.
    pub fn total(&self) -> Result<u64, EngineError> {
        let mut left = self.pool.len() as u64;
        let mut total = 1u64;
        for &k in &self.sizes {
            total = total.checked_mul(binom(left, k as u64)).ok_or_else(|| {
                EngineError::OverconstrainedHand(
                    "completion count overflows a 64-bit total".into(),
                )
            })?;
            left -= k as u64;
        }
        Ok(total)
    }

    /// Restart the walk from its first item
    pub fn reset(&mut self) {
        self.pools.clear();
        self.picks.clear();
        self.started = false;
        self.done = false;
    }

    // set slot `i` (and its pool) to the lexicographically first pick
    fn init_slot(&mut self, i: usize) {
        let pool = if i == 0 {
            self.pool.clone()
        } else {
            let taken: Vec<usize> = self.picks[i - 1].clone();
            self.pools[i - 1]
                .iter()
                .enumerate()
                .filter(|(j, _)| !taken.contains(j))
                .map(|(_, &c)| c)
                .collect()
        };
        let first: Vec<usize> = (0..self.sizes[i]).collect();
        if i < self.pools.len() {
            self.pools[i] = pool;
            self.picks[i] = first;
        } else {
            self.pools.push(pool);
            self.picks.push(first);
        }
    }

    // step slot `i` to its next combination, returning false when exhausted
    fn advance_slot(&mut self, i: usize) -> bool {
        let n = self.pools[i].len();
        let k = self.sizes[i];
        let picks = &mut self.picks[i];
        // rightmost position that still has room to move up
        for p in (0..k).rev() {
            if picks[p] < n - (k - p) {
                picks[p] += 1;
                for q in p + 1..k {
                    picks[q] = picks[q - 1] + 1;
                }
                return true;
            }
        }
        false
    }

    fn current(&self) -> Vec<CardMask> {
        self.picks
            .iter()
            .zip(&self.pools)
            .map(|(picks, pool)| CardMask::from_many(&picks.iter().map(|&j| pool[j]).collect::<Vec<_>>()))
            .collect()
    }
}

impl Iterator for Completions {
    type Item = Vec<CardMask>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.started {
            self.started = true;
            for i in 0..self.sizes.len() {
                self.init_slot(i);
            }
            return Some(self.current());
        }

        // odometer step: advance the deepest slot that can move, then
        // reset every slot after it onto its shrunken pool
        for i in (0..self.sizes.len()).rev() {
            if self.advance_slot(i) {
                for j in i + 1..self.sizes.len() {
                    self.init_slot(j);
                }
                return Some(self.current());
            }
        }

        self.done = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn binom_values() {
        assert_eq!(binom(52u64, 5), 2_598_960);
        assert_eq!(binom(5u64, 0), 1);
        assert_eq!(binom(5u64, 6), 0);
        assert_eq!(binom(0u64, 0), 1);
        assert_eq!(binom(48u64, 2), 1128);
    }

    #[test]
    fn single_slot_matches_binom() {
        let pool = CardMask::from("2s,3s,4s,5s,6s,7s");
        let mut walk = Completions::new(pool, &[2]).unwrap();
        assert_eq!(walk.total().unwrap(), binom(6u64, 2));

        let items: Vec<_> = walk.by_ref().collect();
        assert_eq!(items.len() as u64, binom(6u64, 2));

        // every item is a distinct 2-card subset of the pool
        let distinct: HashSet<_> = items.iter().map(|sets| sets[0]).collect();
        assert_eq!(distinct.len(), items.len());
        for sets in &items {
            assert_eq!(sets[0].count(), 2);
            assert!(pool.contains(sets[0]));
        }
    }

    #[test]
    fn multi_slot_sets_are_disjoint_and_unique() {
        let pool = CardMask::from("2s,3s,4s,5s,6s,7s,8s");
        let walk = Completions::new(pool, &[2, 2, 1]).unwrap();
        // C(7,2) * C(5,2) * C(3,1)
        assert_eq!(walk.total().unwrap(), 21 * 10 * 3);

        let mut seen = HashSet::new();
        let mut count = 0u64;
        for sets in walk {
            assert_eq!(sets.len(), 3);
            assert_eq!(sets[0].count(), 2);
            assert_eq!(sets[1].count(), 2);
            assert_eq!(sets[2].count(), 1);
            assert!((sets[0] & sets[1]).empty());
            assert!((sets[0] & sets[2]).empty());
            assert!((sets[1] & sets[2]).empty());
            assert!(seen.insert(sets.clone()), "repeated item {:?}", sets);
            count += 1;
        }
        assert_eq!(count, 21 * 10 * 3);
    }

    #[test]
    fn total_is_order_invariant() {
        let pool = CardMask::from("2s,3s,4s,5s,6s,7s,8s,9s");
        let a = Completions::new(pool, &[3, 1]).unwrap();
        let b = Completions::new(pool, &[1, 3]).unwrap();
        assert_eq!(a.total().unwrap(), b.total().unwrap());
    }

    #[test]
    fn empty_sizes_yield_one_empty_item() {
        let pool = CardMask::from("2s,3s");
        let mut walk = Completions::new(pool, &[]).unwrap();
        assert_eq!(walk.total().unwrap(), 1);
        assert_eq!(walk.next(), Some(vec![]));
        assert_eq!(walk.next(), None);

        let mut walk = Completions::new(pool, &[0, 0]).unwrap();
        assert_eq!(walk.total().unwrap(), 1);
        assert_eq!(walk.next(), Some(vec![CardMask::NONE, CardMask::NONE]));
        assert_eq!(walk.next(), None);
    }

    #[test]
    fn total_rejects_counts_beyond_u64() {
        // 8 pair slots plus a 5-card slot multiply far past u64::MAX
        let sizes = [2, 2, 2, 2, 2, 2, 2, 2, 5];
        let walk = Completions::new(CardMask::FULL, &sizes).unwrap();
        assert!(matches!(
            walk.total(),
            Err(EngineError::OverconstrainedHand(_))
        ));
    }

    #[test]
    fn overdraw_is_rejected() {
        let pool = CardMask::from("2s,3s,4s");
        assert!(matches!(
            Completions::new(pool, &[2, 2]),
            Err(EngineError::OverconstrainedHand(_))
        ));
    }

    #[test]
    fn reset_restarts_the_walk() {
        let pool = CardMask::from("2s,3s,4s,5s");
        let mut walk = Completions::new(pool, &[2]).unwrap();
        let first: Vec<_> = walk.by_ref().collect();
        walk.reset();
        let second: Vec<_> = walk.collect();
        assert_eq!(first, second);
    }
}
