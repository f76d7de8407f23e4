//! Chip accounting and pot construction shared by betting rounds
//!
//! Game flow varies across variants, but the chip operations underneath it
//! do not. Capturing them here keeps the subtle parts (capped all-in
//! withdrawals, side-pot layering) in one tested place.

use std::{
    fmt::Display,
    ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::PlayerID;

/// Currency type for the game, which is a count of 'chip' values
// integer chips; stakes scale up or down as needed (100/200 chips = $1/$2
// with 0.01 increments)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Chips(u64);

impl Chips {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

/// Display the number of chips as a string, which is prefixed with a dollar sign ($) by default.
///
/// To display without the dollar sign, use the `{:#}` format specifier, which will emit just the number.
impl Display for Chips {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            // display without the dollar sign
            write!(f, "{:}", self.0)
        } else {
            // display with the dollar sign (default)
            write!(f, "${:}", self.0)
        }
    }
}

impl From<u64> for Chips {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Chips> for u64 {
    fn from(value: Chips) -> Self {
        value.0
    }
}

/// Parse from a plain number, or a number prefixed with a dollar sign ($)
impl FromStr for Chips {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(raw) = s.strip_prefix('$') {
            Ok(Self(raw.parse::<u64>()?))
        } else {
            Ok(Self(s.parse::<u64>()?))
        }
    }
}

impl Add<Chips> for Chips {
    type Output = Chips;
    fn add(self, other: Chips) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl AddAssign<Chips> for Chips {
    fn add_assign(&mut self, other: Chips) {
        *self = *self + other;
    }
}

impl Sub<Chips> for Chips {
    type Output = Chips;
    fn sub(self, other: Chips) -> Self::Output {
        Self(self.0 - other.0)
    }
}

impl SubAssign<Chips> for Chips {
    fn sub_assign(&mut self, other: Chips) {
        *self = *self - other;
    }
}

impl Mul<u64> for Chips {
    type Output = Chips;
    fn mul(self, other: u64) -> Self::Output {
        Self(self.0 * other)
    }
}

impl MulAssign<u64> for Chips {
    fn mul_assign(&mut self, other: u64) {
        *self = *self * other;
    }
}

/// Withdraw a requested amount or the maximum available from a source, returning the actual amount that was successfully withdrawn, and a boolean indicating if the source was depleted or not.
///
/// Most 'withdraw' operations (i.e. bank accounts) fail outright when the
/// source cannot cover the request. Poker allows going all-in for the full
/// remaining amount instead, and the caller needs to know when that happened.
pub fn withdraw_capped(from: &mut Chips, amount: Chips) -> (Chips, bool) {
    let actual = amount.min(*from);
    *from -= actual;
    let depleted = *from == Chips::ZERO;
    (actual, depleted)
}

/// Deposit an amount into a destination. Syntactic sugar for addition, but
/// more readable at call sites
pub fn deposit(to: &mut Chips, amount: Chips) {
    *to += amount;
}

/// A capped withdrawal from a source followed by a deposit into a destination.
///
/// Returns the actual amount that was successfully transferred, and a boolean indicating if the source was fully depleted or not.
pub fn transfer_capped(to: &mut Chips, from: &mut Chips, amount: Chips) -> (Chips, bool) {
    let (actual, depleted) = withdraw_capped(from, amount);
    deposit(to, actual);
    (actual, depleted)
}

/// One pot layer and the players who can win it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: Chips,
    pub eligible: Vec<PlayerID>,
}

/// Layer total commitments into a main pot and side pots.
///
/// `committed` lists every seat's total contribution this hand, folded seats
/// included; `live` lists the players still in contention. Each distinct
/// live commitment level closes one layer: the layer collects every seat's
/// chips up to that level, and only live players committed at or above the
/// level can win it. Folded chips land in the layers they reach but carry no
/// eligibility. The layers always sum to the total committed.
pub fn side_pots(committed: &[(PlayerID, Chips)], live: &[PlayerID]) -> Vec<Pot> {
    let mut levels: Vec<Chips> = committed
        .iter()
        .filter(|(id, c)| live.contains(id) && *c > Chips::ZERO)
        .map(|&(_, c)| c)
        .collect();
    levels.sort();
    levels.dedup();

    let mut pots = Vec::new();
    let mut prev = Chips::ZERO;
    for &level in &levels {
        let mut amount = Chips::ZERO;
        for &(_, c) in committed {
            amount += c.min(level) - c.min(prev);
        }
        let eligible: Vec<PlayerID> = committed
            .iter()
            .filter(|&&(id, c)| live.contains(&id) && c >= level)
            .map(|&(id, _)| id)
            .collect();
        pots.push(Pot { amount, eligible });
        prev = level;
    }
    pots
}
