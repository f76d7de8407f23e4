//! Hand detection, evaluation, and ranking for poker hands

pub mod analytic;

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::deck::{Card, CardMask, Rank, RankMask};
use crate::error::EngineError;

/// A trait describing engines capable of deducing the best 5-card hand within
/// a set of 5 to 7 cards
pub trait Hand5 {
    /// Determine the strongest hand makeable from any 5 of the given cards.
    ///
    /// The input mask must hold 5 to 7 cards; use [`evaluate`] for a
    /// validating entry point.
    fn hand5(&self, cards: CardMask) -> Hand;
}

/// Represents all possible poker hands, predelineated in order of strength
/// (i.e. directly comparable), which can be used to convert raw cards into a hand.
///
/// Variant order is category order and each variant carries its tie-break key,
/// so the derived `Ord` compares category first and then the key
/// lexicographically. Equal hands mean a chopped pot at showdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Hand {
    /// A high card hand, which matches no other hand defined here. The kickers
    /// are used to break ties, of which there can be up to 5
    HighCard {
        kickers: RankMask,
    },

    /// A (single) pair, which requires 2 cards of the same rank. The kickers
    /// are used to break ties, of which there can be up to 3
    OnePair {
        pair: Rank,
        kickers: RankMask,
    },

    /// A two pair. The higher pair dominates the lower pair in ties, which the
    /// mask encoding of `pairs` gives for free; the kicker breaks full ties
    TwoPair {
        pairs: RankMask,
        kickers: RankMask,
    },

    /// A three of a kind (trip), with up to 2 kickers
    ThreeOfAKind {
        trip: Rank,
        kickers: RankMask,
    },

    /// A straight: 5 consecutive ranks in any suits. The ace counts high and
    /// low, and only the top rank breaks ties. The wheel (A2345) has `top` Five
    Straight {
        top: Rank,
    },

    /// A flush: at least 5 cards of one suit, tie-broken by the top 5 ranks of
    /// that suit
    Flush {
        ranks: RankMask,
    },

    /// A full house: a trip and a pair. The trip dominates the pair in ties
    FullHouse {
        trip: Rank,
        pair: Rank,
    },

    /// A four of a kind, with 1 kicker
    FourOfAKind {
        quad: Rank,
        kickers: RankMask,
    },

    /// A straight flush: 5 consecutive ranks of one suit, tie-broken by the
    /// top rank (Five for the steel wheel)
    StraightFlush {
        top: Rank,
    },
}

impl Hand {
    /// The category name, without the tie-break key
    pub fn category(&self) -> &'static str {
        match self {
            Self::HighCard { .. } => "High Card",
            Self::OnePair { .. } => "Pair",
            Self::TwoPair { .. } => "Two Pair",
            Self::ThreeOfAKind { .. } => "Three of a Kind",
            Self::Straight { .. } => "Straight",
            Self::Flush { .. } => "Flush",
            Self::FullHouse { .. } => "Full House",
            Self::FourOfAKind { .. } => "Four of a Kind",
            Self::StraightFlush { .. } => "Straight Flush",
        }
    }
}

// writes the ranks of a straight, top first, handling the low ace of the wheel
fn write_straight(f: &mut fmt::Formatter<'_>, top: Rank) -> fmt::Result {
    if top == Rank::Five {
        return write!(f, "A2345");
    }
    for i in (0..5).rev() {
        write!(f, "{}", Rank::from_index(top.index() - i))?;
    }
    Ok(())
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighCard { kickers } => write!(f, "High Card '{}'", kickers),
            Self::OnePair { pair, kickers } => write!(f, "Pair '{}' + Kickers '{}'", pair, kickers),
            Self::TwoPair { pairs, kickers } => write!(f, "Two Pair '{}' + Kickers '{}'", pairs, kickers),
            Self::ThreeOfAKind { trip, kickers } => write!(f, "Trip '{}' + Kickers '{}'", trip, kickers),
            Self::Straight { top } => {
                write!(f, "Straight '")?;
                write_straight(f, *top)?;
                write!(f, "'")
            }
            Self::Flush { ranks } => write!(f, "Flush '{}'", ranks),
            Self::FullHouse { trip, pair } => write!(f, "Full House '{}{}'", trip, pair),
            Self::FourOfAKind { quad, kickers } => write!(f, "Quad '{}' + Kickers '{}'", quad, kickers),
            Self::StraightFlush { top } => {
                write!(f, "Straight Flush '")?;
                write_straight(f, *top)?;
                write!(f, "'")
            }
        }
    }
}

/// Evaluate the best 5-card hand in a set of 5 to 7 distinct cards.
///
/// Deterministic for any fixed input, and equal to the maximum [`Hand`] over
/// all 5-card subsets. Duplicate cards and out-of-range sizes are rejected
/// with [`EngineError::InvalidHandSize`].
pub fn evaluate(cards: &[Card]) -> Result<Hand, EngineError> {
    let mask = CardMask::from_many(cards);
    if mask.count() != cards.len() {
        return Err(EngineError::InvalidHandSize { got: cards.len() });
    }
    evaluate_mask(mask)
}

/// Evaluate the best 5-card hand in a mask of 5 to 7 cards
pub fn evaluate_mask(cards: CardMask) -> Result<Hand, EngineError> {
    if !(5..=7).contains(&cards.count()) {
        return Err(EngineError::InvalidHandSize { got: cards.count() });
    }
    Ok(analytic::AnalyticHand5::new().hand5(cards))
}
