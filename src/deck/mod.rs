//! The 52-card domain: ranks, suits, cards, bitmask sets of them, and decks
//!
//! Cards are packed into a single byte and card sets into a 64-bit mask, so
//! copying, union, and intersection are single machine operations. The hot
//! evaluation and equity paths work on [`CardMask`] throughout; [`Deck`] is
//! the ordered, deal-from-the-top view a game session owns.

use rand::seq::SliceRandom;
use rand::Rng;

use core::fmt;
use std::fmt::{Debug, Display};
use std::ops::{BitAnd, BitOr, BitXor, Not};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// counts the number of items in a sequence of macro arguments
macro_rules! count_items {
    () => { 0 };
    ($head:ident $(, $tail:ident)*) => { 1 + count_items!($($tail),*) };
}

// defines a 'kind': a packed enumeration with an index and a display text per variant
macro_rules! make_kind {
    (
        $kind:ident : $repr:ty {
            $( $name:ident => $text:expr ),* $(,)?
        }
    ) => {
        #[repr($repr)]
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub enum $kind {
            $( $name , )*
        }

        impl $kind {
            pub const NUM: usize = count_items!($( $name ),*);
            pub const ALL: [Self; Self::NUM] = [
                $( Self::$name , )*
            ];

            pub const fn index(self) -> $repr {
                self as $repr
            }

            pub const fn from_index(index: $repr) -> Self {
                Self::ALL[index as usize]
            }

            pub const fn text(self) -> &'static str {
                match self {
                    $( Self::$name => $text , )*
                }
            }
        }

        impl Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.text())
            }
        }

        impl FromStr for $kind {
            type Err = &'static str;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                for variant in Self::ALL {
                    if variant.text() == s {
                        return Ok(variant);
                    }
                }
                Err(concat!("invalid ", stringify!($kind)))
            }
        }

        impl From<&str> for $kind {
            fn from(s: &str) -> Self {
                Self::from_str(s).unwrap()
            }
        }
    };
}

// packed product of two kinds in a single integer, row-major on the left kind
macro_rules! make_kind_prod {
    (
        $kind:ident : $repr:ty = ($lname:ident: $lkind:ty) * ($rname:ident: $rkind:ty)
    ) => {
        #[repr(transparent)]
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $kind($repr);

        impl $kind {
            pub const NUM: usize = <$lkind>::NUM * <$rkind>::NUM;
            pub const ALL: [Self; Self::NUM] = {
                let mut all = [Self(0); Self::NUM];
                let mut i = 0;
                while i < Self::NUM {
                    all[i] = Self(i as $repr);
                    i += 1;
                }
                all
            };

            pub const fn new($lname: $lkind, $rname: $rkind) -> Self {
                Self($lname.index() + $rname.index() * <$lkind>::NUM as $repr)
            }

            pub const fn from_index(index: $repr) -> Self {
                Self(index)
            }

            pub const fn index(self) -> $repr {
                self.0
            }

            pub const fn $lname(self) -> $lkind {
                <$lkind>::ALL[self.0 as usize % <$lkind>::NUM]
            }

            pub const fn $rname(self) -> $rkind {
                <$rkind>::ALL[self.0 as usize / <$lkind>::NUM]
            }
        }

        impl Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", self.$lname(), self.$rname())
            }
        }

        impl FromStr for $kind {
            type Err = &'static str;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.len() == 2 {
                    Ok(Self::new(<$lkind>::from_str(&s[..1])?, <$rkind>::from_str(&s[1..])?))
                } else {
                    Err(concat!("invalid ", stringify!($kind)))
                }
            }
        }

        impl From<&str> for $kind {
            fn from(s: &str) -> Self {
                Self::from_str(s).unwrap()
            }
        }
    };
}

// a bitmask set over a kind, with set algebra, iteration, and parsing
macro_rules! make_mask {
    (
        $(#[$attr:meta])* $mask:ident : $repr:ty = { $name:ident: $kind:ty }
    ) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        $(#[$attr])*
        pub struct $mask($repr);

        impl $mask {
            pub const NONE: Self = Self::new(0);
            pub const FULL: Self = Self::new(((1 as $repr) << <$kind>::NUM) - 1);

            pub const fn new(bits: $repr) -> Self {
                Self(bits)
            }

            pub const fn bits(self) -> $repr {
                self.0
            }

            pub fn from_many(many: &[$kind]) -> Self {
                let mut mask = Self::NONE;
                for &item in many {
                    mask = mask | Self::from(item);
                }
                mask
            }

            pub const fn empty(&self) -> bool {
                self.bits() == 0
            }

            pub const fn count(&self) -> usize {
                self.bits().count_ones() as usize
            }

            pub const fn contains(&self, other: Self) -> bool {
                (self.bits() & other.bits()) == other.bits()
            }

            pub const fn inverse(&self) -> Self {
                Self::new(Self::FULL.bits() ^ self.bits())
            }

            pub fn iter(&self) -> impl Iterator<Item = $kind> + '_ {
                <$kind>::ALL.iter().copied().filter(|&k| self.contains(Self::from(k)))
            }

            pub fn iter_reverse(&self) -> impl Iterator<Item = $kind> + '_ {
                <$kind>::ALL.iter().rev().copied().filter(|&k| self.contains(Self::from(k)))
            }

            /// The top `N` items of the mask, i.e. only the highest indices kept
            pub fn topn<const N: usize>(&self) -> Self {
                let mut out = Self::NONE;
                for (i, kind) in self.iter_reverse().enumerate() {
                    if i >= N {
                        break;
                    }
                    out = out | Self::from(kind);
                }
                out
            }

            pub fn top1(&self) -> Self { self.topn::<1>() }
            pub fn top2(&self) -> Self { self.topn::<2>() }
            pub fn top3(&self) -> Self { self.topn::<3>() }
            pub fn top5(&self) -> Self { self.topn::<5>() }

            /// The single highest item, if the mask is nonempty
            pub fn top(&self) -> Option<$kind> {
                self.iter_reverse().next()
            }
        }

        impl BitOr for $mask {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self::new(self.bits() | other.bits())
            }
        }

        impl BitAnd for $mask {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self::new(self.bits() & other.bits())
            }
        }

        impl BitXor for $mask {
            type Output = Self;
            fn bitxor(self, other: Self) -> Self {
                Self::new(self.bits() ^ other.bits())
            }
        }

        impl Not for $mask {
            type Output = Self;
            fn not(self) -> Self {
                self.inverse()
            }
        }

        impl From<$kind> for $mask {
            fn from($name: $kind) -> Self {
                Self::new((1 as $repr) << $name.index())
            }
        }

        impl Display for $mask {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for item in self.iter_reverse() {
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }

        impl Debug for $mask {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}::from(\"{}\")", stringify!($mask), self)
            }
        }

        impl FromStr for $mask {
            type Err = &'static str;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mut mask = Self::NONE;
                if s.contains(',') {
                    for item in s.split(',') {
                        mask = mask | Self::from(<$kind>::from_str(item)?);
                    }
                } else {
                    // fixed-width items, determined from any variant's text
                    let width = <$kind>::ALL[0].to_string().len();
                    if s.len() % width != 0 {
                        return Err(concat!("invalid ", stringify!($mask)));
                    }
                    for i in (0..s.len()).step_by(width) {
                        mask = mask | Self::from(<$kind>::from_str(&s[i..i + width])?);
                    }
                }
                Ok(mask)
            }
        }

        impl From<&str> for $mask {
            fn from(s: &str) -> Self {
                Self::from_str(s).unwrap()
            }
        }
    };
}

make_kind! {
    Rank : u8 {
        Two      => "2",
        Three    => "3",
        Four     => "4",
        Five     => "5",
        Six      => "6",
        Seven    => "7",
        Eight    => "8",
        Nine     => "9",
        Ten      => "T",
        Jack     => "J",
        Queen    => "Q",
        King     => "K",
        Ace      => "A",
    }
}

make_kind! {
    Suit : u8 {
        Spades   => "s",
        Hearts   => "h",
        Clubs    => "c",
        Diamonds => "d",
    }
}

make_kind_prod! {
    Card : u8 = (rank: Rank) * (suit: Suit)
}

make_mask! {
    /// A set of ranks, as a 13-bit mask
    RankMask : u16 = { rank: Rank }
}

make_mask! {
    /// A set of suits, as a 4-bit mask
    SuitMask : u8 = { suit: Suit }
}

make_mask! {
    /// A set of cards, as a 52-bit mask
    CardMask : u64 = { card: Card }
}

impl CardMask {
    /// The distinct ranks present in the cards, regardless of suit
    pub fn unsuited(self) -> RankMask {
        let mut mask = RankMask::NONE;
        for suit in Suit::ALL {
            mask = mask | self.of_suit(suit);
        }
        mask
    }

    /// The ranks present for a given suit in the cards
    pub fn of_suit(self, suit: Suit) -> RankMask {
        let bits = self.bits() >> (Rank::NUM as u8 * suit.index());
        RankMask::new(bits as u16) & RankMask::FULL
    }

    /// The suits present for a given rank in the cards
    pub fn of_rank(self, rank: Rank) -> SuitMask {
        let mut mask = SuitMask::NONE;
        for suit in Suit::ALL {
            if self.contains(Card::new(rank, suit).into()) {
                mask = mask | SuitMask::from(suit);
            }
        }
        mask
    }

    /// The number of cards of a given rank present in the cards
    pub fn of_rank_count(self, rank: Rank) -> usize {
        let rank_bits = 1u64 << rank.index();
        // the same rank bit repeated once per suit lane
        let all_suits = rank_bits | (rank_bits << 13) | (rank_bits << 26) | (rank_bits << 39);
        (all_suits & self.bits()).count_ones() as usize
    }
}

/// An ordered deck of the 52 cards, dealt from the top.
///
/// At all times the remaining cards plus everything dealt from this deck make
/// up the full 52-card set with no overlap; the only mutations are
/// [`Deck::shuffle`] and dealing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A deck in canonical (index) order, unshuffled
    pub fn unshuffled() -> Self {
        Self { cards: Card::ALL.to_vec() }
    }

    /// A deck shuffled with the given generator.
    ///
    /// Uses the Fisher-Yates algorithm, so every permutation is equally
    /// likely; pass a generator from [`crate::rng_from_seed`] for a
    /// reproducible order.
    pub fn shuffled<R: Rng>(rng: &mut R) -> Self {
        let mut deck = Self::unshuffled();
        deck.shuffle(rng);
        deck
    }

    /// Reorder the remaining cards uniformly at random
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Number of cards not yet dealt
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// Remove and return the top card
    pub fn deal_one(&mut self) -> Result<Card, EngineError> {
        self.cards.pop().ok_or(EngineError::InsufficientCards { requested: 1, remaining: 0 })
    }

    /// Remove and return the next `n` cards, in deal order
    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, EngineError> {
        if n > self.cards.len() {
            return Err(EngineError::InsufficientCards { requested: n, remaining: self.cards.len() });
        }
        let mut dealt = self.cards.split_off(self.cards.len() - n);
        dealt.reverse();
        Ok(dealt)
    }

    /// The not-yet-dealt cards, as a mask
    pub fn mask(&self) -> CardMask {
        CardMask::from_many(&self.cards)
    }
}

/// Randomly samples `num` cards from `src`, a set of available cards (with order, without replacement)
pub fn sample_cards_ordered<R: Rng>(src: CardMask, num: usize, rng: &mut R) -> Vec<Card> {
    assert!(src.count() >= num);
    let mut res: Vec<Card> = Vec::with_capacity(num);
    while res.len() < num {
        let card = Card::from_index(rng.random_range(0..Card::NUM) as u8);
        if src.contains(card.into()) && !res.contains(&card) {
            res.push(card);
        }
    }
    res
}

/// Randomly samples `num` cards from `src`, a set of available cards (unordered, without replacement)
pub fn sample_cards<R: Rng>(src: CardMask, num: usize, rng: &mut R) -> CardMask {
    assert!(src.count() >= num);
    let mut res = CardMask::NONE;
    while res.count() < num {
        let card = Card::from_index(rng.random_range(0..Card::NUM) as u8);
        // no-op unless the card is actually available
        res = res | (CardMask::from(card) & src);
    }
    res
}
