//! Closed-form 5-to-7 card hand evaluation over bitmask arithmetic
//!
//! No lookup tables and no subset enumeration; each category is detected
//! directly from per-rank counts and per-suit rank masks, and ties are
//! resolved with mask top-N extraction.

use crate::deck::{CardMask, Rank, RankMask, Suit};
use crate::hand::{Hand, Hand5};

/// A [`Hand5`] engine which deduces the best hand analytically
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticHand5;

impl AnalyticHand5 {
    pub fn new() -> Self {
        Self
    }
}

/// Find the top rank of a straight within a set of ranks, if any. The ace
/// plays both high and low, so the wheel reports `Rank::Five`
fn check_straight(ranks: RankMask) -> Option<Rank> {
    let bits = ranks.bits() as u32;
    // re-frame with the ace duplicated below the deuce, so one run scan
    // covers the wheel too
    let b = (bits << 1) | (bits >> 12);
    let runs = b & (b >> 1) & (b >> 2) & (b >> 3) & (b >> 4);
    if runs == 0 {
        return None;
    }
    // a run bit marks the low card; the top card sits 4 above it, and the
    // frame shift eats 1
    let top = 31 - runs.leading_zeros();
    Some(Rank::from_index(top as u8 + 3))
}

/// Find the 5 highest ranks of a flush suit within a set of cards, if any
fn check_flush(cards: CardMask) -> Option<RankMask> {
    Suit::ALL
        .iter()
        .map(|&s| cards.of_suit(s))
        .find(|r| r.count() >= 5)
        .map(|r| r.top5())
}

impl Hand5 for AnalyticHand5 {
    fn hand5(&self, cards: CardMask) -> Hand {
        // per-suit rank masks drive the flush family
        for &suit in Suit::ALL.iter() {
            let suited = cards.of_suit(suit);
            if suited.count() >= 5 {
                if let Some(top) = check_straight(suited) {
                    return Hand::StraightFlush { top };
                }
            }
        }

        // per-rank multiplicities, scanned from ace down
        let present = cards.unsuited();
        let mut quad = None;
        let mut trips = Vec::new();
        let mut pairs = Vec::new();
        let mut singles = RankMask::NONE;
        for rank in present.iter_reverse() {
            match cards.of_rank_count(rank) {
                4 => quad = Some(rank),
                3 => trips.push(rank),
                2 => pairs.push(rank),
                _ => singles = singles | RankMask::from(rank),
            }
        }

        if let Some(quad) = quad {
            return Hand::FourOfAKind {
                quad,
                kickers: (present ^ RankMask::from(quad)).top1(),
            };
        }

        // a second trip supplies the pair of a full house
        if !trips.is_empty() {
            let pair = trips
                .get(1)
                .copied()
                .into_iter()
                .chain(pairs.first().copied())
                .max();
            if let Some(pair) = pair {
                return Hand::FullHouse { trip: trips[0], pair };
            }
        }

        if let Some(ranks) = check_flush(cards) {
            return Hand::Flush { ranks };
        }

        if let Some(top) = check_straight(present) {
            return Hand::Straight { top };
        }

        if let Some(&trip) = trips.first() {
            return Hand::ThreeOfAKind {
                trip,
                kickers: singles.top2(),
            };
        }

        if pairs.len() >= 2 {
            let pair_mask = RankMask::from(pairs[0]) | RankMask::from(pairs[1]);
            return Hand::TwoPair {
                pairs: pair_mask,
                kickers: (present ^ pair_mask).top1(),
            };
        }

        if let Some(&pair) = pairs.first() {
            return Hand::OnePair {
                pair,
                kickers: singles.top3(),
            };
        }

        Hand::HighCard {
            kickers: present.top5(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_hand {
        ($cards:literal, $hand:expr) => {
            assert_eq!(
                AnalyticHand5::new().hand5(CardMask::from($cards)),
                $hand,
                "cards: {}",
                $cards
            );
        };
    }

    #[test]
    fn high_card() {
        assert_hand!("2s,5h,7d,9c,Js", Hand::HighCard { kickers: "J9752".into() });
        assert_hand!("2s,5h,7d,9c,Js,Qh,Kd", Hand::HighCard { kickers: "KQJ97".into() });
    }

    #[test]
    fn one_pair() {
        assert_hand!("2s,2h,7d,9c,Js", Hand::OnePair { pair: Rank::Two, kickers: "J97".into() });
        assert_hand!("As,Ah,7d,9c,Js,3h,4d", Hand::OnePair { pair: Rank::Ace, kickers: "J97".into() });
    }

    #[test]
    fn two_pair() {
        assert_hand!("2s,2h,9d,9c,Js", Hand::TwoPair { pairs: "92".into(), kickers: "J".into() });
        // with three pairs the third pair rank is still a live kicker
        assert_hand!("2s,2h,9d,9c,Js,Jh,3d", Hand::TwoPair { pairs: "J9".into(), kickers: "3".into() });
        assert_hand!("2s,2h,4d,4c,Js,Jh,3d", Hand::TwoPair { pairs: "J4".into(), kickers: "3".into() });
    }

    #[test]
    fn three_of_a_kind() {
        assert_hand!("2s,2h,2d,9c,Js", Hand::ThreeOfAKind { trip: Rank::Two, kickers: "J9".into() });
        assert_hand!("5s,5h,5d,9c,Js,Ah,3d", Hand::ThreeOfAKind { trip: Rank::Five, kickers: "AJ".into() });
    }

    #[test]
    fn straight() {
        assert_hand!("2s,3h,4d,5c,6s", Hand::Straight { top: Rank::Six });
        assert_hand!("Ts,Jh,Qd,Kc,As", Hand::Straight { top: Rank::Ace });
        // 7 cards with two overlapping straights keeps the higher top
        assert_hand!("2s,3h,4d,5c,6s,7h,8d", Hand::Straight { top: Rank::Eight });
    }

    #[test]
    fn wheel() {
        assert_hand!("As,2h,3d,4c,5s", Hand::Straight { top: Rank::Five });
        // the ace does not wrap past the king
        assert_hand!("Js,Qh,Kd,Ac,2s", Hand::HighCard { kickers: "AKQJ2".into() });
    }

    #[test]
    fn flush() {
        assert_hand!("2s,5s,7s,9s,Js", Hand::Flush { ranks: "J9752".into() });
        // 6 suited cards keep only the top 5
        assert_hand!("2s,5s,7s,9s,Js,Ks,3h", Hand::Flush { ranks: "KJ975".into() });
    }

    #[test]
    fn full_house() {
        assert_hand!("2s,2h,2d,9c,9s", Hand::FullHouse { trip: Rank::Two, pair: Rank::Nine });
        // two trips make a full house from the higher trip and the lower as pair
        assert_hand!("As,Ah,Ad,Kc,Ks,Kh,2d", Hand::FullHouse { trip: Rank::Ace, pair: Rank::King });
        assert_hand!("2s,2h,2d,Kc,Ks,Kh,Ad", Hand::FullHouse { trip: Rank::King, pair: Rank::Two });
        // trip with two pairs keeps the higher pair
        assert_hand!("5s,5h,5d,3c,3s,9h,9d", Hand::FullHouse { trip: Rank::Five, pair: Rank::Nine });
    }

    #[test]
    fn four_of_a_kind() {
        assert_hand!("2s,2h,2d,2c,9s", Hand::FourOfAKind { quad: Rank::Two, kickers: "9".into() });
        assert_hand!("2s,2h,2d,2c,9s,Ah,Kd", Hand::FourOfAKind { quad: Rank::Two, kickers: "A".into() });
        // quads over trips still kick with the trip rank
        assert_hand!("2s,2h,2d,2c,9s,9h,9d", Hand::FourOfAKind { quad: Rank::Two, kickers: "9".into() });
    }

    #[test]
    fn straight_flush() {
        assert_hand!("2s,3s,4s,5s,6s", Hand::StraightFlush { top: Rank::Six });
        assert_hand!("Ts,Js,Qs,Ks,As", Hand::StraightFlush { top: Rank::Ace });
        // steel wheel
        assert_hand!("As,2s,3s,4s,5s", Hand::StraightFlush { top: Rank::Five });
        // a flush and a straight in different suits is not a straight flush
        assert_hand!("2s,3s,4s,5s,7s,6h,Ad", Hand::Flush { ranks: "75432".into() });
    }

    #[test]
    fn straight_flush_beats_mixed_suit_run() {
        // 7 cards where the suited run is lower than the overall run
        assert_hand!("2s,3s,4s,5s,6s,7h,8d", Hand::StraightFlush { top: Rank::Six });
    }
}
