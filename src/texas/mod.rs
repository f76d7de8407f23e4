//! Table driver for Texas Holdem: streets, betting, and showdown
//!
//! A hand runs preflop → flop → turn → river → showdown. Blinds (and an
//! optional ante) are posted at hand start, each player gets 2 hole cards,
//! and the flop/turn/river deal 3/1/1 community cards with a betting round
//! after each deal. The burn card is omitted; it has no effect on the dealt
//! distribution.
//!
//! The table is externally driven: callers submit one [`Action`] at a time
//! through [`Table::act`], which validates fully before touching any chip
//! ledger, so a rejected action leaves the table exactly as it was. Once all
//! but one player folds the survivor takes the pot immediately; otherwise
//! the showdown evaluates every remaining 7-card hand, layers side pots from
//! committed amounts, and awards each pot to the best eligible hand.
//!
//! Ties split a pot equally. Leftover odd chips go one each to the tied
//! winners in seating order starting from the first seat after the button.

use indexmap::IndexMap;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::betting::{side_pots, transfer_capped, Chips, Pot};
use crate::deck::{CardMask, Deck};
use crate::error::EngineError;
use crate::hand::{evaluate_mask, Hand};
use crate::PlayerID;

// 2 hole cards per player plus 5 board cards must fit in one deck
const MAX_PLAYERS: usize = 23;

/// The dealing/betting stage a hand is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    /// The hand is over and payouts are applied
    Complete,
}

/// One player decision at their turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Give up the hand, forfeiting chips already committed
    Fold,
    /// Pass without betting; only legal when nothing is owed
    Check,
    /// Match the current bet, going all-in for less when short
    Call,
    /// Raise the street's bet to this total level
    Raise(Chips),
}

/// Forced bets posted at hand start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blinds {
    pub ante: Chips,
    pub little: Chips,
    pub big: Chips,
}

/// One position at the table
#[derive(Debug, Clone)]
struct Seat {
    id: PlayerID,
    stack: Chips,
    hole: CardMask,
    folded: bool,
    all_in: bool,
    /// Chips put in over the whole hand, the side-pot ledger
    committed: Chips,
    /// Chips put in this street, compared against the street's bet level
    street_paid: Chips,
    /// Had a chance to act since the last raise this street
    acted: bool,
}

/// A Texas Holdem table playing out a single hand
pub struct Table {
    seats: Vec<Seat>,
    button: usize,
    street: Street,
    deck: Deck,
    board: CardMask,
    pot: Chips,
    /// The bet level of the current street
    bet: Chips,
    to_act: usize,
    payouts: IndexMap<PlayerID, Chips>,
}

impl Table {
    /// Seat the players, shuffle and deal, and post blinds and antes.
    ///
    /// `players` fixes the seating order; the little and big blinds sit
    /// directly after `button` and action opens on the next seat. Short
    /// stacks post forced bets all-in for less.
    pub fn new<R: Rng>(
        players: &[(PlayerID, Chips)],
        blinds: Blinds,
        button: usize,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        let n = players.len();
        if !(2..=MAX_PLAYERS).contains(&n) {
            return Err(EngineError::IllegalAction(format!(
                "a table seats 2 to {} players, got {}",
                MAX_PLAYERS, n
            )));
        }
        if button >= n {
            return Err(EngineError::IllegalAction(format!(
                "button seat {} does not exist at a {}-seat table",
                button, n
            )));
        }
        let distinct: IndexMap<PlayerID, ()> = players.iter().map(|&(id, _)| (id, ())).collect();
        if distinct.len() != n {
            return Err(EngineError::IllegalAction("duplicate player id".into()));
        }
        if let Some(&(id, _)) = players.iter().find(|&&(_, stack)| stack == Chips::ZERO) {
            return Err(EngineError::IllegalAction(format!(
                "player {} cannot sit with an empty stack",
                id
            )));
        }
        if blinds.big == Chips::ZERO || blinds.little > blinds.big {
            return Err(EngineError::IllegalAction(format!(
                "blinds must satisfy little <= big with big > 0, got {:#}/{:#}",
                blinds.little, blinds.big
            )));
        }

        let mut deck = Deck::shuffled(rng);
        let mut seats = Vec::with_capacity(n);
        for &(id, stack) in players {
            let hole = CardMask::from_many(&deck.deal(2)?);
            seats.push(Seat {
                id,
                stack,
                hole,
                folded: false,
                all_in: false,
                committed: Chips::ZERO,
                street_paid: Chips::ZERO,
                acted: false,
            });
        }

        let mut table = Self {
            seats,
            button,
            street: Street::Preflop,
            deck,
            board: CardMask::NONE,
            pot: Chips::ZERO,
            bet: blinds.big,
            to_act: 0,
            payouts: IndexMap::new(),
        };

        // antes are dead money: they count toward the side-pot ledger but
        // not toward the street's bet level
        if blinds.ante > Chips::ZERO {
            for i in 0..n {
                let posted = table.post(i, blinds.ante);
                table.seats[i].committed += posted;
            }
        }
        for (offset, blind) in [blinds.little, blinds.big].into_iter().enumerate() {
            let i = (button + offset + 1) % n;
            let posted = table.post(i, blind);
            table.seats[i].committed += posted;
            table.seats[i].street_paid += posted;
        }
        debug!("hand start: {} players, pot {} after forced bets", n, table.pot);

        table.settle((button + 3) % n)?;
        Ok(table)
    }

    // move up to `amount` from a seat's stack to the pot, marking all-ins
    fn post(&mut self, seat: usize, amount: Chips) -> Chips {
        let (actual, depleted) = transfer_capped(&mut self.pot, &mut self.seats[seat].stack, amount);
        if depleted {
            self.seats[seat].all_in = true;
        }
        actual
    }

    /// Submit one player's action.
    ///
    /// Everything is validated before any chips move, so an
    /// [`EngineError::IllegalAction`] leaves pot, stacks, and turn order
    /// untouched and the same player still to act.
    pub fn act(&mut self, player: PlayerID, action: Action) -> Result<(), EngineError> {
        if self.street == Street::Complete {
            return Err(EngineError::IllegalAction("the hand is over".into()));
        }
        let idx = self
            .seats
            .iter()
            .position(|s| s.id == player)
            .ok_or_else(|| EngineError::IllegalAction(format!("unknown player {}", player)))?;
        if self.seats[idx].folded {
            return Err(EngineError::IllegalAction(format!(
                "player {} cannot act after folding",
                player
            )));
        }
        if self.seats[idx].all_in {
            return Err(EngineError::IllegalAction(format!(
                "player {} cannot act while all-in",
                player
            )));
        }
        if idx != self.to_act {
            return Err(EngineError::IllegalAction(format!(
                "player {} is acting out of turn",
                player
            )));
        }

        let owed = self.bet - self.seats[idx].street_paid;
        match action {
            Action::Fold => {
                debug!("player {} folds", player);
                self.seats[idx].folded = true;
                self.seats[idx].acted = true;
                if self.live().count() == 1 {
                    return self.award_uncontested();
                }
            }
            Action::Check => {
                if owed > Chips::ZERO {
                    return Err(EngineError::IllegalAction(format!(
                        "player {} cannot check against a live bet of {}",
                        player, owed
                    )));
                }
                debug!("player {} checks", player);
                self.seats[idx].acted = true;
            }
            Action::Call => {
                if owed == Chips::ZERO {
                    return Err(EngineError::IllegalAction(format!(
                        "player {} has nothing to call",
                        player
                    )));
                }
                let posted = self.post(idx, owed);
                self.seats[idx].committed += posted;
                self.seats[idx].street_paid += posted;
                self.seats[idx].acted = true;
                debug!("player {} calls {}{}", player, posted,
                    if self.seats[idx].all_in { " (all-in)" } else { "" });
            }
            Action::Raise(to) => {
                if to <= self.bet {
                    return Err(EngineError::IllegalAction(format!(
                        "player {} raise to {} does not exceed the current bet {}",
                        player, to, self.bet
                    )));
                }
                let required = to - self.seats[idx].street_paid;
                if required > self.seats[idx].stack {
                    return Err(EngineError::IllegalAction(format!(
                        "player {} cannot afford a raise to {}",
                        player, to
                    )));
                }
                let posted = self.post(idx, required);
                self.seats[idx].committed += posted;
                self.seats[idx].street_paid += posted;
                self.bet = to;
                // the raise reopens action for everyone else
                for (i, seat) in self.seats.iter_mut().enumerate() {
                    seat.acted = i == idx;
                }
                debug!("player {} raises to {}{}", player, to,
                    if self.seats[idx].all_in { " (all-in)" } else { "" });
            }
        }

        self.settle((idx + 1) % self.seats.len())
    }

    // hand the turn to the next seat that still owes action, or close the
    // street when no seat does
    fn settle(&mut self, from: usize) -> Result<(), EngineError> {
        let n = self.seats.len();
        for offset in 0..n {
            let i = (from + offset) % n;
            let seat = &self.seats[i];
            if !seat.folded && !seat.all_in && (!seat.acted || seat.street_paid < self.bet) {
                self.to_act = i;
                return Ok(());
            }
        }
        self.close_street()
    }

    // deal the next street, or run the board out to showdown when fewer
    // than 2 seats can still act
    fn close_street(&mut self) -> Result<(), EngineError> {
        loop {
            let dealt = match self.street {
                Street::Preflop => {
                    self.street = Street::Flop;
                    3
                }
                Street::Flop => {
                    self.street = Street::Turn;
                    1
                }
                Street::Turn => {
                    self.street = Street::River;
                    1
                }
                Street::River => return self.showdown(),
                Street::Complete => return Ok(()),
            };
            self.board = self.board | CardMask::from_many(&self.deck.deal(dealt)?);
            self.bet = Chips::ZERO;
            for seat in self.seats.iter_mut() {
                seat.street_paid = Chips::ZERO;
                seat.acted = false;
            }
            debug!("{:?}: board {}", self.street, self.board);

            let open: Vec<usize> = (0..self.seats.len())
                .filter(|&i| {
                    let s = &self.seats[i];
                    !s.folded && !s.all_in
                })
                .collect();
            if open.len() >= 2 {
                // action opens on the first live seat after the button
                let n = self.seats.len();
                self.to_act = (1..=n)
                    .map(|offset| (self.button + offset) % n)
                    .find(|i| open.contains(i))
                    .unwrap_or(open[0]);
                return Ok(());
            }
        }
    }

    // everyone else folded: the pot goes to the survivor without a showdown
    fn award_uncontested(&mut self) -> Result<(), EngineError> {
        let winner = self
            .seats
            .iter()
            .position(|s| !s.folded)
            .ok_or_else(|| EngineError::IllegalAction("no live player left".into()))?;
        let amount = self.pot;
        self.seats[winner].stack += amount;
        self.pot = Chips::ZERO;
        self.payouts.insert(self.seats[winner].id, amount);
        self.street = Street::Complete;
        debug!("player {} wins {} uncontested", self.seats[winner].id, amount);
        Ok(())
    }

    // evaluate every live hand, layer the pots, and pay the winners
    fn showdown(&mut self) -> Result<(), EngineError> {
        let mut hands = IndexMap::new();
        for seat in self.seats.iter().filter(|s| !s.folded) {
            hands.insert(seat.id, evaluate_mask(seat.hole | self.board)?);
        }

        let committed: Vec<(PlayerID, Chips)> =
            self.seats.iter().map(|s| (s.id, s.committed)).collect();
        let live: Vec<PlayerID> = hands.keys().copied().collect();
        let pots = side_pots(&committed, &live);

        let n = self.seats.len();
        let order: Vec<PlayerID> = (1..=n)
            .map(|offset| self.seats[(self.button + offset) % n].id)
            .collect();
        self.payouts = distribute_pots(&pots, &hands, &order);

        for seat in self.seats.iter_mut() {
            if let Some(&won) = self.payouts.get(&seat.id) {
                seat.stack += won;
                debug!("player {} shows {} and wins {}", seat.id, hands[&seat.id], won);
            }
        }
        self.pot = Chips::ZERO;
        self.street = Street::Complete;
        Ok(())
    }

    fn live(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| !s.folded)
    }

    /// The live contenders' hole cards and the board so far, the inputs an
    /// in-progress equity query needs
    pub fn known_state(&self) -> (IndexMap<PlayerID, CardMask>, CardMask) {
        let holes = self.live().map(|s| (s.id, s.hole)).collect();
        (holes, self.board)
    }

    pub fn street(&self) -> Street {
        self.street
    }

    pub fn board(&self) -> CardMask {
        self.board
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }

    /// The current bet level of the street
    pub fn bet(&self) -> Chips {
        self.bet
    }

    /// The player whose turn it is, once the hand is still running
    pub fn to_act(&self) -> Option<PlayerID> {
        (self.street != Street::Complete).then(|| self.seats[self.to_act].id)
    }

    /// Every seat's id and current stack, in seating order
    pub fn stacks(&self) -> Vec<(PlayerID, Chips)> {
        self.seats.iter().map(|s| (s.id, s.stack)).collect()
    }

    /// What each winner was paid, empty until the hand completes
    pub fn payouts(&self) -> &IndexMap<PlayerID, Chips> {
        &self.payouts
    }
}

/// Award each pot to its best eligible hand.
///
/// `order` is the seating order starting from the first seat after the
/// button; ties split a pot equally and any remainder chips go one each to
/// the tied winners in that order.
pub fn distribute_pots(
    pots: &[Pot],
    hands: &IndexMap<PlayerID, Hand>,
    order: &[PlayerID],
) -> IndexMap<PlayerID, Chips> {
    let mut payouts: IndexMap<PlayerID, Chips> = IndexMap::new();
    for pot in pots {
        let best = pot.eligible.iter().filter_map(|id| hands.get(id)).max();
        let Some(best) = best else { continue };
        let winners: Vec<PlayerID> = order
            .iter()
            .copied()
            .filter(|id| pot.eligible.contains(id) && hands.get(id) == Some(best))
            .collect();
        let total = u64::from(pot.amount);
        let share = total / winners.len() as u64;
        let remainder = total % winners.len() as u64;
        for (i, id) in winners.into_iter().enumerate() {
            let won = share + if (i as u64) < remainder { 1 } else { 0 };
            *payouts.entry(id).or_insert(Chips::ZERO) += Chips::new(won);
        }
    }
    payouts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Rank;
    use crate::rng_from_seed;

    fn blinds() -> Blinds {
        Blinds { ante: Chips::ZERO, little: Chips::new(5), big: Chips::new(10) }
    }

    fn table(stacks: &[u64]) -> Table {
        let players: Vec<(PlayerID, Chips)> = stacks
            .iter()
            .enumerate()
            .map(|(i, &s)| (i as PlayerID, Chips::new(s)))
            .collect();
        let mut rng = rng_from_seed(Some("table-tests"));
        Table::new(&players, blinds(), 0, &mut rng).unwrap()
    }

    fn total_chips(table: &Table) -> u64 {
        table.stacks().iter().map(|&(_, s)| u64::from(s)).sum::<u64>()
            + u64::from(table.pot())
    }

    #[test]
    fn blinds_are_posted() {
        let t = table(&[100, 100, 100]);
        assert_eq!(t.pot(), Chips::new(15));
        assert_eq!(t.bet(), Chips::new(10));
        assert_eq!(t.stacks(), vec![
            (0, Chips::new(100)),
            (1, Chips::new(95)),
            (2, Chips::new(90)),
        ]);
        // action opens after the big blind
        assert_eq!(t.to_act(), Some(0));
        assert_eq!(t.street(), Street::Preflop);
    }

    #[test]
    fn short_blind_posts_all_in() {
        let t = table(&[100, 100, 4]);
        assert_eq!(t.pot(), Chips::new(9));
        // the bet level stays at the full big blind
        assert_eq!(t.bet(), Chips::new(10));
        assert_eq!(t.stacks()[2], (2, Chips::ZERO));
    }

    #[test]
    fn illegal_actions_change_nothing() {
        let mut t = table(&[100, 100, 100]);
        let pot = t.pot();
        let stacks = t.stacks();
        let to_act = t.to_act();

        // out of turn
        assert!(matches!(t.act(1, Action::Call), Err(EngineError::IllegalAction(_))));
        // checking against the live big blind
        assert!(matches!(t.act(0, Action::Check), Err(EngineError::IllegalAction(_))));
        // raising below the current bet
        assert!(matches!(t.act(0, Action::Raise(Chips::new(6))), Err(EngineError::IllegalAction(_))));
        // raising beyond the stack
        assert!(matches!(t.act(0, Action::Raise(Chips::new(500))), Err(EngineError::IllegalAction(_))));
        // a player who is not seated
        assert!(matches!(t.act(9, Action::Fold), Err(EngineError::IllegalAction(_))));

        assert_eq!(t.pot(), pot);
        assert_eq!(t.stacks(), stacks);
        assert_eq!(t.to_act(), to_act);
    }

    #[test]
    fn folded_players_cannot_act() {
        let mut t = table(&[100, 100, 100]);
        t.act(0, Action::Fold).unwrap();
        let err = t.act(0, Action::Fold).unwrap_err();
        assert!(matches!(err, EngineError::IllegalAction(ref m) if m.contains("after folding")));
    }

    #[test]
    fn folding_to_one_awards_the_pot() {
        let mut t = table(&[100, 100, 100]);
        t.act(0, Action::Fold).unwrap();
        t.act(1, Action::Fold).unwrap();
        assert_eq!(t.street(), Street::Complete);
        assert_eq!(t.to_act(), None);
        // the big blind takes the little blind's chips without a showdown
        assert_eq!(t.payouts().get(&2), Some(&Chips::new(15)));
        assert_eq!(t.stacks()[2], (2, Chips::new(105)));
        assert_eq!(t.pot(), Chips::ZERO);
        assert_eq!(total_chips(&t), 300);
    }

    #[test]
    fn checked_down_hand_reaches_showdown() {
        let mut t = table(&[100, 100, 100]);
        // preflop: button calls, little blind completes, big blind checks
        t.act(0, Action::Call).unwrap();
        t.act(1, Action::Call).unwrap();
        t.act(2, Action::Check).unwrap();
        assert_eq!(t.street(), Street::Flop);
        assert_eq!(t.board().count(), 3);
        assert_eq!(t.pot(), Chips::new(30));

        for street in [Street::Turn, Street::River, Street::Complete] {
            t.act(1, Action::Check).unwrap();
            t.act(2, Action::Check).unwrap();
            t.act(0, Action::Check).unwrap();
            assert_eq!(t.street(), street);
        }

        assert_eq!(t.board().count(), 5);
        assert_eq!(t.pot(), Chips::ZERO);
        let paid: u64 = t.payouts().values().map(|&c| u64::from(c)).sum();
        assert_eq!(paid, 30);
        assert_eq!(total_chips(&t), 300);
    }

    #[test]
    fn all_in_hand_runs_out_the_board() {
        let mut t = table(&[100, 40, 100]);
        t.act(0, Action::Raise(Chips::new(100))).unwrap();
        t.act(1, Action::Call).unwrap();
        t.act(2, Action::Call).unwrap();

        // nobody can act, so the board runs out to a showdown
        assert_eq!(t.street(), Street::Complete);
        assert_eq!(t.board().count(), 5);
        assert_eq!(t.pot(), Chips::ZERO);
        let paid: u64 = t.payouts().values().map(|&c| u64::from(c)).sum();
        assert_eq!(paid, 240);
        assert_eq!(total_chips(&t), 240);
    }

    #[test]
    fn raises_reopen_action() {
        let mut t = table(&[200, 200, 200]);
        t.act(0, Action::Call).unwrap();
        t.act(1, Action::Raise(Chips::new(30))).unwrap();
        // both earlier actors owe again
        t.act(2, Action::Call).unwrap();
        t.act(0, Action::Call).unwrap();
        assert_eq!(t.street(), Street::Flop);
        assert_eq!(t.pot(), Chips::new(90));
    }

    #[test]
    fn known_state_tracks_the_street() {
        let mut t = table(&[100, 100, 100]);
        t.act(0, Action::Fold).unwrap();
        t.act(1, Action::Call).unwrap();
        t.act(2, Action::Check).unwrap();

        let (holes, board) = t.known_state();
        assert_eq!(holes.len(), 2);
        assert!(holes.keys().eq([&1, &2]));
        for hole in holes.values() {
            assert_eq!(hole.count(), 2);
        }
        assert_eq!(board.count(), 3);
        assert_eq!(board, t.board());
        // hole cards and board never overlap
        for hole in holes.values() {
            assert!((*hole & board).empty());
        }
    }

    #[test]
    fn odd_chips_go_to_the_first_seat_after_the_button() {
        let pots = vec![Pot { amount: Chips::new(101), eligible: vec![1, 2, 3] }];
        let mut hands = IndexMap::new();
        let tied = Hand::Straight { top: Rank::Nine };
        hands.insert(1, tied);
        hands.insert(2, Hand::OnePair { pair: Rank::Ace, kickers: "KQJ".into() });
        hands.insert(3, tied);

        // button on seat 1, so seating order is 2, 3, 1
        let payouts = distribute_pots(&pots, &hands, &[2, 3, 1]);
        assert_eq!(payouts.get(&3), Some(&Chips::new(51)));
        assert_eq!(payouts.get(&1), Some(&Chips::new(50)));
        assert_eq!(payouts.get(&2), None);
    }

    #[test]
    fn side_pot_winners_split_by_eligibility() {
        // 2 is all-in short but holds the best hand; 1 beats 3 for the rest
        let pots = vec![
            Pot { amount: Chips::new(90), eligible: vec![1, 2, 3] },
            Pot { amount: Chips::new(80), eligible: vec![1, 3] },
        ];
        let mut hands = IndexMap::new();
        hands.insert(1, Hand::Flush { ranks: "KJ975".into() });
        hands.insert(2, Hand::FourOfAKind { quad: Rank::Six, kickers: "A".into() });
        hands.insert(3, Hand::TwoPair { pairs: "J4".into(), kickers: "A".into() });

        let payouts = distribute_pots(&pots, &hands, &[1, 2, 3]);
        assert_eq!(payouts.get(&2), Some(&Chips::new(90)));
        assert_eq!(payouts.get(&1), Some(&Chips::new(80)));
        assert_eq!(payouts.get(&3), None);
    }

    #[test]
    fn bad_tables_are_rejected() {
        let mut rng = rng_from_seed(Some("bad-tables"));
        let lone = [(0, Chips::new(100))];
        assert!(Table::new(&lone, blinds(), 0, &mut rng).is_err());

        let dup = [(7, Chips::new(100)), (7, Chips::new(100))];
        assert!(Table::new(&dup, blinds(), 0, &mut rng).is_err());

        let broke = [(0, Chips::new(100)), (1, Chips::ZERO)];
        assert!(Table::new(&broke, blinds(), 0, &mut rng).is_err());

        let pair = [(0, Chips::new(100)), (1, Chips::new(100))];
        assert!(Table::new(&pair, blinds(), 5, &mut rng).is_err());
    }

    #[test]
    fn inverted_blinds_are_rejected() {
        let mut rng = rng_from_seed(Some("inverted-blinds"));
        let players = [(0, Chips::new(1_000)), (1, Chips::new(1_000))];

        // a little blind above the big blind would push a caller's owed
        // amount below zero on the very first action
        let inverted = Blinds { ante: Chips::ZERO, little: Chips::new(20), big: Chips::new(10) };
        assert!(matches!(
            Table::new(&players, inverted, 0, &mut rng),
            Err(EngineError::IllegalAction(_))
        ));

        let free = Blinds { ante: Chips::ZERO, little: Chips::ZERO, big: Chips::ZERO };
        assert!(matches!(
            Table::new(&players, free, 0, &mut rng),
            Err(EngineError::IllegalAction(_))
        ));
    }
}
