//! Win/tie/lose equity over the completions of partially known cards
//!
//! Both modes share one scoring step (best hand wins, equal best hands chop)
//! and differ only in how worlds are produced: exact mode walks every
//! completion of the unknown cards exactly once, approximate mode samples
//! completions without replacement under a trial budget. Work is partitioned
//! across rayon workers and partial tallies are merged as plain integer
//! counts, so results are independent of thread count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use rand_seeder::Seeder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combo::Completions;
use crate::deck::{sample_cards, CardMask};
use crate::error::EngineError;
use crate::hand::{analytic::AnalyticHand5, Hand, Hand5};
use crate::PlayerID;

// worlds scored between deadline checks
const DEADLINE_STRIDE: u64 = 512;

// trials per independently seeded Monte Carlo batch
const BATCH: u64 = 4096;

/// How to explore the space of unknown cards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Enumerate every completion exactly once
    Exact,

    /// Sample `trials` completions without replacement per trial. A seed
    /// string makes the run bit-identical across repeats and thread counts;
    /// without one, a fresh seed is drawn from the OS
    Approximate { trials: u64, seed: Option<String> },
}

/// Outcome counts for one contender over every scored world.
///
/// Ties carry their multiplicity: `ties_by_way[k]` counts the worlds chopped
/// `k + 2` ways, so pot-share credit stays exact integer arithmetic until a
/// probability is requested. For every world, `wins + ties + losses` grows by
/// exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityResult {
    pub id: PlayerID,
    pub wins: u64,
    pub losses: u64,
    pub ties_by_way: Vec<u64>,
    pub trials: u64,
}

impl EquityResult {
    /// Worlds this contender chopped, at any multiplicity
    pub fn ties(&self) -> u64 {
        self.ties_by_way.iter().sum()
    }

    /// Fold another run over the same contender into this one
    pub fn merge(&mut self, other: &EquityResult) {
        self.wins += other.wins;
        self.losses += other.losses;
        for (a, b) in self.ties_by_way.iter_mut().zip(&other.ties_by_way) {
            *a += b;
        }
        self.trials += other.trials;
    }

    pub fn win_probability(&self) -> f64 {
        self.wins as f64 / self.trials as f64
    }

    pub fn tie_probability(&self) -> f64 {
        self.ties() as f64 / self.trials as f64
    }

    pub fn lose_probability(&self) -> f64 {
        self.losses as f64 / self.trials as f64
    }

    /// Probability-weighted pot share: outright wins plus the fractional
    /// credit of each chop
    pub fn equity(&self) -> f64 {
        let chopped: f64 = self
            .ties_by_way
            .iter()
            .enumerate()
            .map(|(k, &n)| n as f64 / (k + 2) as f64)
            .sum();
        (self.wins as f64 + chopped) / self.trials as f64
    }
}

// integer outcome counts for all contenders, mergeable across workers
#[derive(Debug, Clone)]
struct Tally {
    trials: u64,
    wins: Vec<u64>,
    losses: Vec<u64>,
    ties_by_way: Vec<Vec<u64>>,
}

impl Tally {
    fn new(contenders: usize) -> Self {
        let ways = contenders.saturating_sub(1);
        Self {
            trials: 0,
            wins: vec![0; contenders],
            losses: vec![0; contenders],
            ties_by_way: vec![vec![0; ways]; contenders],
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.trials += other.trials;
        for (a, b) in self.wins.iter_mut().zip(&other.wins) {
            *a += b;
        }
        for (a, b) in self.losses.iter_mut().zip(&other.losses) {
            *a += b;
        }
        for (a, b) in self.ties_by_way.iter_mut().zip(&other.ties_by_way) {
            for (x, y) in a.iter_mut().zip(b) {
                *x += y;
            }
        }
        self
    }
}

// the validated query: the card pool, the open slots to fill from it, and
// how completed slots map back onto contenders
struct WorldShape {
    ids: Vec<PlayerID>,
    holes: Vec<CardMask>,
    board: CardMask,
    pool: CardMask,
    // slot 0 completes the board, the rest complete short holes in order
    sizes: Vec<usize>,
    hole_slot: Vec<Option<usize>>,
}

impl WorldShape {
    fn build(
        contenders: &IndexMap<PlayerID, CardMask>,
        board: CardMask,
        dead: CardMask,
    ) -> Result<Self, EngineError> {
        if contenders.is_empty() {
            return Err(EngineError::EmptyContenderSet);
        }
        if board.count() > 5 {
            return Err(EngineError::OverconstrainedHand(format!(
                "board holds {} cards, at most 5 allowed",
                board.count()
            )));
        }

        let mut fixed = board | dead;
        let mut fixed_count = board.count() + dead.count();
        let mut ids = Vec::with_capacity(contenders.len());
        let mut holes = Vec::with_capacity(contenders.len());
        let mut sizes = vec![5 - board.count()];
        let mut hole_slot = Vec::with_capacity(contenders.len());
        for (&id, &hole) in contenders {
            if hole.count() > 2 {
                return Err(EngineError::OverconstrainedHand(format!(
                    "contender {} holds {} hole cards, at most 2 allowed",
                    id,
                    hole.count()
                )));
            }
            if hole.count() < 2 {
                hole_slot.push(Some(sizes.len()));
                sizes.push(2 - hole.count());
            } else {
                hole_slot.push(None);
            }
            fixed = fixed | hole;
            fixed_count += hole.count();
            ids.push(id);
            holes.push(hole);
        }

        if fixed.count() != fixed_count {
            return Err(EngineError::OverconstrainedHand(
                "the same card appears in more than one place".into(),
            ));
        }

        let pool = fixed.inverse();
        let open: usize = sizes.iter().sum();
        if open > pool.count() {
            return Err(EngineError::OverconstrainedHand(format!(
                "pool of {} cards cannot fill {} open slots",
                pool.count(),
                open
            )));
        }

        Ok(Self { ids, holes, board, pool, sizes, hole_slot })
    }

    // score one completed world into the tally
    fn score(&self, sets: &[CardMask], tally: &mut Tally, scratch: &mut Vec<Hand>) {
        let board = self.board | sets[0];
        scratch.clear();
        for (hole, slot) in self.holes.iter().zip(&self.hole_slot) {
            let cards = match slot {
                Some(s) => board | *hole | sets[*s],
                None => board | *hole,
            };
            scratch.push(AnalyticHand5::new().hand5(cards));
        }

        let best = *scratch.iter().max().unwrap();
        let winners = scratch.iter().filter(|&&h| h == best).count();
        for (i, &hand) in scratch.iter().enumerate() {
            if hand < best {
                tally.losses[i] += 1;
            } else if winners == 1 {
                tally.wins[i] += 1;
            } else {
                tally.ties_by_way[i][winners - 2] += 1;
            }
        }
        tally.trials += 1;
    }

    fn results(&self, tally: Tally) -> Vec<EquityResult> {
        self.ids
            .iter()
            .enumerate()
            .map(|(i, &id)| EquityResult {
                id,
                wins: tally.wins[i],
                losses: tally.losses[i],
                ties_by_way: tally.ties_by_way[i].clone(),
                trials: tally.trials,
            })
            .collect()
    }
}

fn past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

fn run_exact(shape: &WorldShape, deadline: Option<Instant>) -> Result<Tally, EngineError> {
    let worlds = Completions::new(shape.pool, &shape.sizes)?;
    let cancelled = AtomicBool::new(false);
    worlds
        .par_bridge()
        .try_fold(
            || (Tally::new(shape.ids.len()), Vec::new(), 0u64),
            |(mut tally, mut scratch, seen), sets| {
                if seen % DEADLINE_STRIDE == 0
                    && (cancelled.load(Ordering::Relaxed) || past(deadline))
                {
                    cancelled.store(true, Ordering::Relaxed);
                    return Err(EngineError::Cancelled);
                }
                shape.score(&sets, &mut tally, &mut scratch);
                Ok((tally, scratch, seen + 1))
            },
        )
        .map(|acc| acc.map(|(tally, _, _)| tally))
        .try_reduce(|| Tally::new(shape.ids.len()), |a, b| Ok(a.merge(b)))
}

fn run_approximate(
    shape: &WorldShape,
    trials: u64,
    seed: &str,
    deadline: Option<Instant>,
) -> Result<Tally, EngineError> {
    let batches = trials.div_ceil(BATCH);
    let cancelled = AtomicBool::new(false);
    (0..batches)
        .into_par_iter()
        .map(|b| {
            // every batch draws from its own substream of the seed, so the
            // batch split (and the thread count) never changes the outcome
            let mut rng: ChaCha20Rng = Seeder::from(format!("{seed}#{b}").as_str()).into_rng();
            let mut tally = Tally::new(shape.ids.len());
            let mut scratch = Vec::new();
            let mut sets = vec![CardMask::NONE; shape.sizes.len()];
            for i in 0..BATCH.min(trials - b * BATCH) {
                if i % DEADLINE_STRIDE == 0
                    && (cancelled.load(Ordering::Relaxed) || past(deadline))
                {
                    cancelled.store(true, Ordering::Relaxed);
                    return Err(EngineError::Cancelled);
                }
                let mut remaining = shape.pool;
                for (set, &size) in sets.iter_mut().zip(&shape.sizes) {
                    *set = sample_cards(remaining, size, &mut rng);
                    remaining = remaining ^ *set;
                }
                shape.score(&sets, &mut tally, &mut scratch);
            }
            Ok(tally)
        })
        .try_reduce(|| Tally::new(shape.ids.len()), |a, b| Ok(a.merge(b)))
}

/// The number of worlds exact mode scores for a query, by closed form.
///
/// Equals the product of binomial coefficients over the open slots, and is
/// exactly the `trials` every [`EquityResult`] of the exact run reports.
pub fn exact_trial_count(
    contenders: &IndexMap<PlayerID, CardMask>,
    board: CardMask,
    dead: CardMask,
) -> Result<u64, EngineError> {
    let shape = WorldShape::build(contenders, board, dead)?;
    Ok(Completions::new(shape.pool, &shape.sizes)?.total()?)
}

/// Compute each contender's win/tie/lose counts over the unknown cards.
///
/// `contenders` maps each id to its known hole cards (0 to 2; fewer than 2
/// means a randomized hand), `board` holds the known community cards, and
/// `dead` holds other exposed cards excluded from the pool. Results come back
/// in contender order. A deadline aborts long runs with
/// [`EngineError::Cancelled`], checked cooperatively between worlds.
pub fn compute_equity(
    contenders: &IndexMap<PlayerID, CardMask>,
    board: CardMask,
    dead: CardMask,
    mode: Mode,
    deadline: Option<Instant>,
) -> Result<Vec<EquityResult>, EngineError> {
    let shape = WorldShape::build(contenders, board, dead)?;
    let tally = match mode {
        Mode::Exact => {
            let worlds = Completions::new(shape.pool, &shape.sizes)?.total()?;
            debug!(
                "exact equity: contenders [{}], {} worlds",
                shape.ids.iter().join(", "),
                worlds
            );
            run_exact(&shape, deadline)?
        }
        Mode::Approximate { trials, seed } => {
            if trials == 0 {
                return Err(EngineError::InvalidBudget);
            }
            let seed = seed
                .unwrap_or_else(|| format!("{:016x}", rand::rng().random::<u64>()));
            debug!(
                "approximate equity: {} contenders, {} trials, seed {:?}",
                shape.ids.len(),
                trials,
                seed
            );
            run_approximate(&shape, trials, &seed, deadline)?
        }
    };
    Ok(shape.results(tally))
}
