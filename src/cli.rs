//! Command-line equity calculator for Texas Holdem.
//!
//! Computes each contender's win/tie/lose probabilities from partially known
//! hole cards and board, either by exact enumeration or seeded Monte Carlo.
//!
//! Examples:
//!
//! ```shell
//! # pocket aces vs pocket kings preflop, enumerated exactly
//! $ cargo run --bin odds -- --holes AsAh,KdKc --exact
//!
//! # a known hand against an unknown one on a flop, 1M sampled worlds
//! $ cargo run --bin odds -- --holes AsAh,? --board 2s7h9d --trials 1000000 --seed demo
//! ```

use std::str::FromStr;
use std::time::{Duration, Instant};

use clap::Parser;
use indexmap::IndexMap;
use kdam::{tqdm, BarExt};
use rand::Rng;

use crate::deck::CardMask;
use crate::equity::{compute_equity, exact_trial_count, EquityResult, Mode};
use crate::error::EngineError;
use crate::PlayerID;

// Monte Carlo trials per progress-bar step
const CHUNK: u64 = 50_000;

/// Parse a card list like "AsAh" or "2s,7h,9d"; "?" or "" means no known cards.
pub fn parse_cards(s: &str) -> Result<CardMask, String> {
    if s == "?" {
        return Ok(CardMask::NONE);
    }
    CardMask::from_str(s).map_err(|err| format!("{err}: {s:?}"))
}

/// Arguments for the equity CLI, which describe one equity query.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Hole cards per contender, in table order, e.g. "AsAh,KdKc". Use "?"
    /// for a contender whose hand is unknown (fully random).
    #[arg(short = 'o', long, value_delimiter = ',', num_args = 1.., required = true)]
    pub holes: Vec<String>,

    /// Known community cards, e.g. "2s7h9d" (0, 3, 4, or 5 of them).
    #[arg(short, long, default_value = "")]
    pub board: String,

    /// Other exposed cards to exclude from the unknown pool, e.g. mucked cards.
    #[arg(short, long, default_value = "")]
    pub dead: String,

    /// Enumerate every completion of the unknown cards instead of sampling.
    #[arg(short, long)]
    pub exact: bool,

    /// Number of Monte Carlo trials to sample (ignored with --exact).
    #[arg(short, long, default_value_t = 500_000)]
    pub trials: u64,

    /// Randomness seed string for reproducible sampling.
    ///
    /// If not provided, a fresh seed is drawn and the run is not repeatable.
    #[arg(short, long)]
    pub seed: Option<String>,

    /// Give up and report Cancelled after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl Args {
    /// Run the equity CLI with parsed arguments, useful as an entrypoint for the program.
    pub fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let contenders: IndexMap<PlayerID, CardMask> = self
            .holes
            .iter()
            .enumerate()
            .map(|(i, s)| Ok((i as PlayerID, parse_cards(s)?)))
            .collect::<Result<_, String>>()?;
        let board = parse_cards(&self.board)?;
        let dead = parse_cards(&self.dead)?;
        let deadline = self
            .timeout_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        let results = if self.exact {
            let total = exact_trial_count(&contenders, board, dead)?;
            println!("enumerating {total} worlds exactly");
            compute_equity(&contenders, board, dead, Mode::Exact, deadline)?
        } else {
            if self.trials == 0 {
                return Err(EngineError::InvalidBudget.into());
            }
            let seed = self
                .seed
                .unwrap_or_else(|| format!("{:016x}", rand::rng().random::<u64>()));

            // run in chunks so the bar moves and a timeout lands promptly
            let mut pb = tqdm!(total = self.trials as usize);
            let mut merged: Option<Vec<EquityResult>> = None;
            let mut remaining = self.trials;
            let mut chunk = 0u64;
            while remaining > 0 {
                let trials = remaining.min(CHUNK);
                let mode = Mode::Approximate { trials, seed: Some(format!("{seed}/{chunk}")) };
                let batch = compute_equity(&contenders, board, dead, mode, deadline)?;
                match merged.as_mut() {
                    Some(acc) => {
                        for (a, b) in acc.iter_mut().zip(&batch) {
                            a.merge(b);
                        }
                    }
                    None => merged = Some(batch),
                }
                pb.update(trials as usize)?;
                remaining -= trials;
                chunk += 1;
            }
            eprintln!();
            merged.ok_or(EngineError::InvalidBudget)?
        };

        println!("{} trials evaluated", results.first().map(|r| r.trials).unwrap_or(0));
        for (result, (_, hole)) in results.iter().zip(&contenders) {
            let hole = if hole.empty() { "??".to_string() } else { hole.to_string() };
            println!(
                "player {}: [{}]  win {:.4}  tie {:.4}  lose {:.4}  equity {:.4}",
                result.id,
                hole,
                result.win_probability(),
                result.tie_probability(),
                result.lose_probability(),
                result.equity(),
            );
        }
        Ok(())
    }
}
