//! Dice expressions and die sources.
//!
//! Expressions follow the tabletop notation `NdM+K` (`1d6`, `2d4+2`,
//! `1d4-1`), a bare integer for a fixed value, or the words `none` /
//! `special`, which always evaluate to zero.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sides on the die used for every opposed attribute check.
pub const CHECK_DIE_SIDES: u32 = 10;

/// Errors produced while parsing a dice expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    /// The text is not `NdM[+-K]`, an integer, `none` or `special`.
    #[error("malformed dice expression: {0:?}")]
    Malformed(String),
    /// A die must have at least one side.
    #[error("dice expression {0:?} has a zero-sided die")]
    ZeroSides(String),
}

/// A parsed dice expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DiceExpr {
    /// `count` dice of `sides` sides plus `modifier`.
    Roll { count: u32, sides: u32, modifier: i64 },
    /// A literal value that never varies.
    Fixed(i64),
    /// `none` or `special`: contributes nothing.
    Zero,
}

impl DiceExpr {
    /// Shorthand for an `NdM+K` expression.
    pub const fn dice(count: u32, sides: u32, modifier: i64) -> Self {
        DiceExpr::Roll {
            count,
            sides,
            modifier,
        }
    }

    /// True for the `none`/`special` sentinel.
    pub fn is_zero(&self) -> bool {
        matches!(self, DiceExpr::Zero)
    }

    /// Sum `count` draws over `[1, sides]` plus the modifier.
    pub fn roll<D: DieRoller + ?Sized>(&self, dice: &mut D) -> i64 {
        match *self {
            DiceExpr::Roll {
                count,
                sides,
                modifier,
            } => {
                let mut total = modifier;
                for _ in 0..count {
                    total += i64::from(dice.roll_die(sides));
                }
                total
            }
            DiceExpr::Fixed(v) => v,
            DiceExpr::Zero => 0,
        }
    }

    /// Mean of the expression: `count * (sides + 1) / 2 + modifier`.
    pub fn expected_value(&self) -> f64 {
        match *self {
            DiceExpr::Roll {
                count,
                sides,
                modifier,
            } => f64::from(count) * (f64::from(sides) + 1.0) / 2.0 + modifier as f64,
            DiceExpr::Fixed(v) => v as f64,
            DiceExpr::Zero => 0.0,
        }
    }

    /// Smallest value [`DiceExpr::roll`] can return.
    pub fn min_value(&self) -> i64 {
        match *self {
            DiceExpr::Roll {
                count, modifier, ..
            } => i64::from(count) + modifier,
            DiceExpr::Fixed(v) => v,
            DiceExpr::Zero => 0,
        }
    }

    /// Largest value [`DiceExpr::roll`] can return.
    pub fn max_value(&self) -> i64 {
        match *self {
            DiceExpr::Roll {
                count,
                sides,
                modifier,
            } => i64::from(count) * i64::from(sides) + modifier,
            DiceExpr::Fixed(v) => v,
            DiceExpr::Zero => 0,
        }
    }
}

/// Parse an expression; see the module docs for accepted forms.
pub fn parse(expr: &str) -> Result<DiceExpr, DiceError> {
    expr.parse()
}

impl FromStr for DiceExpr {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        if text == "none" || text == "special" {
            return Ok(DiceExpr::Zero);
        }
        if let Ok(v) = text.parse::<i64>() {
            return Ok(DiceExpr::Fixed(v));
        }
        let malformed = || DiceError::Malformed(s.to_string());
        let (count_s, rest) = text.split_once('d').ok_or_else(malformed)?;
        let count = if count_s.is_empty() {
            1
        } else {
            count_s.parse::<u32>().map_err(|_| malformed())?
        };
        let (sides_s, modifier) = match rest.find(['+', '-']) {
            Some(idx) => {
                let (sides_s, mod_s) = rest.split_at(idx);
                let digits = &mod_s[1..];
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                let m = digits.parse::<i64>().map_err(|_| malformed())?;
                (sides_s, if mod_s.starts_with('-') { -m } else { m })
            }
            None => (rest, 0),
        };
        if sides_s.is_empty() || !sides_s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let sides = sides_s.parse::<u32>().map_err(|_| malformed())?;
        if sides == 0 {
            return Err(DiceError::ZeroSides(s.to_string()));
        }
        Ok(DiceExpr::Roll {
            count,
            sides,
            modifier,
        })
    }
}

impl TryFrom<String> for DiceExpr {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceExpr> for String {
    fn from(value: DiceExpr) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DiceExpr::Roll {
                count,
                sides,
                modifier,
            } => {
                write!(f, "{count}d{sides}")?;
                if modifier > 0 {
                    write!(f, "+{modifier}")
                } else if modifier < 0 {
                    write!(f, "{modifier}")
                } else {
                    Ok(())
                }
            }
            DiceExpr::Fixed(v) => write!(f, "{v}"),
            DiceExpr::Zero => f.write_str("none"),
        }
    }
}

/// Source of single die results.
pub trait DieRoller {
    /// A uniform draw over `[1, sides]`.
    fn roll_die(&mut self, sides: u32) -> u32;
}

/// Reproducible dice backed by a seeded ChaCha stream.
#[derive(Clone, Debug)]
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl DieRoller for SeededDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }
}

/// Dice that replay a fixed script of results, for reproducing exact rolls.
///
/// Each scripted value is clamped into `[1, sides]` of the die asked for.
/// Once the script runs out every further die shows 1.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    queue: VecDeque<u32>,
    consumed: usize,
}

impl ScriptedDice {
    pub fn new<I: IntoIterator<Item = u32>>(rolls: I) -> Self {
        Self {
            queue: rolls.into_iter().collect(),
            consumed: 0,
        }
    }

    /// Number of dice drawn so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Dice left in the script.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl DieRoller for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.consumed += 1;
        self.queue.pop_front().unwrap_or(1).clamp(1, sides.max(1))
    }
}
