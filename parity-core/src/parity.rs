//! Parities, recorded choices and the winner rule

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest value the referee may draw
pub const DICE_MIN: u32 = 1;
/// Largest value the referee may draw
pub const DICE_MAX: u32 = 100;

/// Even/odd classification of an integer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    /// Classify a number
    pub fn of(value: u32) -> Self {
        if value % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    /// The other parity
    pub fn flip(self) -> Self {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Parity::Even => "even",
            Parity::Odd => "odd",
        }
    }

    /// Parse a wire value; only the exact strings "even" and "odd" qualify
    pub fn from_wire(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "even" => Ok(Parity::Even),
            "odd" => Ok(Parity::Odd),
            other => Err(format!("'{}' is not a parity", other)),
        }
    }
}

/// A parity as recorded in a game result, including the sentinels
///
/// `None` marks a choice (or outcome) that could not be obtained; `Error`
/// marks a match whose remote referee call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Even,
    Odd,
    None,
    Error,
}

impl Choice {
    /// The underlying parity, if this is a real choice
    pub fn parity(&self) -> Option<Parity> {
        match self {
            Choice::Even => Some(Parity::Even),
            Choice::Odd => Some(Parity::Odd),
            Choice::None | Choice::Error => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::Even => "even",
            Choice::Odd => "odd",
            Choice::None => "none",
            Choice::Error => "error",
        }
    }
}

impl From<Parity> for Choice {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::Even => Choice::Even,
            Parity::Odd => Choice::Odd,
        }
    }
}

impl From<Option<Parity>> for Choice {
    fn from(parity: Option<Parity>) -> Self {
        parity.map(Choice::from).unwrap_or(Choice::None)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing two guesses against the drawn parity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    FirstWins,
    SecondWins,
    /// Both guessed right, or both guessed wrong
    Draw,
}

/// Apply the winner rule
///
/// A correct guess beats an incorrect one; two correct or two incorrect
/// guesses are a draw.
pub fn decide(first: Parity, second: Parity, drawn: Parity) -> Verdict {
    match (first == drawn, second == drawn) {
        (true, false) => Verdict::FirstWins,
        (false, true) => Verdict::SecondWins,
        _ => Verdict::Draw,
    }
}

/// Draw a value uniformly from `DICE_MIN..=DICE_MAX`
pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(DICE_MIN..=DICE_MAX)
}
