//! This module defines the shared vocabulary of the simulator: the reserved tape symbols,
//! machine kinds, head directions, execution modes, run outcomes and the error type used
//! throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::Rule;

/// The symbol read from a tape cell that holds no content.
pub const BLANK: &str = "_";
/// Matches any state or symbol on the input side of a rule, and keeps the current
/// state or symbol on the output side.
pub const WILDCARD: &str = "*";
/// Move token for a head step to the left.
pub const LEFT: &str = "L";
/// Move token for a head step to the right.
pub const RIGHT: &str = "R";

/// The kind of automaton a machine simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    /// Deterministic finite automaton. Consumes one input symbol per step.
    #[serde(rename = "dfa")]
    Dfa,
    /// Turing machine whose tape is bounded on the left.
    #[serde(rename = "one-way-tm")]
    OneWayTm,
    /// Turing machine whose tape is conceptually unbounded in both directions.
    #[serde(rename = "two-way-tm")]
    TwoWayTm,
}

impl MachineKind {
    /// Returns the name used for this kind in machine definitions.
    pub fn name(&self) -> &'static str {
        match self {
            MachineKind::Dfa => "dfa",
            MachineKind::OneWayTm => "one-way-tm",
            MachineKind::TwoWayTm => "two-way-tm",
        }
    }

    /// Checks if this kind reads and writes a tape.
    pub fn is_tape(&self) -> bool {
        !matches!(self, MachineKind::Dfa)
    }

    /// Number of entries in a rule tuple for this kind.
    pub fn rule_arity(&self) -> usize {
        if self.is_tape() {
            5
        } else {
            3
        }
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MachineKind {
    type Err = MachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dfa" => Ok(MachineKind::Dfa),
            "one-way-tm" => Ok(MachineKind::OneWayTm),
            "two-way-tm" | "tm" => Ok(MachineKind::TwoWayTm),
            other => Err(MachineError::ValidationError(format!(
                "{other} is not a valid machine type"
            ))),
        }
    }
}

/// Represents the directions a Turing machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
}

impl FromStr for Direction {
    type Err = MachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            LEFT => Ok(Direction::Left),
            RIGHT => Ok(Direction::Right),
            other => Err(MachineError::IllegalMove(other.to_string())),
        }
    }
}

/// How a tape machine treats a blank written over the first cell.
///
/// - `Normal` (default): the first cell is dropped and the step ends without moving the head.
/// - `Strict`: the first cell is dropped and the requested move is applied afterwards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Skip the move after dropping the first cell.
    #[default]
    Normal,
    /// Apply the move after dropping the first cell.
    Strict,
}

/// How a single simulation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The machine halted in an accepting configuration.
    Accepted,
    /// The machine halted in a rejecting configuration.
    Rejected,
    /// The machine got stuck; the last recorded configuration could not be advanced.
    Errored(MachineError),
    /// The step cap was reached before the machine halted.
    StepLimit(usize),
}

impl Outcome {
    /// Checks if the run ended in an accept or reject configuration.
    pub fn is_halted(&self) -> bool {
        matches!(self, Outcome::Accepted | Outcome::Rejected)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Accepted => write!(f, "accepted"),
            Outcome::Rejected => write!(f, "rejected"),
            Outcome::Errored(e) => write!(f, "error: {e}"),
            Outcome::StepLimit(n) => write!(f, "no halt after {n} steps"),
        }
    }
}

/// Represents the errors that can occur while building or running a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// The accept and reject states of a Turing machine are the same state.
    #[error("{0} cannot be both the accept state and the reject state")]
    SameHaltingStates(String),
    /// A rule tuple has the wrong number of entries for the machine kind.
    #[error("Rule {index} has {found} entries, expected {expected}")]
    MalformedRule {
        index: usize,
        expected: usize,
        found: usize,
    },
    /// The halting states given do not fit the machine kind.
    #[error("{0} machines need {1}")]
    HaltingMismatch(MachineKind, &'static str),
    /// No rule matches the current state and symbol.
    #[error("No transition found for state: \"{state}\" and symbol: \"{symbol}\"")]
    NoTransition { state: String, symbol: String },
    /// A rule asked the head to move in a direction other than left or right.
    #[error("{0:?} is not a legal move, use R or L")]
    IllegalMove(String),
    /// A configuration of one machine kind was handed to a machine of another.
    #[error("Configuration does not belong to a {0} machine")]
    VariantMismatch(MachineKind),
    /// A tape head lies beyond the first unwritten cell.
    #[error("Head position {head} is outside a tape of length {len}")]
    InvalidHead { head: usize, len: usize },
    /// Syntax error in a text machine definition.
    #[error("Definition parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// A YAML machine definition could not be read.
    #[error("Definition error: {0}")]
    DefinitionError(String),
    /// A machine definition is well-formed but inconsistent.
    #[error("Definition validation error: {0}")]
    ValidationError(String),
    /// File system failure while reading definitions or inputs.
    #[error("File error: {0}")]
    FileError(String),
}
