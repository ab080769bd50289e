//! This module defines `Configuration`, a snapshot of a running machine, together with the
//! rules for producing the next snapshot from a resolved transition.
//!
//! Configurations are values. Computing the next configuration never touches the current one,
//! which keeps recorded traces valid as historical snapshots.

use crate::transition::Action;
use crate::types::{Direction, MachineError, MachineKind, Mode, BLANK};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A snapshot of a DFA: the current state and the input not yet consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiniteConfig {
    state: String,
    input: Vec<String>,
}

impl FiniteConfig {
    pub fn new(state: impl Into<String>, input: Vec<String>) -> Self {
        Self {
            state: state.into(),
            input,
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// The symbols left to consume, front first.
    pub fn input(&self) -> &[String] {
        &self.input
    }

    /// Consumes the front symbol and enters `state`. An exhausted input yields an unchanged copy.
    fn next(&self, state: &str) -> Self {
        match self.input.split_first() {
            Some((_, rest)) => Self::new(state, rest.to_vec()),
            None => self.clone(),
        }
    }
}

/// A snapshot of a Turing machine: state, tape contents and head position.
///
/// The head ranges over `0..=tape.len()`. Sitting at `tape.len()` means the head reads a
/// blank cell that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTapeConfig")]
pub struct TapeConfig {
    kind: MachineKind,
    state: String,
    tape: Vec<String>,
    head: usize,
}

/// Unchecked wire form of `TapeConfig`.
#[derive(Deserialize)]
struct RawTapeConfig {
    kind: MachineKind,
    state: String,
    tape: Vec<String>,
    head: usize,
}

impl TryFrom<RawTapeConfig> for TapeConfig {
    type Error = MachineError;

    fn try_from(raw: RawTapeConfig) -> Result<Self, Self::Error> {
        TapeConfig::new(raw.kind, raw.state, raw.tape, raw.head)
    }
}

impl TapeConfig {
    /// Creates a tape configuration, rejecting heads beyond the first unwritten cell.
    pub fn new(
        kind: MachineKind,
        state: impl Into<String>,
        tape: Vec<String>,
        head: usize,
    ) -> Result<Self, MachineError> {
        if !kind.is_tape() {
            return Err(MachineError::VariantMismatch(kind));
        }
        if head > tape.len() {
            return Err(MachineError::InvalidHead {
                head,
                len: tape.len(),
            });
        }

        Ok(Self {
            kind,
            state: state.into(),
            tape,
            head,
        })
    }

    pub fn kind(&self) -> MachineKind {
        self.kind
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn tape(&self) -> &[String] {
        &self.tape
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// The symbol under the head; `BLANK` past the written tape.
    pub fn symbol(&self) -> &str {
        self.tape.get(self.head).map_or(BLANK, String::as_str)
    }

    /// Writes `action.symbol`, then moves the head, producing a new configuration.
    ///
    /// Writing a blank over the first cell drops that cell. In `Mode::Normal` the step ends
    /// there and the move is skipped; in `Mode::Strict` the move is applied as usual.
    fn next(&self, action: &Action, mode: Mode) -> Result<Self, MachineError> {
        let mut tape = self.tape.clone();
        let head = self.head;
        let written = action.symbol.as_str();

        // Write
        if head == tape.len() {
            if written != BLANK {
                tape.push(written.to_string());
            }
        } else if head == 0 && written == BLANK {
            tape.remove(0);
            if mode == Mode::Normal {
                return Ok(self.with(&action.state, tape, head));
            }
        } else {
            tape[head] = written.to_string();
        }

        // Move, measured against the tape after writing
        let direction = action.direction.as_deref().unwrap_or_default();
        let head = match direction.parse::<Direction>()? {
            Direction::Right if head == tape.len() => head,
            Direction::Left if head == 0 => head,
            Direction::Right => head + 1,
            Direction::Left => head - 1,
        };

        Ok(self.with(&action.state, tape, head))
    }

    fn with(&self, state: &str, tape: Vec<String>, head: usize) -> Self {
        Self {
            kind: self.kind,
            state: state.to_string(),
            tape,
            head,
        }
    }

    /// Cells shown when rendering. Two-way tapes show a blank on both ends,
    /// one-way tapes only on the right.
    fn cells(&self) -> (Vec<&str>, usize) {
        let mut cells = Vec::with_capacity(self.tape.len() + 2);
        let mut marker = self.head;

        if self.kind == MachineKind::TwoWayTm {
            cells.push(BLANK);
            marker += 1;
        }
        cells.extend(self.tape.iter().map(String::as_str));
        cells.push(BLANK);

        (cells, marker)
    }
}

/// An instantaneous snapshot of a running machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Configuration {
    /// A DFA snapshot.
    Finite(FiniteConfig),
    /// A one-way or two-way Turing machine snapshot.
    Tape(TapeConfig),
}

impl Configuration {
    /// Creates the initial configuration of a machine of `kind` for a whitespace-delimited input.
    pub fn initial(kind: MachineKind, state: &str, input: &str) -> Self {
        let symbols = input.split_whitespace().map(String::from).collect();
        match kind {
            MachineKind::Dfa => Configuration::Finite(FiniteConfig::new(state, symbols)),
            kind => Configuration::Tape(TapeConfig {
                kind,
                state: state.to_string(),
                tape: symbols,
                head: 0,
            }),
        }
    }

    /// The kind of machine this configuration belongs to.
    pub fn kind(&self) -> MachineKind {
        match self {
            Configuration::Finite(_) => MachineKind::Dfa,
            Configuration::Tape(conf) => conf.kind,
        }
    }

    /// Returns the current control state.
    pub fn state(&self) -> &str {
        match self {
            Configuration::Finite(conf) => &conf.state,
            Configuration::Tape(conf) => &conf.state,
        }
    }

    /// Checks if the configuration is in `state`.
    pub fn is_state(&self, state: &str) -> bool {
        self.state() == state
    }

    /// Determines if the configuration has anything left to read.
    ///
    /// DFAs stop once their input is exhausted. A tape can always be read.
    pub fn can_next(&self) -> bool {
        match self {
            Configuration::Finite(conf) => !conf.input.is_empty(),
            Configuration::Tape(_) => true,
        }
    }

    /// Returns the `(state, symbol)` pair used to look up the next transition.
    pub fn next_key(&self) -> Option<(&str, &str)> {
        match self {
            Configuration::Finite(conf) => conf
                .input
                .first()
                .map(|symbol| (conf.state.as_str(), symbol.as_str())),
            Configuration::Tape(conf) => Some((conf.state.as_str(), conf.symbol())),
        }
    }

    /// Produces the configuration that results from applying `action`.
    pub fn next(&self, action: &Action, mode: Mode) -> Result<Self, MachineError> {
        match self {
            Configuration::Finite(conf) => Ok(Configuration::Finite(conf.next(&action.state))),
            Configuration::Tape(conf) => conf.next(action, mode).map(Configuration::Tape),
        }
    }

    pub fn as_tape(&self) -> Option<&TapeConfig> {
        match self {
            Configuration::Tape(conf) => Some(conf),
            Configuration::Finite(_) => None,
        }
    }

    pub fn as_finite(&self) -> Option<&FiniteConfig> {
        match self {
            Configuration::Finite(conf) => Some(conf),
            Configuration::Tape(_) => None,
        }
    }
}

impl From<FiniteConfig> for Configuration {
    fn from(conf: FiniteConfig) -> Self {
        Configuration::Finite(conf)
    }
}

impl From<TapeConfig> for Configuration {
    fn from(conf: TapeConfig) -> Self {
        Configuration::Tape(conf)
    }
}

/// Renders the trace line.
///
/// ```text
/// q0: a b          (DFA, remaining input)
/// q0: _ a b _      (two-way tape)
///       ^
/// ```
impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.state())?;

        match self {
            Configuration::Finite(conf) => {
                for symbol in &conf.input {
                    write!(f, " {symbol}")?;
                }
                Ok(())
            }
            Configuration::Tape(conf) => {
                let (cells, marker) = conf.cells();
                for cell in &cells {
                    write!(f, " {cell}")?;
                }

                let offset = conf.state.chars().count()
                    + 1
                    + cells[..marker]
                        .iter()
                        .map(|cell| cell.chars().count() + 1)
                        .sum::<usize>();
                write!(f, "\n{:offset$} ^", "", offset = offset)
            }
        }
    }
}
