//! This module defines transition rules and the ordered `TransitionTable` that matches them.
//!
//! Rules are evaluated in declaration order and the first matching rule wins, so authors
//! express priority by placing specific rules before catch-all wildcard rules.

use crate::types::{MachineError, MachineKind, WILDCARD};
use serde::{Deserialize, Serialize};

/// A single transition rule.
///
/// DFA rules carry no `write` or `direction`; tape rules carry both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// State the rule applies to, or `WILDCARD`.
    pub state: String,
    /// Symbol the rule applies to, or `WILDCARD`.
    pub symbol: String,
    /// State entered after the step, or `WILDCARD` to stay.
    pub next_state: String,
    /// Symbol written under the head, or `WILDCARD` to keep the symbol read.
    pub write: Option<String>,
    /// Move token, `L` or `R`. Validated when the move is applied.
    pub direction: Option<String>,
}

impl Transition {
    /// Creates a DFA rule `(state, symbol) -> next_state`.
    pub fn finite(
        state: impl Into<String>,
        symbol: impl Into<String>,
        next_state: impl Into<String>,
    ) -> Self {
        Self {
            state: state.into(),
            symbol: symbol.into(),
            next_state: next_state.into(),
            write: None,
            direction: None,
        }
    }

    /// Creates a tape rule `(state, symbol) -> (next_state, write, direction)`.
    pub fn tape(
        state: impl Into<String>,
        symbol: impl Into<String>,
        next_state: impl Into<String>,
        write: impl Into<String>,
        direction: impl Into<String>,
    ) -> Self {
        Self {
            state: state.into(),
            symbol: symbol.into(),
            next_state: next_state.into(),
            write: Some(write.into()),
            direction: Some(direction.into()),
        }
    }

    /// Builds a rule from a tuple as supplied by a machine definition.
    ///
    /// `index` is only used for error reporting.
    pub fn from_tuple<S: AsRef<str>>(
        kind: MachineKind,
        index: usize,
        tuple: &[S],
    ) -> Result<Self, MachineError> {
        let expected = kind.rule_arity();
        if tuple.len() != expected {
            return Err(MachineError::MalformedRule {
                index,
                expected,
                found: tuple.len(),
            });
        }

        let field = |i: usize| tuple[i].as_ref().to_string();
        Ok(if kind.is_tape() {
            Self::tape(field(0), field(1), field(2), field(3), field(4))
        } else {
            Self::finite(field(0), field(1), field(2))
        })
    }

    /// Checks if this rule applies to the given state and symbol.
    pub fn matches(&self, state: &str, symbol: &str) -> bool {
        (self.state == state || self.state == WILDCARD)
            && (self.symbol == symbol || self.symbol == WILDCARD)
    }

    /// Checks if the rule has the shape expected by `kind`.
    fn fits(&self, kind: MachineKind) -> bool {
        if kind.is_tape() {
            self.write.is_some() && self.direction.is_some()
        } else {
            self.write.is_none() && self.direction.is_none()
        }
    }
}

/// The resolved outputs of the rule that matched a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The state to enter. Already resolved when the rule used `WILDCARD`.
    pub state: String,
    /// The symbol to write. Equal to the symbol read for DFA rules and wildcard writes.
    pub symbol: String,
    /// The raw move token, if the rule has one.
    pub direction: Option<String>,
}

/// An ordered collection of transition rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTable {
    rules: Vec<Transition>,
}

impl TransitionTable {
    /// Creates a table from rules in priority order.
    pub fn new(rules: Vec<Transition>) -> Self {
        Self { rules }
    }

    /// Builds a table from definition tuples, rejecting any tuple whose arity does not fit `kind`.
    pub fn from_tuples<T, S>(kind: MachineKind, tuples: &[T]) -> Result<Self, MachineError>
    where
        T: AsRef<[S]>,
        S: AsRef<str>,
    {
        tuples
            .iter()
            .enumerate()
            .map(|(i, tuple)| Transition::from_tuple(kind, i, tuple.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Returns the rules in priority order.
    pub fn rules(&self) -> &[Transition] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Finds the first rule matching `state` and `symbol` and resolves its outputs.
    ///
    /// A wildcard `next_state` resolves to `state`; a wildcard `write` resolves to `symbol`,
    /// the symbol actually read rather than the rule's input pattern.
    pub fn find(&self, state: &str, symbol: &str) -> Option<Action> {
        let rule = self.rules.iter().find(|rule| rule.matches(state, symbol))?;

        let next_state = if rule.next_state == WILDCARD {
            state
        } else {
            rule.next_state.as_str()
        };
        let write = match rule.write.as_deref() {
            Some(write) if write != WILDCARD => write,
            _ => symbol,
        };

        Some(Action {
            state: next_state.to_string(),
            symbol: write.to_string(),
            direction: rule.direction.clone(),
        })
    }

    /// Returns the index of the first rule whose shape does not fit `kind`.
    pub(crate) fn first_misfit(&self, kind: MachineKind) -> Option<(usize, &Transition)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| !rule.fits(kind))
    }
}
