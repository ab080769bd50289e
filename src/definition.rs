//! This module provides `MachineDefinition`, the declarative form of a machine as read from a
//! YAML or `.tm` file, and the validation that turns it into a runnable `Machine`.

use crate::machine::{Halting, Machine};
use crate::transition::TransitionTable;
use crate::types::{MachineError, MachineKind};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// A machine as written by a user, before validation.
///
/// ```yaml
/// type: two-way-tm
/// start: q0
/// accept: done
/// reject: fail
/// transitions:
///   - [q0, a, q0, a, R]
///   - [q0, _, done, $, R]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineDefinition {
    /// Declared kind. Inferred from the halting states when absent.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MachineKind>,
    #[serde(deserialize_with = "scalar")]
    pub start: String,
    #[serde(default, deserialize_with = "optional_scalar", skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar", skip_serializing_if = "Option::is_none")]
    pub reject: Option<String>,
    #[serde(
        rename = "accept-states",
        default,
        deserialize_with = "scalar_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub accept_states: Vec<String>,
    #[serde(default, deserialize_with = "tuples")]
    pub transitions: Vec<Vec<String>>,
}

impl MachineDefinition {
    /// Parses a YAML definition.
    pub fn from_yaml(content: &str) -> Result<Self, MachineError> {
        serde_yaml_ng::from_str(content).map_err(|e| MachineError::DefinitionError(e.to_string()))
    }

    /// Serializes the definition back to YAML.
    pub fn to_yaml(&self) -> Result<String, MachineError> {
        serde_yaml_ng::to_string(self).map_err(|e| MachineError::DefinitionError(e.to_string()))
    }

    /// The declared kind, or the inferred one.
    ///
    /// Accept states without a reject state describe a DFA; anything else is a two-way machine.
    pub fn kind(&self) -> MachineKind {
        match self.kind {
            Some(kind) => kind,
            None if !self.accept_states.is_empty() && self.reject.is_none() => MachineKind::Dfa,
            None => MachineKind::TwoWayTm,
        }
    }

    /// Validates the definition and builds the machine it describes.
    pub fn build(&self) -> Result<Machine, MachineError> {
        let kind = self.kind();
        let halting = self.halting(kind)?;
        let table = TransitionTable::from_tuples(kind, &self.transitions)?;

        debug!(kind = %kind, rules = table.len(), start = %self.start, "building machine");

        Machine::new(kind, table, self.start.as_str(), halting)
    }

    fn halting(&self, kind: MachineKind) -> Result<Halting, MachineError> {
        if self.start.is_empty() {
            return Err(MachineError::ValidationError(
                "Missing 'start' state".to_string(),
            ));
        }

        if !kind.is_tape() {
            if self.reject.is_some() {
                return Err(MachineError::ValidationError(
                    "'reject' is not allowed for dfa machines, list 'accept-states' instead"
                        .to_string(),
                ));
            }
            // A single `accept` is shorthand for a one-element accept set.
            let states = self.accept_states.iter().chain(self.accept.iter()).cloned();
            return Ok(Halting::accepting(states));
        }

        if !self.accept_states.is_empty() {
            return Err(MachineError::ValidationError(format!(
                "'accept-states' is not allowed for {kind} machines, use 'accept' and 'reject'"
            )));
        }
        match (&self.accept, &self.reject) {
            (Some(accept), Some(reject)) => Ok(Halting::decider(accept, reject)),
            (None, _) => Err(MachineError::ValidationError(
                "Missing 'accept' state".to_string(),
            )),
            (_, None) => Err(MachineError::ValidationError(
                "Missing 'reject' state".to_string(),
            )),
        }
    }
}

/// A YAML scalar read as text, so `[q0, 1, q1, 0, R]` needs no quoting.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(s) => s,
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Boolean(b) => b.to_string(),
        }
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(String::from)
}

fn optional_scalar<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

fn scalar_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Vec::<Scalar>::deserialize(deserializer)?
        .into_iter()
        .map(String::from)
        .collect())
}

fn tuples<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error> {
    Ok(Vec::<Vec<Scalar>>::deserialize(deserializer)?
        .into_iter()
        .map(|tuple| tuple.into_iter().map(String::from).collect())
        .collect())
}
