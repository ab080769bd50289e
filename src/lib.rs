//! This crate provides the core logic for simulating deterministic finite automata and
//! one-way and two-way Turing machines. It includes modules for describing machines,
//! loading them from YAML or text definitions, stepping them one configuration at a time,
//! and running batches of inputs on a worker pool.

pub mod configuration;
pub mod definition;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod transition;
pub mod types;
pub mod worker;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the configuration types from the configuration module.
pub use configuration::{Configuration, FiniteConfig, TapeConfig};
/// Re-exports the `MachineDefinition` struct from the definition module.
pub use definition::MachineDefinition;
/// Re-exports the `DefinitionLoader` struct and `Format` enum from the loader module.
pub use loader::{DefinitionLoader, Format};
/// Re-exports the machine engine from the machine module.
pub use machine::{build_machine, Halting, Machine, Run};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `Catalog`, `Sample`, and `SAMPLES` from the programs module.
pub use programs::{Catalog, Sample, SAMPLES};
/// Re-exports the transition table types from the transition module.
pub use transition::{Action, Transition, TransitionTable};
/// Re-exports the shared vocabulary from the types module.
pub use types::{Direction, MachineError, MachineKind, Mode, Outcome, BLANK, WILDCARD};
/// Re-exports the simulation harness from the worker module.
pub use worker::{run_all, Harness, HarnessConfig, Report, SimulationResult, Summary};
