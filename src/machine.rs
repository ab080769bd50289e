//! This module defines the `Machine` struct, which combines a transition table with start and
//! halting states into a steppable computation. The same contract covers DFAs and both tape
//! variants; the variant only decides how configurations are built and advanced.

use crate::configuration::Configuration;
use crate::transition::TransitionTable;
use crate::types::{MachineError, MachineKind, Mode, Outcome};
use std::collections::BTreeSet;
use tracing::trace;

/// The states at which a machine stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halting {
    /// DFA halting: accept when the input is exhausted in one of these states, reject otherwise.
    AcceptStates(BTreeSet<String>),
    /// Turing machine halting: stop on entering either state.
    Decider { accept: String, reject: String },
}

impl Halting {
    /// Creates DFA halting states.
    pub fn accepting<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Halting::AcceptStates(states.into_iter().map(Into::into).collect())
    }

    /// Creates Turing machine halting states.
    pub fn decider(accept: impl Into<String>, reject: impl Into<String>) -> Self {
        Halting::Decider {
            accept: accept.into(),
            reject: reject.into(),
        }
    }
}

/// An immutable automaton ready to simulate inputs.
///
/// A `Machine` holds no per-run state, so one value can be shared by reference across any
/// number of concurrent simulations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    kind: MachineKind,
    table: TransitionTable,
    start: String,
    halting: Halting,
    mode: Mode,
}

/// The recorded result of simulating one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Every configuration visited, from the initial one to the last one reached.
    pub trace: Vec<Configuration>,
    pub outcome: Outcome,
}

impl Run {
    /// Number of transitions taken.
    pub fn steps(&self) -> usize {
        self.trace.len().saturating_sub(1)
    }

    /// The configuration the run ended in.
    pub fn last(&self) -> Option<&Configuration> {
        self.trace.last()
    }
}

impl Machine {
    /// Creates a new `Machine`.
    ///
    /// # Errors
    ///
    /// * `MachineError::HaltingMismatch` if `halting` does not fit `kind`.
    /// * `MachineError::SameHaltingStates` if a Turing machine's accept and reject states coincide.
    /// * `MachineError::MalformedRule` if a rule lacks (or carries) a write and move for `kind`.
    pub fn new(
        kind: MachineKind,
        table: TransitionTable,
        start: impl Into<String>,
        halting: Halting,
    ) -> Result<Self, MachineError> {
        match (&halting, kind.is_tape()) {
            (Halting::AcceptStates(_), true) => {
                return Err(MachineError::HaltingMismatch(
                    kind,
                    "an accept state and a reject state",
                ))
            }
            (Halting::Decider { .. }, false) => {
                return Err(MachineError::HaltingMismatch(kind, "a set of accept states"))
            }
            (Halting::Decider { accept, reject }, true) if accept == reject => {
                return Err(MachineError::SameHaltingStates(accept.clone()))
            }
            _ => {}
        }

        if let Some((index, rule)) = table.first_misfit(kind) {
            let found = 3 + usize::from(rule.write.is_some()) + usize::from(rule.direction.is_some());
            return Err(MachineError::MalformedRule {
                index,
                expected: kind.rule_arity(),
                found,
            });
        }

        Ok(Self {
            kind,
            table,
            start: start.into(),
            halting,
            mode: Mode::default(),
        })
    }

    /// Returns the machine with the given front-of-tape blank policy.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn kind(&self) -> MachineKind {
        self.kind
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn start_state(&self) -> &str {
        &self.start
    }

    pub fn halting(&self) -> &Halting {
        &self.halting
    }

    /// Builds the initial configuration for a whitespace-delimited input.
    pub fn start(&self, input: &str) -> Configuration {
        Configuration::initial(self.kind, &self.start, input)
    }

    /// Applies one transition to `conf`, returning the next configuration.
    ///
    /// A halted configuration is returned unchanged. `conf` itself is never modified.
    ///
    /// # Errors
    ///
    /// * `MachineError::NoTransition` if no rule matches the current state and symbol.
    /// * `MachineError::IllegalMove` if the matching rule has a move other than `L` or `R`.
    /// * `MachineError::VariantMismatch` if `conf` belongs to a different kind of machine.
    pub fn step(&self, conf: &Configuration) -> Result<Configuration, MachineError> {
        if conf.kind() != self.kind {
            return Err(MachineError::VariantMismatch(self.kind));
        }

        if self.is_halted(conf) {
            return Ok(conf.clone());
        }

        let Some((state, symbol)) = conf.next_key() else {
            return Ok(conf.clone());
        };

        let action = self
            .table
            .find(state, symbol)
            .ok_or_else(|| MachineError::NoTransition {
                state: state.to_string(),
                symbol: symbol.to_string(),
            })?;

        trace!(state, symbol, next = %action.state, "step");

        conf.next(&action, self.mode)
    }

    /// Checks if `conf` is an accepting configuration.
    ///
    /// DFAs accept only once their input is exhausted.
    pub fn is_accept(&self, conf: &Configuration) -> bool {
        match &self.halting {
            Halting::AcceptStates(accepts) => !conf.can_next() && accepts.contains(conf.state()),
            Halting::Decider { accept, .. } => conf.is_state(accept),
        }
    }

    /// Checks if `conf` is a rejecting configuration.
    ///
    /// DFAs reject only once their input is exhausted.
    pub fn is_reject(&self, conf: &Configuration) -> bool {
        match &self.halting {
            Halting::AcceptStates(accepts) => !conf.can_next() && !accepts.contains(conf.state()),
            Halting::Decider { reject, .. } => conf.is_state(reject),
        }
    }

    /// Checks if `conf` is an accepting or rejecting configuration.
    pub fn is_halted(&self, conf: &Configuration) -> bool {
        self.is_accept(conf) || self.is_reject(conf)
    }

    /// Simulates `input` until the machine halts, gets stuck, or takes `max_steps` transitions.
    ///
    /// With `max_steps` set to `None` a machine that never halts runs forever.
    pub fn run(&self, input: &str, max_steps: Option<usize>) -> Run {
        let mut conf = self.start(input);
        let mut trace = Vec::new();

        let outcome = loop {
            if self.is_accept(&conf) {
                break Outcome::Accepted;
            }
            if self.is_reject(&conf) {
                break Outcome::Rejected;
            }
            if max_steps.is_some_and(|limit| trace.len() >= limit) {
                break Outcome::StepLimit(trace.len());
            }

            match self.step(&conf) {
                Ok(next) => trace.push(std::mem::replace(&mut conf, next)),
                Err(e) => break Outcome::Errored(e),
            }
        };

        trace.push(conf);
        Run { trace, outcome }
    }
}

/// Builds a machine from definition tuples.
///
/// Rules are 3-tuples `(state, symbol, next)` for DFAs and 5-tuples
/// `(state, symbol, next, write, move)` for Turing machines.
pub fn build_machine<T, S>(
    kind: MachineKind,
    rules: &[T],
    start: &str,
    halting: Halting,
) -> Result<Machine, MachineError>
where
    T: AsRef<[S]>,
    S: AsRef<str>,
{
    let table = TransitionTable::from_tuples(kind, rules)?;
    Machine::new(kind, table, start, halting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::TapeConfig;
    use crate::transition::Transition;
    use crate::types::BLANK;

    fn tm(rules: &[[&str; 5]], start: &str, accept: &str, reject: &str) -> Machine {
        build_machine(
            MachineKind::TwoWayTm,
            rules,
            start,
            Halting::decider(accept, reject),
        )
        .unwrap()
    }

    fn dfa(rules: &[[&str; 3]], start: &str, accepts: &[&str]) -> Machine {
        build_machine(
            MachineKind::Dfa,
            rules,
            start,
            Halting::accepting(accepts.iter().copied()),
        )
        .unwrap()
    }

    fn conf(state: &str, cells: &[&str], head: usize) -> Configuration {
        let cells = cells.iter().map(|s| s.to_string()).collect();
        TapeConfig::new(MachineKind::TwoWayTm, state, cells, head)
            .unwrap()
            .into()
    }

    fn add_markers() -> Machine {
        let mut rules = Vec::new();
        for (from, write) in [
            ("place$", "$"),
            ("placeA", "a"),
            ("placeB", "b"),
            ("placeC", "c"),
        ] {
            rules.push([from, "a", "placeA", write, "R"]);
            rules.push([from, "b", "placeB", write, "R"]);
            rules.push([from, "c", "placeC", write, "R"]);
            rules.push([from, BLANK, "placeLast$", write, "R"]);
            rules.push([from, "$", "doh", "$", "R"]);
        }
        rules.extend([
            ["placeLast$", "a", "doh", "a", "R"],
            ["placeLast$", "b", "doh", "b", "R"],
            ["placeLast$", "c", "doh", "c", "R"],
            ["placeLast$", BLANK, "returnToStart", "$", "L"],
            ["placeLast$", "$", "doh", "$", "R"],
            ["returnToStart", "a", "returnToStart", "a", "L"],
            ["returnToStart", "b", "returnToStart", "b", "L"],
            ["returnToStart", "c", "returnToStart", "c", "L"],
            ["returnToStart", BLANK, "doh", BLANK, "L"],
            ["returnToStart", "$", "all done", "$", "L"],
        ]);
        tm(&rules, "place$", "all done", "doh")
    }

    fn red_light() -> Machine {
        dfa(
            &[
                ["start", "r", "red"],
                ["start", "y", "yellow"],
                ["start", "g", "green"],
                ["red", "r", "error"],
                ["red", "y", "error"],
                ["red", "g", "green"],
                ["yellow", "r", "red"],
                ["yellow", "y", "error"],
                ["yellow", "g", "error"],
                ["green", "r", "error"],
                ["green", "y", "yellow"],
                ["green", "g", "error"],
                ["error", "r", "error"],
                ["error", "y", "error"],
                ["error", "g", "error"],
            ],
            "start",
            &["red", "yellow", "green"],
        )
    }

    #[test]
    fn test_same_accept_and_reject_fails() {
        let err = build_machine::<[&str; 5], &str>(
            MachineKind::TwoWayTm,
            &[],
            "start",
            Halting::decider("same", "same"),
        )
        .unwrap_err();
        assert_eq!(err, MachineError::SameHaltingStates("same".to_string()));

        assert!(build_machine::<[&str; 5], &str>(
            MachineKind::OneWayTm,
            &[],
            "same",
            Halting::decider("same", "reject"),
        )
        .is_ok());
    }

    #[test]
    fn test_halting_must_fit_kind() {
        let err = Machine::new(
            MachineKind::Dfa,
            TransitionTable::default(),
            "q0",
            Halting::decider("a", "r"),
        )
        .unwrap_err();
        assert!(matches!(err, MachineError::HaltingMismatch(MachineKind::Dfa, _)));

        let err = Machine::new(
            MachineKind::TwoWayTm,
            TransitionTable::default(),
            "q0",
            Halting::accepting(["a"]),
        )
        .unwrap_err();
        assert!(matches!(err, MachineError::HaltingMismatch(MachineKind::TwoWayTm, _)));
    }

    #[test]
    fn test_rule_shape_must_fit_kind() {
        let table = TransitionTable::new(vec![Transition::finite("q0", "a", "q1")]);
        let err = Machine::new(MachineKind::TwoWayTm, table, "q0", Halting::decider("a", "r"))
            .unwrap_err();

        assert_eq!(
            err,
            MachineError::MalformedRule {
                index: 0,
                expected: 5,
                found: 3
            }
        );
    }

    #[test]
    fn test_tm_start() {
        let machine = add_markers();
        assert_eq!(machine.start(""), conf("place$", &[], 0));
        assert_eq!(machine.start("c b a"), conf("place$", &["c", "b", "a"], 0));
    }

    #[test]
    fn test_add_markers_steps() {
        let machine = add_markers();
        let cases = [
            (conf("place$", &[], 0), conf("placeLast$", &["$"], 1)),
            (conf("placeLast$", &["$"], 1), conf("returnToStart", &["$", "$"], 0)),
            (conf("returnToStart", &["$", "$"], 0), conf("all done", &["$", "$"], 0)),
            (conf("place$", &["c", "b", "a"], 0), conf("placeC", &["$", "b", "a"], 1)),
            (conf("placeC", &["$", "b", "a"], 1), conf("placeB", &["$", "c", "a"], 2)),
            (conf("placeB", &["$", "c", "a"], 2), conf("placeA", &["$", "c", "b"], 3)),
            (
                conf("placeA", &["$", "c", "b"], 3),
                conf("placeLast$", &["$", "c", "b", "a"], 4),
            ),
            (
                conf("placeLast$", &["$", "c", "b", "a"], 4),
                conf("returnToStart", &["$", "c", "b", "a", "$"], 3),
            ),
            (
                conf("returnToStart", &["$", "c", "b", "a", "$"], 0),
                conf("all done", &["$", "c", "b", "a", "$"], 0),
            ),
        ];

        for (from, expected) in cases {
            assert_eq!(machine.step(&from).unwrap(), expected, "stepping {from}");
        }
    }

    #[test]
    fn test_halted_step_is_noop() {
        let machine = add_markers();
        for halted in [
            conf("all done", &["$", "a"], 1),
            conf("doh", &[], 0),
            conf("doh", &["x"], 1),
        ] {
            assert_eq!(machine.step(&halted).unwrap(), halted);
        }
    }

    #[test]
    fn test_accept_and_reject_are_exact() {
        let machine = add_markers();

        assert!(machine.is_accept(&conf("all done", &[], 0)));
        assert!(!machine.is_accept(&conf("accept", &[], 0)));
        assert!(!machine.is_accept(&conf("All done", &[], 0)));
        assert!(machine.is_reject(&conf("doh", &[], 0)));
        assert!(!machine.is_reject(&conf("all done", &[], 0)));
    }

    #[test]
    fn test_no_transition_does_not_advance() {
        let machine = tm(&[["q0", "a", "q0", "a", "R"]], "q0", "accept", "reject");
        let stuck = conf("q0", &["a", "b"], 1);

        let err = machine.step(&stuck).unwrap_err();
        assert_eq!(
            err,
            MachineError::NoTransition {
                state: "q0".to_string(),
                symbol: "b".to_string()
            }
        );
    }

    #[test]
    fn test_step_never_sees_head_past_frontier() {
        let machine = tm(&[["*", "*", "*", "a", "R"]], "q0", "accept", "reject");
        let json = r#"{"Tape":{"kind":"two-way-tm","state":"q0","tape":["a"],"head":5}}"#;
        assert!(serde_json::from_str::<Configuration>(json).is_err());

        let json = r#"{"Tape":{"kind":"two-way-tm","state":"q0","tape":["a"],"head":1}}"#;
        let loaded: Configuration = serde_json::from_str(json).unwrap();
        assert_eq!(machine.step(&loaded).unwrap(), conf("q0", &["a", "a"], 2));
    }

    #[test]
    fn test_illegal_move_is_an_error() {
        let machine = tm(&[["q0", "a", "q0", "a", "S"]], "q0", "accept", "reject");
        let err = machine.step(&machine.start("a")).unwrap_err();

        assert_eq!(err, MachineError::IllegalMove("S".to_string()));
    }

    #[test]
    fn test_variant_mismatch() {
        let machine = add_markers();
        let err = machine.step(&red_light().start("r")).unwrap_err();

        assert_eq!(err, MachineError::VariantMismatch(MachineKind::TwoWayTm));
    }

    #[test]
    fn test_wildcard_rules() {
        let wild = tm(
            &[
                ["start", "a", "q2", "x", "R"],
                ["start", "*", "reject", "x", "R"],
                ["*", "b", "accept", "x", "R"],
                ["*", "*", "reject", "x", "R"],
            ],
            "start",
            "accept",
            "reject",
        );

        assert_eq!(wild.step(&conf("start", &["a"], 0)).unwrap(), conf("q2", &["x"], 1));
        assert_eq!(
            wild.step(&conf("q2", &["x"], 1)).unwrap(),
            conf("reject", &["x", "x"], 2)
        );
        assert_eq!(
            wild.step(&conf("q2", &["x", "b"], 1)).unwrap(),
            conf("accept", &["x", "x"], 2)
        );
        assert_eq!(
            wild.step(&conf("start", &["b", "b"], 0)).unwrap(),
            conf("reject", &["x", "b"], 1)
        );
    }

    #[test]
    fn test_write_same() {
        let same = tm(
            &[["same", BLANK, "accept", BLANK, "R"], ["same", "*", "same", "*", "R"]],
            "same",
            "accept",
            "reject",
        );

        let run = same.run("a b c", None);
        assert_eq!(run.outcome, Outcome::Accepted);
        assert_eq!(run.steps(), 4);
        assert_eq!(run.last(), Some(&conf("accept", &["a", "b", "c"], 3)));
    }

    #[test]
    fn test_append_marker_run() {
        let machine = tm(
            &[
                ["q0", "a", "q0", "a", "R"],
                ["q0", "b", "q0", "b", "R"],
                ["q0", BLANK, "done", "$", "R"],
            ],
            "q0",
            "done",
            "cannot_reject",
        );

        let run = machine.run("a a", None);
        assert_eq!(run.outcome, Outcome::Accepted);
        assert_eq!(
            run.trace,
            vec![
                conf("q0", &["a", "a"], 0),
                conf("q0", &["a", "a"], 1),
                conf("q0", &["a", "a"], 2),
                conf("done", &["a", "a", "$"], 3),
            ]
        );
    }

    #[test]
    fn test_run_records_stuck_configuration() {
        let machine = tm(&[["q0", "a", "q0", "a", "R"]], "q0", "accept", "reject");
        let run = machine.run("a a b", None);

        assert_eq!(run.steps(), 2);
        assert_eq!(run.last(), Some(&conf("q0", &["a", "a", "b"], 2)));
        assert!(matches!(run.outcome, Outcome::Errored(MachineError::NoTransition { .. })));
    }

    #[test]
    fn test_run_step_limit() {
        let forever = tm(&[["any", "*", "*", "*", "R"]], "any", "accept", "reject");
        let run = forever.run("a", Some(10));

        assert_eq!(run.outcome, Outcome::StepLimit(10));
        assert_eq!(run.trace.len(), 11);
        assert_eq!(run.last(), Some(&conf("any", &["a"], 1)));
    }

    #[test]
    fn test_strict_mode_moves_after_collapse() {
        let rules = [["any", "a", "any", BLANK, "R"], ["any", BLANK, "accept", BLANK, "R"]];
        let normal = tm(&rules, "any", "accept", "reject");
        let strict = normal.clone().with_mode(Mode::Strict);

        let start = normal.start("a a");
        assert_eq!(normal.step(&start).unwrap(), conf("any", &["a"], 0));
        assert_eq!(strict.step(&start).unwrap(), conf("any", &["a"], 1));
    }

    #[test]
    fn test_dfa_steps() {
        let machine = red_light();
        let mut current = machine.start("r g y r g y");
        let states = ["red", "green", "yellow", "red", "green", "yellow"];

        for (i, state) in states.iter().enumerate() {
            current = machine.step(&current).unwrap();
            assert_eq!(current.state(), *state);
            assert_eq!(current.as_finite().unwrap().input().len(), 5 - i);
        }
        assert!(machine.is_accept(&current));
    }

    #[test]
    fn test_dfa_exhausted_step_is_noop() {
        let machine = red_light();
        let done = machine.start("");

        assert_eq!(machine.step(&done).unwrap(), done);
    }

    #[test]
    fn test_dfa_accept_reject_only_at_end() {
        let machine = red_light();
        let start = machine.start("r g y");
        let step1 = machine.step(&start).unwrap();
        let step2 = machine.step(&step1).unwrap();
        let step3 = machine.step(&step2).unwrap();

        for conf in [&start, &step1, &step2] {
            assert!(!machine.is_accept(conf));
            assert!(!machine.is_reject(conf));
        }
        assert!(machine.is_accept(&step3));
        assert!(!machine.is_reject(&step3));

        let empty = dfa(
            &[["start", "a", "reject"], ["reject", "a", "reject"]],
            "start",
            &[],
        );
        let run = empty.run("a a", None);
        assert_eq!(run.outcome, Outcome::Rejected);
        assert_eq!(run.steps(), 2);
    }

    #[test]
    fn test_dfa_missing_transition() {
        let machine = dfa(&[["zero", "a", "one"], ["one", "a", "zero"]], "zero", &["zero"]);
        let err = machine.step(&machine.start("b")).unwrap_err();

        assert_eq!(
            err,
            MachineError::NoTransition {
                state: "zero".to_string(),
                symbol: "b".to_string()
            }
        );
        assert_eq!(machine.run("a a", None).outcome, Outcome::Accepted);
        assert_eq!(machine.run("a a a", None).outcome, Outcome::Rejected);
    }
}
