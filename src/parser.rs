//! This module provides the parser for the `.tm` text format, utilizing the `pest` crate.
//! It defines the grammar in `grammar.pest` and turns a parse tree into a `MachineDefinition`.

use crate::{
    definition::MachineDefinition,
    types::{MachineError, MachineKind},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Derives a `PestParser` for the machine definition grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct DefinitionParser;

/// Parses a `.tm` text definition into a `MachineDefinition`.
///
/// Only syntax and declaration structure are checked here. Rule arity and halting states
/// are validated when the definition is built.
///
/// # Errors
///
/// * `MachineError::ParseError` for syntax errors, duplicate declarations and unknown kinds.
/// * `MachineError::ValidationError` if the `start` declaration is missing.
pub fn parse(input: &str) -> Result<MachineDefinition, MachineError> {
    let root = DefinitionParser::parse(Rule::definition, input)
        .map_err(|e| MachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| MachineError::ValidationError("Empty definition".to_string()))?;

    parse_definition(root)
}

fn parse_definition(pair: Pair<Rule>) -> Result<MachineDefinition, MachineError> {
    let mut kind: Option<MachineKind> = None;
    let mut start: Option<String> = None;
    let mut accepts: Option<(Vec<String>, Span)> = None;
    let mut reject: Option<String> = None;
    let mut transitions = Vec::new();
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::kind => kind = Some(parse_kind(p)?),
            Rule::start => start = parse_names(p).into_iter().next(),
            Rule::accept => accepts = Some((parse_names(p), span)),
            Rule::reject => reject = parse_names(p).into_iter().next(),
            Rule::transition => transitions.push(parse_transition(p)?),
            _ => {} // `rules:` header and EOI
        }
    }

    let start = start.ok_or_else(|| {
        MachineError::ValidationError("Missing 'start' declaration".to_string())
    })?;

    let mut definition = MachineDefinition {
        kind,
        start,
        reject,
        transitions,
        ..Default::default()
    };

    // Without a reject state the accept list is a DFA's accept set.
    if let Some((states, span)) = accepts {
        let tape = definition.reject.is_some() || kind.is_some_and(|k| k.is_tape());
        match (tape, states.len()) {
            (false, _) => definition.accept_states = states,
            (true, 1) => definition.accept = states.into_iter().next(),
            (true, n) => {
                return Err(parse_error(
                    &format!("Turing machines take a single accept state, found {n}"),
                    span,
                ))
            }
        }
    }

    Ok(definition)
}

/// Parses `kind: <name>` into a `MachineKind`.
fn parse_kind(pair: Pair<Rule>) -> Result<MachineKind, MachineError> {
    let span = pair.as_span();
    let name = parse_names(pair).into_iter().next().unwrap_or_default();

    name.parse::<MachineKind>().map_err(|_| {
        parse_error(
            &format!("Unknown machine kind: {name}, expected dfa, one-way-tm or two-way-tm"),
            span,
        )
    })
}

/// Parses `state, symbol -> next[, write, move]` into a flat rule tuple.
fn parse_transition(pair: Pair<Rule>) -> Result<Vec<String>, MachineError> {
    let span = pair.as_span();
    let mut sides = pair.into_inner();

    let input = sides.next().map(parse_names).unwrap_or_default();
    let output = sides.next().map(parse_names).unwrap_or_default();

    if input.len() != 2 {
        return Err(parse_error(
            &format!(
                "A rule reads one state and one symbol, found {} names",
                input.len()
            ),
            span,
        ));
    }

    Ok(input.into_iter().chain(output).collect())
}

/// Collects every `name` below `pair`, with surrounding quotes removed.
fn parse_names(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner()
        .flatten()
        .filter(|p| p.as_rule() == Rule::name)
        .map(|p| parse_name(p.as_str()))
        .collect()
}

fn parse_name(input: &str) -> String {
    input
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(input)
        .to_string()
}

/// Creates a `MachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> MachineError {
    MachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Checks if a declaration has already been made. Rule lines may repeat.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), MachineError> {
    if !matches!(
        rule,
        Rule::kind | Rule::start | Rule::accept | Rule::reject | Rule::rules
    ) {
        return Ok(());
    };

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}
