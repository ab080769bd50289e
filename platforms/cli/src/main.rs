use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use tint::{
    Catalog, DefinitionLoader, Harness, HarnessConfig, MachineDefinition, MachineError,
    MachineKind, Mode, Outcome, Report, SimulationResult, Summary,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The machine definition file (.yaml, .yml or .tm)
    #[clap(required_unless_present_any = ["sample", "list"])]
    machine: Option<PathBuf>,

    /// A file of test inputs, one per line. Read from stdin when omitted and piped
    tests: Option<PathBuf>,

    /// Use a built-in sample machine instead of a file. The first path is then the tests file
    #[clap(short, long)]
    sample: Option<String>,

    /// List the built-in sample machines
    #[clap(short, long)]
    list: bool,

    /// Simulate this input instead of reading a tests file (repeatable)
    #[clap(short, long = "test", conflicts_with = "tests")]
    test: Vec<String>,

    /// Override the machine kind: dfa, one-way-tm or two-way-tm
    #[clap(short, long)]
    kind: Option<String>,

    /// Apply the head move after a blank is written over the first cell
    #[clap(long)]
    strict: bool,

    /// Stop each simulation after this many steps
    #[clap(short, long)]
    max_steps: Option<usize>,

    /// Number of worker threads
    #[clap(short, long, default_value_t = tint::worker::DEFAULT_WORKERS)]
    workers: usize,

    /// Print every configuration of each simulation
    #[clap(short, long)]
    verbose: bool,

    /// Print the results as JSON
    #[clap(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), MachineError> {
    if cli.list {
        for name in Catalog::list_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut definition = load_definition(&cli)?;
    if let Some(kind) = &cli.kind {
        definition.kind = Some(kind.parse::<MachineKind>()?);
    }

    let mode = if cli.strict { Mode::Strict } else { Mode::Normal };
    let machine = definition.build()?.with_mode(mode);
    let inputs = load_inputs(&cli)?;

    debug!(kind = %machine.kind(), inputs = inputs.len(), "simulating");

    let harness = Harness::new(HarnessConfig {
        workers: cli.workers,
        max_steps: cli.max_steps,
        ..HarnessConfig::default()
    });
    let mut results = harness.run(&machine, &inputs);
    results.sort_by_key(|result| result.id);

    if cli.json {
        let json = Report::new(&results)
            .to_json()
            .map_err(|e| MachineError::DefinitionError(e.to_string()))?;
        println!("{json}");
        return Ok(());
    }

    for result in &results {
        print_result(result, cli.verbose);
    }

    let summary = Summary::from_results(&results);
    println!(
        "{} accepted, {} rejected, {} errored, {} unfinished",
        summary.accepted, summary.rejected, summary.errored, summary.unfinished
    );

    Ok(())
}

fn load_definition(cli: &Cli) -> Result<MachineDefinition, MachineError> {
    match (&cli.sample, &cli.machine) {
        (Some(name), _) => Ok(Catalog::get(name)?.definition.clone()),
        (None, Some(path)) => DefinitionLoader::load_definition(path),
        (None, None) => Err(MachineError::ValidationError(
            "Please provide a machine file or --sample".to_string(),
        )),
    }
}

fn load_inputs(cli: &Cli) -> Result<Vec<String>, MachineError> {
    if !cli.test.is_empty() {
        return Ok(cli.test.clone());
    }

    if let Some(path) = tests_path(cli) {
        return DefinitionLoader::load_inputs(path);
    }

    if atty::is(atty::Stream::Stdin) {
        return Err(MachineError::ValidationError(
            "Please provide a tests file, --test, or pipe inputs on stdin".to_string(),
        ));
    }

    io::stdin()
        .lock()
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MachineError::FileError(format!("Failed to read stdin: {}", e)))
}

/// With `--sample` the machine slot is free, so a lone path names the tests file.
fn tests_path(cli: &Cli) -> Option<&PathBuf> {
    match cli.sample {
        Some(_) => cli.tests.as_ref().or(cli.machine.as_ref()),
        None => cli.tests.as_ref(),
    }
}

fn print_result(result: &SimulationResult, verbose: bool) {
    println!("Simulating with {:?}.", result.input);

    if verbose {
        for conf in &result.trace {
            println!("{conf}");
        }
    }

    match &result.outcome {
        Outcome::Accepted => println!("Accepted.\n"),
        Outcome::Rejected => println!("Rejected.\n"),
        Outcome::Errored(e) => println!("Error: {e}\n"),
        Outcome::StepLimit(n) => println!("No halt after {n} steps.\n"),
    }
}
