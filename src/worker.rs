//! This module provides the simulation harness: a fixed pool of worker threads that runs a
//! batch of inputs against one machine and collects a trace per input.
//!
//! Jobs and results travel over two bounded channels. Submission happens on its own scoped
//! thread while the caller drains results, so batches larger than the queue capacity never
//! stall. Results arrive in completion order; each carries the index of its input.

use crate::configuration::Configuration;
use crate::machine::Machine;
use crate::types::Outcome;
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::Serialize;
use std::thread;
use tracing::debug;

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 5;
/// Default capacity of the job and result queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// A single input to simulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: usize,
    pub input: String,
}

/// The finished simulation of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Index of the input in the submitted batch.
    pub id: usize,
    pub input: String,
    /// Configurations in visitation order, including the initial and the final one.
    pub trace: Vec<Configuration>,
    pub outcome: Outcome,
}

impl SimulationResult {
    /// Number of transitions taken.
    pub fn steps(&self) -> usize {
        self.trace.len().saturating_sub(1)
    }
}

/// Settings for a `Harness`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Number of worker threads. Zero is treated as one.
    pub workers: usize,
    /// Capacity of each bounded queue. Zero is treated as one.
    pub queue_capacity: usize,
    /// Stop a simulation after this many transitions. `None` runs until the machine halts.
    pub max_steps: Option<usize>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_steps: None,
        }
    }
}

/// Runs batches of inputs through a worker pool.
#[derive(Debug, Clone, Default)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Simulates every input and collects the results, in completion order.
    pub fn run<S>(&self, machine: &Machine, inputs: &[S]) -> Vec<SimulationResult>
    where
        S: AsRef<str> + Sync,
    {
        let mut results = Vec::with_capacity(inputs.len());
        self.run_each(machine, inputs, |result| results.push(result));
        results
    }

    /// Simulates every input, handing each result to `on_result` as soon as it completes.
    ///
    /// Returns once every input has been simulated.
    pub fn run_each<S, F>(&self, machine: &Machine, inputs: &[S], mut on_result: F)
    where
        S: AsRef<str> + Sync,
        F: FnMut(SimulationResult),
    {
        let workers = self.config.workers.max(1);
        let capacity = self.config.queue_capacity.max(1);
        let max_steps = self.config.max_steps;

        let (job_tx, job_rx) = bounded::<Job>(capacity);
        let (result_tx, result_rx) = bounded::<SimulationResult>(capacity);

        debug!(jobs = inputs.len(), workers, capacity, "starting batch");

        thread::scope(|scope| {
            for worker in 0..workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || work(worker, machine, jobs, results, max_steps));
            }
            // The result queue closes once the last worker drops its sender.
            drop(job_rx);
            drop(result_tx);

            scope.spawn(move || {
                for (id, input) in inputs.iter().enumerate() {
                    let job = Job {
                        id,
                        input: input.as_ref().to_string(),
                    };
                    if job_tx.send(job).is_err() {
                        break;
                    }
                }
            });

            // Owned by the scope: unwinding drops it and disconnects the workers.
            let results = result_rx;
            for result in results {
                on_result(result);
            }
        });
    }
}

fn work(
    worker: usize,
    machine: &Machine,
    jobs: Receiver<Job>,
    results: Sender<SimulationResult>,
    max_steps: Option<usize>,
) {
    for job in jobs.iter() {
        debug!(worker, job = job.id, "simulating");
        let run = machine.run(&job.input, max_steps);
        debug!(worker, job = job.id, steps = run.steps(), outcome = %run.outcome, "finished");

        let result = SimulationResult {
            id: job.id,
            input: job.input,
            trace: run.trace,
            outcome: run.outcome,
        };
        if results.send(result).is_err() {
            break;
        }
    }
}

/// Simulates every input with the default harness settings.
pub fn run_all<S>(machine: &Machine, inputs: &[S]) -> Vec<SimulationResult>
where
    S: AsRef<str> + Sync,
{
    Harness::default().run(machine, inputs)
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub accepted: usize,
    pub rejected: usize,
    pub errored: usize,
    pub unfinished: usize,
}

impl Summary {
    pub fn from_results(results: &[SimulationResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.record(&result.outcome);
        }
        summary
    }

    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Accepted => self.accepted += 1,
            Outcome::Rejected => self.rejected += 1,
            Outcome::Errored(_) => self.errored += 1,
            Outcome::StepLimit(_) => self.unfinished += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.accepted + self.rejected + self.errored + self.unfinished
    }
}

/// A serializable view of a finished simulation.
#[derive(Debug, Clone, Serialize)]
pub struct ResultReport {
    pub id: usize,
    pub input: String,
    pub outcome: String,
    pub steps: usize,
    pub trace: Vec<Configuration>,
}

impl From<&SimulationResult> for ResultReport {
    fn from(result: &SimulationResult) -> Self {
        Self {
            id: result.id,
            input: result.input.clone(),
            outcome: result.outcome.to_string(),
            steps: result.steps(),
            trace: result.trace.clone(),
        }
    }
}

/// A serializable report for a whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub results: Vec<ResultReport>,
    pub summary: Summary,
}

impl Report {
    /// Builds a report with results sorted by input index.
    pub fn new(results: &[SimulationResult]) -> Self {
        let mut reports: Vec<ResultReport> = results.iter().map(ResultReport::from).collect();
        reports.sort_by_key(|report| report.id);

        Self {
            results: reports,
            summary: Summary::from_results(results),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
