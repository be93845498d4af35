use crate::error::{HarnessError, Result};
use crate::fingerprint::fingerprint;
use crate::record::{Dataset, Query, QueryResult};
use crate::strategy::Strategy;
use ahash::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// One timed query call and what it returned.
#[derive(Debug, Clone)]
pub struct Run {
    pub elapsed: Duration,
    pub result: QueryResult,
    /// Computed once when the run is recorded.
    pub fingerprint: String,
}

impl Run {
    pub fn result_count(&self) -> usize {
        self.result.len()
    }
}

/// Append-only run history of one strategy.
#[derive(Debug, Clone)]
pub struct History {
    name: Box<str>,
    setup: Duration,
    runs: Vec<Run>,
}

impl History {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn setup_elapsed(&self) -> Duration {
        self.setup
    }

    /// Runs in call order.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }
}

/// A flattened report row: one (strategy, run) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement<'a> {
    pub index: usize,
    pub strategy: &'a str,
    pub setup: Duration,
    pub elapsed: Duration,
    pub result_count: usize,
    pub fingerprint: &'a str,
}

/// Times setup and query calls and keeps every result, keyed by strategy name.
///
/// Strategies appear in the order their setup was timed.
#[derive(Debug, Default)]
pub struct Recorder {
    histories: Vec<History>,
    by_name: HashMap<Box<str>, usize>,
}

impl Recorder {
    pub fn new() -> Recorder {
        Recorder::default()
    }

    /// Times exactly one `setup` call and opens a history for the strategy.
    pub fn time_setup<S: Strategy + ?Sized>(&mut self, strategy: &mut S, dataset: Dataset) -> Result<Duration> {
        let name: Box<str> = strategy.name().into();
        if self.by_name.contains_key(&name) {
            return Err(HarnessError::DuplicateStrategy { strategy: name });
        }

        let start = Instant::now();
        strategy.setup(dataset)?;
        let setup = start.elapsed();

        debug!(strategy = %name, ?setup, "setup timed");
        self.by_name.insert(name.clone(), self.histories.len());
        self.histories.push(History {
            name,
            setup,
            runs: Vec::new(),
        });
        Ok(setup)
    }

    /// Times exactly one `query` call and appends it to the strategy's history.
    /// Empty results are recorded like any other.
    pub fn time_query<S: Strategy + ?Sized>(&mut self, strategy: &S, keys: &Query) -> Result<&Run> {
        let slot = *self
            .by_name
            .get(strategy.name())
            .ok_or_else(|| HarnessError::not_set_up(strategy.name()))?;

        let start = Instant::now();
        let result = strategy.query(keys)?;
        let elapsed = start.elapsed();

        let fingerprint = fingerprint(&result);
        let history = &mut self.histories[slot];
        let index = history.runs.len();
        debug!(
            strategy = %history.name,
            run = index,
            keys = keys.len(),
            count = result.len(),
            ?elapsed,
            "query timed"
        );
        history.runs.push(Run {
            elapsed,
            result,
            fingerprint,
        });
        Ok(&history.runs[index])
    }

    pub fn histories(&self) -> &[History] {
        &self.histories
    }

    pub fn history(&self, name: &str) -> Option<&History> {
        self.by_name.get(name).map(|&slot| &self.histories[slot])
    }

    /// Every (strategy, run) pair, strategies in setup order, runs in call order.
    pub fn measurements(&self) -> impl Iterator<Item = Measurement<'_>> {
        self.histories.iter().flat_map(|history| {
            history.runs.iter().enumerate().map(move |(index, run)| Measurement {
                index,
                strategy: &history.name,
                setup: history.setup,
                elapsed: run.elapsed,
                result_count: run.result_count(),
                fingerprint: &run.fingerprint,
            })
        })
    }

    /// Checks that run `i` has the same fingerprint for every strategy,
    /// using the first strategy as reference. Only run indices that both
    /// sides recorded are compared.
    pub fn verify_agreement(&self) -> Result<()> {
        let Some((reference, rest)) = self.histories.split_first() else {
            return Ok(());
        };
        for other in rest {
            for (run, (expected, found)) in reference.runs.iter().zip(&other.runs).enumerate() {
                if expected.fingerprint != found.fingerprint {
                    return Err(HarnessError::Disagreement {
                        run,
                        strategy: other.name.clone(),
                        expected: expected.fingerprint.as_str().into(),
                        found: found.fingerprint.as_str().into(),
                    });
                }
            }
        }
        Ok(())
    }
}
