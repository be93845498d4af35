pub mod error;
pub mod fingerprint;
pub mod record;
pub mod recorder;
pub mod report;
pub mod strategy;

pub use error::{HarnessError, Result};
pub use fingerprint::fingerprint;
pub use record::{Dataset, Query, QueryResult, Record};
pub use recorder::{History, Measurement, Recorder, Run};
pub use strategy::{
    ChunkedContains, HashContains, HashJoin, LinearWhere, ParallelContains, Strategy, standard_strategies,
};

use rand::{Rng, SeedableRng, prelude::StdRng};
use rayon::iter::*;

pub const DEFAULT_SEED: u64 = 123456789;
pub const PAYLOAD: &str = "teste";

fn id_bound(total: usize) -> Result<i32> {
    i32::try_from(total).map_err(|_| HarnessError::TooManyRecords { total })
}

/// Records with ids `0..total`, all sharing one payload.
/// Fails when `total` exceeds the `i32` id space.
pub fn generate_dataset(total: usize) -> Result<Dataset> {
    let bound = id_bound(total)?;
    let payload: std::sync::Arc<str> = PAYLOAD.into();
    Ok((0..bound)
        .into_par_iter()
        .map(|id| Record {
            id,
            payload: payload.clone(),
        })
        .collect::<Vec<_>>()
        .into())
}

/// `rounds` queries of growing size: query `i` draws `(total / 100) * (i + 1)`
/// ids uniformly from `0..total` with replacement, then deduplicates.
pub fn generate_queries(total: usize, rounds: usize, seed: u64) -> Result<Vec<Query>> {
    let bound = id_bound(total)?;
    let mut rng = StdRng::seed_from_u64(seed);
    if bound == 0 {
        return Ok(vec![Query::default(); rounds]);
    }
    Ok((0..rounds)
        .map(|round| {
            let draws = (total / 100) * (round + 1);
            (0..draws)
                .map(|_| rng.random_range(0..bound))
                .collect::<Query>()
        })
        .collect())
}
