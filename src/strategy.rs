use crate::error::{HarnessError, Result};
use crate::record::{Dataset, Query, QueryResult, Record};
use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use rayon::prelude::*;
use std::{sync::mpsc, thread};

/// A pluggable lookup algorithm: one `setup`, then any number of `query` calls.
pub trait Strategy: Send {
    /// Stable identifier, used for reporting and as the recorder key.
    fn name(&self) -> &str;

    /// Takes ownership of a dataset handle and builds whatever index is needed.
    /// Fails if called a second time on the same instance.
    fn setup(&mut self, dataset: Dataset) -> Result<()>;

    /// Every dataset record whose id is in `keys`, in any order.
    /// Fails with [`HarnessError::NotSetUp`] before `setup`.
    fn query(&self, keys: &Query) -> Result<QueryResult>;
}

fn install(slot: &mut Option<Dataset>, dataset: Dataset, name: &str) -> Result<()> {
    if slot.is_some() {
        return Err(HarnessError::already_set_up(name));
    }
    *slot = Some(dataset);
    Ok(())
}

fn loaded<'a>(slot: &'a Option<Dataset>, name: &str) -> Result<&'a [Record]> {
    slot.as_deref().ok_or_else(|| HarnessError::not_set_up(name))
}

fn key_set(keys: &Query) -> HashSet<i32> {
    let mut set = HashSet::with_capacity(keys.len());
    set.extend(keys.ids().iter().copied());
    set
}

/// Scans the dataset and tests each id with a linear scan of the keys.
#[derive(Debug, Default)]
pub struct LinearWhere {
    database: Option<Dataset>,
}

impl LinearWhere {
    pub const NAME: &'static str = "LinearWhere";

    pub fn new() -> LinearWhere {
        LinearWhere::default()
    }
}

impl Strategy for LinearWhere {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn setup(&mut self, dataset: Dataset) -> Result<()> {
        install(&mut self.database, dataset, Self::NAME)
    }

    fn query(&self, keys: &Query) -> Result<QueryResult> {
        let database = loaded(&self.database, Self::NAME)?;
        let keys = keys.ids();
        Ok(database
            .iter()
            .filter(|record| keys.iter().any(|&key| key == record.id))
            .cloned()
            .collect())
    }
}

/// Same scan as [`LinearWhere`], but membership goes through a hash set.
#[derive(Debug, Default)]
pub struct HashContains {
    database: Option<Dataset>,
}

impl HashContains {
    pub const NAME: &'static str = "HashContains";

    pub fn new() -> HashContains {
        HashContains::default()
    }
}

impl Strategy for HashContains {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn setup(&mut self, dataset: Dataset) -> Result<()> {
        install(&mut self.database, dataset, Self::NAME)
    }

    fn query(&self, keys: &Query) -> Result<QueryResult> {
        let database = loaded(&self.database, Self::NAME)?;
        let keys = key_set(keys);
        Ok(database
            .iter()
            .filter(|record| keys.contains(&record.id))
            .cloned()
            .collect())
    }
}

/// Inner join of the key set against an id index built at setup.
/// Drives the lookup from the keys side, so results follow key order.
#[derive(Debug, Default)]
pub struct HashJoin {
    database: Option<Dataset>,
    index: HashMap<i32, usize>,
}

impl HashJoin {
    pub const NAME: &'static str = "HashJoin";

    pub fn new() -> HashJoin {
        HashJoin::default()
    }
}

impl Strategy for HashJoin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn setup(&mut self, dataset: Dataset) -> Result<()> {
        let mut index = HashMap::with_capacity(dataset.len());
        for (position, record) in dataset.iter().enumerate() {
            index.insert(record.id, position);
        }
        install(&mut self.database, dataset, Self::NAME)?;
        self.index = index;
        Ok(())
    }

    fn query(&self, keys: &Query) -> Result<QueryResult> {
        let database = loaded(&self.database, Self::NAME)?;
        Ok(keys
            .ids()
            .iter()
            .filter_map(|key| self.index.get(key))
            .map(|&position| database[position].clone())
            .collect())
    }
}

/// [`HashContains`] with the scan split across the rayon pool.
#[derive(Debug, Default)]
pub struct ParallelContains {
    database: Option<Dataset>,
}

impl ParallelContains {
    pub const NAME: &'static str = "ParallelContains";

    pub fn new() -> ParallelContains {
        ParallelContains::default()
    }
}

impl Strategy for ParallelContains {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn setup(&mut self, dataset: Dataset) -> Result<()> {
        install(&mut self.database, dataset, Self::NAME)
    }

    fn query(&self, keys: &Query) -> Result<QueryResult> {
        let database = loaded(&self.database, Self::NAME)?;
        let keys = key_set(keys);
        Ok(database
            .par_iter()
            .filter(|record| keys.contains(&record.id))
            .cloned()
            .collect())
    }
}

/// [`HashContains`] over one contiguous chunk per worker thread, each worker
/// filling its own buffer that is merged once all workers finish.
#[derive(Debug)]
pub struct ChunkedContains {
    workers: usize,
    database: Option<Dataset>,
}

impl ChunkedContains {
    pub const NAME: &'static str = "ChunkedContains";

    pub fn new(workers: usize) -> ChunkedContains {
        ChunkedContains {
            workers: workers.max(1),
            database: None,
        }
    }
}

impl Default for ChunkedContains {
    fn default() -> Self {
        ChunkedContains::new(num_cpus::get())
    }
}

impl Strategy for ChunkedContains {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn setup(&mut self, dataset: Dataset) -> Result<()> {
        install(&mut self.database, dataset, Self::NAME)
    }

    fn query(&self, keys: &Query) -> Result<QueryResult> {
        let database = loaded(&self.database, Self::NAME)?;
        let keys = key_set(keys);
        Ok(fan_out(
            database,
            self.workers,
            Vec::new,
            |found: &mut Vec<Record>, record| {
                if keys.contains(&record.id) {
                    found.push(record.clone());
                }
            },
            |mut left, mut right| {
                left.append(&mut right);
                left
            },
        ))
    }
}

/// Splits `items` into at most `workers` chunks, folds each chunk into a fresh
/// `init()` buffer on its own scoped thread, then merges the buffers in
/// completion order.
pub fn fan_out<I, K>(
    items: &[I],
    workers: usize,
    init: impl Fn() -> K + Sync,
    visit: impl Fn(&mut K, &I) + Sync,
    merge: impl Fn(K, K) -> K,
) -> K
where
    I: Sync,
    K: Send,
{
    if items.is_empty() {
        return init();
    }
    let workers = workers.clamp(1, items.len());
    let chunk_len = items.len().div_ceil(workers);
    let (tx, rx) = mpsc::channel::<K>();
    thread::scope(|scope| {
        for chunk in items.chunks(chunk_len) {
            let tx = tx.clone();
            let (init, visit) = (&init, &visit);
            scope.spawn(move || {
                let mut buffer = init();
                for item in chunk {
                    visit(&mut buffer, item);
                }
                // rx outlives the scope
                let _ = tx.send(buffer);
            });
        }
    });
    drop(tx);
    rx.into_iter().fold(init(), merge)
}

/// The reference strategies in registration order.
pub fn standard_strategies(workers: usize) -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(LinearWhere::new()),
        Box::new(HashContains::new()),
        Box::new(ParallelContains::new()),
        Box::new(HashJoin::new()),
        Box::new(ChunkedContains::new(workers)),
    ]
}
