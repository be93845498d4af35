use std::sync::Arc;

/// One row of the dataset under test. Cheap to clone: the payload is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i32,
    pub payload: Arc<str>,
}

impl Record {
    pub fn new(id: i32, payload: impl Into<Arc<str>>) -> Record {
        Record {
            id,
            payload: payload.into(),
        }
    }
}

/// The full, immutable collection. Ids are unique but not necessarily dense.
pub type Dataset = Arc<[Record]>;

/// Records returned by one query, in whatever order the strategy produced them.
pub type QueryResult = Vec<Record>;

/// A deduplicated set of lookup keys, kept sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    ids: Box<[i32]>,
}

impl Query {
    pub fn new<I: IntoIterator<Item = i32>>(ids: I) -> Query {
        let mut ids = ids.into_iter().collect::<Vec<_>>();
        ids.sort_unstable();
        ids.dedup();
        Query {
            ids: ids.into_boxed_slice(),
        }
    }

    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: i32) -> bool {
        self.ids.binary_search(&id).is_ok()
    }
}

impl FromIterator<i32> for Query {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        Query::new(iter)
    }
}
