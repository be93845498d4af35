use std::io;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Query issued before the strategy (or its recorder slot) saw a setup.
    #[error("strategy '{strategy}' was queried before setup")]
    NotSetUp { strategy: Box<str> },

    #[error("strategy '{strategy}' was already set up")]
    AlreadySetUp { strategy: Box<str> },

    /// Names are the recorder's identity key, so they must be unique.
    #[error("strategy name '{strategy}' registered twice")]
    DuplicateStrategy { strategy: Box<str> },

    #[error("run {run}: strategy '{strategy}' produced {found}, expected {expected}")]
    Disagreement {
        run: usize,
        strategy: Box<str>,
        expected: Box<str>,
        found: Box<str>,
    },

    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode report: {0}")]
    Csv(#[from] csv::Error),

    /// Ids are `i32`, so a dense dataset cannot exceed `i32::MAX` records.
    #[error("dataset of {total} records does not fit i32 ids")]
    TooManyRecords { total: usize },
}

impl HarnessError {
    pub(crate) fn not_set_up(strategy: &str) -> Self {
        HarnessError::NotSetUp {
            strategy: strategy.into(),
        }
    }

    pub(crate) fn already_set_up(strategy: &str) -> Self {
        HarnessError::AlreadySetUp {
            strategy: strategy.into(),
        }
    }
}
