use std::error::Error as StdError;

pub type DbResult<T, E = Error> = Result<T, E>;

/// A boxed driver-level error.
pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection source failed to produce a connection (pool
    /// exhaustion, network failure). The kernel attempts no retry.
    #[error("failed to acquire connection: {0}")]
    Acquire(#[source] BoxError),

    /// The database rejected or failed the statement (constraint violation,
    /// disconnection mid-stream). Forwarded untranslated.
    #[error("statement execution failed: {0}")]
    Execution(#[source] BoxError),

    /// A single-row retrieval observed a second row.
    #[error("query [{sql}] returned a non-unique result (expected {expected})")]
    NonUniqueResult {
        /// The statement text, carried for diagnostics.
        sql: String,
        /// The row count the caller asked for.
        expected: usize,
    },
}
