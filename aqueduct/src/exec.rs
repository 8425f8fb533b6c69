use async_trait::async_trait;

use crate::error::DbResult;

pub mod fetch;

pub mod stream;

/// Row production trait. It is implemented by row-yielding statement
/// executions.
///
/// Execution is based on the iterator model: `next` may be called
/// arbitrarily to lazily fetch rows without running out of memory. The
/// connection is passed in on every pull, since the surrounding stream
/// (not the source) owns it for the duration of the operation; a source
/// must not retain the reference beyond the call.
#[async_trait]
pub trait RowSource<C>: Send {
    type Row: Send;

    /// Produces the next row. `None` ends the stream.
    async fn next(&mut self, conn: &mut C) -> DbResult<Option<Self::Row>>;
}

/// A one-shot computation against a connection, such as reading the
/// affected-row count of a mutation.
#[async_trait]
pub trait ConnectionOp<C>: Send {
    type Output: Send;

    /// Consumes the operation, producing its single result.
    async fn run(self, conn: &mut C) -> DbResult<Self::Output>;
}
