use crate::{
    access::ConnectionAccessor,
    conn::ConnectionSource,
    error::{DbResult, Error},
    exec::{stream::RowStream, ConnectionOp, RowSource},
};

/// One prepared-statement execution, exposed through four retrieval views.
///
/// `all`, `first` and `one` are views over the same row pipeline;
/// `rows_updated` runs the count side instead. Nothing executes until a
/// view is consumed, and every terminal call re-runs the pipeline with its
/// own connection; results are never cached across calls.
///
/// The producers are held as factories so that each call gets a fresh,
/// single-use subscription.
pub struct Fetch<S, R, U> {
    accessor: ConnectionAccessor<S>,
    sql: String,
    rows: R,
    count: U,
}

impl<S, R, RS, U, CO> Fetch<S, R, U>
where
    S: ConnectionSource,
    R: Fn() -> RS,
    RS: RowSource<S::Conn>,
    U: Fn() -> CO,
    CO: ConnectionOp<S::Conn, Output = u64>,
{
    /// Creates a new fetch over the given producer factories. The statement
    /// text is carried for diagnostics only.
    pub fn new(accessor: ConnectionAccessor<S>, sql: String, rows: R, count: U) -> Fetch<S, R, U> {
        Fetch {
            accessor,
            sql,
            rows,
            count,
        }
    }

    /// All produced rows, as a lazy stream.
    pub fn all(&self) -> RowStream<S, RS> {
        self.accessor.with_connection_many((self.rows)())
    }

    /// The first produced row, if any.
    ///
    /// Never fails on extra rows: they are simply not pulled. The
    /// underlying stream is cancelled after one element, which releases the
    /// connection.
    pub async fn first(&self) -> DbResult<Option<RS::Row>> {
        let mut rows = self.all();
        let head = rows.next().await?;
        rows.dispose();
        Ok(head)
    }

    /// The sole produced row, if any.
    ///
    /// Pulls at most two rows: observing a second one fails the call with
    /// [`Error::NonUniqueResult`] without buffering or draining the rest of
    /// the result set.
    pub async fn one(&self) -> DbResult<Option<RS::Row>> {
        let mut rows = self.all();
        let Some(head) = rows.next().await? else {
            return Ok(None);
        };
        if rows.next().await?.is_some() {
            rows.dispose();
            return Err(Error::NonUniqueResult {
                sql: self.sql.clone(),
                expected: 1,
            });
        }
        Ok(Some(head))
    }

    /// The number of rows affected by the statement. The row producer is
    /// never constructed for this call.
    pub async fn rows_updated(&self) -> DbResult<u64> {
        self.accessor.with_connection((self.count)()).await
    }
}
