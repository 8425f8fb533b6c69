use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    conn::{ConnectionSource, Lease},
    error::DbResult,
    exec::{stream::RowStream, ConnectionOp, RowSource},
};

/// Scoped access to connections from a [`ConnectionSource`].
///
/// Callers never acquire or release directly: they hand the accessor a
/// computation, and the accessor guarantees that a connection is acquired
/// once for it and released exactly once afterwards, on every exit path.
pub struct ConnectionAccessor<S> {
    source: Arc<S>,
}

impl<S> Clone for ConnectionAccessor<S> {
    fn clone(&self) -> Self {
        ConnectionAccessor {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: ConnectionSource> ConnectionAccessor<S> {
    pub fn new(source: Arc<S>) -> ConnectionAccessor<S> {
        ConnectionAccessor { source }
    }

    /// Runs a row-yielding computation with a connection.
    ///
    /// The returned stream is lazy: no connection is acquired here, only on
    /// the first pull. The connection is released when the stream
    /// completes, fails, is disposed or is dropped.
    pub fn with_connection_many<R>(&self, rows: R) -> RowStream<S, R>
    where
        R: RowSource<S::Conn>,
    {
        RowStream::new(Arc::clone(&self.source), rows)
    }

    /// Runs a one-shot computation with a connection, releasing it once the
    /// computation finishes, successfully or not.
    ///
    /// An acquisition failure resolves the future with that error; nothing
    /// was acquired, so nothing is released.
    #[instrument(level = "debug", skip_all)]
    pub async fn with_connection<Op>(&self, op: Op) -> DbResult<Op::Output>
    where
        Op: ConnectionOp<S::Conn>,
    {
        let conn = self.source.acquire().await?;
        debug!("acquired connection");
        let mut lease = Lease::new(Arc::clone(&self.source), conn);
        op.run(lease.conn_mut()).await
    }
}
