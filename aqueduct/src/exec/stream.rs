use std::{mem, sync::Arc};

use futures_util::stream::{self, Stream};
use tracing::debug;

use crate::{
    conn::{ConnectionSource, Lease},
    error::DbResult,
    exec::RowSource,
};

/// A lazily-executed, connection-scoped stream of rows.
///
/// Nothing happens at construction. The first [`next`] call acquires a
/// connection from the source, and every pull after that feeds the same
/// connection to the row source. The connection is released exactly once:
/// when the source is exhausted, when it fails, when the stream is
/// [`dispose`]d, or when the stream is dropped mid-flight, whichever comes
/// first.
///
/// [`next`]: RowStream::next
/// [`dispose`]: RowStream::dispose
pub struct RowStream<S: ConnectionSource, R> {
    source: Arc<S>,
    state: State<S, R>,
}

enum State<S: ConnectionSource, R> {
    /// No pull has happened yet; no connection is held.
    Pending { rows: R },
    /// A connection is leased and rows are flowing.
    Streaming { lease: Lease<S>, rows: R },
    /// The stream completed, failed or was disposed.
    Terminated,
}

impl<S, R> RowStream<S, R>
where
    S: ConnectionSource,
    R: RowSource<S::Conn>,
{
    pub(crate) fn new(source: Arc<S>, rows: R) -> RowStream<S, R> {
        RowStream {
            source,
            state: State::Pending { rows },
        }
    }

    /// Produces the next row.
    ///
    /// The first call acquires the connection; an acquisition failure is
    /// reported here as the stream's terminal error. Once the stream has
    /// terminated, for whatever reason, further calls return `Ok(None)`.
    pub async fn next(&mut self) -> DbResult<Option<R::Row>> {
        // Acquire on the first pull. On acquisition failure the stream is
        // left terminated with nothing to release.
        let state = mem::replace(&mut self.state, State::Terminated);
        self.state = match state {
            State::Pending { rows } => {
                let conn = self.source.acquire().await?;
                debug!("acquired connection for row stream");
                State::Streaming {
                    lease: Lease::new(Arc::clone(&self.source), conn),
                    rows,
                }
            }
            state => state,
        };

        let State::Streaming { lease, rows } = &mut self.state else {
            return Ok(None);
        };

        match rows.next(lease.conn_mut()).await {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                // Dropping the lease releases the connection.
                self.state = State::Terminated;
                Ok(None)
            }
            Err(error) => {
                self.state = State::Terminated;
                Err(error)
            }
        }
    }

    /// Cancels the stream, releasing the connection without pulling any
    /// remaining rows. A no-op on an already-terminated stream.
    pub fn dispose(&mut self) {
        self.state = State::Terminated;
    }

    /// Adapts the pull iterator to a [`Stream`] of fallible rows, for
    /// composition with the `StreamExt`/`TryStreamExt` combinators.
    pub fn into_stream(self) -> impl Stream<Item = DbResult<R::Row>> {
        stream::try_unfold(self, |mut rows| async move {
            let row = rows.next().await?;
            Ok(row.map(|row| (row, rows)))
        })
    }
}
