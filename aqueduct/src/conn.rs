use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::DbResult;

/// A source of database connections, such as a connection factory or pool.
///
/// The kernel acquires one connection per logical operation and hands it
/// back through [`release`] exactly once, no matter how the operation
/// terminates. Acquisition failures must surface as
/// [`Error::Acquire`](crate::error::Error::Acquire) rather than blocking
/// indefinitely.
///
/// `release` is synchronous so that it may run from teardown paths which
/// cannot suspend. A source that needs asynchronous cleanup should hand the
/// connection off internally (e.g. over a channel) and complete it on its
/// own time.
///
/// [`release`]: ConnectionSource::release
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    type Conn: Send;

    /// Acquires a connection for exclusive use by one operation.
    async fn acquire(&self) -> DbResult<Self::Conn>;

    /// Takes a connection back. Called exactly once per successful
    /// acquisition.
    fn release(&self, conn: Self::Conn);
}

/// An exclusive lease over one acquired connection.
///
/// Dropping the lease returns the connection to its source. Every exit path
/// of an execution (completion, error, disposal, consumer drop) funnels
/// through this single release point.
pub(crate) struct Lease<S: ConnectionSource> {
    source: Arc<S>,
    conn: Option<S::Conn>,
}

impl<S: ConnectionSource> Lease<S> {
    pub(crate) fn new(source: Arc<S>, conn: S::Conn) -> Lease<S> {
        Lease {
            source,
            conn: Some(conn),
        }
    }

    pub(crate) fn conn_mut(&mut self) -> &mut S::Conn {
        self.conn.as_mut().expect("lease is active")
    }
}

impl<S: ConnectionSource> Drop for Lease<S> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.source.release(conn);
            debug!("released connection");
        }
    }
}
