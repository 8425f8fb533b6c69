use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use aqueduct::{
    conn::ConnectionSource,
    error::{DbResult, Error},
    exec::{ConnectionOp, RowSource},
};
use async_trait::async_trait;

/// Sets up tracing subscriber.
#[allow(dead_code)]
pub fn setup_tracing(level: Option<&str>) {
    use tracing_subscriber::{
        fmt::{format::FmtSpan, layer},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter_layer = level
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::try_from_default_env().unwrap_or("warn".into()));
    let fmt_layer = layer().with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

/// An in-memory connection handle.
pub struct TestConn {
    #[allow(dead_code)]
    pub id: usize,
}

/// A connection source serving numbered in-memory connections, counting
/// acquisitions and releases.
pub struct TestSource {
    fail_acquire: bool,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl TestSource {
    pub fn new() -> Arc<TestSource> {
        Arc::new(TestSource {
            fail_acquire: false,
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        })
    }

    /// A source whose `acquire` always fails.
    #[allow(dead_code)]
    pub fn refusing() -> Arc<TestSource> {
        Arc::new(TestSource {
            fail_acquire: true,
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        })
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionSource for TestSource {
    type Conn = TestConn;

    async fn acquire(&self) -> DbResult<TestConn> {
        if self.fail_acquire {
            return Err(Error::Acquire("connection refused".into()));
        }
        let id = self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(TestConn { id })
    }

    fn release(&self, _conn: TestConn) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// A row source yielding a fixed set of rows, counting pulls.
pub struct FixedRows {
    rows: std::vec::IntoIter<i64>,
    pulls: Arc<AtomicUsize>,
}

impl FixedRows {
    pub fn new(rows: Vec<i64>, pulls: &Arc<AtomicUsize>) -> FixedRows {
        FixedRows {
            rows: rows.into_iter(),
            pulls: Arc::clone(pulls),
        }
    }
}

#[async_trait]
impl RowSource<TestConn> for FixedRows {
    type Row = i64;

    async fn next(&mut self, _conn: &mut TestConn) -> DbResult<Option<i64>> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.next())
    }
}

/// A row source that fails after yielding `ok` rows.
#[allow(dead_code)]
pub struct FailingRows {
    remaining: usize,
}

#[allow(dead_code)]
impl FailingRows {
    pub fn new(ok: usize) -> FailingRows {
        FailingRows { remaining: ok }
    }
}

#[async_trait]
impl RowSource<TestConn> for FailingRows {
    type Row = i64;

    async fn next(&mut self, _conn: &mut TestConn) -> DbResult<Option<i64>> {
        if self.remaining == 0 {
            return Err(Error::Execution("connection reset by peer".into()));
        }
        self.remaining -= 1;
        Ok(Some(self.remaining as i64))
    }
}

/// A count op resolving to a fixed affected-row count.
pub struct FixedCount(pub u64);

#[async_trait]
impl ConnectionOp<TestConn> for FixedCount {
    type Output = u64;

    async fn run(self, _conn: &mut TestConn) -> DbResult<u64> {
        Ok(self.0)
    }
}

/// A count op that fails.
#[allow(dead_code)]
pub struct FailingCount;

#[async_trait]
impl ConnectionOp<TestConn> for FailingCount {
    type Output = u64;

    async fn run(self, _conn: &mut TestConn) -> DbResult<u64> {
        Err(Error::Execution("deadlock detected".into()))
    }
}
