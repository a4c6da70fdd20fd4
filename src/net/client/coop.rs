//! An executor merging identical queries that are in flight at the same
//! time.
//!
//! If a query arrives while a query with the same name, type, and class is
//! still being worked on by the upstream executor, the new query does not
//! start a second upstream query. Instead it waits for the pending one and
//! receives a copy of its result. Each caller gets the response with the
//! message ID of its own query.
//!
//! The upstream query is shared by all waiting callers. It is cancelled,
//! that is, its future dropped, once every caller has gone away before it
//! finished. The nameserver address is not part of the identity of a query,
//! so identical queries to different nameservers are merged too.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::message::Message;
use crate::base::query::{Query, QueryKey};
use crate::net::client::request::{Error, Executor, QueryFuture};
use futures_util::future::{BoxFuture, FutureExt, Shared, WeakShared};
use parking_lot::Mutex;
use std::boxed::Box;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, trace};

//------------ Type Aliases ---------------------------------------------------

/// The upstream query shared between all waiting callers.
type SharedQuery = Shared<BoxFuture<'static, Result<Message, Error>>>;

/// A handle to a shared query that doesn’t keep it alive.
type WeakQuery = WeakShared<BoxFuture<'static, Result<Message, Error>>>;

//------------ Connection -----------------------------------------------------

/// An executor de-duplicating concurrent identical queries.
pub struct Connection<Upstream> {
    /// The executor doing the actual work.
    upstream: Arc<Upstream>,

    /// The queries currently in flight.
    pending: Mutex<PendingTable>,
}

impl<Upstream> Connection<Upstream>
where
    Upstream: Executor + 'static,
{
    /// Creates a new executor.
    pub fn new(upstream: Upstream) -> Self {
        Self {
            upstream: Arc::new(upstream),
            pending: Default::default(),
        }
    }

    /// Returns the number of queries currently in flight.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().queries.len()
    }

    /// Waits for the shared query and adjusts the result for the caller.
    async fn query_impl(
        &self,
        nameserver: SocketAddr,
        query: Query,
    ) -> Result<Message, Error> {
        let id = query.id();
        let mut waiter = self.attach(nameserver, query);
        let res = waiter.wait().await;
        res.map(|mut answer| {
            answer.header_mut().set_id(id);
            answer
        })
    }

    /// Attaches to a pending query or starts a new one.
    ///
    /// The lock on the table is only held while looking up or inserting
    /// the query and never across an await point.
    fn attach(&self, nameserver: SocketAddr, query: Query) -> Waiter<'_> {
        let key = query.key();
        let mut pending = self.pending.lock();

        if let Some(entry) = pending.queries.get(&key) {
            if let Some(shared) = entry.weak.upgrade() {
                trace!(%key, "joining pending query");
                return Waiter {
                    table: &self.pending,
                    key,
                    serial: entry.serial,
                    shared: Some(shared),
                    finished: false,
                };
            }
        }

        debug!(%key, %nameserver, "starting upstream query");
        let upstream = self.upstream.clone();
        let fut: BoxFuture<'static, Result<Message, Error>> =
            Box::pin(async move { upstream.query(nameserver, query).await });
        let shared = fut.shared();
        pending.next_serial = pending.next_serial.wrapping_add(1);
        let serial = pending.next_serial;
        if let Some(weak) = shared.downgrade() {
            pending
                .queries
                .insert(key.clone(), PendingQuery { serial, weak });
        }
        Waiter {
            table: &self.pending,
            key,
            serial,
            shared: Some(shared),
            finished: false,
        }
    }
}

impl<Upstream> Executor for Connection<Upstream>
where
    Upstream: Executor + 'static,
{
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        Box::pin(self.query_impl(nameserver, query))
    }
}

impl<Upstream: fmt::Debug> fmt::Debug for Connection<Upstream> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("upstream", &self.upstream)
            .field("pending", &self.pending.lock().queries.len())
            .finish()
    }
}

//------------ PendingTable ---------------------------------------------------

/// The table of queries in flight.
#[derive(Default)]
struct PendingTable {
    /// The pending queries by their identity.
    queries: HashMap<QueryKey, PendingQuery>,

    /// The serial number given to the most recently started query.
    next_serial: u64,
}

/// A query in flight.
struct PendingQuery {
    /// Distinguishes this query from later ones with the same key.
    serial: u64,

    /// The shared upstream query.
    weak: WeakQuery,
}

//------------ Waiter ---------------------------------------------------------

/// A caller waiting for a shared query.
///
/// When dropped, the waiter removes the query from the table if the query
/// has finished or if it was the last one waiting for it.
struct Waiter<'a> {
    /// The table the query is registered in.
    table: &'a Mutex<PendingTable>,

    /// The identity of the query.
    key: QueryKey,

    /// The serial number of the query.
    serial: u64,

    /// The shared query.
    ///
    /// This is only `None` while dropping.
    shared: Option<SharedQuery>,

    /// Whether the shared query has produced its result.
    finished: bool,
}

impl<'a> Waiter<'a> {
    /// Waits for the result of the shared query.
    async fn wait(&mut self) -> Result<Message, Error> {
        let res = match self.shared.as_mut() {
            Some(shared) => shared.await,
            None => Err(Error::Cancelled),
        };
        self.finished = true;
        res
    }
}

impl<'a> Drop for Waiter<'a> {
    fn drop(&mut self) {
        // Our handle has to be gone before checking for other ones.
        drop(self.shared.take());

        let mut pending = self.table.lock();
        let remove = match pending.queries.get(&self.key) {
            Some(entry) => {
                entry.serial == self.serial
                    && (self.finished || entry.weak.upgrade().is_none())
            }
            None => false,
        };
        if remove {
            trace!(key = %self.key, "removing pending query");
            pending.queries.remove(&self.key);
        }
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::iana::Rtype;
    use crate::base::name::Dname;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts how often it is dropped.
    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Answers after one second.
    #[derive(Default)]
    struct Slow {
        calls: AtomicUsize,
        dropped: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Slow {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn dropped(&self) -> usize {
            self.dropped.load(Ordering::SeqCst)
        }
    }

    impl Executor for Slow {
        fn query(&self, _: SocketAddr, query: Query) -> QueryFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let counter = DropCounter(self.dropped.clone());
            let fail = self.fail;
            Box::pin(async move {
                let _counter = counter;
                tokio::time::sleep(Duration::from_secs(1)).await;
                if fail {
                    Err(Error::Timeout(query.name().clone()))
                } else {
                    Ok(Message::response_for_query(&query, Vec::new()))
                }
            })
        }
    }

    fn query(name: &str, id: u16) -> Query {
        Query::new_in(Dname::from_str(name).unwrap(), Rtype::A).with_id(id)
    }

    fn addr() -> SocketAddr {
        "192.0.2.53:53".parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn merges_identical_queries() {
        let conn = Connection::new(Slow::default());
        let (a, b) = tokio::join!(
            conn.query(addr(), query("example.com", 1)),
            conn.query(addr(), query("Example.COM", 2)),
        );
        assert_eq!(a.unwrap().header().id(), 1);
        assert_eq!(b.unwrap().header().id(), 2);
        assert_eq!(conn.upstream.calls(), 1);
        assert_eq!(conn.pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_queries() {
        let conn = Connection::new(Slow::default());
        let (a, b) = tokio::join!(
            conn.query(addr(), query("example.com", 1)),
            conn.query(addr(), query("example.net", 2)),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(conn.upstream.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_queries_not_merged() {
        let conn = Connection::new(Slow::default());
        conn.query(addr(), query("example.com", 1)).await.unwrap();
        conn.query(addr(), query("example.com", 2)).await.unwrap();
        assert_eq!(conn.upstream.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn error_is_shared() {
        let conn = Connection::new(Slow {
            fail: true,
            ..Default::default()
        });
        let (a, b) = tokio::join!(
            conn.query(addr(), query("example.com", 1)),
            conn.query(addr(), query("example.com", 2)),
        );
        assert!(a.unwrap_err().is_timeout());
        assert!(b.unwrap_err().is_timeout());
        assert_eq!(conn.upstream.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn all_callers_gone() {
        let conn = Connection::new(Slow::default());
        let both = async {
            tokio::join!(
                conn.query(addr(), query("example.com", 1)),
                conn.query(addr(), query("example.com", 2)),
            )
        };
        let res =
            tokio::time::timeout(Duration::from_millis(10), both).await;
        assert!(res.is_err());
        assert_eq!(conn.upstream.calls(), 1);
        assert_eq!(conn.upstream.dropped(), 1);
        assert_eq!(conn.pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn one_caller_gone() {
        let conn = Connection::new(Slow::default());
        let mut a = conn.query(addr(), query("example.com", 1));
        let mut b = conn.query(addr(), query("example.com", 2));
        let res = tokio::time::timeout(
            Duration::from_millis(10),
            futures_util::future::select(&mut a, &mut b),
        )
        .await;
        assert!(res.is_err());
        drop(a);
        assert_eq!(conn.upstream.dropped(), 0);
        assert_eq!(b.await.unwrap().header().id(), 2);
        assert_eq!(conn.upstream.calls(), 1);
        assert_eq!(conn.upstream.dropped(), 1);
        assert_eq!(conn.pending_len(), 0);
    }
}
