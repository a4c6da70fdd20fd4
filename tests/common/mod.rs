//! Helpers shared by the integration tests.
#![allow(dead_code)]

use dnsquery::base::{
    Class, Dname, Message, Query, Record, RecordData, Rtype, Ttl,
};
use dnsquery::net::client::request::{Error, Executor, QueryFuture};
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Setup logging of events reported by dnsquery and the test suite.
///
/// Use the RUST_LOG environment variable to override the defaults.
///
/// E.g. To enable debug level logging:
///   RUST_LOG=DEBUG
///
/// Or to log only the decisions of the cache:
///   RUST_LOG=dnsquery::net::client::cache=TRACE
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_thread_ids(true)
        .without_time()
        .try_init()
        .ok();
}

pub fn name(s: &str) -> Dname {
    Dname::from_str(s).unwrap()
}

pub fn query_a(s: &str) -> Query {
    Query::new_in(name(s), Rtype::A)
}

pub fn a_record(owner: &str, ttl: u32, addr: Ipv4Addr) -> Record {
    Record::new(
        name(owner),
        Class::IN,
        Ttl::from_secs(ttl),
        RecordData::A(addr),
    )
}

/// An address nothing should ever be sent to.
pub fn unused_ns() -> SocketAddr {
    "192.0.2.53:53".parse().unwrap()
}

//------------ Counter -------------------------------------------------------

/// Counts calls to an executor and drops of the futures it returned.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    calls: Arc<AtomicUsize>,
    drops: Arc<AtomicUsize>,
}

impl Counter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    fn call(&self) -> DropGuard {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DropGuard(self.drops.clone())
    }
}

/// Bumps the drop count when dropped.
struct DropGuard(Arc<AtomicUsize>);

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

//------------ Never ---------------------------------------------------------

/// An executor that never answers.
#[derive(Clone, Debug, Default)]
pub struct Never(pub Counter);

impl Executor for Never {
    fn query(&self, _: SocketAddr, _: Query) -> QueryFuture<'_> {
        let guard = self.0.call();
        Box::pin(async move {
            let _guard = guard;
            std::future::pending::<Result<Message, Error>>().await
        })
    }
}

//------------ Fixed ---------------------------------------------------------

/// An executor answering every query with the same records.
#[derive(Clone, Debug, Default)]
pub struct Fixed {
    pub answers: Vec<Record>,
    pub counter: Counter,
}

impl Fixed {
    pub fn new(answers: Vec<Record>) -> Self {
        Fixed {
            answers,
            counter: Counter::default(),
        }
    }
}

impl Executor for Fixed {
    fn query(&self, _: SocketAddr, query: Query) -> QueryFuture<'_> {
        let guard = self.counter.call();
        let response =
            Message::response_for_query(&query, self.answers.clone());
        Box::pin(async move {
            let _guard = guard;
            Ok(response)
        })
    }
}
