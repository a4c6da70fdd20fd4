//! A client cache.
//!
//! This module implements a simple answer cache provided as a pass through
//! executor. It works with any of the other executors.
//!
//! The query name, class, and type of a query are used as the key. When a
//! successful response to a query arrives, the records of its answer
//! section are stored under this key. A later query with the same key is
//! answered from the cache for as long as the records are valid, with the
//! TTL values of the records reduced by the amount of time they have been
//! cached.
//!
//! How long an entry is valid is determined by the smallest TTL of its
//! records, capped by the configured maximum validity. Entries are only
//! removed once they have expired and are looked up again or when the cache
//! runs out of space.
//!
//! Only successful answers are cached. Errors, responses with a response
//! code other than NOERROR, responses with an empty answer section, and
//! responses that have a record with a TTL of zero are passed on but not
//! stored. Truncated responses are not stored either unless the [Config]
//! says otherwise.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::iana::{Class, Opcode, Rcode};
use crate::base::message::Message;
use crate::base::query::{Query, QueryKey};
use crate::base::record::{Record, Ttl};
use crate::net::client::clock::{Clock, Elapsed, SystemClock};
use crate::net::client::request::{Error, Executor, QueryFuture};
use crate::utils::config::DefMinMax;
use moka::future::Cache;
use std::boxed::Box;
use std::cmp::min;
use std::fmt::Debug;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use std::vec::Vec;
use tracing::{debug, trace};

//------------ Configuration Constants ----------------------------------------

/// Configuration limit for the maximum number of entries in the cache.
const MAX_CACHE_ENTRIES: DefMinMax<u64> =
    DefMinMax::new(1_000, 1, 1_000_000_000);

/// Limit on the maximum time a cache entry is considered valid.
///
/// According to [RFC 8767](https://www.rfc-editor.org/info/rfc8767) the
/// limit should be on the order of days to weeks with a recommended cap of
/// 604800 seconds (7 days).
const MAX_VALIDITY: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(604800),
    Duration::from_secs(60),
    Duration::from_secs(6048000),
);

//------------ Config ---------------------------------------------------------

/// Configuration of a cache.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of cache entries.
    max_cache_entries: u64,

    /// Maximum validity of a cached answer.
    max_validity: Duration,

    /// Whether truncated responses are cached.
    cache_truncated: bool,
}

impl Config {
    /// Creates a new config with default values.
    ///
    /// The default values are documented at the relevant set_* methods.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the maximum number of cache entries.
    pub fn max_cache_entries(&self) -> u64 {
        self.max_cache_entries
    }

    /// Set the maximum number of cache entries.
    ///
    /// The value has to be at least one, at most 1,000,000,000 and the
    /// default is 1000.
    ///
    /// The maximum is only used when creating a cache. Changing it on the
    /// config of an existing cache has no effect.
    pub fn set_max_cache_entries(&mut self, value: u64) {
        self.max_cache_entries = MAX_CACHE_ENTRIES.limit(value)
    }

    /// Returns the maximum validity of a cached answer.
    pub fn max_validity(&self) -> Duration {
        self.max_validity
    }

    /// Set the maximum time a cache entry is considered valid.
    ///
    /// The value has to be at least 60 seconds, at most 6,048,000 seconds
    /// (10 weeks) and the default is 604800 seconds (one week).
    pub fn set_max_validity(&mut self, value: Duration) {
        self.max_validity = MAX_VALIDITY.limit(value)
    }

    /// Returns whether truncated responses are cached.
    pub fn cache_truncated(&self) -> bool {
        self.cache_truncated
    }

    /// Set whether truncated responses should be cached.
    ///
    /// The default is false.
    pub fn set_cache_truncated(&mut self, value: bool) {
        self.cache_truncated = value;
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cache_entries: MAX_CACHE_ENTRIES.default(),
            max_validity: MAX_VALIDITY.default(),
            cache_truncated: false,
        }
    }
}

//------------ Connection -----------------------------------------------------

/// An executor that caches answers from an upstream executor.
#[derive(Clone)]
pub struct Connection<Upstream, C: Clock + Send + Sync = SystemClock> {
    /// Upstream executor to use for queries.
    upstream: Upstream,

    /// The cache for this executor.
    cache: Cache<QueryKey, Arc<Value<C>>>,

    /// The configuration of this executor.
    config: Config,

    /// The clock to use for expiring cache entries.
    clock: C,
}

impl<Upstream: Executor> Connection<Upstream> {
    /// Creates a new cache with default configuration parameters.
    pub fn new(upstream: Upstream) -> Self {
        Self::with_config(upstream, Default::default())
    }

    /// Creates a new cache with specified configuration parameters.
    pub fn with_config(upstream: Upstream, config: Config) -> Self {
        Self::with_clock(upstream, SystemClock::new(), config)
    }
}

impl<Upstream, C> Connection<Upstream, C>
where
    Upstream: Executor,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new cache using the given clock.
    pub fn with_clock(upstream: Upstream, clock: C, config: Config) -> Self {
        Self {
            upstream,
            cache: Cache::new(config.max_cache_entries),
            config,
            clock,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Answers from the cache or asks upstream and stores the answer.
    async fn query_impl(
        &self,
        nameserver: SocketAddr,
        query: Query,
    ) -> Result<Message, Error> {
        if query.class() != Class::IN {
            // Anything other than a query on the Internet class
            // should not be cached.
            return self.upstream.query(nameserver, query).await;
        }

        let key = query.key();
        if let Some(value) = self.cache.get(&key).await {
            if let Some(answers) = value.get_answers() {
                trace!(%key, "cache hit");
                return Ok(Message::response_for_query(&query, answers));
            }
            debug!(%key, "cache entry expired");
            self.cache.invalidate(&key).await;
        } else {
            trace!(%key, "cache miss");
        }

        let response = self.upstream.query(nameserver, query).await?;
        if let Some(value) = Value::new(&response, &self.config, &self.clock)
        {
            debug!(%key, valid_for = ?value.valid_for, "storing answer");
            self.cache.insert(key, Arc::new(value)).await;
        }
        Ok(response)
    }
}

impl<Upstream, C> Executor for Connection<Upstream, C>
where
    Upstream: Executor,
    C: Clock + Send + Sync + 'static,
{
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        Box::pin(self.query_impl(nameserver, query))
    }
}

impl<Upstream: Debug, C: Clock + Debug + Send + Sync> Debug
    for Connection<Upstream, C>
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> Result<(), std::fmt::Error> {
        f.debug_struct("Connection")
            .field("upstream", &self.upstream)
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish()
    }
}

//------------ Value ----------------------------------------------------------

/// The value to be cached.
#[derive(Debug)]
struct Value<C>
where
    C: Clock + Send + Sync,
{
    /// Creation time of the cache entry.
    created_at: C::Instant,

    /// The amount time the cache entry is valid.
    valid_for: Duration,

    /// The cached answer records with normalized TTLs.
    answers: Vec<Record>,
}

impl<C> Value<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a new value from a response.
    ///
    /// Returns `None` if the response should not be cached.
    fn new(response: &Message, config: &Config, clock: &C) -> Option<Self> {
        let valid_for = validity(response, config)?;
        let answers = response
            .answers()
            .iter()
            .map(|record| {
                let mut record = record.clone();
                record.set_ttl(record.ttl().normalize());
                record
            })
            .collect();
        Some(Self {
            created_at: clock.now(),
            valid_for,
            answers,
        })
    }

    /// Returns the answers with decremented TTL values.
    ///
    /// Returns `None` if the value has expired.
    fn get_answers(&self) -> Option<Vec<Record>> {
        let elapsed = self.created_at.elapsed();
        if elapsed > self.valid_for {
            return None;
        }
        let secs = Ttl::from_secs(
            u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX),
        );
        Some(
            self.answers
                .iter()
                .map(|record| {
                    let mut record = record.clone();
                    record.set_ttl(record.ttl().saturating_sub(secs));
                    record
                })
                .collect(),
        )
    }
}

//------------ Utility functions ----------------------------------------------

/// Computes how long a response can be cached.
///
/// Returns `None` if it cannot be cached at all.
fn validity(response: &Message, config: &Config) -> Option<Duration> {
    let header = response.header();
    if header.opcode() != Opcode::QUERY || header.rcode() != Rcode::NOERROR {
        return None;
    }
    if header.tc() && !config.cache_truncated {
        return None;
    }
    match response.first_question() {
        Some(question) if question.qclass() == Class::IN => {}
        _ => return None,
    }
    let ttl = response.min_answer_ttl()?;
    if ttl.is_zero() {
        return None;
    }
    Some(min(ttl.into_duration(), config.max_validity))
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::iana::Rtype;
    use crate::base::name::Dname;
    use crate::base::rdata::RecordData;
    use crate::net::client::clock::FakeClock;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers with a fixed set of records and counts the calls.
    struct Answer {
        ttls: Vec<u32>,
        truncated: bool,
        rcode: Rcode,
        calls: AtomicUsize,
    }

    impl Answer {
        fn new(ttls: &[u32]) -> Self {
            Answer {
                ttls: ttls.into(),
                truncated: false,
                rcode: Rcode::NOERROR,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Executor for Answer {
        fn query(&self, _: SocketAddr, query: Query) -> QueryFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answers = self
                .ttls
                .iter()
                .enumerate()
                .map(|(i, ttl)| {
                    Record::new(
                        query.name().clone(),
                        query.class(),
                        Ttl::from_secs(*ttl),
                        RecordData::A([192, 0, 2, i as u8].into()),
                    )
                })
                .collect();
            let mut response = Message::response_for_query(&query, answers);
            response.header_mut().set_tc(self.truncated);
            response.header_mut().set_rcode(self.rcode);
            Box::pin(async move { Ok(response) })
        }
    }

    fn query(name: &str) -> Query {
        Query::new_in(Dname::from_str(name).unwrap(), Rtype::A)
    }

    fn addr() -> SocketAddr {
        "192.0.2.53:53".parse().unwrap()
    }

    fn cached(
        upstream: Answer,
        config: Config,
    ) -> (Connection<Answer, FakeClock>, FakeClock) {
        let clock = FakeClock::new();
        (Connection::with_clock(upstream, clock.clone(), config), clock)
    }

    #[test]
    fn config_limits() {
        let mut config = Config::new();
        assert_eq!(config.max_cache_entries(), 1000);
        assert_eq!(config.max_validity(), Duration::from_secs(604800));
        assert!(!config.cache_truncated());
        config.set_max_cache_entries(0);
        config.set_max_validity(Duration::from_secs(1));
        assert_eq!(config.max_cache_entries(), 1);
        assert_eq!(config.max_validity(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn hit_decrements_ttl() {
        let (conn, clock) = cached(Answer::new(&[300, 120]), Config::new());
        conn.query(addr(), query("example.com")).await.unwrap();
        clock.adjust_time(Duration::from_millis(30_500));

        // Case of the name does not matter.
        let q = query("EXAMPLE.com").with_id(99);
        let answer = conn.query(addr(), q).await.unwrap();
        assert_eq!(conn.upstream.calls(), 1);
        assert_eq!(answer.header().id(), 99);
        let ttls: Vec<_> =
            answer.answers().iter().map(|r| r.ttl().as_secs()).collect();
        assert_eq!(ttls, [270, 90]);
    }

    #[tokio::test]
    async fn expires_after_min_ttl() {
        let (conn, clock) = cached(Answer::new(&[300, 60]), Config::new());
        conn.query(addr(), query("example.com")).await.unwrap();
        clock.adjust_time(Duration::from_secs(60));
        conn.query(addr(), query("example.com")).await.unwrap();
        assert_eq!(conn.upstream.calls(), 1);
        clock.adjust_time(Duration::from_secs(1));
        conn.query(addr(), query("example.com")).await.unwrap();
        assert_eq!(conn.upstream.calls(), 2);
    }

    #[tokio::test]
    async fn max_validity_caps() {
        let mut config = Config::new();
        config.set_max_validity(Duration::from_secs(100));
        let (conn, clock) = cached(Answer::new(&[86400]), config);
        conn.query(addr(), query("example.com")).await.unwrap();
        clock.adjust_time(Duration::from_secs(101));
        conn.query(addr(), query("example.com")).await.unwrap();
        assert_eq!(conn.upstream.calls(), 2);
    }

    #[tokio::test]
    async fn zero_ttl_not_cached() {
        let (conn, _) = cached(Answer::new(&[300, 0]), Config::new());
        conn.query(addr(), query("example.com")).await.unwrap();
        conn.query(addr(), query("example.com")).await.unwrap();
        assert_eq!(conn.upstream.calls(), 2);
    }

    #[tokio::test]
    async fn empty_answer_not_cached() {
        let (conn, _) = cached(Answer::new(&[]), Config::new());
        conn.query(addr(), query("example.com")).await.unwrap();
        conn.query(addr(), query("example.com")).await.unwrap();
        assert_eq!(conn.upstream.calls(), 2);
    }

    #[tokio::test]
    async fn error_rcode_not_cached() {
        let mut upstream = Answer::new(&[300]);
        upstream.rcode = Rcode::SERVFAIL;
        let (conn, _) = cached(upstream, Config::new());
        conn.query(addr(), query("example.com")).await.unwrap();
        conn.query(addr(), query("example.com")).await.unwrap();
        assert_eq!(conn.upstream.calls(), 2);
    }

    #[tokio::test]
    async fn truncated() {
        let mut upstream = Answer::new(&[300]);
        upstream.truncated = true;
        let (conn, _) = cached(upstream, Config::new());
        conn.query(addr(), query("example.com")).await.unwrap();
        conn.query(addr(), query("example.com")).await.unwrap();
        assert_eq!(conn.upstream.calls(), 2);

        let mut upstream = Answer::new(&[300]);
        upstream.truncated = true;
        let mut config = Config::new();
        config.set_cache_truncated(true);
        let (conn, _) = cached(upstream, config);
        conn.query(addr(), query("example.com")).await.unwrap();
        conn.query(addr(), query("example.com")).await.unwrap();
        assert_eq!(conn.upstream.calls(), 1);
    }

    #[tokio::test]
    async fn other_class_forwarded() {
        let (conn, _) = cached(Answer::new(&[300]), Config::new());
        let q = Query::new(
            Dname::from_str("version.bind").unwrap(),
            Rtype::TXT,
            Class::CH,
        );
        conn.query(addr(), q.clone()).await.unwrap();
        conn.query(addr(), q).await.unwrap();
        assert_eq!(conn.upstream.calls(), 2);
    }

    #[tokio::test]
    async fn distinct_types() {
        let (conn, _) = cached(Answer::new(&[300]), Config::new());
        conn.query(addr(), query("example.com")).await.unwrap();
        let q =
            Query::new_in(Dname::from_str("example.com").unwrap(), Rtype::MX);
        conn.query(addr(), q).await.unwrap();
        assert_eq!(conn.upstream.calls(), 2);
    }
}
