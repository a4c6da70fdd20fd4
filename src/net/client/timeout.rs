//! An executor limiting the time a query may take.
//!
//! The upstream query is raced against a timer. Whichever finishes first
//! wins and the other one is dropped right away. Dropping the upstream
//! query cancels it and releases its resources, so a timed out query never
//! delivers a late result.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::message::Message;
use crate::base::query::Query;
use crate::net::client::clock::{Timer, TokioTimer};
use crate::net::client::request::{Error, Executor, QueryFuture};
use crate::utils::config::DefMinMax;
use std::boxed::Box;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

//------------ Configuration Constants ----------------------------------------

/// Configuration limits for the timeout.
const TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(5),
    Duration::from_millis(1),
    Duration::from_secs(60),
);

//------------ Config ---------------------------------------------------------

/// Configuration of a timeout executor.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// The maximum time a query may take.
    timeout: Duration,
}

impl Config {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sets the timeout.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_timeout(&mut self, value: Duration) {
        self.timeout = TIMEOUT.limit(value)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: TIMEOUT.default(),
        }
    }
}

//------------ Connection -----------------------------------------------------

/// An executor failing queries that take too long.
#[derive(Clone, Debug)]
pub struct Connection<Upstream, T = TokioTimer> {
    /// The executor doing the actual work.
    upstream: Upstream,

    /// Creates the timer for each query.
    timer: T,

    /// The configuration.
    config: Config,
}

impl<Upstream: Executor> Connection<Upstream> {
    /// Creates a new executor with the default timeout.
    pub fn new(upstream: Upstream) -> Self {
        Self::with_config(upstream, Default::default())
    }

    /// Creates a new executor with the given configuration.
    pub fn with_config(upstream: Upstream, config: Config) -> Self {
        Self::with_timer(upstream, config, TokioTimer)
    }
}

impl<Upstream: Executor, T: Timer> Connection<Upstream, T> {
    /// Creates a new executor using the given timer.
    pub fn with_timer(upstream: Upstream, config: Config, timer: T) -> Self {
        Self {
            upstream,
            timer,
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Races the upstream query against the timer.
    async fn query_impl(
        &self,
        nameserver: SocketAddr,
        query: Query,
    ) -> Result<Message, Error> {
        let name = query.name().clone();
        let sleep = self.timer.sleep(self.config.timeout);
        let upstream = self.upstream.query(nameserver, query);
        tokio::select! {
            biased;
            res = upstream => res,
            _ = sleep => {
                debug!(
                    %name,
                    timeout = ?self.config.timeout,
                    "query timed out"
                );
                Err(Error::Timeout(name))
            }
        }
    }
}

impl<Upstream: Executor, T: Timer> Executor for Connection<Upstream, T> {
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        Box::pin(self.query_impl(nameserver, query))
    }
}

//============ Testing =======================================================
