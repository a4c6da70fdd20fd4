//! Assembling the standard stack of executors.
//!
//! The executors in this crate can be stacked in any order. The usual stack
//! for a stub resolver, from the caller down to the network, is:
//!
//! 1. a [hosts][super::hosts] table answering for local names,
//! 2. a [cache][super::cache],
//! 3. [merging][super::coop] of identical queries in flight,
//! 4. [retries][super::retry] on timeouts and transport errors,
//! 5. a [timeout][super::timeout] for each attempt, and
//! 6. [UDP with TCP fallback][super::dgram_stream] on truncation.
//!
//! [`build`] creates this stack from a [`ChainConfig`]. The hosts table and
//! the cache are optional.
//!
//! ```no_run
//! use dnsquery::base::{Dname, Query, Rtype};
//! use dnsquery::net::client::chain::{self, ChainConfig};
//! use dnsquery::net::client::request::Executor;
//! use std::str::FromStr;
//!
//! # async fn f() {
//! let executor = chain::build(ChainConfig::new());
//! let name = Dname::from_str("example.com").unwrap();
//! let query = Query::new_in(name, Rtype::A);
//! let answer = executor.query("192.0.2.53:53".parse().unwrap(), query).await;
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::net::client::hosts::Hosts;
use crate::net::client::request::Executor;
use crate::net::client::{
    cache, coop, dgram, dgram_stream, hosts, retry, timeout,
};
use std::boxed::Box;
use std::time::Duration;

//------------ ChainConfig ----------------------------------------------------

/// Configuration of the standard stack of executors.
#[derive(Clone, Debug)]
pub struct ChainConfig {
    /// The hosts table, if any.
    hosts: Option<Hosts>,

    /// The cache configuration if caching is enabled.
    cache: Option<cache::Config>,

    /// The retry configuration.
    retry: retry::Config,

    /// The timeout configuration.
    timeout: timeout::Config,

    /// The configuration of the UDP transport.
    dgram: dgram::Config,
}

impl ChainConfig {
    /// Creates a new config with default values.
    ///
    /// By default, there is no hosts table and the cache is enabled.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the hosts table.
    pub fn hosts(&self) -> Option<&Hosts> {
        self.hosts.as_ref()
    }

    /// Sets the hosts table.
    pub fn set_hosts(&mut self, hosts: Option<Hosts>) {
        self.hosts = hosts
    }

    /// Returns the cache configuration if caching is enabled.
    pub fn cache(&self) -> Option<&cache::Config> {
        self.cache.as_ref()
    }

    /// Sets the cache configuration or disables caching.
    pub fn set_cache(&mut self, cache: Option<cache::Config>) {
        self.cache = cache
    }

    /// Returns the number of retries.
    pub fn retries(&self) -> u8 {
        self.retry.retries()
    }

    /// Sets the number of retries.
    pub fn set_retries(&mut self, value: u8) {
        self.retry.set_retries(value)
    }

    /// Returns the timeout of each attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout.timeout()
    }

    /// Sets the timeout of each attempt.
    pub fn set_timeout(&mut self, value: Duration) {
        self.timeout.set_timeout(value)
    }

    /// Returns the configuration of the UDP transport.
    pub fn dgram(&self) -> &dgram::Config {
        &self.dgram
    }

    /// Sets the configuration of the UDP transport.
    pub fn set_dgram(&mut self, dgram: dgram::Config) {
        self.dgram = dgram
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            hosts: None,
            cache: Some(Default::default()),
            retry: Default::default(),
            timeout: Default::default(),
            dgram: Default::default(),
        }
    }
}

//------------ build ----------------------------------------------------------

/// Builds the standard stack of executors.
pub fn build(config: ChainConfig) -> Box<dyn Executor> {
    let transport =
        dgram_stream::Connection::udp_tcp_with_config(config.dgram);
    let transport =
        timeout::Connection::with_config(transport, config.timeout);
    let transport = retry::Connection::with_config(transport, config.retry);
    let mut executor: Box<dyn Executor> =
        Box::new(coop::Connection::new(transport));
    if let Some(cache) = config.cache {
        executor = Box::new(cache::Connection::with_config(executor, cache));
    }
    if let Some(hosts) = config.hosts {
        executor = Box::new(hosts::Connection::new(hosts, executor));
    }
    executor
}

//============ Testing =======================================================
