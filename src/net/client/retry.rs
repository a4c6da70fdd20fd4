//! An executor retrying failed queries.
//!
//! If the upstream executor fails with a timeout or a transport error, the
//! query is sent again with a new message ID. All other errors, such as a
//! response that cannot be parsed, are returned right away. Once the retry
//! budget is used up, the error of the last attempt is returned.
//!
//! A successful response always carries the message ID of the original
//! query, even if it was received for a retry.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::message::Message;
use crate::base::query::Query;
use crate::net::client::request::{Error, Executor, QueryFuture};
use crate::utils::config::DefMinMax;
use std::boxed::Box;
use std::net::SocketAddr;
use tracing::debug;

//------------ Configuration Constants ----------------------------------------

/// Configuration limits for the number of retries.
const RETRIES: DefMinMax<u8> = DefMinMax::new(2, 0, 100);

//------------ Config ---------------------------------------------------------

/// Configuration of a retry executor.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// The number of additional attempts after the first one.
    retries: u8,
}

impl Config {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the number of retries.
    pub fn retries(&self) -> u8 {
        self.retries
    }

    /// Sets the number of retries.
    ///
    /// A value of zero means that a query is only ever tried once. If the
    /// value is too large, it will be caped.
    pub fn set_retries(&mut self, value: u8) {
        self.retries = RETRIES.limit(value)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retries: RETRIES.default(),
        }
    }
}

//------------ Connection -----------------------------------------------------

/// An executor re-issuing queries that failed transiently.
#[derive(Clone, Debug)]
pub struct Connection<Upstream> {
    /// The executor doing the actual work.
    upstream: Upstream,

    /// The configuration.
    config: Config,
}

impl<Upstream: Executor> Connection<Upstream> {
    /// Creates a new executor with the default number of retries.
    pub fn new(upstream: Upstream) -> Self {
        Self::with_config(upstream, Default::default())
    }

    /// Creates a new executor with the given configuration.
    pub fn with_config(upstream: Upstream, config: Config) -> Self {
        Self { upstream, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tries the query until it succeeds or the budget is used up.
    async fn query_impl(
        &self,
        nameserver: SocketAddr,
        query: Query,
    ) -> Result<Message, Error> {
        let id = query.id();
        let mut attempt = 0;
        let mut current = query;
        loop {
            let res = self.upstream.query(nameserver, current.clone()).await;
            let err = match res {
                Ok(mut answer) => {
                    // Restore the ID of the original query.
                    answer.header_mut().set_id(id);
                    return Ok(answer);
                }
                Err(err) => err,
            };
            if !err.is_transient() || attempt >= self.config.retries {
                return Err(err);
            }
            attempt += 1;
            current = current.with_random_id();
            debug!(
                query = %current,
                %nameserver,
                attempt,
                error = %err,
                "retrying query"
            );
        }
    }
}

impl<Upstream: Executor> Executor for Connection<Upstream> {
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        Box::pin(self.query_impl(nameserver, query))
    }
}

//============ Testing =======================================================
