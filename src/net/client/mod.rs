//! Sending queries and receiving responses.
//!
//! This module provides query executors: types that take a [`Query`] and
//! the address of a name server and produce the response [`Message`]. All
//! of them implement the [Executor][request::Executor] trait.
//!
//! Some executors are transports that talk to the network:
//!
//! * [dgram] sends queries over UDP, using a new socket for each query,
//! * [stream] sends queries over TCP, using a new connection for each
//!   query, and
//! * [dgram_stream] combines the two, asking over UDP first and repeating
//!   the query over TCP if the UDP response was truncated.
//!
//! Others are decorators that wrap another executor, the *upstream*, and
//! add functionality to it:
//!
//! * [timeout] fails queries that take too long,
//! * [retry] repeats queries that failed with a timeout or a transport
//!   error,
//! * [cache] answers repeated queries from a cache,
//! * [coop] merges identical queries that are in flight at the same time,
//! * [hosts] answers queries for names in a hosts table, and
//! * [cancel] allows cancelling queries through a token.
//!
//! Since decorators are executors themselves, they can be stacked in any
//! order. The [chain] module builds the usual stack.
//!
//! # Cancellation
//!
//! The future returned by an executor can be dropped at any time. This
//! cancels the query: all futures of the decorators below are dropped as
//! well, down to the socket, which is closed. A query never delivers a
//! result after it has been cancelled.
//!
//! # Example
//!
//! ```no_run
//! use dnsquery::base::{Dname, Query, Rtype};
//! use dnsquery::net::client::request::Executor;
//! use dnsquery::net::client::{dgram_stream, retry, timeout};
//! use std::str::FromStr;
//! use std::time::Duration;
//!
//! # async fn _test() {
//! let mut config = timeout::Config::new();
//! config.set_timeout(Duration::from_secs(2));
//! let executor = retry::Connection::new(
//!     timeout::Connection::with_config(
//!         dgram_stream::Connection::udp_tcp(),
//!         config,
//!     )
//! );
//! let query = Query::new_in(
//!     Dname::from_str("example.com").unwrap(), Rtype::AAAA
//! );
//! let reply = executor.query("127.0.0.1:53".parse().unwrap(), query).await;
//! # }
//! ```
//!
//! [`Query`]: crate::base::Query
//! [`Message`]: crate::base::Message

#![warn(missing_docs)]

pub mod cache;
pub mod cancel;
pub mod chain;
pub mod clock;
pub mod coop;
pub mod dgram;
pub mod dgram_stream;
pub mod error;
pub mod hosts;
pub mod protocol;
pub mod request;
pub mod retry;
pub mod stream;
pub mod timeout;
