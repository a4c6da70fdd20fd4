//! A datagram transport that falls back to a stream if the reply is
//! truncated.
//!
//! The query is first sent via the datagram executor. If its response has
//! the TC bit set, the same question is asked once more with a new message
//! ID via the stream executor and that result is returned with the ID of
//! the original query. The truncated response is discarded.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::message::Message;
use crate::base::query::Query;
use crate::net::client::protocol::UdpConnect;
use crate::net::client::request::{Error, Executor, QueryFuture};
use crate::net::client::{dgram, stream};
use std::boxed::Box;
use std::net::SocketAddr;
use tracing::debug;

//------------ Connection -----------------------------------------------------

/// An executor asking via datagram first and via stream if truncated.
#[derive(Clone, Debug)]
pub struct Connection<D = dgram::Connection, S = stream::Connection> {
    /// The datagram executor used first.
    dgram: D,

    /// The stream executor used for truncated responses.
    stream: S,
}

impl Connection {
    /// Creates a new UDP with TCP fallback executor.
    pub fn udp_tcp() -> Self {
        Self::udp_tcp_with_config(Default::default())
    }

    /// Creates a new UDP with TCP fallback executor using a UDP config.
    pub fn udp_tcp_with_config(config: dgram::Config) -> Self {
        Self::new(
            dgram::Connection::with_config(UdpConnect::new(), config),
            stream::Connection::tcp(),
        )
    }
}

impl<D: Executor, S: Executor> Connection<D, S> {
    /// Creates a new executor from a datagram and a stream executor.
    pub fn new(dgram: D, stream: S) -> Self {
        Self { dgram, stream }
    }

    /// Sends the query, falling back to the stream on truncation.
    async fn query_impl(
        &self,
        nameserver: SocketAddr,
        query: Query,
    ) -> Result<Message, Error> {
        let response = self.dgram.query(nameserver, query.clone()).await?;
        if !response.header().tc() {
            return Ok(response);
        }
        debug!(
            %query, %nameserver,
            "response truncated, retrying over stream"
        );
        let mut answer =
            self.stream.query(nameserver, query.with_random_id()).await?;
        answer.header_mut().set_id(query.id());
        Ok(answer)
    }
}

impl<D: Executor, S: Executor> Executor for Connection<D, S> {
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        Box::pin(self.query_impl(nameserver, query))
    }
}

//============ Testing =======================================================
