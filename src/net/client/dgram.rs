//! A DNS over datagram transport.
//!
//! Each query uses its own socket bound to a random local port and
//! connected to the name server. The query is sent exactly once. The
//! transport then waits for a response with the ID of the query, ignoring
//! all other packets that may arrive. It does not give up on its own: wrap
//! it in a [timeout][super::timeout] executor to limit the time spent
//! waiting.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::header::HeaderSection;
use crate::base::message::Message;
use crate::base::query::Query;
use crate::net::client::protocol::{
    AsyncConnect, AsyncDgramRecv, AsyncDgramSend, UdpConnect,
};
use crate::net::client::request::{Error, Executor, QueryFuture};
use crate::utils::config::DefMinMax;
use std::boxed::Box;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

//------------ Configuration Constants ----------------------------------------

/// Configuration limits for the maximum number of parallel requests.
const MAX_PARALLEL: DefMinMax<usize> = DefMinMax::new(100, 1, 1000);

/// Configuration limits for the size of the receive buffer.
const RECV_SIZE: DefMinMax<usize> = DefMinMax::new(4096, 512, 65535);

//------------ Config ---------------------------------------------------------

/// Configuration for a datagram transport.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of parallel requests for a transport.
    max_parallel: usize,

    /// Size of the buffer used for receiving responses.
    recv_size: usize,
}

impl Config {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the maximum number of parallel requests.
    ///
    /// Once this many number of requests are currently outstanding,
    /// additional requests will wait.
    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Sets the maximum number of parallel requests.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_max_parallel(&mut self, value: usize) {
        self.max_parallel = MAX_PARALLEL.limit(value)
    }

    /// Returns the size of the receive buffer.
    ///
    /// Datagrams longer than this are cut short by the operating system.
    pub fn recv_size(&self) -> usize {
        self.recv_size
    }

    /// Sets the size of the receive buffer.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_recv_size(&mut self, value: usize) {
        self.recv_size = RECV_SIZE.limit(value)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_parallel: MAX_PARALLEL.default(),
            recv_size: RECV_SIZE.default(),
        }
    }
}

//------------ Connection -----------------------------------------------------

/// A datagram transport.
#[derive(Clone, Debug)]
pub struct Connection<S = UdpConnect> {
    /// Reference to the actual connection object.
    inner: Arc<InnerConnection<S>>,
}

impl Connection<UdpConnect> {
    /// Creates a new UDP transport with default configuration.
    pub fn udp() -> Self {
        Self::new(UdpConnect::new())
    }
}

impl<S, C> Connection<S>
where
    S: AsyncConnect<Connection = C> + Send + Sync + 'static,
    C: AsyncDgramRecv + AsyncDgramSend + Send + Sync + 'static,
{
    /// Creates a new datagram transport with default configuration.
    pub fn new(connect: S) -> Self {
        Self::with_config(connect, Default::default())
    }

    /// Creates a new datagram transport with the given configuration.
    pub fn with_config(connect: S, config: Config) -> Self {
        Self {
            inner: Arc::new(InnerConnection {
                semaphore: Semaphore::new(config.max_parallel),
                config,
                connect,
            }),
        }
    }

    /// Sends the query and waits for the matching response.
    async fn query_impl(
        &self,
        nameserver: SocketAddr,
        query: Query,
    ) -> Result<Message, Error> {
        // We need to get past the semaphore that limits the
        // number of concurrent sockets we can use.
        let _permit = self
            .inner
            .semaphore
            .acquire()
            .await
            .expect("the semaphore has not been closed");

        let sock = self
            .inner
            .connect
            .connect(nameserver)
            .await
            .map_err(connect_error)?;

        let dgram = query.to_vec();
        let sent = sock
            .send(&dgram)
            .await
            .map_err(|e| Error::UdpSend(Arc::new(e)))?;
        if sent != dgram.len() {
            return Err(Error::UdpShortSend);
        }

        loop {
            let buf = sock
                .recv(vec![0; self.inner.config.recv_size])
                .await
                .map_err(|e| Error::UdpReceive(Arc::new(e)))?;

            let header = match HeaderSection::from_message_slice(&buf) {
                Ok(section) => section.header(),
                Err(_) => {
                    trace!(
                        len = buf.len(),
                        "ignoring datagram with unparseable header"
                    );
                    continue;
                }
            };
            if !header.qr() || header.id() != query.id() {
                trace!(
                    id = header.id(),
                    expected = query.id(),
                    "ignoring datagram for another query"
                );
                continue;
            }

            // From here on, the datagram is the response to our query and
            // a failure to parse it is an error.
            let answer = Message::from_octets(&buf)?;
            if !is_answer(&answer, &query) {
                trace!("ignoring response with mismatched question");
                continue;
            }
            if answer.header().tc() {
                debug!(%query, "received truncated response");
            }
            return Ok(answer);
        }
    }
}

impl<S, C> Executor for Connection<S>
where
    S: AsyncConnect<Connection = C> + Send + Sync + 'static,
    C: AsyncDgramRecv + AsyncDgramSend + Send + Sync + 'static,
{
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        Box::pin(self.query_impl(nameserver, query))
    }
}

//------------ InnerConnection ------------------------------------------------

/// Actual implementation of the datagram transport.
#[derive(Debug)]
struct InnerConnection<S> {
    /// User configuration variables.
    config: Config,

    /// Creates the datagram sockets.
    connect: S,

    /// Semaphore to limit access to UDP sockets.
    semaphore: Semaphore,
}

//------------ Utility --------------------------------------------------------

/// Checks whether a reply is an answer to the query.
///
/// A response without a question section is accepted since servers may
/// leave it out of truncated responses.
fn is_answer(answer: &Message, query: &Query) -> bool {
    match answer.first_question() {
        None => true,
        Some(question) => *question == query.question(),
    }
}

/// Converts an error from creating a socket.
fn connect_error(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::AddrInUse {
        Error::UdpBind(Arc::new(err))
    } else {
        Error::UdpConnect(Arc::new(err))
    }
}

//============ Testing =======================================================
