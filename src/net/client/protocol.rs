//! Underlying transport protocols.
//!
//! The transport executors don’t open sockets themselves. They use a
//! connector implementing [`AsyncConnect`] that creates a fresh connection
//! to a given server for each query. This allows replacing the network with
//! something else in tests.

use core::future::Future;
use core::pin::Pin;
use std::boxed::Box;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::vec::Vec;
use tokio::net::{TcpStream, UdpSocket};
use tracing::trace;

/// How many times do we try a new random port if we get ‘address in use.’
const RETRY_RANDOM_PORT: usize = 10;

//------------ AsyncConnect --------------------------------------------------

/// Establish a connection asynchronously.
pub trait AsyncConnect {
    /// The type of an established connection.
    type Connection;

    /// The future establishing the connection.
    type Fut: Future<Output = Result<Self::Connection, io::Error>> + Send;

    /// Returns a future that establishing a connection to `addr`.
    fn connect(&self, addr: SocketAddr) -> Self::Fut;
}

//------------ TcpConnect --------------------------------------------------

/// Create new TCP connections.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpConnect;

impl TcpConnect {
    /// Create new TCP connections.
    pub fn new() -> Self {
        Self
    }
}

impl AsyncConnect for TcpConnect {
    type Connection = TcpStream;
    type Fut = Pin<
        Box<
            dyn Future<Output = Result<Self::Connection, std::io::Error>>
                + Send,
        >,
    >;

    fn connect(&self, addr: SocketAddr) -> Self::Fut {
        Box::pin(TcpStream::connect(addr))
    }
}

//------------ AsyncDgramRecv -------------------------------------------------

/// Receive a datagram packets asynchronously.
pub trait AsyncDgramRecv {
    /// The future receiving a single datagram.
    type Fut: Future<Output = Result<Vec<u8>, io::Error>> + Send;

    /// Receive a datagram into `buf`.
    ///
    /// The returned buffer is truncated to the length of the datagram.
    fn recv(&self, buf: Vec<u8>) -> Self::Fut;
}

//------------ AsyncDgramSend -------------------------------------------------

/// Send a datagram packet asynchronously.
pub trait AsyncDgramSend {
    /// The future sending a single datagram.
    type Fut: Future<Output = Result<usize, io::Error>> + Send;

    /// Send a datagram packet, returning the number of octets sent.
    fn send(&self, buf: &[u8]) -> Self::Fut;
}

//------------ UdpConnect --------------------------------------------------

/// Create new UDP sockets connected to a server.
///
/// Every call to `connect` binds a new socket to a random local port.
#[derive(Clone, Copy, Debug, Default)]
pub struct UdpConnect;

impl UdpConnect {
    /// Create new UDP connections.
    pub fn new() -> Self {
        Self
    }
}

impl AsyncConnect for UdpConnect {
    type Connection = UdpDgram;
    type Fut = Pin<
        Box<
            dyn Future<Output = Result<Self::Connection, std::io::Error>>
                + Send,
        >,
    >;

    fn connect(&self, addr: SocketAddr) -> Self::Fut {
        Box::pin(UdpDgram::new(addr))
    }
}

/// A single UDP socket connected to a server.
///
/// The socket is closed when the value is dropped.
#[derive(Clone, Debug)]
pub struct UdpDgram {
    /// Underlying UDP socket.
    sock: Arc<UdpSocket>,
}

impl UdpDgram {
    /// Creates a new socket connected to `addr`.
    async fn new(addr: SocketAddr) -> Result<Self, io::Error> {
        let sock = Self::udp_bind(addr.is_ipv4()).await?;
        sock.connect(addr).await?;
        Ok(Self {
            sock: Arc::new(sock),
        })
    }

    /// Bind to a random local UDP port.
    async fn udp_bind(v4: bool) -> Result<UdpSocket, io::Error> {
        let mut i = 0;
        loop {
            let local: SocketAddr = if v4 {
                ([0u8; 4], 0).into()
            } else {
                ([0u16; 8], 0).into()
            };
            match UdpSocket::bind(&local).await {
                Ok(sock) => return Ok(sock),
                Err(err) => {
                    if i == RETRY_RANDOM_PORT
                        || err.kind() != io::ErrorKind::AddrInUse
                    {
                        return Err(err);
                    } else {
                        trace!("local port in use, trying another one");
                        i += 1
                    }
                }
            }
        }
    }
}

impl AsyncDgramRecv for UdpDgram {
    type Fut =
        Pin<Box<dyn Future<Output = Result<Vec<u8>, io::Error>> + Send>>;
    fn recv(&self, mut buf: Vec<u8>) -> Self::Fut {
        let sock = self.sock.clone();
        Box::pin(async move {
            let len = sock.recv(&mut buf).await?;
            buf.truncate(len);
            Ok(buf)
        })
    }
}

impl AsyncDgramSend for UdpDgram {
    type Fut = Pin<Box<dyn Future<Output = Result<usize, io::Error>> + Send>>;
    fn send(&self, buf: &[u8]) -> Self::Fut {
        let sock = self.sock.clone();
        let buf = buf.to_vec();
        Box::pin(async move { sock.send(&buf).await })
    }
}
