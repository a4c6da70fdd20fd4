//! A DNS over octet stream transport.
//!
//! Each query opens a new connection to the name server, writes the query
//! preceded by its length as a two octet value, reads exactly one response
//! framed the same way, and closes the connection again.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::message::Message;
use crate::base::query::Query;
use crate::base::wire::ComposeError;
use crate::net::client::protocol::{AsyncConnect, TcpConnect};
use crate::net::client::request::{Error, Executor, QueryFuture};
use bytes::{BufMut, BytesMut};
use std::boxed::Box;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

//------------ Connection -----------------------------------------------------

/// A stream transport.
#[derive(Clone, Debug, Default)]
pub struct Connection<S = TcpConnect> {
    /// Creates the stream connections.
    connect: S,
}

impl Connection<TcpConnect> {
    /// Creates a new TCP transport.
    pub fn tcp() -> Self {
        Self::new(TcpConnect::new())
    }
}

impl<S, C> Connection<S>
where
    S: AsyncConnect<Connection = C> + Send + Sync + 'static,
    C: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Creates a new stream transport.
    pub fn new(connect: S) -> Self {
        Self { connect }
    }

    /// Performs a single exchange over a new connection.
    async fn query_impl(
        &self,
        nameserver: SocketAddr,
        query: Query,
    ) -> Result<Message, Error> {
        let mut sock = self
            .connect
            .connect(nameserver)
            .await
            .map_err(|e| Error::StreamConnect(Arc::new(e)))?;

        let msg = query.to_vec();
        let mut buf = BytesMut::with_capacity(msg.len() + 2);
        let len =
            u16::try_from(msg.len()).map_err(|_| ComposeError::LongData)?;
        buf.put_u16(len);
        buf.put_slice(&msg);
        sock.write_all(&buf)
            .await
            .map_err(|e| Error::StreamWrite(Arc::new(e)))?;

        let reply = Self::read_message(&mut sock).await?;
        trace!(len = reply.len(), "received response over stream");

        let answer = Message::from_octets(&reply)?;
        if !answer.is_response_to(&query) {
            return Err(Error::WrongReplyForQuery);
        }
        Ok(answer)
    }

    /// Reads a single length-prefixed message.
    ///
    /// Reading has to be done in two steps: first read a two octet value
    /// the specifies the length of the message, and then read in a loop the
    /// body of the message.
    async fn read_message(sock: &mut C) -> Result<BytesMut, Error> {
        let len = match sock.read_u16().await {
            Ok(len) => usize::from(len),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(Error::StreamUnexpectedEndOfData)
            }
            Err(err) => return Err(Error::StreamRead(Arc::new(err))),
        };

        let mut buf = BytesMut::with_capacity(len);
        while buf.len() < len {
            // Only read what belongs to this message.
            let mut limited = (&mut *sock).take((len - buf.len()) as u64);
            match limited.read_buf(&mut buf).await {
                Ok(0) => return Err(Error::StreamUnexpectedEndOfData),
                Ok(_) => {}
                Err(err) => return Err(Error::StreamRead(Arc::new(err))),
            }
        }
        Ok(buf)
    }
}

impl<S, C> Executor for Connection<S>
where
    S: AsyncConnect<Connection = C> + Send + Sync + 'static,
    C: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        Box::pin(self.query_impl(nameserver, query))
    }
}

//============ Testing =======================================================
