//! Cancelling queries through a token.
//!
//! Dropping the future of a query always cancels it. Sometimes the code
//! that wants to cancel a query is not the code awaiting it, though. For
//! these cases, a query can be bound to a [`CancellationToken`]. Once the
//! token is cancelled, the query is dropped and the caller receives
//! [`Error::Cancelled`].

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::message::Message;
use crate::base::query::Query;
use crate::net::client::request::{Error, Executor, QueryFuture};
use std::boxed::Box;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::debug;

//------------ cancellable ----------------------------------------------------

/// Binds a query future to a cancellation token.
///
/// If the token is cancelled before the query has finished, the query
/// future is dropped and the returned future resolves into
/// [`Error::Cancelled`]. If the token has already been cancelled, the
/// query is never polled.
pub fn cancellable(
    query: QueryFuture<'_>,
    token: CancellationToken,
) -> QueryFuture<'_> {
    Box::pin(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("query cancelled");
                Err(Error::Cancelled)
            }
            res = query => res,
        }
    })
}

//------------ Cancellable ----------------------------------------------------

/// An executor whose queries can all be cancelled through a token.
///
/// Cancelling the token cancels all queries in flight as well as all later
/// ones. Use a fresh token via [`set_token`][Self::set_token] to accept
/// queries again.
#[derive(Clone, Debug)]
pub struct Cancellable<Upstream> {
    /// The executor doing the actual work.
    upstream: Upstream,

    /// The token cancelling the queries.
    token: CancellationToken,
}

impl<Upstream: Executor> Cancellable<Upstream> {
    /// Creates a new executor with a new token.
    pub fn new(upstream: Upstream) -> Self {
        Self::with_token(upstream, CancellationToken::new())
    }

    /// Creates a new executor using the given token.
    pub fn with_token(upstream: Upstream, token: CancellationToken) -> Self {
        Self { upstream, token }
    }

    /// Returns the token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Replaces the token.
    pub fn set_token(&mut self, token: CancellationToken) {
        self.token = token
    }

    /// Cancels all queries in flight and all later ones.
    pub fn cancel(&self) {
        self.token.cancel()
    }

    /// Runs the query until it is done or the token is cancelled.
    async fn query_impl(
        &self,
        nameserver: SocketAddr,
        query: Query,
    ) -> Result<Message, Error> {
        let fut = self.upstream.query(nameserver, query);
        cancellable(fut, self.token.clone()).await
    }
}

impl<Upstream: Executor> Executor for Cancellable<Upstream> {
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        Box::pin(self.query_impl(nameserver, query))
    }
}

//============ Testing =======================================================
