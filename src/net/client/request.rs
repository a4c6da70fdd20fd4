//! The trait shared by all query executors.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::message::Message;
use crate::base::query::Query;
use std::boxed::Box;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

pub use super::error::Error;

/// The future returned by [`Executor::query`].
pub type QueryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Message, Error>> + Send + 'a>>;

/// Trait for executing a single DNS query.
///
/// Transports and decorators alike implement this trait, so that they can
/// be stacked freely. A decorator owns its upstream executor and forwards
/// queries to it.
pub trait Executor: Send + Sync {
    /// Sends `query` to `nameserver` and resolves into the response.
    ///
    /// The returned future yields exactly one result. Dropping it before
    /// it has resolved cancels the query. This releases all resources held
    /// for the query, in particular open sockets, and makes sure that
    /// nothing is delivered afterwards.
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_>;
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        (**self).query(nameserver, query)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        (**self).query(nameserver, query)
    }
}

impl<'e, E: Executor + ?Sized> Executor for &'e E {
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        (**self).query(nameserver, query)
    }
}
