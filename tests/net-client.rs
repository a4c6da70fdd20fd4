#![cfg(feature = "net")]
mod common;

use crate::common::{
    a_record, init_logging, name, query_a, unused_ns, Fixed, Never,
};
use dnsquery::base::{Message, Query, Ttl};
use dnsquery::net::client::cancel::Cancellable;
use dnsquery::net::client::chain::{self, ChainConfig};
use dnsquery::net::client::clock::{Sleep, Timer};
use dnsquery::net::client::hosts::{self, Hosts};
use dnsquery::net::client::request::{Error, Executor};
use dnsquery::net::client::{
    coop, dgram, dgram_stream, retry, stream, timeout,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

//------------ Test Servers --------------------------------------------------

/// Returns the query contained in a request.
fn query_of(request: &Message) -> Query {
    let question = request.first_question().unwrap();
    Query::new(question.qname().clone(), question.qtype(), question.qclass())
        .with_id(request.header().id())
}

/// Returns the usual answer for a request.
fn answer_for(request: &Message, truncated: bool) -> Message {
    let query = query_of(request);
    let mut response = if truncated {
        Message::response_for_query(&query, Vec::new())
    } else {
        Message::response_for_query(
            &query,
            vec![a_record("example.com", 300, Ipv4Addr::new(192, 0, 2, 1))],
        )
    };
    response.header_mut().set_tc(truncated);
    response
}

/// Starts a UDP server on `sock` answering requests via `respond`.
///
/// Every datagram returned by `respond` is sent back in order. The
/// server counts the requests it receives.
fn serve_udp<F>(sock: UdpSocket, respond: F) -> Arc<AtomicUsize>
where
    F: Fn(&Message) -> Vec<Vec<u8>> + Send + 'static,
{
    let count = Arc::new(AtomicUsize::new(0));
    let res = count.clone();
    tokio::spawn(async move {
        let mut buf = vec![0; 512];
        loop {
            let (len, peer) = sock.recv_from(&mut buf).await.unwrap();
            count.fetch_add(1, Ordering::SeqCst);
            let request = Message::from_octets(&buf[..len]).unwrap();
            for dgram in respond(&request) {
                sock.send_to(&dgram, peer).await.unwrap();
            }
        }
    });
    res
}

async fn udp_server<F>(respond: F) -> (SocketAddr, Arc<AtomicUsize>)
where
    F: Fn(&Message) -> Vec<Vec<u8>> + Send + 'static,
{
    let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = sock.local_addr().unwrap();
    (addr, serve_udp(sock, respond))
}

/// Starts a TCP server answering one request per connection.
fn serve_tcp(listener: TcpListener) {
    tokio::spawn(async move {
        loop {
            let (mut sock, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let len = sock.read_u16().await.unwrap();
                let mut buf = vec![0; usize::from(len)];
                sock.read_exact(&mut buf).await.unwrap();
                let request = Message::from_octets(&buf).unwrap();
                let response =
                    answer_for(&request, false).to_compressed_vec().unwrap();
                sock.write_u16(response.len() as u16).await.unwrap();
                sock.write_all(&response).await.unwrap();
            });
        }
    });
}

//------------ Transports ----------------------------------------------------

#[tokio::test]
async fn udp_ignores_unrelated_datagrams() {
    init_logging();
    let (addr, _) = udp_server(|request| {
        let mut wrong = answer_for(request, false);
        wrong.header_mut().set_id(request.header().id().wrapping_add(1));
        vec![
            b"\x01\x02\x03".to_vec(),
            wrong.to_vec().unwrap(),
            answer_for(request, false).to_compressed_vec().unwrap(),
        ]
    })
    .await;

    let query = query_a("example.com").with_id(4711);
    let answer = dgram::Connection::udp().query(addr, query).await.unwrap();
    assert_eq!(answer.header().id(), 4711);
    assert!(answer.header().qr());
    assert_eq!(answer.answers().len(), 1);
    assert_eq!(answer.answers()[0].ttl(), Ttl::from_secs(300));
}

#[tokio::test]
async fn udp_malformed_response() {
    init_logging();
    let (addr, _) = udp_server(|request| {
        // A header announcing one answer that isn’t there.
        let id = request.header().id().to_be_bytes();
        vec![vec![id[0], id[1], 0x81, 0x80, 0, 0, 0, 1, 0, 0, 0, 0]]
    })
    .await;

    let err = dgram::Connection::udp()
        .query(addr, query_a("example.com"))
        .await
        .unwrap_err();
    assert!(err.is_format());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn udp_keeps_truncated_response() {
    init_logging();
    let (addr, _) = udp_server(|request| {
        vec![answer_for(request, true).to_vec().unwrap()]
    })
    .await;

    let answer = dgram::Connection::udp()
        .query(addr, query_a("example.com"))
        .await
        .unwrap();
    assert!(answer.header().tc());
}

#[tokio::test]
async fn tcp_exchange() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    serve_tcp(listener);

    let query = query_a("example.com").with_id(17);
    let answer = stream::Connection::tcp().query(addr, query).await.unwrap();
    assert_eq!(answer.header().id(), 17);
    assert_eq!(answer.answers().len(), 1);
}

#[tokio::test]
async fn tcp_connect_refused() {
    init_logging();
    // Grab a free port and close it again.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = stream::Connection::tcp()
        .query(addr, query_a("example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StreamConnect(_)));
}

#[tokio::test]
async fn udp_falls_back_to_tcp() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let sock = UdpSocket::bind(addr).await.unwrap();
    serve_tcp(listener);
    let udp_count = serve_udp(sock, |request| {
        vec![answer_for(request, true).to_vec().unwrap()]
    });

    let answer = dgram_stream::Connection::udp_tcp()
        .query(addr, query_a("example.com").with_id(4711))
        .await
        .unwrap();
    assert!(!answer.header().tc());
    assert_eq!(answer.header().id(), 4711);
    assert_eq!(answer.answers().len(), 1);
    assert_eq!(udp_count.load(Ordering::SeqCst), 1);
}

//------------ Decorators ----------------------------------------------------

#[tokio::test(start_paused = true)]
async fn timeout_fires() {
    init_logging();
    let never = Never::default();
    let counter = never.0.clone();
    let conn = timeout::Connection::new(never);

    let start = tokio::time::Instant::now();
    let err = conn.query(unused_ns(), query_a("igor.io")).await.unwrap_err();
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "DNS query for igor.io timed out");
    assert_eq!(counter.calls(), 1);
    assert_eq!(counter.drops(), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_passes_result() {
    init_logging();
    let conn = timeout::Connection::new(Fixed::new(vec![a_record(
        "example.com",
        60,
        Ipv4Addr::LOCALHOST,
    )]));
    let answer = conn
        .query(unused_ns(), query_a("example.com"))
        .await
        .unwrap();
    assert_eq!(answer.answers().len(), 1);
}

/// A timer counting the sleeps it created and the ones dropped again.
#[derive(Clone, Debug, Default)]
struct CountingTimer {
    created: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

/// Bumps the drop count of a sleep.
struct SleepGuard(Arc<AtomicUsize>);

impl Drop for SleepGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl Timer for CountingTimer {
    fn sleep(&self, duration: Duration) -> Sleep {
        self.created.fetch_add(1, Ordering::SeqCst);
        let guard = SleepGuard(self.dropped.clone());
        Box::pin(async move {
            let _guard = guard;
            tokio::time::sleep(duration).await
        })
    }
}

#[tokio::test(start_paused = true)]
async fn timer_dropped_when_query_wins() {
    init_logging();
    let timer = CountingTimer::default();
    let conn = timeout::Connection::with_timer(
        Fixed::new(vec![a_record("example.com", 60, Ipv4Addr::LOCALHOST)]),
        timeout::Config::new(),
        timer.clone(),
    );

    let start = tokio::time::Instant::now();
    let answer = conn
        .query(unused_ns(), query_a("example.com"))
        .await
        .unwrap();
    assert_eq!(answer.answers().len(), 1);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(timer.created.load(Ordering::SeqCst), 1);
    assert_eq!(timer.dropped.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn injected_timer_fires() {
    init_logging();
    let timer = CountingTimer::default();
    let never = Never::default();
    let counter = never.0.clone();
    let mut config = timeout::Config::new();
    config.set_timeout(Duration::from_millis(250));
    let conn = timeout::Connection::with_timer(never, config, timer.clone());

    let err = conn.query(unused_ns(), query_a("igor.io")).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(timer.created.load(Ordering::SeqCst), 1);
    assert_eq!(timer.dropped.load(Ordering::SeqCst), 1);
    assert_eq!(counter.drops(), 1);
}

#[tokio::test(start_paused = true)]
async fn outer_drop_cancels() {
    init_logging();
    let never = Never::default();
    let counter = never.0.clone();
    let conn = timeout::Connection::new(never);
    let res = tokio::time::timeout(
        Duration::from_secs(1),
        conn.query(unused_ns(), query_a("example.com")),
    )
    .await;
    assert!(res.is_err());
    assert_eq!(counter.drops(), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_budget() {
    init_logging();
    let never = Never::default();
    let counter = never.0.clone();
    let mut config = retry::Config::new();
    config.set_retries(2);
    let conn =
        retry::Connection::with_config(timeout::Connection::new(never), config);

    let err = conn
        .query(unused_ns(), query_a("example.com"))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(counter.calls(), 3);
    assert_eq!(counter.drops(), 3);
}

#[tokio::test]
async fn coop_merges_network_queries() {
    init_logging();
    let (addr, count) = udp_server(|request| {
        vec![answer_for(request, false).to_vec().unwrap()]
    })
    .await;
    let conn = coop::Connection::new(dgram::Connection::udp());

    let (a, b) = tokio::join!(
        conn.query(addr, query_a("example.com").with_id(1)),
        conn.query(addr, query_a("example.com").with_id(2)),
    );
    assert_eq!(a.unwrap().header().id(), 1);
    assert_eq!(b.unwrap().header().id(), 2);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(conn.pending_len(), 0);
}

#[tokio::test]
async fn hosts_shortcut() {
    init_logging();
    let fallback = Fixed::default();
    let counter = fallback.counter.clone();
    let conn = hosts::Connection::new(
        Hosts::parse_str("127.0.0.1 local.test\n"),
        fallback,
    );

    let answer = conn
        .query(unused_ns(), query_a("local.test"))
        .await
        .unwrap();
    assert_eq!(answer.answers().len(), 1);
    assert_eq!(answer.answers()[0].owner(), &name("local.test"));
    assert_eq!(answer.answers()[0].ttl(), Ttl::ZERO);
    assert_eq!(
        answer.answers()[0].data(),
        &dnsquery::base::RecordData::A(Ipv4Addr::LOCALHOST)
    );
    assert_eq!(counter.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_through_token() {
    init_logging();
    let never = Never::default();
    let counter = never.0.clone();
    let conn = Cancellable::new(never);
    let token = conn.token().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = conn
        .query(unused_ns(), query_a("example.com"))
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(counter.drops(), 1);
}

#[tokio::test]
async fn standard_chain() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let sock = UdpSocket::bind(addr).await.unwrap();
    serve_tcp(listener);
    let count = serve_udp(sock, |request| {
        vec![answer_for(request, false).to_vec().unwrap()]
    });

    let mut config = ChainConfig::new();
    config.set_hosts(Some(Hosts::parse_str("127.0.0.1 local.test\n")));
    let executor = chain::build(config);

    let first = executor.query(addr, query_a("example.com")).await.unwrap();
    let second = executor.query(addr, query_a("example.com")).await.unwrap();
    assert_eq!(first.answers().len(), 1);
    assert_eq!(second.answers().len(), 1);
    // The second answer came from the cache.
    assert_eq!(count.load(Ordering::SeqCst), 1);

    let local = executor.query(addr, query_a("local.test")).await.unwrap();
    assert_eq!(local.answers()[0].ttl(), Ttl::ZERO);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
