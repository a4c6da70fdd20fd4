//! Answering queries from a hosts table.
//!
//! A [`Hosts`] table maps host names to addresses the way the hosts file
//! of a system does. The table can be built by hand or parsed from the
//! content of such a file. Finding and reading the system’s hosts file is
//! left to the user.
//!
//! The [`Connection`] executor answers A and AAAA queries for names found
//! in the table, as well as PTR queries for the reverse names of addresses
//! in the table, without asking the upstream executor. Records synthesized
//! from the table have a TTL of zero so they are never cached. All other
//! queries are passed on to the upstream executor.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::iana::{Class, Rtype};
use crate::base::message::Message;
use crate::base::name::Dname;
use crate::base::query::Query;
use crate::base::rdata::RecordData;
use crate::base::record::{Record, Ttl};
use crate::net::client::request::{Error, Executor, QueryFuture};
use std::boxed::Box;
use std::collections::HashMap;
use std::convert::Infallible;
use std::io;
use std::io::BufRead;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use tracing::{debug, trace};

//------------ Hosts ----------------------------------------------------------

/// A table of host names and their addresses.
///
/// Names are compared ignoring ASCII case. A name can have any number of
/// addresses of either family and an address any number of names.
#[derive(Clone, Debug, Default)]
pub struct Hosts {
    /// The addresses by lowercased name.
    forward: HashMap<Dname, Vec<IpAddr>>,

    /// The names by address.
    reverse: HashMap<IpAddr, Vec<Dname>>,
}

impl Hosts {
    /// Creates a new, empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the content of a hosts file.
    ///
    /// Each line contains an address followed by one or more names, all
    /// separated by white space. Everything after a `#` is a comment. A
    /// zone index attached to an IPv6 address, such as in `fe80::1%lo0`,
    /// is ignored. Lines with an invalid address and names that cannot be
    /// parsed are skipped.
    pub fn parse_str(s: &str) -> Self {
        let mut res = Self::new();
        for line in s.lines() {
            res.parse_line(line);
        }
        res
    }

    /// Reads a hosts file from a reader.
    ///
    /// See [`parse_str`][Self::parse_str] for the format. Fails if reading
    /// fails or the content is not valid UTF-8.
    pub fn read<R: io::Read>(reader: R) -> Result<Self, io::Error> {
        let mut res = Self::new();
        for line in io::BufReader::new(reader).lines() {
            res.parse_line(&line?);
        }
        Ok(res)
    }

    /// Adds a single line of a hosts file.
    fn parse_line(&mut self, line: &str) {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let mut words = line.split_whitespace();
        let addr = match words.next() {
            Some(addr) => addr,
            None => return,
        };
        let addr = match addr.split_once('%') {
            Some((addr, _zone)) => addr,
            None => addr,
        };
        let addr = match IpAddr::from_str(addr) {
            Ok(addr) => addr,
            Err(_) => {
                trace!(line, "skipping hosts line with invalid address");
                return;
            }
        };
        for name in words {
            match Dname::from_str(name) {
                Ok(name) => self.add(name, addr),
                Err(err) => {
                    trace!(name, %err, "skipping invalid host name")
                }
            }
        }
    }

    /// Adds an address for a name.
    ///
    /// Adding the same pair again has no effect.
    pub fn add(&mut self, name: Dname, addr: IpAddr) {
        let addrs = self.forward.entry(name.to_lowercase()).or_default();
        if !addrs.contains(&addr) {
            addrs.push(addr);
        }
        let names = self.reverse.entry(addr).or_default();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    /// Returns the addresses for a name.
    pub fn lookup(&self, name: &Dname) -> &[IpAddr] {
        self.forward
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the names for an address.
    pub fn lookup_addr(&self, addr: IpAddr) -> &[Dname] {
        self.reverse
            .get(&addr)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the number of names in the table.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Returns the records answering a query if the table has any.
    fn answer(&self, query: &Query) -> Option<Vec<Record>> {
        if query.class() != Class::IN {
            return None;
        }
        let data: Vec<RecordData> = match query.rtype() {
            Rtype::A => self
                .lookup(query.name())
                .iter()
                .filter_map(|addr| match addr {
                    IpAddr::V4(addr) => Some(RecordData::A(*addr)),
                    IpAddr::V6(_) => None,
                })
                .collect(),
            Rtype::AAAA => self
                .lookup(query.name())
                .iter()
                .filter_map(|addr| match addr {
                    IpAddr::V4(_) => None,
                    IpAddr::V6(addr) => Some(RecordData::Aaaa(*addr)),
                })
                .collect(),
            Rtype::PTR => self
                .lookup_addr(reverse_addr(query.name())?)
                .iter()
                .map(|name| RecordData::Ptr(name.clone()))
                .collect(),
            _ => return None,
        };
        if data.is_empty() {
            return None;
        }
        Some(
            data.into_iter()
                .map(|data| {
                    Record::new(
                        query.name().clone(),
                        Class::IN,
                        Ttl::ZERO,
                        data,
                    )
                })
                .collect(),
        )
    }
}

impl FromStr for Hosts {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_str(s))
    }
}

//------------ Connection -----------------------------------------------------

/// An executor answering from a hosts table.
#[derive(Clone, Debug)]
pub struct Connection<Upstream> {
    /// The executor asked for everything not in the table.
    upstream: Upstream,

    /// The hosts table.
    hosts: Hosts,
}

impl<Upstream: Executor> Connection<Upstream> {
    /// Creates a new executor from a table and an upstream executor.
    pub fn new(hosts: Hosts, upstream: Upstream) -> Self {
        Self { upstream, hosts }
    }

    /// Returns the hosts table.
    pub fn hosts(&self) -> &Hosts {
        &self.hosts
    }

    /// Answers from the table or asks upstream.
    async fn query_impl(
        &self,
        nameserver: SocketAddr,
        query: Query,
    ) -> Result<Message, Error> {
        match self.hosts.answer(&query) {
            Some(answers) => {
                debug!(%query, "answering from hosts table");
                Ok(Message::response_for_query(&query, answers))
            }
            None => self.upstream.query(nameserver, query).await,
        }
    }
}

impl<Upstream: Executor> Executor for Connection<Upstream> {
    fn query(&self, nameserver: SocketAddr, query: Query) -> QueryFuture<'_> {
        Box::pin(self.query_impl(nameserver, query))
    }
}

//------------ Utility --------------------------------------------------------

/// Returns the address for a reverse lookup name.
///
/// This is a name below `in-addr.arpa` with four decimal labels for IPv4
/// or below `ip6.arpa` with 32 labels of a single hex digit for IPv6, in
/// both cases in reverse order.
fn reverse_addr(name: &Dname) -> Option<IpAddr> {
    let name = name.to_lowercase();
    let labels: Vec<&[u8]> = name.labels().collect();
    match labels.as_slice() {
        [d, c, b, a, b"in-addr", b"arpa"] => {
            fn octet(label: &[u8]) -> Option<u8> {
                if label.is_empty() || label.len() > 3 {
                    return None;
                }
                std::str::from_utf8(label).ok()?.parse().ok()
            }
            Some(IpAddr::V4(Ipv4Addr::new(
                octet(a)?,
                octet(b)?,
                octet(c)?,
                octet(d)?,
            )))
        }
        [nibbles @ .., b"ip6", b"arpa"] if nibbles.len() == 32 => {
            let mut addr = 0u128;
            for label in nibbles.iter().rev() {
                let digit = match label {
                    [digit] => char::from(*digit).to_digit(16)?,
                    _ => return None,
                };
                addr = (addr << 4) | u128::from(digit);
            }
            Some(IpAddr::V6(Ipv6Addr::from(addr)))
        }
        _ => None,
    }
}

//============ Testing =======================================================
