//! Queries and their identity.
//!
//! A [`Query`] is the request handed to an executor: a single question plus
//! the message ID to use on the wire. Two queries asking the same question
//! are considered the same query no matter their ID. This identity is
//! captured by [`QueryKey`] which is used for caching and for merging
//! concurrent identical queries.

use super::header::{Header, HeaderCounts, HeaderSection};
use super::iana::{Class, Rtype};
use super::name::Dname;
use super::question::Question;
use core::fmt;

//------------ Query ---------------------------------------------------------

/// A DNS query.
///
/// Values are immutable. Methods that would change a query return a new
/// value instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    /// The domain name asked for.
    name: Dname,

    /// The record type asked for.
    rtype: Rtype,

    /// The class asked for.
    class: Class,

    /// The message ID used on the wire.
    id: u16,
}

impl Query {
    /// Creates a new query with a random message ID.
    pub fn new(name: Dname, rtype: Rtype, class: Class) -> Self {
        Query {
            name,
            rtype,
            class,
            id: ::rand::random(),
        }
    }

    /// Creates a new query for class IN with a random message ID.
    pub fn new_in(name: Dname, rtype: Rtype) -> Self {
        Self::new(name, rtype, Class::IN)
    }

    /// Returns the same query with the given message ID.
    #[must_use]
    pub fn with_id(self, id: u16) -> Self {
        Query { id, ..self }
    }

    /// Returns the same logical query with a fresh random message ID.
    #[must_use]
    pub fn with_random_id(&self) -> Self {
        self.clone().with_id(::rand::random())
    }

    /// Returns the domain name asked for.
    pub fn name(&self) -> &Dname {
        &self.name
    }

    /// Returns the record type asked for.
    pub fn rtype(&self) -> Rtype {
        self.rtype
    }

    /// Returns the class asked for.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the message ID.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Returns the question of the query.
    pub fn question(&self) -> Question {
        Question::new(self.name.clone(), self.rtype, self.class)
    }

    /// Returns the identity of the query.
    pub fn key(&self) -> QueryKey {
        QueryKey::new(&self.name, self.rtype, self.class)
    }

    /// Returns the query message in wire format.
    ///
    /// The message has the query’s ID, the RD bit set, and a single
    /// question with an uncompressed name.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut header = Header::new();
        header.set_id(self.id);
        header.set_rd(true);
        let mut counts = HeaderCounts::new();
        counts.set_qdcount(1);

        let mut target = Vec::with_capacity(
            HeaderSection::LEN + self.name.len() + 4,
        );
        HeaderSection::new(header, counts).compose(&mut target);
        self.question().compose(&mut target);
        target
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.class, self.rtype)
    }
}

//------------ QueryKey ------------------------------------------------------

/// The identity of a query.
///
/// This is the lowercased name together with type and class. The message
/// ID is not part of it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct QueryKey {
    name: Dname,
    rtype: Rtype,
    class: Class,
}

impl QueryKey {
    /// Creates a new key from the question elements.
    pub fn new(name: &Dname, rtype: Rtype, class: Class) -> Self {
        QueryKey {
            name: name.to_lowercase(),
            rtype,
            class,
        }
    }

    /// Returns the lowercased name.
    pub fn name(&self) -> &Dname {
        &self.name
    }

    /// Returns the record type.
    pub fn rtype(&self) -> Rtype {
        self.rtype
    }

    /// Returns the class.
    pub fn class(&self) -> Class {
        self.class
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.class, self.rtype)
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn to_vec() {
        let query = Query::new_in(
            Dname::from_str("igor.io").unwrap(),
            Rtype::A,
        )
        .with_id(0x7262);
        assert_eq!(
            query.to_vec(),
            b"\x72\x62\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
              \x04igor\x02io\x00\x00\x01\x00\x01"
        );
    }

    #[test]
    fn key_ignores_id_and_case() {
        let query = Query::new_in(
            Dname::from_str("Example.COM").unwrap(),
            Rtype::AAAA,
        );
        let other = Query::new_in(
            Dname::from_str("example.com").unwrap(),
            Rtype::AAAA,
        )
        .with_id(query.id().wrapping_add(1));
        assert_ne!(query, other);
        assert_eq!(query.key(), other.key());
        assert_eq!(query.key().name().as_slice(), b"\x07example\x03com\x00");
        assert_ne!(
            query.key(),
            Query::new_in(query.name().clone(), Rtype::A).key()
        );
    }

    #[test]
    fn with_random_id_keeps_question() {
        let name = Dname::from_str("example.com").unwrap();
        let query = Query::new(name, Rtype::MX, Class::CH);
        let fresh = query.with_random_id();
        assert_eq!(fresh.question(), query.question());
        assert_eq!(fresh.key(), query.key());
    }
}
