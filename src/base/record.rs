//! Resource Records.
//!
//! This module defines types related to DNS resource records. The most
//! complete one is [`Record`] which contains a complete record for a certain
//! record type. The time-to-live of a record is represented by [`Ttl`].

use super::iana::{Class, Rtype};
use super::name::{Compressor, Dname};
use super::rdata::RecordData;
use super::wire::{compose_len_prefixed, ComposeError, ParseError, Parser};
use core::fmt;
use std::time::Duration;

//------------ Record --------------------------------------------------------

/// A DNS resource record.
///
/// A record consists of an owner name, a class, a time-to-live value, and
/// the record data. The record type is implied by the data.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Record {
    /// The owner of the record.
    owner: Dname,

    /// The class of the record.
    class: Class,

    /// The time-to-live value of the record.
    ttl: Ttl,

    /// The record data. The value also specifies the record’s type.
    data: RecordData,
}

/// # Creation and Element Access
///
impl Record {
    /// Creates a new record from its parts.
    pub fn new(
        owner: Dname,
        class: Class,
        ttl: Ttl,
        data: RecordData,
    ) -> Self {
        Record {
            owner,
            class,
            ttl,
            data,
        }
    }

    /// Returns a reference to the owner domain name.
    pub fn owner(&self) -> &Dname {
        &self.owner
    }

    /// Returns the record type.
    pub fn rtype(&self) -> Rtype {
        self.data.rtype()
    }

    /// Returns the record class.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the record’s time-to-live.
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Sets the record’s time-to-live.
    pub fn set_ttl(&mut self, ttl: Ttl) {
        self.ttl = ttl
    }

    /// Return a reference to the record data.
    pub fn data(&self) -> &RecordData {
        &self.data
    }

    /// Trades the record for its record data.
    pub fn into_data(self) -> RecordData {
        self.data
    }
}

/// # Parsing and Composing
///
impl Record {
    /// Parses a record from the current position of the parser.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let owner = Dname::parse(parser)?;
        let rtype = Rtype::from_int(parser.parse_u16_be()?);
        let class = Class::from_int(parser.parse_u16_be()?);
        let ttl = Ttl::from_secs(parser.parse_u32_be()?);
        let rdlen = usize::from(parser.parse_u16_be()?);
        let data = RecordData::parse(rtype, parser, rdlen)?;
        Ok(Record::new(owner, class, ttl, data))
    }

    /// Appends the record without name compression.
    pub fn compose(&self, target: &mut Vec<u8>) -> Result<(), ComposeError> {
        self.owner.compose(target);
        self.compose_header(target);
        compose_len_prefixed(target, |target| self.data.compose(target))
    }

    /// Appends the record compressing all eligible names.
    pub fn compose_compressed(
        &self,
        target: &mut Vec<u8>,
        compressor: &mut Compressor,
    ) -> Result<(), ComposeError> {
        self.owner.compose_compressed(target, compressor);
        self.compose_header(target);
        compose_len_prefixed(target, |target| {
            self.data.compose_compressed(target, compressor)
        })
    }

    fn compose_header(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.rtype().to_int().to_be_bytes());
        target.extend_from_slice(&self.class.to_int().to_be_bytes());
        target.extend_from_slice(&self.ttl.as_secs().to_be_bytes());
    }
}

//--- Display

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.owner.is_root() {
            f.write_str(".")?;
        } else {
            write!(f, "{}.", self.owner)?;
        }
        write!(
            f,
            " {} {} {} {}",
            self.ttl.as_secs(),
            self.class,
            self.rtype(),
            self.data
        )
    }
}

//------------ Ttl -----------------------------------------------------------

/// A span of time a record may be cached, in whole seconds.
///
/// [RFC 2181](https://tools.ietf.org/html/rfc2181#section-8) defines the
/// TTL as an unsigned 32 bit number but limits the values to 31 bits and
/// requires values with the top bit set to be treated as zero. The raw value
/// is kept as received. Use [`normalize`][Ttl::normalize] to obtain the value
/// that is safe to use for caching.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Ttl(u32);

impl Ttl {
    /// A duration of zero time.
    pub const ZERO: Ttl = Ttl::from_secs(0);

    /// A time-to-live of one minute.
    pub const MINUTE: Ttl = Ttl::from_secs(60);

    /// The largest value allowed by RFC 2181.
    pub const MAX: Ttl = Ttl::from_secs(i32::MAX as u32);

    /// Creates a new value from seconds.
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        Ttl(secs)
    }

    /// Creates a new value from a duration dropping fractional seconds.
    ///
    /// Durations too long for a TTL saturate.
    #[must_use]
    pub fn from_duration_lossy(duration: Duration) -> Self {
        Ttl(u32::try_from(duration.as_secs()).unwrap_or(u32::MAX))
    }

    /// Returns the total time to live in seconds.
    #[must_use]
    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Returns the value as a duration.
    #[must_use]
    pub const fn into_duration(self) -> Duration {
        Duration::from_secs(self.0 as u64)
    }

    /// Returns whether this value spans no time.
    ///
    /// This usually indicates a given record should not be cached.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns zero for values with the top bit set, the value otherwise.
    #[must_use]
    pub const fn normalize(self) -> Self {
        if self.0 > Self::MAX.0 {
            Self::ZERO
        } else {
            self
        }
    }

    /// Subtracts `rhs`, stopping at zero.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Ttl) -> Ttl {
        Ttl(self.0.saturating_sub(rhs.0))
    }
}

impl From<u32> for Ttl {
    fn from(secs: u32) -> Self {
        Ttl::from_secs(secs)
    }
}

//============ Testing =======================================================
