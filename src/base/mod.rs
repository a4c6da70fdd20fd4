//! Basics.
//!
//! This module provides types for working with DNS data: creating messages
//! from scratch, extracting them from their wire format, and producing that
//! wire format again.
//!
//!
//! ## Parsing and Composing Messages
//!
//! In order to easily distinguish the process of creating and disecting
//! wire-format messages from other forms of representation conversion, we
//! use the term *parsing* for extracting data from a wire-format
//! representation and *composing* for producing such a representation.
//!
//! Both parsing and composing happen on buffers holding a complete DNS
//! message. This is required because compressed domain names refer to
//! other parts of the message. The fundamental types for parsing and
//! composing live in the [wire] module.
//!
//! A [`Message`] is an owned DNS message with its four sections.
//! [`Message::from_octets`] parses the wire format and
//! [`Message::to_vec`] creates it again. A [`Query`] is the single question
//! handed to an executor of the [`net::client`][crate::net::client] module.
//!
//!
//! # Types for DNS Data
//!
//! The module contains a number of types for DNS data. You will find
//! detailed explanations for all of them in their module. These are:
//!
//! * [header] for the header of DNS messages,
//! * [iana] for the IANA registries used in messages,
//! * [name] for domain names,
//! * [question] for questions,
//! * [query] for queries and their identity,
//! * [record] for DNS resource records, and
//! * [rdata] for typed record data.

pub use self::header::{Header, HeaderCounts, HeaderSection};
pub use self::iana::{Class, Opcode, Rcode, Rtype};
pub use self::message::Message;
pub use self::name::Dname;
pub use self::query::{Query, QueryKey};
pub use self::question::Question;
pub use self::rdata::RecordData;
pub use self::record::{Record, Ttl};
pub use self::wire::{ComposeError, FormError, ParseError};

pub mod header;
pub mod iana;
pub mod message;
pub mod name;
pub mod query;
pub mod question;
pub mod rdata;
pub mod record;
pub mod wire;
