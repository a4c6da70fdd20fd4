//! A single question in a DNS message.
//!
//! This module defines the type [`Question`] which represents an entry in
//! the question section of a DNS message.

use super::iana::{Class, Rtype};
use super::name::{Compressor, Dname};
use super::wire::{ParseError, Parser};
use core::fmt;

//------------ Question ------------------------------------------------------

/// A question in a DNS message.
///
/// In DNS, a question describes what is requested in a query. It consists
/// of three elements: a domain name, a record type, and a class.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Question {
    /// The domain name of the question.
    qname: Dname,

    /// The record type of the question.
    qtype: Rtype,

    /// The class of the question.
    qclass: Class,
}

/// # Creation and Conversion
///
impl Question {
    /// Creates a new question from its three components.
    pub fn new(qname: Dname, qtype: Rtype, qclass: Class) -> Self {
        Question {
            qname,
            qtype,
            qclass,
        }
    }

    /// Creates a new question for the IN class.
    pub fn new_in(qname: Dname, qtype: Rtype) -> Self {
        Question::new(qname, qtype, Class::IN)
    }
}

/// # Field Access
///
impl Question {
    /// Returns a reference to the domain name in the question.
    pub fn qname(&self) -> &Dname {
        &self.qname
    }

    /// Returns the record type of the question.
    pub fn qtype(&self) -> Rtype {
        self.qtype
    }

    /// Returns the class of the question.
    pub fn qclass(&self) -> Class {
        self.qclass
    }
}

/// # Parsing and Composing
///
impl Question {
    /// Parses a question from the current position of the parser.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Question::new(
            Dname::parse(parser)?,
            parser.parse_u16_be()?.into(),
            parser.parse_u16_be()?.into(),
        ))
    }

    /// Appends the question with an uncompressed name.
    pub fn compose(&self, target: &mut Vec<u8>) {
        self.qname.compose(target);
        self.compose_tail(target)
    }

    /// Appends the question, compressing the name.
    pub fn compose_compressed(
        &self,
        target: &mut Vec<u8>,
        compressor: &mut Compressor,
    ) {
        self.qname.compose_compressed(target, compressor);
        self.compose_tail(target)
    }

    fn compose_tail(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.qtype.to_int().to_be_bytes());
        target.extend_from_slice(&self.qclass.to_int().to_be_bytes());
    }
}

//--- Display and Debug

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.qname, self.qclass, self.qtype)
    }
}

impl fmt::Debug for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Question")
            .field("qname", &self.qname)
            .field("qtype", &self.qtype)
            .field("qclass", &self.qclass)
            .finish()
    }
}
