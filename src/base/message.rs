//! DNS messages.
//!
//! This module defines [`Message`], an owned DNS message consisting of a
//! header and the four sections: question, answer, authority, and
//! additional.
//!
//! The section counts of the header are not stored. They are derived from
//! the lengths of the sections when a message is composed. When parsing, the
//! counts from the wire drive how many entries are read for each section.
//!
//! # Truncated messages
//!
//! A server sending a message that doesn’t fit into a datagram may cut the
//! message short and set the TC bit. Such a message may well contain
//! section counts that promise more records than are present. When the TC
//! bit is set, parsing therefore stops cleanly at the first entry that runs
//! past the end of the message and keeps what has been parsed so far. For
//! all other messages, this is a format error.

use super::header::{Flags, Header, HeaderCounts, HeaderSection};
use super::iana::{Opcode, Rcode};
use super::name::Compressor;
use super::query::Query;
use super::question::Question;
use super::record::{Record, Ttl};
use super::wire::{ComposeError, ParseError, Parser};
use core::fmt;

//------------ Message -------------------------------------------------------

/// A DNS message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    header: Header,
    questions: Vec<Question>,
    answers: Vec<Record>,
    authority: Vec<Record>,
    additional: Vec<Record>,
}

/// # Creation
///
impl Message {
    /// Creates an empty message with a zeroed header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a response to a query without talking to a server.
    ///
    /// The response carries the query’s ID and question, has the QR, RD,
    /// and RA bits set, a response code of NOERROR, and the given records
    /// in its answer section.
    pub fn response_for_query(query: &Query, answers: Vec<Record>) -> Self {
        let mut header = Header::new();
        header.set_id(query.id());
        header.set_opcode(Opcode::QUERY);
        header.set_flags(Flags {
            qr: true,
            rd: true,
            ra: true,
            ..Flags::new()
        });
        header.set_rcode(Rcode::NOERROR);
        Message {
            header,
            questions: vec![query.question()],
            answers,
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// Parses a message from its wire format.
    pub fn from_octets(octets: &[u8]) -> Result<Self, ParseError> {
        let mut parser = Parser::from_slice(octets);
        let section = HeaderSection::parse(&mut parser)?;
        let header = section.header();
        let counts = section.counts();
        let mut res = Message {
            header,
            ..Default::default()
        };
        res.parse_sections(&mut parser, counts, header.tc())?;
        Ok(res)
    }

    /// Parses the entries of all four sections.
    ///
    /// If `lenient` is true, running out of data ends parsing without an
    /// error.
    fn parse_sections(
        &mut self,
        parser: &mut Parser,
        counts: HeaderCounts,
        lenient: bool,
    ) -> Result<(), ParseError> {
        for _ in 0..counts.qdcount() {
            match Question::parse(parser) {
                Ok(question) => self.questions.push(question),
                Err(ParseError::ShortInput) if lenient => return Ok(()),
                Err(err) => return Err(err),
            }
        }
        for (count, section) in [
            (counts.ancount(), &mut self.answers),
            (counts.nscount(), &mut self.authority),
            (counts.arcount(), &mut self.additional),
        ] {
            for _ in 0..count {
                match Record::parse(parser) {
                    Ok(record) => section.push(record),
                    Err(ParseError::ShortInput) if lenient => return Ok(()),
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(())
    }
}

/// # Access to the header and sections
///
impl Message {
    /// Returns the message header.
    pub fn header(&self) -> Header {
        self.header
    }

    /// Returns a mutable reference to the message header.
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Returns the section counts as they would appear on the wire.
    ///
    /// Counts saturate at 65535. Composing a message with larger sections
    /// fails.
    pub fn counts(&self) -> HeaderCounts {
        fn count<T>(items: &[T]) -> u16 {
            u16::try_from(items.len()).unwrap_or(u16::MAX)
        }
        let mut counts = HeaderCounts::new();
        counts.set_qdcount(count(&self.questions));
        counts.set_ancount(count(&self.answers));
        counts.set_nscount(count(&self.authority));
        counts.set_arcount(count(&self.additional));
        counts
    }

    /// Returns the question section.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the first question if there is one.
    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Returns the answer section.
    pub fn answers(&self) -> &[Record] {
        &self.answers
    }

    /// Returns the authority section.
    pub fn authority(&self) -> &[Record] {
        &self.authority
    }

    /// Returns the additional section.
    pub fn additional(&self) -> &[Record] {
        &self.additional
    }

    /// Trades the message for its answer section.
    pub fn into_answers(self) -> Vec<Record> {
        self.answers
    }

    /// Appends a question.
    pub fn push_question(&mut self, question: Question) {
        self.questions.push(question)
    }

    /// Appends a record to the answer section.
    pub fn push_answer(&mut self, record: Record) {
        self.answers.push(record)
    }

    /// Appends a record to the authority section.
    pub fn push_authority(&mut self, record: Record) {
        self.authority.push(record)
    }

    /// Appends a record to the additional section.
    pub fn push_additional(&mut self, record: Record) {
        self.additional.push(record)
    }

    /// Returns the smallest TTL of all answer records.
    ///
    /// TTLs are normalized first, so values with the top bit set count as
    /// zero. Returns `None` if there are no answers.
    pub fn min_answer_ttl(&self) -> Option<Ttl> {
        self.answers
            .iter()
            .map(|record| record.ttl().normalize())
            .min()
    }

    /// Returns whether this message is a response to the given query.
    ///
    /// This checks the QR bit and the message ID.
    pub fn is_response_to(&self, query: &Query) -> bool {
        self.header.qr() && self.header.id() == query.id()
    }
}

/// # Composing
///
impl Message {
    /// Returns the message in wire format without name compression.
    pub fn to_vec(&self) -> Result<Vec<u8>, ComposeError> {
        self.compose_with(|target, item| match item {
            Item::Question(question) => {
                question.compose(target);
                Ok(())
            }
            Item::Record(record) => record.compose(target),
        })
    }

    /// Returns the message in wire format compressing domain names.
    pub fn to_compressed_vec(&self) -> Result<Vec<u8>, ComposeError> {
        let mut compressor = Compressor::new();
        self.compose_with(|target, item| match item {
            Item::Question(question) => {
                question.compose_compressed(target, &mut compressor);
                Ok(())
            }
            Item::Record(record) => {
                record.compose_compressed(target, &mut compressor)
            }
        })
    }

    fn compose_with<F>(&self, mut op: F) -> Result<Vec<u8>, ComposeError>
    where
        F: FnMut(&mut Vec<u8>, Item) -> Result<(), ComposeError>,
    {
        let sections = [
            self.questions.len(),
            self.answers.len(),
            self.authority.len(),
            self.additional.len(),
        ];
        if sections.iter().any(|&len| len > usize::from(u16::MAX)) {
            return Err(ComposeError::TooManyEntries);
        }

        let mut target = Vec::with_capacity(512);
        HeaderSection::new(self.header, self.counts()).compose(&mut target);
        for question in &self.questions {
            op(&mut target, Item::Question(question))?;
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authority)
            .chain(&self.additional)
        {
            op(&mut target, Item::Record(record))?;
        }
        Ok(target)
    }
}

/// An entry of one of the sections.
enum Item<'a> {
    Question(&'a Question),
    Record(&'a Record),
}

//--- Display

impl fmt::Display for Message {
    /// Formats the message similar to the output of dig.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let header = self.header;
        writeln!(
            f,
            ";; ->>HEADER<<- opcode: {}, rcode: {}, id: {}",
            header.opcode(),
            header.rcode(),
            header.id()
        )?;
        writeln!(f, ";; flags: {}", header.flags())?;
        writeln!(f, ";; QUESTION SECTION:")?;
        for question in &self.questions {
            writeln!(f, ";{}", question)?;
        }
        for (title, section) in [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authority),
            ("ADDITIONAL", &self.additional),
        ] {
            if !section.is_empty() {
                writeln!(f, ";; {} SECTION:", title)?;
                for record in section {
                    writeln!(f, "{}", record)?;
                }
            }
        }
        Ok(())
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::iana::{Class, Rtype};
    use crate::base::name::Dname;
    use crate::base::rdata::RecordData;
    use rstest::rstest;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn name(s: &str) -> Dname {
        Dname::from_str(s).unwrap()
    }

    fn a_record(owner: &str, addr: [u8; 4], ttl: u32) -> Record {
        Record::new(
            name(owner),
            Class::IN,
            Ttl::from_secs(ttl),
            RecordData::A(Ipv4Addr::from(addr)),
        )
    }

    fn response() -> Message {
        let query = Query::new_in(name("www.example.com"), Rtype::A).with_id(7);
        let mut msg = Message::response_for_query(
            &query,
            vec![
                a_record("www.example.com", [192, 0, 2, 1], 300),
                a_record("www.example.com", [192, 0, 2, 2], 60),
            ],
        );
        msg.push_authority(Record::new(
            name("example.com"),
            Class::IN,
            Ttl::from_secs(3600),
            RecordData::Ns(name("ns.example.com")),
        ));
        msg
    }

    #[test]
    fn response_for_query() {
        let msg = response();
        let header = msg.header();
        assert_eq!(header.id(), 7);
        assert!(header.qr() && header.rd() && header.ra());
        assert!(!header.tc() && !header.aa());
        assert_eq!(header.rcode(), Rcode::NOERROR);
        assert_eq!(
            msg.first_question(),
            Some(&Question::new_in(name("www.example.com"), Rtype::A))
        );
        assert_eq!(msg.min_answer_ttl(), Some(Ttl::from_secs(60)));
        assert!(msg.is_response_to(
            &Query::new_in(name("www.example.com"), Rtype::A).with_id(7)
        ));
    }

    #[test]
    fn round_trip() {
        let msg = response();
        let plain = msg.to_vec().unwrap();
        let compressed = msg.to_compressed_vec().unwrap();
        assert!(compressed.len() < plain.len());
        assert_eq!(Message::from_octets(&plain).unwrap(), msg);
        assert_eq!(Message::from_octets(&compressed).unwrap(), msg);

        let counts = HeaderSection::from_message_slice(&plain)
            .unwrap()
            .counts();
        assert_eq!(counts.qdcount(), 1);
        assert_eq!(counts.ancount(), 2);
        assert_eq!(counts.nscount(), 1);
        assert_eq!(counts.arcount(), 0);
    }

    #[rstest]
    #[case(&b""[..])]
    #[case(&b"\x00\x07\x81\x80\x00\x00\x00\x00\x00"[..])]
    // One answer promised but none present.
    #[case(&b"\x00\x07\x81\x80\x00\x00\x00\x01\x00\x00\x00\x00"[..])]
    // Question cut short.
    #[case(&b"\x00\x07\x81\x80\x00\x01\x00\x00\x00\x00\x00\x00\x03www"[..])]
    fn short_messages(#[case] octets: &[u8]) {
        assert_eq!(Message::from_octets(octets), Err(ParseError::ShortInput));
    }

    #[test]
    fn compression_loop_is_format_error() {
        let mut octets =
            b"\x00\x07\x81\x80\x00\x01\x00\x00\x00\x00\x00\x00".to_vec();
        // The question name points at itself.
        octets.extend_from_slice(b"\xc0\x0c\x00\x01\x00\x01");
        assert!(matches!(
            Message::from_octets(&octets),
            Err(ParseError::Form(_))
        ));
    }

    #[test]
    fn truncated_is_lenient() {
        let mut msg = response();
        msg.header_mut().set_tc(true);
        let octets = msg.to_vec().unwrap();

        // Cut the message in the middle of the second answer. The header
        // is 12 octets, the question 21, and each answer 31.
        let first_answer_end = 12 + 21 + 31;
        let cut = &octets[..first_answer_end + 10];
        let parsed = Message::from_octets(cut).unwrap();
        assert!(parsed.header().tc());
        assert_eq!(parsed.questions().len(), 1);
        assert_eq!(parsed.answers().len(), 1);
        assert!(parsed.authority().is_empty());

        // Without the TC bit, the same data is an error.
        let mut octets = cut.to_vec();
        octets[2] &= !0x02;
        assert_eq!(Message::from_octets(&octets), Err(ParseError::ShortInput));
    }

    #[test]
    fn nxdomain_is_not_an_error() {
        let mut msg = Message::new();
        msg.header_mut().set_qr(true);
        msg.header_mut().set_rcode(Rcode::NXDOMAIN);
        msg.push_question(Question::new_in(name("nope.example"), Rtype::A));
        let parsed = Message::from_octets(&msg.to_vec().unwrap()).unwrap();
        assert_eq!(parsed.header().rcode(), Rcode::NXDOMAIN);
        assert!(parsed.answers().is_empty());
    }

    #[test]
    fn display() {
        let text = response().to_string();
        assert!(text.contains("rcode: NOERROR, id: 7"));
        assert!(text.contains(";; flags: QR RD RA"));
        assert!(text.contains("www.example.com. 60 IN A 192.0.2.2"));
        assert!(text.contains(";; AUTHORITY SECTION:"));
        assert!(!text.contains(";; ADDITIONAL SECTION:"));
    }
}
