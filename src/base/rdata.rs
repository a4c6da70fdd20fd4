//! Resource record data.
//!
//! The [`RecordData`] enum holds the data of a record in a typed form for
//! the record types the query pipeline commonly encounters. Data for all
//! other record types is kept as raw octets in the
//! [`Other`][RecordData::Other] variant and shown in the generic format of
//! [RFC 3597].
//!
//! [RFC 3597]: https://tools.ietf.org/html/rfc3597

use super::iana::Rtype;
use super::name::{Compressor, Dname};
use super::wire::{ComposeError, ParseError, Parser};
use core::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

//------------ RecordData ----------------------------------------------------

/// The data of a resource record.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum RecordData {
    /// An IPv4 host address.
    A(Ipv4Addr),

    /// An IPv6 host address.
    Aaaa(Ipv6Addr),

    /// An authoritative name server.
    Ns(Dname),

    /// The canonical name for an alias.
    Cname(Dname),

    /// A domain name pointer.
    Ptr(Dname),

    /// A mail exchange.
    Mx(Mx),

    /// One or more character strings.
    Txt(Vec<Vec<u8>>),

    /// The start of a zone of authority.
    Soa(Soa),

    /// A server selection record.
    Srv(Srv),

    /// Data of any other record type, kept as is.
    Other {
        /// The record type.
        rtype: Rtype,

        /// The raw record data.
        data: Vec<u8>,
    },
}

impl RecordData {
    /// Returns the record type of the data.
    pub fn rtype(&self) -> Rtype {
        match *self {
            RecordData::A(_) => Rtype::A,
            RecordData::Aaaa(_) => Rtype::AAAA,
            RecordData::Ns(_) => Rtype::NS,
            RecordData::Cname(_) => Rtype::CNAME,
            RecordData::Ptr(_) => Rtype::PTR,
            RecordData::Mx(_) => Rtype::MX,
            RecordData::Txt(_) => Rtype::TXT,
            RecordData::Soa(_) => Rtype::SOA,
            RecordData::Srv(_) => Rtype::SRV,
            RecordData::Other { rtype, .. } => rtype,
        }
    }

    /// Parses record data of the given type and length.
    ///
    /// The data has to take up exactly `rdlen` octets. The parser is left
    /// at the end of the record data.
    pub fn parse(
        rtype: Rtype,
        parser: &mut Parser,
        rdlen: usize,
    ) -> Result<Self, ParseError> {
        parser.check_len(rdlen)?;
        let end = parser.pos() + rdlen;
        let res = match rtype {
            Rtype::A => {
                let mut buf = [0u8; 4];
                parser.parse_buf(&mut buf)?;
                RecordData::A(buf.into())
            }
            Rtype::AAAA => {
                let mut buf = [0u8; 16];
                parser.parse_buf(&mut buf)?;
                RecordData::Aaaa(buf.into())
            }
            Rtype::NS => RecordData::Ns(Dname::parse(parser)?),
            Rtype::CNAME => RecordData::Cname(Dname::parse(parser)?),
            Rtype::PTR => RecordData::Ptr(Dname::parse(parser)?),
            Rtype::MX => RecordData::Mx(Mx {
                preference: parser.parse_u16_be()?,
                exchange: Dname::parse(parser)?,
            }),
            Rtype::TXT => {
                let mut strings = Vec::new();
                while parser.pos() < end {
                    let len = usize::from(parser.parse_u8()?);
                    strings.push(parser.parse_slice(len)?.to_vec());
                }
                if strings.is_empty() {
                    return Err(ParseError::form_error("empty TXT record"));
                }
                RecordData::Txt(strings)
            }
            Rtype::SOA => RecordData::Soa(Soa {
                mname: Dname::parse(parser)?,
                rname: Dname::parse(parser)?,
                serial: parser.parse_u32_be()?,
                refresh: parser.parse_u32_be()?,
                retry: parser.parse_u32_be()?,
                expire: parser.parse_u32_be()?,
                minimum: parser.parse_u32_be()?,
            }),
            Rtype::SRV => RecordData::Srv(Srv {
                priority: parser.parse_u16_be()?,
                weight: parser.parse_u16_be()?,
                port: parser.parse_u16_be()?,
                target: Dname::parse(parser)?,
            }),
            _ => RecordData::Other {
                rtype,
                data: parser.parse_slice(rdlen)?.to_vec(),
            },
        };
        if parser.pos() != end {
            return Err(ParseError::form_error("invalid record data length"));
        }
        Ok(res)
    }

    /// Appends the uncompressed wire format of the data.
    ///
    /// This does not include the length prefix.
    pub fn compose(&self, target: &mut Vec<u8>) -> Result<(), ComposeError> {
        self.compose_with(target, |name, target| name.compose(target))
    }

    /// Appends the data compressing embedded domain names.
    ///
    /// Only the names in NS, CNAME, PTR, MX, and SOA data are compressed.
    /// The target of an SRV record is never compressed (RFC 2782).
    pub fn compose_compressed(
        &self,
        target: &mut Vec<u8>,
        compressor: &mut Compressor,
    ) -> Result<(), ComposeError> {
        self.compose_with(target, |name, target| {
            compressor.compose_name(name, target)
        })
    }

    fn compose_with<F>(
        &self,
        target: &mut Vec<u8>,
        mut compose_name: F,
    ) -> Result<(), ComposeError>
    where
        F: FnMut(&Dname, &mut Vec<u8>),
    {
        match *self {
            RecordData::A(addr) => target.extend_from_slice(&addr.octets()),
            RecordData::Aaaa(addr) => {
                target.extend_from_slice(&addr.octets())
            }
            RecordData::Ns(ref name)
            | RecordData::Cname(ref name)
            | RecordData::Ptr(ref name) => compose_name(name, target),
            RecordData::Mx(ref mx) => {
                target.extend_from_slice(&mx.preference.to_be_bytes());
                compose_name(&mx.exchange, target);
            }
            RecordData::Txt(ref strings) => {
                for s in strings {
                    let len = u8::try_from(s.len())
                        .map_err(|_| ComposeError::LongData)?;
                    target.push(len);
                    target.extend_from_slice(s);
                }
            }
            RecordData::Soa(ref soa) => {
                compose_name(&soa.mname, target);
                compose_name(&soa.rname, target);
                for value in [
                    soa.serial,
                    soa.refresh,
                    soa.retry,
                    soa.expire,
                    soa.minimum,
                ] {
                    target.extend_from_slice(&value.to_be_bytes());
                }
            }
            RecordData::Srv(ref srv) => {
                target.extend_from_slice(&srv.priority.to_be_bytes());
                target.extend_from_slice(&srv.weight.to_be_bytes());
                target.extend_from_slice(&srv.port.to_be_bytes());
                srv.target.compose(target);
            }
            RecordData::Other { ref data, .. } => {
                target.extend_from_slice(data)
            }
        }
        Ok(())
    }
}

//--- Display

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RecordData::A(addr) => addr.fmt(f),
            RecordData::Aaaa(addr) => addr.fmt(f),
            RecordData::Ns(ref name)
            | RecordData::Cname(ref name)
            | RecordData::Ptr(ref name) => write!(f, "{}.", name),
            RecordData::Mx(ref mx) => {
                write!(f, "{} {}.", mx.preference, mx.exchange)
            }
            RecordData::Txt(ref strings) => {
                let mut first = true;
                for s in strings {
                    if first {
                        first = false;
                    } else {
                        f.write_str(" ")?;
                    }
                    f.write_str("\"")?;
                    for &ch in s {
                        if ch == b'"' || ch == b'\\' {
                            write!(f, "\\{}", ch as char)?;
                        } else if (0x20..0x7F).contains(&ch) {
                            write!(f, "{}", ch as char)?;
                        } else {
                            write!(f, "\\{:03}", ch)?;
                        }
                    }
                    f.write_str("\"")?;
                }
                Ok(())
            }
            RecordData::Soa(ref soa) => write!(
                f,
                "{}. {}. {} {} {} {} {}",
                soa.mname,
                soa.rname,
                soa.serial,
                soa.refresh,
                soa.retry,
                soa.expire,
                soa.minimum
            ),
            RecordData::Srv(ref srv) => write!(
                f,
                "{} {} {} {}.",
                srv.priority, srv.weight, srv.port, srv.target
            ),
            RecordData::Other { ref data, .. } => {
                write!(f, "\\# {}", data.len())?;
                if !data.is_empty() {
                    f.write_str(" ")?;
                    for ch in data {
                        write!(f, "{:02x}", ch)?;
                    }
                }
                Ok(())
            }
        }
    }
}

//------------ Mx ------------------------------------------------------------

/// Mail exchange record data.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Mx {
    /// The preference of this exchange. Lower values are preferred.
    pub preference: u16,

    /// The host acting as mail exchange.
    pub exchange: Dname,
}

//------------ Soa -----------------------------------------------------------

/// Start of authority record data.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Soa {
    /// The primary name server of the zone.
    pub mname: Dname,

    /// The mailbox of the person responsible for the zone.
    pub rname: Dname,

    /// The serial number of the zone.
    pub serial: u32,

    /// Seconds between refreshes of secondary servers.
    pub refresh: u32,

    /// Seconds before a failed refresh is retried.
    pub retry: u32,

    /// Seconds until a secondary stops answering without a refresh.
    pub expire: u32,

    /// The TTL for negative answers.
    pub minimum: u32,
}

//------------ Srv -----------------------------------------------------------

/// Server selection record data.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Srv {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: Dname,
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    fn name(s: &str) -> Dname {
        Dname::from_str(s).unwrap()
    }

    fn parse(rtype: Rtype, data: &[u8]) -> Result<RecordData, ParseError> {
        let mut parser = Parser::from_slice(data);
        RecordData::parse(rtype, &mut parser, data.len())
    }

    #[rstest]
    #[case(Rtype::A, &b"\x7f\x00\x00\x01"[..], "127.0.0.1")]
    #[case(
        Rtype::AAAA,
        &b"\x20\x01\x0d\xb8\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x01"[..],
        "2001:db8::1"
    )]
    #[case(Rtype::CNAME, &b"\x03www\x07example\x00"[..], "www.example.")]
    #[case(Rtype::MX, &b"\x00\x0a\x02mx\x07example\x00"[..], "10 mx.example.")]
    #[case(Rtype::TXT, &b"\x03foo\x04b\"ar"[..], "\"foo\" \"b\\\"ar\"")]
    #[case(
        Rtype::SRV,
        &b"\x00\x01\x00\x02\x00\x35\x02ns\x00"[..],
        "1 2 53 ns."
    )]
    #[case(Rtype::from_int(65), &b"\xde\xad"[..], "\\# 2 dead")]
    fn parse_and_display(
        #[case] rtype: Rtype,
        #[case] data: &[u8],
        #[case] text: &str,
    ) {
        let rdata = parse(rtype, data).unwrap();
        assert_eq!(rdata.rtype(), rtype);
        assert_eq!(rdata.to_string(), text);

        let mut target = Vec::new();
        rdata.compose(&mut target).unwrap();
        assert_eq!(target, data);
    }

    #[rstest]
    #[case(Rtype::A, &b"\x7f\x00\x00"[..])]
    #[case(Rtype::A, &b"\x7f\x00\x00\x01\x01"[..])]
    #[case(Rtype::AAAA, &b"\x7f\x00\x00\x01"[..])]
    #[case(Rtype::PTR, &b"\x03www\x00\x00"[..])]
    #[case(Rtype::TXT, &b""[..])]
    #[case(Rtype::TXT, &b"\x05foo"[..])]
    fn bad_length(#[case] rtype: Rtype, #[case] data: &[u8]) {
        assert!(parse(rtype, data).is_err());
    }

    #[test]
    fn name_beyond_rdlen() {
        // The name runs past the declared length of the record data.
        let mut parser = Parser::from_slice(b"\x03www\x00");
        assert_eq!(
            RecordData::parse(Rtype::NS, &mut parser, 3),
            Err(ParseError::form_error("invalid record data length"))
        );
    }

    #[test]
    fn soa() {
        let soa = RecordData::Soa(Soa {
            mname: name("ns.example"),
            rname: name("hostmaster.example"),
            serial: 1,
            refresh: 2,
            retry: 3,
            expire: 4,
            minimum: 5,
        });
        let mut target = Vec::new();
        soa.compose(&mut target).unwrap();
        assert_eq!(parse(Rtype::SOA, &target).unwrap(), soa);
        assert_eq!(soa.to_string(), "ns.example. hostmaster.example. 1 2 3 4 5");
    }

    #[test]
    fn compressed() {
        let mut compressor = Compressor::new();
        let mut target = Vec::new();
        name("example").compose_compressed(&mut target, &mut compressor);
        let start = target.len();
        RecordData::Mx(Mx {
            preference: 5,
            exchange: name("mx.example"),
        })
        .compose_compressed(&mut target, &mut compressor)
        .unwrap();
        assert_eq!(&target[start..], b"\x00\x05\x02mx\xc0\x00");
    }
}
