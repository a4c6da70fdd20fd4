//! Domain names.
//!
//! This module provides [`Dname`], an owned absolute domain name kept in
//! its uncompressed wire format: a sequence of labels, each preceded by a
//! length octet, and terminated by the empty root label.
//!
//! Names compare and hash ignoring ASCII case, as required by [RFC 4343].
//!
//! When a name is parsed from a message, compression pointers as defined in
//! section 4.1.4 of [RFC 1035] are followed. Every pointer must point to a
//! position strictly before the label run it was found in. This makes the
//! positions visited strictly decreasing and guarantees termination even
//! for maliciously crafted messages. The 255 octet limit on the length of a
//! name provides a second bound.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035
//! [RFC 4343]: https://tools.ietf.org/html/rfc4343

use super::wire::{FormError, ParseError, Parser};
use core::{fmt, hash, str};
use std::collections::HashMap;

/// The maximum length of a label in octets.
const MAX_LABEL_LEN: usize = 63;

/// The maximum length of a domain name in wire format in octets.
const MAX_NAME_LEN: usize = 255;

/// Positions beyond this value can't be the target of a compression pointer.
const MAX_POINTER_TARGET: usize = 0x3FFF;

//------------ Dname ---------------------------------------------------------

/// An uncompressed, absolute domain name.
#[derive(Clone)]
pub struct Dname {
    /// The name in wire format, ending in the root label.
    octets: Vec<u8>,
}

/// # Creation
///
impl Dname {
    /// Returns the root name.
    pub fn root() -> Self {
        Dname { octets: vec![0] }
    }

    /// Creates a name from its uncompressed wire format.
    ///
    /// The octets must contain exactly one absolute name.
    pub fn from_octets(octets: Vec<u8>) -> Result<Self, NameError> {
        let mut pos = 0;
        loop {
            let len = match octets.get(pos) {
                Some(&len) => usize::from(len),
                None => return Err(NameError::ShortInput),
            };
            if len > MAX_LABEL_LEN {
                return Err(NameError::BadLabel);
            }
            pos += len + 1;
            if pos > MAX_NAME_LEN {
                return Err(NameError::LongName);
            }
            if len == 0 {
                break;
            }
        }
        if pos != octets.len() {
            return Err(NameError::TrailingData);
        }
        Ok(Dname { octets })
    }

    /// Parses a possibly compressed name from a message.
    ///
    /// The parser is left right behind the name as it appears at its
    /// original position, i.e., after the first compression pointer if
    /// there is one.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let message = parser.as_slice();
        let mut octets = Vec::new();
        let mut pos = parser.pos();
        let mut run_start = pos;
        let mut end = None;

        loop {
            let ltype = match message.get(pos) {
                Some(&ltype) => ltype,
                None => return Err(ParseError::ShortInput),
            };
            match ltype {
                0 => {
                    octets.push(0);
                    pos += 1;
                    break;
                }
                1..=0x3F => {
                    let len = usize::from(ltype);
                    let label = match message.get(pos + 1..pos + 1 + len) {
                        Some(label) => label,
                        None => return Err(ParseError::ShortInput),
                    };
                    // Leave room for the root label.
                    if octets.len() + len + 2 > MAX_NAME_LEN {
                        return Err(NameError::LongName.into());
                    }
                    octets.push(ltype);
                    octets.extend_from_slice(label);
                    pos += len + 1;
                }
                0xC0..=0xFF => {
                    let low = match message.get(pos + 1) {
                        Some(&low) => low,
                        None => return Err(ParseError::ShortInput),
                    };
                    let target =
                        (usize::from(ltype & 0x3F) << 8) | usize::from(low);
                    if end.is_none() {
                        end = Some(pos + 2);
                    }
                    if target >= run_start {
                        return Err(NameError::BadPointer.into());
                    }
                    pos = target;
                    run_start = target;
                }
                _ => return Err(NameError::BadLabel.into()),
            }
        }

        parser.seek(end.unwrap_or(pos))?;
        Ok(Dname { octets })
    }
}

/// # Properties
///
impl Dname {
    /// Returns the wire format of the name.
    pub fn as_slice(&self) -> &[u8] {
        &self.octets
    }

    /// Returns the length of the name in wire format.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.octets.len() == 1
    }

    /// Returns an iterator over the content of the non-root labels.
    pub fn labels(&self) -> Labels<'_> {
        Labels {
            octets: &self.octets,
        }
    }

    /// Returns the number of labels without the root label.
    pub fn label_count(&self) -> usize {
        self.labels().count()
    }

    /// Returns whether `base` is a suffix of this name.
    ///
    /// The comparison ignores ASCII case. Every name ends with the root.
    pub fn ends_with(&self, base: &Dname) -> bool {
        let mut rest = self.octets.as_slice();
        loop {
            if rest.eq_ignore_ascii_case(&base.octets) {
                return true;
            }
            if rest.len() <= 1 {
                return false;
            }
            rest = &rest[usize::from(rest[0]) + 1..];
        }
    }

    /// Returns a copy of the name with all ASCII letters lowercased.
    pub fn to_lowercase(&self) -> Self {
        Dname {
            octets: self.octets.to_ascii_lowercase(),
        }
    }
}

/// # Composing
///
impl Dname {
    /// Appends the uncompressed wire format of the name.
    pub fn compose(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.octets)
    }

    /// Appends the name, compressing it against earlier names if possible.
    ///
    /// The target must contain the message from its first octet.
    pub fn compose_compressed(
        &self,
        target: &mut Vec<u8>,
        compressor: &mut Compressor,
    ) {
        compressor.compose_name(self, target)
    }
}

//--- FromStr

impl str::FromStr for Dname {
    type Err = FromStrError;

    /// Creates a name from its presentation format.
    ///
    /// A trailing dot is optional as all names are absolute. A lone dot is
    /// the root name. The escapes `\X` and `\DDD` are supported.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FromStrError::EmptyString);
        }
        if s == "." {
            return Ok(Dname::root());
        }

        let mut octets = vec![0];
        let mut label_start = 0;
        let mut chars = s.chars();
        let mut trailing_dot = false;

        while let Some(ch) = chars.next() {
            trailing_dot = false;
            let octet = match ch {
                '.' => {
                    let len = octets.len() - label_start - 1;
                    if len == 0 {
                        return Err(FromStrError::EmptyLabel);
                    }
                    octets[label_start] = len as u8;
                    label_start = octets.len();
                    octets.push(0);
                    trailing_dot = true;
                    continue;
                }
                '\\' => parse_escape(&mut chars)?,
                ' '..='~' => ch as u8,
                _ => return Err(FromStrError::IllegalCharacter(ch)),
            };
            if octets.len() - label_start > MAX_LABEL_LEN {
                return Err(FromStrError::LongLabel);
            }
            octets.push(octet);
        }

        if !trailing_dot {
            let len = octets.len() - label_start - 1;
            octets[label_start] = len as u8;
            octets.push(0);
        }
        if octets.len() > MAX_NAME_LEN {
            return Err(FromStrError::LongName);
        }
        Ok(Dname { octets })
    }
}

/// Reads the rest of an escape sequence after the backslash.
fn parse_escape(chars: &mut str::Chars) -> Result<u8, FromStrError> {
    let ch = chars.next().ok_or(FromStrError::UnexpectedEnd)?;
    if let Some(first) = ch.to_digit(10) {
        let second = chars
            .next()
            .and_then(|ch| ch.to_digit(10))
            .ok_or(FromStrError::IllegalEscape)?;
        let third = chars
            .next()
            .and_then(|ch| ch.to_digit(10))
            .ok_or(FromStrError::IllegalEscape)?;
        u8::try_from(first * 100 + second * 10 + third)
            .map_err(|_| FromStrError::IllegalEscape)
    } else if ch.is_ascii() {
        Ok(ch as u8)
    } else {
        Err(FromStrError::IllegalEscape)
    }
}

//--- PartialEq, Eq, and Hash

impl PartialEq for Dname {
    fn eq(&self, other: &Self) -> bool {
        self.octets.eq_ignore_ascii_case(&other.octets)
    }
}

impl Eq for Dname {}

impl hash::Hash for Dname {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        for octet in &self.octets {
            state.write_u8(octet.to_ascii_lowercase())
        }
    }
}

//--- Display and Debug

impl fmt::Display for Dname {
    /// Formats the name without the trailing dot.
    ///
    /// Only the root name is shown as a single dot.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        let mut first = true;
        for label in self.labels() {
            if first {
                first = false;
            } else {
                f.write_str(".")?;
            }
            for &ch in label {
                if ch == b'.' || ch == b'\\' {
                    write!(f, "\\{}", ch as char)?;
                } else if (0x21..0x7F).contains(&ch) {
                    write!(f, "{}", ch as char)?;
                } else {
                    write!(f, "\\{:03}", ch)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Dname {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dname({})", self)
    }
}

//------------ Labels --------------------------------------------------------

/// An iterator over the content of the labels of a name.
#[derive(Clone, Debug)]
pub struct Labels<'a> {
    octets: &'a [u8],
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, rest) = self.octets.split_first()?;
        if len == 0 {
            return None;
        }
        let (label, rest) = rest.split_at(usize::from(len));
        self.octets = rest;
        Some(label)
    }
}

//------------ Compressor ----------------------------------------------------

/// Remembers where names have been written to a message.
///
/// Names added via [`compose_name`][Self::compose_name] are replaced by a
/// pointer to an earlier occurrence of the longest suffix already present.
#[derive(Clone, Debug, Default)]
pub struct Compressor {
    /// Maps lowercased name suffixes to their positions in the message.
    positions: HashMap<Vec<u8>, u16>,
}

impl Compressor {
    /// Creates a new, empty compressor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a compressed name to the message in `target`.
    pub fn compose_name(&mut self, name: &Dname, target: &mut Vec<u8>) {
        let mut rest = name.as_slice();
        while rest.len() > 1 {
            let key = rest.to_ascii_lowercase();
            if let Some(&pos) = self.positions.get(&key) {
                target.extend_from_slice(&(0xC000 | pos).to_be_bytes());
                return;
            }
            if target.len() <= MAX_POINTER_TARGET {
                self.positions.insert(key, target.len() as u16);
            }
            let len = usize::from(rest[0]) + 1;
            target.extend_from_slice(&rest[..len]);
            rest = &rest[len..];
        }
        target.push(0);
    }
}

//------------ NameError -----------------------------------------------------

/// A domain name in wire format was invalid.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NameError {
    /// A label with a reserved or unknown label type was found.
    BadLabel,

    /// The name is longer than the 255 octets allowed.
    LongName,

    /// A compression pointer didn't point strictly backwards.
    BadPointer,

    /// The octets ended before the root label.
    ShortInput,

    /// There was data after the root label.
    TrailingData,
}

impl From<NameError> for FormError {
    fn from(err: NameError) -> FormError {
        match err {
            NameError::BadLabel => FormError::new("invalid label type"),
            NameError::LongName => FormError::new("long domain name"),
            NameError::BadPointer => {
                FormError::new("invalid compression pointer")
            }
            NameError::ShortInput => FormError::new("short domain name"),
            NameError::TrailingData => {
                FormError::new("trailing data after domain name")
            }
        }
    }
}

impl From<NameError> for ParseError {
    fn from(err: NameError) -> ParseError {
        ParseError::Form(err.into())
    }
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        FormError::from(*self).fmt(f)
    }
}

impl std::error::Error for NameError {}

//------------ FromStrError --------------------------------------------------

/// An error happened while converting a string into a domain name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum FromStrError {
    /// The string was empty.
    EmptyString,

    /// Two dots followed each other or the name started with a dot.
    EmptyLabel,

    /// A label was longer than 63 octets.
    LongLabel,

    /// The name was longer than 255 octets in wire format.
    LongName,

    /// An escape sequence was malformed.
    IllegalEscape,

    /// The string ended inside an escape sequence.
    UnexpectedEnd,

    /// A character outside of printable ASCII was found.
    IllegalCharacter(char),
}

impl fmt::Display for FromStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FromStrError::EmptyString => f.write_str("empty string"),
            FromStrError::EmptyLabel => {
                f.write_str("an empty label was encountered")
            }
            FromStrError::LongLabel => f.write_str("label too long"),
            FromStrError::LongName => f.write_str("long domain name"),
            FromStrError::IllegalEscape => {
                f.write_str("illegal escape sequence")
            }
            FromStrError::UnexpectedEnd => {
                f.write_str("unexpected end of input")
            }
            FromStrError::IllegalCharacter(ch) => {
                write!(f, "illegal character '{}'", ch)
            }
        }
    }
}

impl std::error::Error for FromStrError {}

//============ Testing =======================================================
