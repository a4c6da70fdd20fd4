//! Creating and consuming data in wire format.
//!
//! Parsing happens through a [`Parser`], a cursor over the octets of a
//! complete message. Because compressed domain names refer to absolute
//! positions within the message, the parser always sees the whole message
//! and can be repositioned via [`seek`][Parser::seek].
//!
//! Composing happens directly into a `Vec<u8>` holding the message. The
//! helpers in here take care of length prefixes.

use core::fmt;

//------------ Parser --------------------------------------------------------

/// A parser for sequentially extracting data from a message.
///
/// All multi-octet integers are read in network byte order.
#[derive(Clone, Copy, Debug)]
pub struct Parser<'a> {
    /// The complete message.
    octets: &'a [u8],

    /// The current position of the parser.
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser atop the start of the given octets.
    pub fn from_slice(octets: &'a [u8]) -> Self {
        Parser { octets, pos: 0 }
    }

    /// Returns the complete underlying octets.
    pub fn as_slice(&self) -> &'a [u8] {
        self.octets
    }

    /// Returns the current position of the parser.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the number of octets left to parse.
    pub fn remaining(&self) -> usize {
        self.octets.len() - self.pos
    }

    /// Repositions the parser to the given absolute position.
    pub fn seek(&mut self, pos: usize) -> Result<(), ParseError> {
        if pos > self.octets.len() {
            Err(ParseError::ShortInput)
        } else {
            self.pos = pos;
            Ok(())
        }
    }

    /// Advances the parser by `len` octets.
    pub fn advance(&mut self, len: usize) -> Result<(), ParseError> {
        if len > self.remaining() {
            Err(ParseError::ShortInput)
        } else {
            self.pos += len;
            Ok(())
        }
    }

    /// Checks that at least `len` octets are left.
    pub fn check_len(&self, len: usize) -> Result<(), ParseError> {
        if self.remaining() < len {
            Err(ParseError::ShortInput)
        } else {
            Ok(())
        }
    }

    /// Takes the next `len` octets.
    pub fn parse_slice(
        &mut self,
        len: usize,
    ) -> Result<&'a [u8], ParseError> {
        self.check_len(len)?;
        let res = &self.octets[self.pos..self.pos + len];
        self.pos += len;
        Ok(res)
    }

    /// Fills `buf` with the next octets.
    pub fn parse_buf(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        buf.copy_from_slice(self.parse_slice(buf.len())?);
        Ok(())
    }

    /// Takes a single octet.
    pub fn parse_u8(&mut self) -> Result<u8, ParseError> {
        self.check_len(1)?;
        let res = self.octets[self.pos];
        self.pos += 1;
        Ok(res)
    }

    /// Takes a big-endian 16 bit integer.
    pub fn parse_u16_be(&mut self) -> Result<u16, ParseError> {
        let mut buf = [0u8; 2];
        self.parse_buf(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Takes a big-endian 32 bit integer.
    pub fn parse_u32_be(&mut self) -> Result<u32, ParseError> {
        let mut buf = [0u8; 4];
        self.parse_buf(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }
}

//------------ compose functions ---------------------------------------------

/// Composes some data prefixed by its length as a 16 bit integer.
///
/// The closure appends the data to `target`. If it fails or the data turns
/// out to be longer than 65535 octets, the target is truncated back to where
/// it was before the call.
pub fn compose_len_prefixed<F>(
    target: &mut Vec<u8>,
    op: F,
) -> Result<(), ComposeError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), ComposeError>,
{
    let start = target.len();
    target.extend_from_slice(&[0; 2]);
    let pos = target.len();
    let res = op(target).and_then(|_| {
        u16::try_from(target.len() - pos).map_err(|_| ComposeError::LongData)
    });
    match res {
        Ok(len) => {
            target[start..pos].copy_from_slice(&len.to_be_bytes());
            Ok(())
        }
        Err(err) => {
            target.truncate(start);
            Err(err)
        }
    }
}

//------------ ParseError ----------------------------------------------------

/// An error happened while parsing data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An attempt was made to go beyond the end of the parser.
    ShortInput,

    /// A formatting error occurred.
    Form(FormError),
}

impl ParseError {
    /// Creates a new parse error as a form error with the given message.
    pub fn form_error(msg: &'static str) -> Self {
        FormError::new(msg).into()
    }
}

//--- From

impl From<FormError> for ParseError {
    fn from(err: FormError) -> Self {
        ParseError::Form(err)
    }
}

//--- Display and Error

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::ShortInput => f.write_str("unexpected end of input"),
            ParseError::Form(ref err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ParseError {}

//------------ FormError -----------------------------------------------------

/// A formatting error occured.
///
/// This is a generic error for all kinds of error cases that result in data
/// not being accepted. For diagnostics, the error is being given a static
/// string describing the error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormError(&'static str);

impl FormError {
    /// Creates a new form error value with the given diagnostics string.
    pub fn new(msg: &'static str) -> Self {
        FormError(msg)
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for FormError {}

//------------ ComposeError --------------------------------------------------

/// A message could not be put into wire format.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComposeError {
    /// Length-prefixed data was longer than 65535 octets.
    LongData,

    /// A section holds more than 65535 entries.
    TooManyEntries,
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ComposeError::LongData => f.write_str("data too long"),
            ComposeError::TooManyEntries => {
                f.write_str("too many entries in section")
            }
        }
    }
}

impl std::error::Error for ComposeError {}

//============ Tests =========================================================
