//! Error type for query executors.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::name::Dname;
use crate::base::wire::{ComposeError, ParseError};
use std::error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Error type for query executors.
///
/// The type is cheap to clone so the same error can be handed to every
/// caller waiting for a shared query.
///
/// A response with an error response code such as NXDOMAIN or SERVFAIL is
/// not an error. It is returned as a regular message.
#[derive(Clone, Debug)]
pub enum Error {
    /// The response could not be parsed.
    Format(ParseError),

    /// The query could not be put into wire format.
    Compose(ComposeError),

    /// No response arrived in time.
    ///
    /// Carries the name that was asked for.
    Timeout(Dname),

    /// The query was cancelled by the caller.
    Cancelled,

    /// Binding a UDP socket gave an error.
    UdpBind(Arc<std::io::Error>),

    /// Connecting a UDP socket gave an error.
    UdpConnect(Arc<std::io::Error>),

    /// Sending over a UDP socket gaven an error.
    UdpSend(Arc<std::io::Error>),

    /// Sending over a UDP socket gave a partial result.
    UdpShortSend,

    /// Receiving from a UDP socket gave an error.
    UdpReceive(Arc<std::io::Error>),

    /// Establishing a stream connection gave an error.
    StreamConnect(Arc<std::io::Error>),

    /// Writing to a stream gave an error.
    StreamWrite(Arc<std::io::Error>),

    /// Reading from stream gave an error.
    StreamRead(Arc<std::io::Error>),

    /// Reading for a stream ended unexpectedly.
    StreamUnexpectedEndOfData,

    /// Reply does not match the query.
    WrongReplyForQuery,
}

impl Error {
    /// Returns whether the error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Returns whether the query was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns whether a response was received but couldn’t be parsed.
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }

    /// Returns whether trying again may succeed.
    ///
    /// This is the case for timeouts and all transport errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Format(_) | Error::Compose(_) | Error::Cancelled => false,
            Error::Timeout(_)
            | Error::UdpBind(_)
            | Error::UdpConnect(_)
            | Error::UdpSend(_)
            | Error::UdpShortSend
            | Error::UdpReceive(_)
            | Error::StreamConnect(_)
            | Error::StreamWrite(_)
            | Error::StreamRead(_)
            | Error::StreamUnexpectedEndOfData
            | Error::WrongReplyForQuery => true,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Format(err)
    }
}

impl From<ComposeError> for Error {
    fn from(err: ComposeError) -> Self {
        Error::Compose(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::Format(err) => write!(f, "malformed response: {}", err),
            Error::Compose(err) => write!(f, "cannot compose query: {}", err),
            Error::Timeout(name) => {
                write!(f, "DNS query for {} timed out", name)
            }
            Error::Cancelled => write!(f, "DNS query cancelled"),
            Error::UdpBind(_) => write!(f, "error binding UDP socket"),
            Error::UdpConnect(_) => write!(f, "error connecting UDP socket"),
            Error::UdpSend(_) => write!(f, "error sending to UDP socket"),
            Error::UdpShortSend => write!(f, "partial sent to UDP socket"),
            Error::UdpReceive(_) => {
                write!(f, "error receiving from UDP socket")
            }
            Error::StreamConnect(_) => {
                write!(f, "error connecting stream")
            }
            Error::StreamWrite(_) => {
                write!(f, "error writing to stream")
            }
            Error::StreamRead(_) => {
                write!(f, "error reading from stream")
            }
            Error::StreamUnexpectedEndOfData => {
                write!(f, "unexpected end of data")
            }
            Error::WrongReplyForQuery => {
                write!(f, "reply does not match query")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Format(e) => Some(e),
            Error::Compose(e) => Some(e),
            Error::Timeout(_) => None,
            Error::Cancelled => None,
            Error::UdpBind(e) => Some(e),
            Error::UdpConnect(e) => Some(e),
            Error::UdpSend(e) => Some(e),
            Error::UdpShortSend => None,
            Error::UdpReceive(e) => Some(e),
            Error::StreamConnect(e) => Some(e),
            Error::StreamWrite(e) => Some(e),
            Error::StreamRead(e) => Some(e),
            Error::StreamUnexpectedEndOfData => None,
            Error::WrongReplyForQuery => None,
        }
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn timeout_message() {
        let err = Error::Timeout(Dname::from_str("igor.io").unwrap());
        assert_eq!(err.to_string(), "DNS query for igor.io timed out");
        assert!(err.is_timeout());
        assert!(err.is_transient());
    }

    #[test]
    fn classification() {
        assert!(!Error::Cancelled.is_transient());
        assert!(Error::Cancelled.is_cancelled());
        let format = Error::from(ParseError::ShortInput);
        assert!(format.is_format());
        assert!(!format.is_transient());
        assert!(!Error::from(ComposeError::LongData).is_transient());
        assert!(Error::StreamUnexpectedEndOfData.is_transient());
        let io = Arc::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(Error::StreamConnect(io.clone()).is_transient());
        assert!(error::Error::source(&Error::UdpReceive(io)).is_some());
    }
}
