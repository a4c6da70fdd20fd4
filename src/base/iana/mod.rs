//! IANA Definitions for DNS.
//!
//! This module contains types for the parameters defined in IANA registries
//! that the query pipeline needs: record types, classes, opcodes, and
//! response codes.
//!
//! All types defined hereunder follow the same basic structure. They are
//! newtypes around the raw integer with an associated constant for every
//! well-defined value. Since any integer may appear on the wire, values
//! without a constant are perfectly valid and are carried along unchanged.
//!
//! There are two methods `from_int()` and `to_int()` to convert from and
//! to raw integer values as well as implementations of the `From` trait
//! for these. `FromStr` and `Display` convert from the mnemonics to the
//! values and back.

use core::fmt;

pub use self::class::Class;
pub use self::opcode::Opcode;
pub use self::rcode::Rcode;
pub use self::rtype::Rtype;

#[macro_use]
mod macros;

pub mod class;
pub mod opcode;
pub mod rcode;
pub mod rtype;

//------------ FromStrError --------------------------------------------------

/// A string could not be converted into an IANA value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FromStrError(pub(crate) ());

impl fmt::Display for FromStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("unknown mnemonic")
    }
}

impl std::error::Error for FromStrError {}
