//! DNS response codes.
//!
//! The DNS specification in [RFC 1035] specified four bits of the message
//! header as response code. This is all the query pipeline looks at:
//! extended response codes live in the OPT record which is carried along as
//! opaque record data.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035

//------------ Rcode --------------------------------------------------------

int_enum! {
    /// DNS Response Codes.
    ///
    /// The response code of a response indicates what happend on the server
    /// when trying to answer the query. The code is a 4 bit value and part
    /// of the header of a DNS message.
    ///
    /// Note that a response code other than `NOERROR` is not a failure of
    /// the exchange itself: such responses are decoded and handed to the
    /// caller like any other.
    =>
    Rcode, u8, "RCODE";

    /// No error condition.
    (NOERROR => 0, "NOERROR")

    /// Format error.
    ///
    /// The name server was unable to interpret the query.
    (FORMERR => 1, "FORMERR")

    /// Server failure.
    (SERVFAIL => 2, "SERVFAIL")

    /// Name error.
    ///
    /// The domain name given in the query does not exist at the name
    /// server.
    (NXDOMAIN => 3, "NXDOMAIN")

    /// Not implemented.
    (NOTIMP => 4, "NOTIMP")

    /// Query refused.
    (REFUSED => 5, "REFUSED")
}
