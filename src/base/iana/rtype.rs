//! Resource Record (RR) TYPEs

//------------ Rtype ---------------------------------------------------------

int_enum! {
    /// Resource Record Types.
    ///
    /// Each resource records has a 16 bit type value indicating what kind of
    /// information is represented by the record. Normal query includes the
    /// type of record information is requested for. A few additional types,
    /// called query types, are defined as well and can only be used in
    /// questions.
    ///
    /// Only the types the query pipeline interprets, plus a few common ones,
    /// have constants. Any other value can be created via
    /// [`from_int`][Self::from_int].
    ///
    /// For the complete list see the [IANA Resource Record (RR) TYPEs
    /// registry].
    ///
    /// [IANA Resource Record (RR) TYPEs registry]: http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4
    =>
    Rtype, u16, "TYPE";

    /// A host address.
    (A => 1, "A")

    /// An authoritative name server.
    (NS => 2, "NS")

    /// The canonical name for an alias.
    (CNAME => 5, "CNAME")

    /// Marks the start of a zone of authority.
    (SOA => 6, "SOA")

    /// A domain name pointer.
    (PTR => 12, "PTR")

    /// Host information.
    (HINFO => 13, "HINFO")

    /// Mail exchange.
    (MX => 15, "MX")

    /// Text strings.
    (TXT => 16, "TXT")

    /// IPv6 address.
    (AAAA => 28, "AAAA")

    /// Server selection.
    (SRV => 33, "SRV")

    /// Option.
    (OPT => 41, "OPT")

    /// Certification Authority Restriction.
    (CAA => 257, "CAA")

    /// A request for all records the server/cache has available.
    (ANY => 255, "*")
}

//============ Tests =========================================================
