//! DNS CLASSes.

//------------ Class ---------------------------------------------------------

int_enum! {
    /// DNS CLASSes.
    ///
    /// The domain name space is partitioned into separate classes for
    /// different network types. That is, each class has its own separate
    /// record tree starting at the root. However, in practice, only the IN
    /// class is really relevant.
    ///
    /// Classes are represented by a 16 bit value.
    ///
    /// See [RFC 1034] for the introduction of classes and
    /// [RFC 6895] for a discussion of the current state of affairs.
    ///
    /// [RFC 1034]: https://tools.ietf.org/html/rfc1034
    /// [RFC 6895]: https://tools.ietf.org/html/rfc6895
    =>
    Class, u16, "CLASS";

    /// Internet (IN).
    ///
    /// This class is defined in RFC 1035 and really the only one relevant
    /// at all.
    (IN => 1, "IN")

    /// Chaosnet (CH).
    ///
    /// Reused by BIND for built-in server information zones.
    (CH => 3, "CH")

    /// Hesiod (HS).
    (HS => 4, "HS")

    /// Query class None.
    (NONE => 0xFE, "NONE")

    /// Query class * (ANY).
    (ANY => 0xFF, "*")
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::Class;
    use core::str::FromStr;

    #[test]
    fn from_str() {
        assert_eq!(Class::from_str("in"), Ok(Class::IN));
        assert_eq!(Class::from_str("CH"), Ok(Class::CH));
        assert_eq!(Class::from_str("CLASS5"), Ok(Class::from_int(5)));
        assert!(Class::from_str("CLASS").is_err());
        assert!(Class::from_str("foo").is_err());
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Class::IN), "IN");
        assert_eq!(format!("{}", Class::from_int(5)), "CLASS5");
        assert_eq!(format!("{:?}", Class::IN), "Class::IN");
    }
}
