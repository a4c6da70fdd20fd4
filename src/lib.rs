//! A non-blocking DNS client core.
//!
//! This crate provides the building blocks for asking DNS questions: an
//! owned model of DNS messages together with their wire format, and a set
//! of composable query executors that send queries to name servers.
//!
//! # Modules
//!
//! A set of modules providing fundamental types and functionality is always
//! enabled:
//!
//! * [base] contains the types for DNS data, such as domain names, records,
//!   and messages, as well as parsing and composing their wire format, and
//! * [utils] contains helpers used throughout the crate.
//!
//! The query executors live in the
#![cfg_attr(feature = "net", doc = "[net]")]
#![cfg_attr(not(feature = "net"), doc = "net")]
//! module. They are based on the [Tokio](https://tokio.rs/) async runtime
//! and hidden behind the `net` feature flag.
//!
//! # Reference of Feature Flags
//!
//! * `net`: Enables the query executors of the `net::client` module and
//!   pulls in Tokio and its companions. This feature is enabled by default.
//!
//! # Non-goals
//!
//! The crate does not implement a DNS server, recursive resolution, or
//! DNSSEC validation. It also leaves finding the system’s name servers and
//! its hosts file to the user.

#![allow(renamed_and_removed_lints)]
#![allow(clippy::unknown_clippy_lints)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod base;
pub mod net;
pub mod utils;
