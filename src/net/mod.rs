//! Sending and receiving DNS messages.
//!
//! This module provides types, traits, and function for sending DNS
//! queries and receiving the responses to them. Currently, it only contains
//! the [`client`] sub-module.
//!
//! The module requires the `net` feature, which is enabled by default.
#![cfg(feature = "net")]
#![cfg_attr(docsrs, doc(cfg(feature = "net")))]

pub mod client;
