//! Various utility modules.

pub mod config;
