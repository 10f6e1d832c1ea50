//! Common types for capbeam caption decoding.
//!
//! This crate holds the pieces every other capbeam crate agrees on: the
//! token identifier type, the decode/logging configuration with its TOML and
//! environment sources, and the token table that maps ids to words.

pub mod config;
pub mod vocab;

pub use config::*;
pub use vocab::*;

/// Integer identifier of a vocabulary entry.
pub type TokenId = u32;
