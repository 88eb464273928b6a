//! # dtest-core
//!
//! Shared message contract for in-process distributed tests.
//!
//! Test drivers run several simulated nodes inside one process and script
//! the network between them. This crate holds the types every participant
//! agrees on:
//!
//! - [`Message`]: the envelope a simulated node sends to another node
//! - [`AddressAndPort`]: IP address + port identifying a node on the wire
//! - [`NodeId`] and [`Verb`]: integer node and message-type identifiers

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod message;
mod types;

pub use message::Message;
pub use types::{AddressAndPort, AddressParseError, NodeId, Verb};
