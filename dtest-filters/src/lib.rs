//! # dtest-filters
//!
//! Message filtering and simulated networking for in-process distributed
//! tests.
//!
//! - [`filters`]: the rule chain deciding whether a message between two
//!   simulated nodes is delivered, dropped or delayed
//! - [`network`]: a registry of simulated nodes that routes messages through
//!   the filters, outbound at the sender and inbound at the receiver
//!
//! ## Quick Start
//!
//! ```
//! use dtest_core::{AddressAndPort, Message};
//! use dtest_filters::{MessageFilters, NetworkConfiguration, SimNetwork};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let network = SimNetwork::new(MessageFilters::new(), NetworkConfiguration::fast_local());
//! let _n1 = network.register(1, AddressAndPort::parse("127.0.0.1:7012")?)?;
//! let mut n2 = network.register(2, AddressAndPort::parse("127.0.0.2:7012")?)?;
//!
//! network.filters().verbs([5]).from([1]).to([2]).drop();
//! network.send(1, 2, Message::new(5, "dropped"))?;
//! network.send(1, 2, Message::new(6, "delivered"))?;
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().build()?;
//! let received = runtime.block_on(n2.recv());
//! assert_eq!(received.map(|e| e.message.verb()), Some(6));
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub use dtest_core::{AddressAndPort, Message, NodeId, Verb};

/// Rule-based message filters.
pub mod filters;

/// Simulated message delivery between registered nodes.
pub mod network;

pub use filters::{
    ActionKind, DelaySource, DelaySupplier, Direction, FilterAction, FilterBuilder,
    FilterDescription, FilterHandle, MessageFilters, MessageMatcher, Verdict,
};
pub use network::{
    Delivery, Envelope, MessageSink, NetworkConfiguration, NetworkError, NetworkResult,
    NodeInbox, SimNetwork,
};
