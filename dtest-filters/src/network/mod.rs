//! Simulated message delivery between registered nodes.
//!
//! [`SimNetwork`] plays the cluster's part of the filter contract: every
//! message goes through the outbound chain of the sender, then the inbound
//! chain of the receiver, and only then reaches the receiver's
//! [`NodeInbox`] (or the installed [`MessageSink`]).
//!
//! | Outcome | Outbound verdict | Inbound verdict | Result |
//! |---------|------------------|-----------------|--------|
//! | Drop at sender | `Drop` | not consulted | [`Delivery::Dropped`]`(Outbound)` |
//! | Drop at receiver | `Deliver`/`Delay` | `Drop` | [`Delivery::Dropped`]`(Inbound)` |
//! | Immediate | `Deliver` | `Deliver` | [`Delivery::Delivered`] (with zero base latency) |
//! | Late | any `Delay` or base latency | `Deliver`/`Delay` | [`Delivery::Delayed`] |

mod config;
mod error;
mod sim;
mod sink;

pub use config::NetworkConfiguration;
pub use error::{NetworkError, NetworkResult};
pub use sim::{Delivery, Envelope, NodeInbox, SimNetwork};
pub use sink::MessageSink;
