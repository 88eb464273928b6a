//! Interception point for permitted messages.

use dtest_core::AddressAndPort;

use super::sim::Envelope;

/// Receives permitted messages instead of the destination node's inbox.
///
/// Installed with [`SimNetwork::set_message_sink`](super::SimNetwork::set_message_sink).
/// A sink can record traffic, reorder it, or hand it back with
/// [`SimNetwork::deliver`](super::SimNetwork::deliver).
pub trait MessageSink: Send + Sync {
    /// Accept a message that passed both filter chains.
    fn accept(&self, to: AddressAndPort, envelope: Envelope);
}

impl<F> MessageSink for F
where
    F: Fn(AddressAndPort, Envelope) + Send + Sync,
{
    fn accept(&self, to: AddressAndPort, envelope: Envelope) {
        self(to, envelope)
    }
}
