//! The message envelope exchanged between simulated nodes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::{AddressAndPort, Verb};

/// A message sent from one simulated node to another.
///
/// Immutable once built: filters and sinks only ever inspect it. The payload
/// is a [`Bytes`] so fanning a message out to several nodes does not copy it.
///
/// # Examples
///
/// ```
/// use dtest_core::Message;
///
/// let msg = Message::new(7, "mutation").with_id(42).with_version(12);
/// assert_eq!(msg.verb(), 7);
/// assert_eq!(msg.bytes(), b"mutation");
/// assert_eq!(msg.id(), 42);
/// assert!(msg.from().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    verb: Verb,
    bytes: Bytes,
    id: u64,
    version: u32,
    from: Option<AddressAndPort>,
    from_port: u16,
}

impl Message {
    /// Create a message with the given verb and payload.
    ///
    /// Id and version default to zero and the origin is unset.
    pub fn new(verb: Verb, bytes: impl Into<Bytes>) -> Self {
        Self {
            verb,
            bytes: bytes.into(),
            id: 0,
            version: 0,
            from: None,
            from_port: 0,
        }
    }

    /// Set the message identifier.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Set the protocol version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the origin address. The origin port defaults to the address port.
    pub fn with_origin(mut self, from: AddressAndPort) -> Self {
        self.from = Some(from);
        self.from_port = from.port;
        self
    }

    /// Override the port the message was sent from (e.g. an ephemeral port).
    pub fn with_from_port(mut self, from_port: u16) -> Self {
        self.from_port = from_port;
        self
    }

    /// Message-type tag.
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Serialized payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload as a shared buffer.
    pub fn payload(&self) -> &Bytes {
        &self.bytes
    }

    /// Message identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Protocol version the message was serialized with.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Address of the node that sent the message, if known.
    pub fn from(&self) -> Option<&AddressAndPort> {
        self.from.as_ref()
    }

    /// Port the message was sent from.
    pub fn from_port(&self) -> u16 {
        self.from_port
    }
}
