//! Error types for the simulated network.

use dtest_core::{AddressAndPort, NodeId};

/// Errors raised by [`SimNetwork`](super::SimNetwork).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// No node is registered under this id.
    #[error("unknown node: {id}")]
    UnknownNode {
        /// The id that was not found.
        id: NodeId,
    },

    /// A node is already registered under this id.
    #[error("node {id} is already registered")]
    DuplicateNode {
        /// The conflicting id.
        id: NodeId,
    },

    /// Another node already uses this address.
    #[error("address {address} is already used by node {owner}")]
    DuplicateAddress {
        /// The conflicting address.
        address: AddressAndPort,
        /// Node that owns the address.
        owner: NodeId,
    },

    /// A delayed delivery needs a tokio runtime and none is running.
    #[error("delayed delivery requires a tokio runtime")]
    NoRuntime,

    /// The receiver dropped its inbox.
    #[error("inbox of node {id} is closed")]
    InboxClosed {
        /// Node whose inbox is gone.
        id: NodeId,
    },
}

/// Result type for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;
