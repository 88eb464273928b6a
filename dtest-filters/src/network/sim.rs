//! Node registry and filtered delivery.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use dtest_core::{AddressAndPort, Message, NodeId};
use tokio::sync::mpsc;

use super::config::NetworkConfiguration;
use super::error::{NetworkError, NetworkResult};
use super::sink::MessageSink;
use crate::filters::{Direction, MessageFilters, Verdict};

/// A message in flight between two registered nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Sending node.
    pub from: NodeId,
    /// Receiving node.
    pub to: NodeId,
    /// The message itself.
    pub message: Message,
}

/// What [`SimNetwork::send`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the receiver (or the sink) before `send` returned.
    Delivered,
    /// Scheduled for delivery after the given delay.
    Delayed(Duration),
    /// Dropped by the filter chain of the given direction.
    Dropped(Direction),
}

/// Receiving end of a registered node.
#[derive(Debug)]
pub struct NodeInbox {
    node_id: NodeId,
    receiver: mpsc::UnboundedReceiver<Envelope>,
}

impl NodeInbox {
    /// Node this inbox belongs to.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Wait for the next message. `None` once the network is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.receiver.recv().await
    }

    /// Take the next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.receiver.try_recv().ok()
    }
}

#[derive(Clone)]
struct NodeEntry {
    address: AddressAndPort,
    inbox: mpsc::UnboundedSender<Envelope>,
}

struct Inner {
    filters: MessageFilters,
    config: NetworkConfiguration,
    nodes: RwLock<BTreeMap<NodeId, NodeEntry>>,
    sink: RwLock<Option<Arc<dyn MessageSink>>>,
}

/// In-process network connecting simulated nodes through [`MessageFilters`].
///
/// Cloning is cheap; clones share nodes, filters and sink.
#[derive(Clone)]
pub struct SimNetwork {
    inner: Arc<Inner>,
}

impl SimNetwork {
    /// Create a network with no nodes.
    pub fn new(filters: MessageFilters, config: NetworkConfiguration) -> Self {
        Self {
            inner: Arc::new(Inner {
                filters,
                config,
                nodes: RwLock::new(BTreeMap::new()),
                sink: RwLock::new(None),
            }),
        }
    }

    /// The filters every delivery goes through.
    pub fn filters(&self) -> &MessageFilters {
        &self.inner.filters
    }

    /// The network configuration.
    pub fn config(&self) -> &NetworkConfiguration {
        &self.inner.config
    }

    /// Register a node and return its inbox.
    ///
    /// # Errors
    ///
    /// Fails if the id or the address is already registered.
    pub fn register(&self, id: NodeId, address: AddressAndPort) -> NetworkResult<NodeInbox> {
        let mut nodes = self
            .inner
            .nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if nodes.contains_key(&id) {
            return Err(NetworkError::DuplicateNode { id });
        }
        if let Some((&owner, _)) = nodes.iter().find(|(_, node)| node.address == address) {
            return Err(NetworkError::DuplicateAddress { address, owner });
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        nodes.insert(
            id,
            NodeEntry {
                address,
                inbox: sender,
            },
        );
        tracing::debug!(node = id, %address, "node registered");

        Ok(NodeInbox {
            node_id: id,
            receiver,
        })
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    /// Whether no node is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }

    /// Ids of every registered node, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().keys().copied().collect()
    }

    /// Address of a registered node.
    pub fn node_address(&self, id: NodeId) -> Option<AddressAndPort> {
        self.nodes().get(&id).map(|node| node.address)
    }

    /// Node registered under `address`.
    pub fn node_for_address(&self, address: &AddressAndPort) -> Option<NodeId> {
        self.nodes()
            .iter()
            .find(|(_, node)| node.address == *address)
            .map(|(&id, _)| id)
    }

    /// Route permitted messages to `sink` instead of node inboxes.
    pub fn set_message_sink(&self, sink: impl MessageSink + 'static) {
        *self
            .inner
            .sink
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(sink));
        tracing::debug!("message sink installed");
    }

    /// Go back to delivering into node inboxes.
    pub fn clear_message_sink(&self) {
        *self
            .inner
            .sink
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        tracing::debug!("message sink cleared");
    }

    /// Send `message` from `from` to `to` through both filter chains.
    ///
    /// The outbound chain is evaluated first; the inbound chain is only
    /// consulted when the sender lets the message out. Permitted messages
    /// with no delay are delivered before this returns, delayed ones are
    /// delivered by a task spawned on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`NetworkError::UnknownNode`] if either node is not registered
    /// - [`NetworkError::NoRuntime`] if the message is delayed outside a runtime.
    ///   The delay is only known once both chains have run, so their content
    ///   predicates and delay suppliers have already been called for the
    ///   rejected message.
    /// - [`NetworkError::InboxClosed`] if an immediate delivery finds the
    ///   receiver's inbox dropped
    pub fn send(&self, from: NodeId, to: NodeId, message: Message) -> NetworkResult<Delivery> {
        let target = {
            let nodes = self.nodes();
            if !nodes.contains_key(&from) {
                return Err(NetworkError::UnknownNode { id: from });
            }
            nodes
                .get(&to)
                .cloned()
                .ok_or(NetworkError::UnknownNode { id: to })?
        };

        let Some(outbound) = self.filter_delay(Direction::Outbound, from, to, &message) else {
            return Ok(Delivery::Dropped(Direction::Outbound));
        };
        let Some(inbound) = self.filter_delay(Direction::Inbound, from, to, &message) else {
            return Ok(Delivery::Dropped(Direction::Inbound));
        };

        let delay = self.inner.config.total_delay(outbound, inbound);
        let envelope = Envelope { from, to, message };
        if delay.is_zero() {
            self.dispatch(&target, envelope)?;
            return Ok(Delivery::Delivered);
        }

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| NetworkError::NoRuntime)?;
        let network = self.clone();
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = network.dispatch(&target, envelope) {
                tracing::warn!(from, to, error = %e, "delayed delivery failed");
            }
        });
        Ok(Delivery::Delayed(delay))
    }

    /// Hand `envelope` straight to the node at `to`, bypassing filters and
    /// the sink.
    ///
    /// Returns `false` if no node owns the address or its inbox is closed.
    pub fn deliver(&self, to: &AddressAndPort, envelope: Envelope) -> bool {
        let inbox = self
            .nodes()
            .values()
            .find(|node| node.address == *to)
            .map(|node| node.inbox.clone());
        match inbox {
            Some(inbox) => inbox.send(envelope).is_ok(),
            None => {
                tracing::debug!(%to, "no node for direct delivery");
                false
            }
        }
    }

    /// `None` when dropped, otherwise the delay the chain asks for.
    fn filter_delay(
        &self,
        direction: Direction,
        from: NodeId,
        to: NodeId,
        message: &Message,
    ) -> Option<Duration> {
        match self.inner.filters.evaluate(direction, from, to, message) {
            Verdict::Deliver => Some(Duration::ZERO),
            Verdict::Delay(delay) => Some(delay),
            Verdict::Drop => {
                tracing::debug!(from, to, verb = message.verb(), %direction, "message dropped");
                None
            }
        }
    }

    fn dispatch(&self, target: &NodeEntry, envelope: Envelope) -> NetworkResult<()> {
        let sink = self
            .inner
            .sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        tracing::trace!(
            from = envelope.from,
            to = envelope.to,
            verb = envelope.message.verb(),
            sink = sink.is_some(),
            "delivering message"
        );

        match sink {
            Some(sink) => {
                sink.accept(target.address, envelope);
                Ok(())
            }
            None => {
                let id = envelope.to;
                target
                    .inbox
                    .send(envelope)
                    .map_err(|_| NetworkError::InboxClosed { id })
            }
        }
    }

    fn nodes(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<NodeId, NodeEntry>> {
        self.inner
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SimNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimNetwork")
            .field("nodes", &self.node_ids())
            .field("config", &self.inner.config)
            .field("filters", &self.inner.filters.len())
            .finish_non_exhaustive()
    }
}
