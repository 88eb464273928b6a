//! Filter rules, their actions and the handles tests use to toggle them.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dtest_core::{Message, NodeId, Verb};
use serde::{Deserialize, Serialize};

/// Caller-supplied content predicate over `(from, to, message)`.
pub type MessageMatcher = Arc<dyn Fn(NodeId, NodeId, &Message) -> bool + Send + Sync>;

/// Caller-supplied delay computed per message.
pub type DelaySupplier = Arc<dyn Fn(NodeId, NodeId, &Message) -> Duration + Send + Sync>;

/// Which side of a transfer a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Evaluated by the receiving node before it accepts a message.
    Inbound,
    /// Evaluated by the sending node before the message leaves it.
    #[default]
    Outbound,
}

impl Direction {
    /// `Inbound` when `inbound` is true, `Outbound` otherwise.
    pub fn from_inbound(inbound: bool) -> Self {
        if inbound {
            Self::Inbound
        } else {
            Self::Outbound
        }
    }

    /// Whether this is the inbound direction.
    pub fn is_inbound(self) -> bool {
        self == Self::Inbound
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbound => f.write_str("inbound"),
            Self::Outbound => f.write_str("outbound"),
        }
    }
}

/// A set of ids a rule is scoped to, or the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum Scope<T> {
    #[default]
    Any,
    Only(BTreeSet<T>),
}

impl<T: Ord + Copy> Scope<T> {
    pub(crate) fn only(ids: impl IntoIterator<Item = T>) -> Self {
        Self::Only(ids.into_iter().collect())
    }

    pub(crate) fn contains(&self, id: T) -> bool {
        match self {
            Self::Any => true,
            Self::Only(ids) => ids.contains(&id),
        }
    }

    fn to_vec(&self) -> Option<Vec<T>> {
        match self {
            Self::Any => None,
            Self::Only(ids) => Some(ids.iter().copied().collect()),
        }
    }
}

/// How long a delayed message is held back.
#[derive(Clone)]
pub enum DelaySource {
    /// The same delay for every matching message.
    Fixed(Duration),
    /// A delay computed from the message and its endpoints.
    Computed(DelaySupplier),
}

impl DelaySource {
    fn resolve(&self, from: NodeId, to: NodeId, message: &Message) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Computed(supplier) => supplier(from, to, message),
        }
    }
}

impl fmt::Debug for DelaySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(delay) => f.debug_tuple("Fixed").field(delay).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// What happens to a message matched by a rule.
#[derive(Debug, Clone)]
pub enum FilterAction {
    /// The message is never delivered.
    Drop,
    /// The message is delivered late.
    Delay(DelaySource),
}

/// Outcome of evaluating the rule chain for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No rule matched; deliver normally.
    Deliver,
    /// A drop rule matched.
    Drop,
    /// A delay rule matched; deliver after the given duration.
    Delay(Duration),
}

impl Verdict {
    /// Whether the message may proceed (delivered now or later).
    pub fn permits(self) -> bool {
        !matches!(self, Self::Drop)
    }
}

/// A registered rule. Immutable apart from its enabled flag.
pub(crate) struct Filter {
    pub(crate) id: u64,
    pub(crate) direction: Direction,
    pub(crate) verbs: Scope<Verb>,
    pub(crate) from: Scope<NodeId>,
    pub(crate) to: Scope<NodeId>,
    pub(crate) matcher: Option<MessageMatcher>,
    pub(crate) action: FilterAction,
    pub(crate) enabled: AtomicBool,
}

impl Filter {
    /// Everything but the content predicate: cheap, pure, checked first.
    fn in_scope(
        &self,
        direction: Direction,
        from: NodeId,
        to: NodeId,
        message: &Message,
    ) -> bool {
        self.direction == direction
            && self.verbs.contains(message.verb())
            && self.from.contains(from)
            && self.to.contains(to)
    }

    /// Full predicate chain. The matcher only runs for in-scope transfers.
    pub(crate) fn matches(
        &self,
        direction: Direction,
        from: NodeId,
        to: NodeId,
        message: &Message,
    ) -> bool {
        self.is_enabled()
            && self.in_scope(direction, from, to, message)
            && self
                .matcher
                .as_ref()
                .is_none_or(|matcher| matcher(from, to, message))
    }

    pub(crate) fn verdict(&self, from: NodeId, to: NodeId, message: &Message) -> Verdict {
        match &self.action {
            FilterAction::Drop => Verdict::Drop,
            FilterAction::Delay(source) => Verdict::Delay(source.resolve(from, to, message)),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn describe(&self) -> FilterDescription {
        FilterDescription {
            id: self.id,
            direction: self.direction,
            verbs: self.verbs.to_vec(),
            from: self.from.to_vec(),
            to: self.to.to_vec(),
            content_predicate: self.matcher.is_some(),
            action: match &self.action {
                FilterAction::Drop => ActionKind::Drop,
                FilterAction::Delay(DelaySource::Fixed(delay)) => ActionKind::Delay {
                    millis: Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)),
                },
                FilterAction::Delay(DelaySource::Computed(_)) => {
                    ActionKind::Delay { millis: None }
                }
            },
            enabled: self.is_enabled(),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("id", &self.id)
            .field("direction", &self.direction)
            .field("verbs", &self.verbs)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("matcher", &self.matcher.is_some())
            .field("action", &self.action)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Handle to a registered rule.
///
/// The handle shares the rule it was returned for. After
/// [`MessageFilters::reset`](super::MessageFilters::reset) the rule is no
/// longer consulted, so toggling an old handle is harmless.
#[derive(Debug, Clone)]
pub struct FilterHandle {
    filter: Arc<Filter>,
}

impl FilterHandle {
    pub(crate) fn new(filter: Arc<Filter>) -> Self {
        Self { filter }
    }

    /// Identifier assigned at registration; increases with insertion order.
    pub fn id(&self) -> u64 {
        self.filter.id
    }

    /// Direction the rule applies to.
    pub fn direction(&self) -> Direction {
        self.filter.direction
    }

    /// Disable the rule without removing it.
    pub fn off(&self) -> &Self {
        self.filter.enabled.store(false, Ordering::Release);
        tracing::debug!(filter = self.filter.id, "filter disabled");
        self
    }

    /// Re-enable a disabled rule. It keeps its original position in the chain.
    pub fn on(&self) -> &Self {
        self.filter.enabled.store(true, Ordering::Release);
        tracing::debug!(filter = self.filter.id, "filter enabled");
        self
    }

    /// Whether the rule is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.filter.is_enabled()
    }
}

/// Serializable kind of a rule's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Drop matching messages.
    Drop,
    /// Delay matching messages; `millis` is `None` for computed delays.
    Delay {
        /// Fixed delay in milliseconds.
        millis: Option<u64>,
    },
}

/// Snapshot of a registered rule, for logging and assertions.
///
/// `None` scopes are wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDescription {
    /// Registration identifier.
    pub id: u64,
    /// Direction the rule applies to.
    pub direction: Direction,
    /// Verbs the rule applies to.
    pub verbs: Option<Vec<Verb>>,
    /// Source nodes the rule applies to.
    pub from: Option<Vec<NodeId>>,
    /// Destination nodes the rule applies to.
    pub to: Option<Vec<NodeId>>,
    /// Whether a content predicate is attached.
    pub content_predicate: bool,
    /// What the rule does to matching messages.
    pub action: ActionKind,
    /// Whether the rule is currently enabled.
    pub enabled: bool,
}
