//! Change signals emitted to the UI owner.
//!
//! The engine never calls back into its owner. Mutations push typed signals
//! into an outbox and the owner drains it after each call into the engine
//! (or each tick). Derived-state signals are edge-triggered: they are pushed
//! only when the value actually changed.

use crate::message::MessageId;
use crate::sources::SourceId;
use crate::transition::ItemId;

/// A change notification for the UI owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The top-level list transitioned between empty and non-empty.
    EmptyChanged(bool),
    /// Whether any member of the list is closable changed.
    CanClearChanged(bool),
    /// A group's urgent population transitioned between zero and non-zero.
    HasUrgentChanged { source: SourceId, has_urgent: bool },
    /// An item gained input focus.
    Focused(ItemId),
    /// A message started expanding.
    Expanded(MessageId),
    /// A message started collapsing.
    Unexpanded(MessageId),
    /// The expand affordance for a message became visible or hidden.
    ExpandHintChanged { message: MessageId, visible: bool },
    /// A message attribute (title, body, icon, timestamp, controls) changed
    /// and the rendering layer should refresh it.
    MessageChanged(MessageId),
    /// A message was added to a group.
    GroupMessageAdded { source: SourceId, message: MessageId },
    /// A message left the engine for good.
    Destroyed(MessageId),
    /// Relative time labels crossed a relabel period and should be redrawn.
    TimeLabelsChanged,
}

/// Outbox of pending signals, drained by the engine owner.
#[derive(Debug, Default)]
pub struct SignalQueue {
    queued: Vec<Signal>,
}

impl SignalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, signal: Signal) {
        self.queued.push(signal);
    }

    /// Takes every queued signal, leaving the outbox empty.
    pub fn take(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.queued)
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, signal: &Signal) -> bool {
        self.queued.contains(signal)
    }
}
