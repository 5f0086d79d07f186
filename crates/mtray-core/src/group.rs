//! Ordered sub-list of messages sharing one source.
//!
//! Urgency is a priority lane, not a sort key: urgent members occupy the
//! leading indices ordered by arrival (newest first), non-urgent members
//! follow, also newest first within their band. Re-sorting on an urgency
//! change moves exactly one member.

use std::time::Duration;

use crate::expansion;
use crate::message::{Message, MessageId, Urgency};
use crate::signals::{Signal, SignalQueue};
use crate::sources::SourceId;
use crate::transition::{Completion, TransitionId, TransitionScheduler, TransitionSpec};

/// A group member slot: the message plus its animation bookkeeping.
#[derive(Debug)]
struct Member {
    message: Message,
    anim: Option<TransitionId>,
    /// Resting scale; the effective scale follows `anim` while in flight.
    scale: f32,
    /// Scale-out is running; the slot is excised when it completes.
    leaving: bool,
}

/// The set of messages produced by one source, rendered under one header.
#[derive(Debug)]
pub struct MessageGroup {
    source: SourceId,
    title: String,
    members: Vec<Member>,
    urgent_count: usize,
}

impl MessageGroup {
    pub fn new(source: SourceId, title: &str) -> Self {
        Self {
            source,
            title: title.to_string(),
            members: Vec::new(),
            urgent_count: 0,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Header title; falls back for unnamed producers.
    pub fn title(&self) -> &str {
        if self.title.is_empty() {
            "Unknown App"
        } else {
            &self.title
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn urgent_count(&self) -> usize {
        self.urgent_count
    }

    pub fn has_urgent(&self) -> bool {
        self.urgent_count > 0
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.members.iter().map(|m| &m.message)
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.members
            .iter()
            .find(|m| m.message.id() == id)
            .map(|m| &m.message)
    }

    pub fn message_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.members
            .iter_mut()
            .find(|m| m.message.id() == id)
            .map(|m| &mut m.message)
    }

    pub fn messages_mut(&mut self) -> impl Iterator<Item = &mut Message> {
        self.members.iter_mut().map(|m| &mut m.message)
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.members.iter().any(|m| m.message.id() == id)
    }

    /// Effective scale of a member, following its animation while in flight.
    pub fn scale_of(&self, id: MessageId, scheduler: &TransitionScheduler) -> Option<f32> {
        let member = self.members.iter().find(|m| m.message.id() == id)?;
        let scale = member
            .anim
            .and_then(|anim| scheduler.value(anim))
            .unwrap_or(member.scale);
        Some(scale)
    }

    /// Whether any member's close policy allows dismissal.
    pub fn any_closable(&self) -> bool {
        self.members.iter().any(|m| m.message.can_close())
    }

    fn position(&self, id: MessageId) -> Option<usize> {
        self.members.iter().position(|m| m.message.id() == id)
    }

    /// Inserts a newly produced message at its urgency-determined index.
    ///
    /// Urgent messages go to the front of the urgent block; others go to the
    /// top of the non-urgent block. The first member skips the scale-in,
    /// since the whole group is animated in by its owner.
    pub fn add_message(
        &mut self,
        message: Message,
        scheduler: &mut TransitionScheduler,
        signals: &mut SignalQueue,
        duration: Duration,
    ) {
        let id = message.id();
        let urgent = message.urgency().is_urgent();
        let had_urgent = self.has_urgent();
        let first = self.members.is_empty();

        if urgent {
            self.urgent_count += 1;
        }
        let index = if urgent { 0 } else { self.urgent_count };

        let (anim, scale) = if first {
            (None, 1.0)
        } else {
            let anim = scheduler.start(TransitionSpec::new(
                0.0,
                1.0,
                duration,
                Completion::GroupEnterDone {
                    source: self.source,
                    message: id,
                },
            ));
            (Some(anim), 0.0)
        };

        self.members.insert(
            index.min(self.members.len()),
            Member {
                message,
                anim,
                scale,
                leaving: false,
            },
        );

        if had_urgent != self.has_urgent() {
            signals.push(Signal::HasUrgentChanged {
                source: self.source,
                has_urgent: self.has_urgent(),
            });
        }
        signals.push(Signal::GroupMessageAdded {
            source: self.source,
            message: id,
        });
    }

    /// Applies an urgency change to an existing member, re-slotting it at
    /// the boundary of its new band.
    ///
    /// Unknown or already-leaving members are ignored (producers may race
    /// benignly with removal).
    pub fn change_urgency(
        &mut self,
        id: MessageId,
        urgency: Urgency,
        scheduler: &mut TransitionScheduler,
        signals: &mut SignalQueue,
        duration: Duration,
    ) {
        let Some(position) = self.position(id) else {
            tracing::debug!(?id, "urgency change for unknown group member");
            return;
        };
        let member = &mut self.members[position];
        if member.leaving {
            return;
        }

        let was_urgent = member.message.urgency().is_urgent();
        member.message.set_urgency(urgency);
        let is_urgent = urgency.is_urgent();
        if was_urgent == is_urgent {
            return;
        }

        let had_urgent = self.has_urgent();
        if is_urgent {
            self.urgent_count += 1;
        } else {
            self.urgent_count -= 1;
        }
        let index = if is_urgent { 0 } else { self.urgent_count };
        self.move_member(id, index, scheduler, duration);

        if had_urgent != self.has_urgent() {
            signals.push(Signal::HasUrgentChanged {
                source: self.source,
                has_urgent: self.has_urgent(),
            });
        }
    }

    /// Moves a member to `index` with a scale-out / reparent / scale-in
    /// sequence. The logical splice happens immediately; a newer move for
    /// the same member supersedes a stale in-flight one.
    fn move_member(
        &mut self,
        id: MessageId,
        index: usize,
        scheduler: &mut TransitionScheduler,
        duration: Duration,
    ) {
        let Some(position) = self.position(id) else {
            return;
        };
        if position == index {
            return;
        }

        let mut member = self.members.remove(position);
        let from = member
            .anim
            .take()
            .and_then(|anim| scheduler.cancel(anim))
            .unwrap_or(member.scale);

        member.anim = Some(scheduler.start(TransitionSpec::new(
            from,
            0.0,
            duration,
            Completion::GroupMoveOut {
                source: self.source,
                message: id,
            },
        )));
        self.members.insert(index.min(self.members.len()), member);
    }

    /// Starts removing a member: scale-out now, excision on completion.
    ///
    /// Returns false for unknown members so the caller can log the benign
    /// producer race. Repeated removal of a leaving member is a no-op.
    pub fn remove_message(
        &mut self,
        id: MessageId,
        scheduler: &mut TransitionScheduler,
        signals: &mut SignalQueue,
        duration: Duration,
    ) -> bool {
        let Some(position) = self.position(id) else {
            return false;
        };
        let had_urgent = self.has_urgent();
        {
            let member = &mut self.members[position];
            if member.leaving {
                return true;
            }
            member.leaving = true;

            if member.message.urgency().is_urgent() {
                self.urgent_count -= 1;
            }
        }

        let member = &mut self.members[position];
        let from = member
            .anim
            .take()
            .and_then(|anim| scheduler.cancel(anim))
            .unwrap_or(member.scale);
        expansion::cancel_animation(&mut member.message, scheduler);

        member.anim = Some(scheduler.start(TransitionSpec::new(
            from,
            0.0,
            duration,
            Completion::GroupRemoveDone {
                source: self.source,
                message: id,
            },
        )));

        if had_urgent != self.has_urgent() {
            signals.push(Signal::HasUrgentChanged {
                source: self.source,
                has_urgent: self.has_urgent(),
            });
        }
        true
    }

    /// Settles a finished scale-in.
    pub(crate) fn finish_enter(&mut self, id: MessageId) {
        if let Some(position) = self.position(id) {
            let member = &mut self.members[position];
            member.anim = None;
            member.scale = 1.0;
        }
    }

    /// Second half of a move: the member is at its new index, scale back in.
    pub(crate) fn finish_move_out(
        &mut self,
        id: MessageId,
        scheduler: &mut TransitionScheduler,
        duration: Duration,
    ) {
        if let Some(position) = self.position(id) {
            let member = &mut self.members[position];
            member.scale = 0.0;
            member.anim = Some(scheduler.start(TransitionSpec::new(
                0.0,
                1.0,
                duration,
                Completion::GroupMoveIn {
                    source: self.source,
                    message: id,
                },
            )));
        }
    }

    pub(crate) fn finish_move_in(&mut self, id: MessageId) {
        self.finish_enter(id);
    }

    /// Excises a member whose removal scale-out completed.
    pub(crate) fn finish_remove(&mut self, id: MessageId, signals: &mut SignalQueue) {
        if let Some(position) = self.position(id) {
            self.members.remove(position);
            signals.push(Signal::Destroyed(id));
        }
    }

    /// Drops every in-flight animation owned by this group; called when the
    /// whole group is destroyed.
    pub(crate) fn cancel_animations(&mut self, scheduler: &mut TransitionScheduler) {
        for member in &mut self.members {
            if let Some(anim) = member.anim.take() {
                scheduler.cancel(anim);
            }
            expansion::cancel_animation(&mut member.message, scheduler);
        }
    }

    /// Destroys the group's members without animation, reporting each id.
    pub(crate) fn drain_member_ids(&mut self) -> Vec<MessageId> {
        self.members.drain(..).map(|m| m.message.id()).collect()
    }

    #[cfg(test)]
    fn settled_order(&self) -> Vec<MessageId> {
        self.members
            .iter()
            .filter(|m| !m.leaving)
            .map(|m| m.message.id())
            .collect()
    }
}
