//! Timed, cancellable transitions on a driver-advanced clock.
//!
//! Every animated mutation in the engine goes through the scheduler: a
//! container schedules a transition together with the deferred mutation to
//! apply when it finishes, and the driver advances the clock with
//! [`TransitionScheduler::advance`]. A submitted transition completes exactly
//! once or is cancelled, never both.
//!
//! Transitions interpolate an abstract `0.0..=1.0`-ish value (a scale, an
//! expansion level, a slide progress) with an ease-out-quad curve. Cancelling
//! returns the current eased value so a reversal can start from where the
//! cancelled transition left off instead of snapping.

use std::time::Duration;

use crate::message::MessageId;
use crate::sources::SourceId;

/// Identifier addressing a top-level list entry: either a standalone message
/// or a whole group (addressed by its source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemId {
    Message(MessageId),
    Group(SourceId),
}

/// Handle for an in-flight transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionId(pub u64);

/// Deferred mutation applied when a transition finishes.
///
/// The scheduler hands these back from [`TransitionScheduler::advance`]; the
/// engine routes each one to the owning container. Cancelling a transition
/// drops its completion, which is how destroying an item mid-animation avoids
/// mutating a structure that no longer contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A top-level item finished scaling in; settle its resting state.
    ListEnterDone { item: ItemId },
    /// First half of a top-level move finished; start the scale-in half.
    ListMoveOut { item: ItemId },
    /// Second half of a top-level move finished.
    ListMoveIn { item: ItemId },
    /// A top-level item finished scaling out; excise it from the sequence.
    ListRemoveDone { item: ItemId },
    /// A staggered clear slide reached this item; close it.
    ListSlideOut { item: ItemId },
    /// A group member finished scaling in.
    GroupEnterDone { source: SourceId, message: MessageId },
    /// First half of an in-group move finished; start the scale-in half.
    GroupMoveOut { source: SourceId, message: MessageId },
    /// Second half of an in-group move finished.
    GroupMoveIn { source: SourceId, message: MessageId },
    /// A group member finished scaling out; excise it from the group.
    GroupRemoveDone { source: SourceId, message: MessageId },
    /// Body growth finished; the message is fully expanded.
    ExpandDone { message: MessageId },
    /// Body shrink finished; hide the action area and settle collapsed.
    CollapseDone { message: MessageId },
}

/// Parameters for a new transition.
#[derive(Debug, Clone, Copy)]
pub struct TransitionSpec {
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
    /// Time to wait before interpolation starts (staggered clear).
    pub delay: Duration,
    pub on_complete: Completion,
}

impl TransitionSpec {
    pub fn new(from: f32, to: f32, duration: Duration, on_complete: Completion) -> Self {
        Self {
            from,
            to,
            duration,
            delay: Duration::ZERO,
            on_complete,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug)]
struct Transition {
    id: TransitionId,
    from: f32,
    to: f32,
    duration: Duration,
    delay: Duration,
    elapsed: Duration,
    on_complete: Completion,
}

impl Transition {
    fn eased_value(&self) -> f32 {
        let run = self.elapsed.saturating_sub(self.delay);
        if self.duration.is_zero() {
            return self.to;
        }
        let t = (run.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * ease_out_quad(t)
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }
}

fn ease_out_quad(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Runs every in-flight transition in the engine.
///
/// Single-threaded: the driver advances the clock from its event loop and the
/// returned completions are applied before the call returns to the caller.
#[derive(Debug, Default)]
pub struct TransitionScheduler {
    next_id: u64,
    active: Vec<Transition>,
}

impl TransitionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a transition and returns its handle.
    ///
    /// A zero `duration` (animations disabled) still goes through the
    /// scheduler so completion stays a separate step with the same
    /// exactly-once guarantee; it finishes on the next [`advance`] call, even
    /// one advancing by zero.
    ///
    /// [`advance`]: TransitionScheduler::advance
    pub fn start(&mut self, spec: TransitionSpec) -> TransitionId {
        let id = TransitionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        tracing::trace!(?id, on_complete = ?spec.on_complete, "transition start");
        self.active.push(Transition {
            id,
            from: spec.from,
            to: spec.to,
            duration: spec.duration,
            delay: spec.delay,
            elapsed: Duration::ZERO,
            on_complete: spec.on_complete,
        });
        id
    }

    /// Cancels an in-flight transition, dropping its completion.
    ///
    /// Returns the current eased value so the caller can start a replacement
    /// transition from it. Returns `None` if the transition already completed
    /// or was cancelled before; cancelling twice is harmless.
    pub fn cancel(&mut self, id: TransitionId) -> Option<f32> {
        let index = self.active.iter().position(|t| t.id == id)?;
        let transition = self.active.remove(index);
        tracing::trace!(?id, "transition cancelled");
        Some(transition.eased_value())
    }

    /// Current eased value of an in-flight transition.
    pub fn value(&self, id: TransitionId) -> Option<f32> {
        self.active
            .iter()
            .find(|t| t.id == id)
            .map(Transition::eased_value)
    }

    pub fn is_active(&self, id: TransitionId) -> bool {
        self.active.iter().any(|t| t.id == id)
    }

    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    /// Advances the clock and returns the completions of every transition
    /// that finished, in submission order.
    pub fn advance(&mut self, dt: Duration) -> Vec<Completion> {
        for transition in &mut self.active {
            transition.elapsed = transition.elapsed.saturating_add(dt);
        }
        let mut completed = Vec::new();
        self.active.retain(|t| {
            if t.is_finished() {
                tracing::trace!(id = ?t.id, on_complete = ?t.on_complete, "transition complete");
                completed.push(t.on_complete);
                false
            } else {
                true
            }
        });
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(message: u64) -> Completion {
        Completion::ExpandDone {
            message: MessageId(message),
        }
    }

    #[test]
    fn completes_exactly_once() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.start(TransitionSpec::new(
            0.0,
            1.0,
            Duration::from_millis(100),
            probe(1),
        ));

        assert!(scheduler.advance(Duration::from_millis(50)).is_empty());
        let done = scheduler.advance(Duration::from_millis(50));
        assert_eq!(done, vec![probe(1)]);
        // Nothing left to complete.
        assert!(scheduler.advance(Duration::from_millis(100)).is_empty());
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[test]
    fn cancel_drops_completion_and_reports_value() {
        let mut scheduler = TransitionScheduler::new();
        let id = scheduler.start(TransitionSpec::new(
            0.0,
            1.0,
            Duration::from_millis(100),
            probe(1),
        ));
        scheduler.advance(Duration::from_millis(50));

        let value = scheduler.cancel(id).unwrap();
        // Ease-out-quad at t=0.5 is 0.75.
        assert!((value - 0.75).abs() < 1e-6);

        // The completion never fires, and a second cancel is a no-op.
        assert!(scheduler.advance(Duration::from_millis(100)).is_empty());
        assert_eq!(scheduler.cancel(id), None);
    }

    #[test]
    fn zero_duration_completes_on_next_advance() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.start(TransitionSpec::new(1.0, 0.0, Duration::ZERO, probe(7)));
        assert_eq!(scheduler.advance(Duration::ZERO), vec![probe(7)]);
    }

    #[test]
    fn delay_defers_both_interpolation_and_completion() {
        let mut scheduler = TransitionScheduler::new();
        let id = scheduler.start(
            TransitionSpec::new(1.0, 0.0, Duration::from_millis(100), probe(3))
                .with_delay(Duration::from_millis(40)),
        );

        scheduler.advance(Duration::from_millis(40));
        // Still at the starting value once the delay has just elapsed.
        assert!((scheduler.value(id).unwrap() - 1.0).abs() < 1e-6);

        assert!(scheduler.advance(Duration::from_millis(99)).is_empty());
        assert_eq!(scheduler.advance(Duration::from_millis(1)), vec![probe(3)]);
    }

    #[test]
    fn completions_preserve_submission_order() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.start(TransitionSpec::new(
            0.0,
            1.0,
            Duration::from_millis(10),
            probe(1),
        ));
        scheduler.start(TransitionSpec::new(
            0.0,
            1.0,
            Duration::from_millis(5),
            probe(2),
        ));
        let done = scheduler.advance(Duration::from_millis(10));
        assert_eq!(done, vec![probe(1), probe(2)]);
    }
}
