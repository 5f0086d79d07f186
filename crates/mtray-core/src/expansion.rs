//! Collapsed/expanded state machine for a message body.
//!
//! The logical expansion state flips at request time; the animated body
//! height catches up through the scheduler. Reversing mid-flight cancels the
//! in-flight transition and restarts from its current value, so transitions
//! never stack on the same message.

use std::time::Duration;

use crate::message::Message;
use crate::signals::{Signal, SignalQueue};
use crate::transition::{Completion, TransitionId, TransitionScheduler, TransitionSpec};

/// Where a message body is within the collapse/expand cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionPhase {
    Collapsed,
    Expanding(TransitionId),
    Expanded,
    Collapsing(TransitionId),
}

/// Per-message expansion state.
#[derive(Debug)]
pub struct ExpansionController {
    phase: ExpansionPhase,
    /// Settled expansion level; authoritative while not animating.
    level: f32,
}

impl Default for ExpansionController {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpansionController {
    pub fn new() -> Self {
        Self {
            phase: ExpansionPhase::Collapsed,
            level: 0.0,
        }
    }

    pub fn phase(&self) -> ExpansionPhase {
        self.phase
    }

    /// Logical expansion state. True from the moment expansion is requested
    /// until a collapse is requested, independent of the animation.
    pub fn is_expanded(&self) -> bool {
        matches!(
            self.phase,
            ExpansionPhase::Expanding(_) | ExpansionPhase::Expanded
        )
    }

    pub fn is_animating(&self) -> bool {
        matches!(
            self.phase,
            ExpansionPhase::Expanding(_) | ExpansionPhase::Collapsing(_)
        )
    }

    /// Current expansion level in `0.0..=1.0`, following the animation while
    /// one is in flight.
    pub fn level(&self, scheduler: &TransitionScheduler) -> f32 {
        match self.phase {
            ExpansionPhase::Expanding(id) | ExpansionPhase::Collapsing(id) => {
                scheduler.value(id).unwrap_or(self.level)
            }
            ExpansionPhase::Collapsed | ExpansionPhase::Expanded => self.level,
        }
    }

    /// Body height in line units: one line collapsed, growing toward the
    /// natural height capped at `expand_lines`.
    pub fn body_height(
        &self,
        scheduler: &TransitionScheduler,
        natural_lines: u32,
        expand_lines: u32,
    ) -> f32 {
        let target = natural_lines.min(expand_lines).max(1) as f32;
        1.0 + self.level(scheduler) * (target - 1.0)
    }

    fn in_flight(&self) -> Option<TransitionId> {
        match self.phase {
            ExpansionPhase::Expanding(id) | ExpansionPhase::Collapsing(id) => Some(id),
            ExpansionPhase::Collapsed | ExpansionPhase::Expanded => None,
        }
    }
}

/// Starts expanding a message body and revealing its action area.
///
/// A no-op when the message is already expanded or expanding.
pub fn expand(
    message: &mut Message,
    scheduler: &mut TransitionScheduler,
    signals: &mut SignalQueue,
    duration: Duration,
) {
    if message.expansion.is_expanded() {
        return;
    }

    let from = match message.expansion.phase() {
        ExpansionPhase::Collapsing(id) => scheduler
            .cancel(id)
            .unwrap_or(message.expansion.level),
        _ => message.expansion.level,
    };

    let id = message.id();
    let transition = scheduler.start(TransitionSpec::new(
        from,
        1.0,
        duration,
        Completion::ExpandDone { message: id },
    ));
    message.expansion.phase = ExpansionPhase::Expanding(transition);

    message.set_action_area_visible(true);
    signals.push(Signal::Expanded(id));
    message.update_expand_hint(signals);
}

/// Starts collapsing a message body; the action area hides on completion.
///
/// A no-op when the message is already collapsed or collapsing.
pub fn unexpand(
    message: &mut Message,
    scheduler: &mut TransitionScheduler,
    signals: &mut SignalQueue,
    duration: Duration,
) {
    if !message.expansion.is_expanded() {
        return;
    }

    let from = match message.expansion.phase() {
        ExpansionPhase::Expanding(id) => scheduler
            .cancel(id)
            .unwrap_or(message.expansion.level),
        _ => message.expansion.level,
    };

    let id = message.id();
    let transition = scheduler.start(TransitionSpec::new(
        from,
        0.0,
        duration,
        Completion::CollapseDone { message: id },
    ));
    message.expansion.phase = ExpansionPhase::Collapsing(transition);

    signals.push(Signal::Unexpanded(id));
    message.update_expand_hint(signals);
}

/// Settles a finished expansion.
pub(crate) fn finish_expand(message: &mut Message) {
    message.expansion.phase = ExpansionPhase::Expanded;
    message.expansion.level = 1.0;
}

/// Settles a finished collapse and hides the action area entirely.
pub(crate) fn finish_collapse(message: &mut Message, signals: &mut SignalQueue) {
    message.expansion.phase = ExpansionPhase::Collapsed;
    message.expansion.level = 0.0;
    message.set_action_area_visible(false);
    message.update_expand_hint(signals);
}

/// Drops any in-flight expansion transition; called when the message is
/// destroyed so the completion cannot touch a gone entity.
pub(crate) fn cancel_animation(message: &mut Message, scheduler: &mut TransitionScheduler) {
    if let Some(id) = message.expansion.in_flight() {
        scheduler.cancel(id);
    }
}
