//! The top-level ordered list of displayable items.
//!
//! Items are standalone messages or whole groups. Insertion and moves splice
//! the logical sequence immediately; removal keeps the item in the sequence
//! until its scale-out completes, then excises it atomically. Derived flags
//! (`empty`, `can_clear`) are recomputed around every membership change and
//! signalled only on transitions.

use std::time::Duration;

use crate::expansion;
use crate::group::MessageGroup;
use crate::message::{Message, MessageId};
use crate::signals::{Signal, SignalQueue};
use crate::sources::SourceId;
use crate::transition::{Completion, ItemId, TransitionId, TransitionScheduler, TransitionSpec};

/// A top-level list entry.
#[derive(Debug)]
pub enum TrayItem {
    Message(Message),
    Group(MessageGroup),
}

impl TrayItem {
    pub fn id(&self) -> ItemId {
        match self {
            TrayItem::Message(message) => ItemId::Message(message.id()),
            TrayItem::Group(group) => ItemId::Group(group.source()),
        }
    }

    /// Whether closing this item is allowed by direct user action.
    pub fn can_close(&self) -> bool {
        match self {
            TrayItem::Message(message) => message.can_close(),
            TrayItem::Group(group) => group.any_closable(),
        }
    }
}

/// Keyboard focus within the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    None,
    /// The list container itself holds focus.
    List,
    Item(ItemId),
}

#[derive(Debug)]
struct ItemSlot {
    item: TrayItem,
    /// In-flight scale animation (enter, move, removal).
    anim: Option<TransitionId>,
    /// In-flight staggered-clear slide, separate from the scale channel.
    slide: Option<TransitionId>,
    /// Resting scale; the effective scale follows `anim` while in flight.
    scale: f32,
    /// Scale-out is running; the slot is excised when it completes.
    leaving: bool,
}

/// Ordered collection of standalone messages and groups.
#[derive(Debug, Default)]
pub struct MessageList {
    slots: Vec<ItemSlot>,
    focus: Focus,
    empty: bool,
    can_clear: bool,
}

impl MessageList {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            focus: Focus::None,
            empty: true,
            can_clear: false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn empty(&self) -> bool {
        self.empty
    }

    pub fn can_clear(&self) -> bool {
        self.can_clear
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn items(&self) -> impl Iterator<Item = &TrayItem> {
        self.slots.iter().map(|slot| &slot.item)
    }

    pub fn item(&self, id: ItemId) -> Option<&TrayItem> {
        self.slots
            .iter()
            .find(|slot| slot.item.id() == id)
            .map(|slot| &slot.item)
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Option<&mut TrayItem> {
        self.slots
            .iter_mut()
            .find(|slot| slot.item.id() == id)
            .map(|slot| &mut slot.item)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.position(id).is_some()
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.position(id)
    }

    pub fn group(&self, source: SourceId) -> Option<&MessageGroup> {
        match self.item(ItemId::Group(source)) {
            Some(TrayItem::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn group_mut(&mut self, source: SourceId) -> Option<&mut MessageGroup> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.item.id() == ItemId::Group(source))?;
        match &mut slot.item {
            TrayItem::Group(group) => Some(group),
            TrayItem::Message(_) => None,
        }
    }

    /// Looks a message up across standalone items and group members.
    pub fn find_message(&self, id: MessageId) -> Option<&Message> {
        for slot in &self.slots {
            match &slot.item {
                TrayItem::Message(message) if message.id() == id => return Some(message),
                TrayItem::Group(group) => {
                    if let Some(message) = group.message(id) {
                        return Some(message);
                    }
                }
                TrayItem::Message(_) => {}
            }
        }
        None
    }

    pub fn find_message_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        for slot in &mut self.slots {
            match &mut slot.item {
                TrayItem::Message(message) if message.id() == id => return Some(message),
                TrayItem::Group(group) => {
                    if let Some(message) = group.message_mut(id) {
                        return Some(message);
                    }
                }
                TrayItem::Message(_) => {}
            }
        }
        None
    }

    /// Effective scale of a top-level item, following its animation.
    pub fn scale_of(&self, id: ItemId, scheduler: &TransitionScheduler) -> Option<f32> {
        let slot = self.slots.iter().find(|slot| slot.item.id() == id)?;
        let scale = slot
            .anim
            .and_then(|anim| scheduler.value(anim))
            .unwrap_or(slot.scale);
        Some(scale)
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.item.id() == id)
    }

    /// Inserts an item at `index`, scaling it in.
    ///
    /// # Panics
    ///
    /// Panics if the item was already added; adding twice is a caller bug.
    pub fn insert_at(
        &mut self,
        item: TrayItem,
        index: usize,
        scheduler: &mut TransitionScheduler,
        signals: &mut SignalQueue,
        duration: Duration,
    ) {
        let id = item.id();
        assert!(
            !self.contains(id),
            "item was already added previously: {id:?}"
        );

        let anim = scheduler.start(TransitionSpec::new(
            0.0,
            1.0,
            duration,
            Completion::ListEnterDone { item: id },
        ));
        self.slots.insert(
            index.min(self.slots.len()),
            ItemSlot {
                item,
                anim: Some(anim),
                slide: None,
                scale: 0.0,
                leaving: false,
            },
        );
        self.refresh_flags(signals);
    }

    /// Moves an item to `index`. The logical splice happens immediately; the
    /// scale-out / scale-in runs behind it. A newer move supersedes a stale
    /// in-flight one for the same item.
    ///
    /// # Panics
    ///
    /// Panics if the item is untracked.
    pub fn move_to(
        &mut self,
        id: ItemId,
        index: usize,
        scheduler: &mut TransitionScheduler,
        duration: Duration,
    ) {
        let position = self
            .position(id)
            .unwrap_or_else(|| panic!("impossible to move untracked item: {id:?}"));
        if position == index {
            return;
        }

        let mut slot = self.slots.remove(position);
        let from = slot
            .anim
            .take()
            .and_then(|anim| scheduler.cancel(anim))
            .unwrap_or(slot.scale);
        slot.anim = Some(scheduler.start(TransitionSpec::new(
            from,
            0.0,
            duration,
            Completion::ListMoveOut { item: id },
        )));
        self.slots.insert(index.min(self.slots.len()), slot);
    }

    /// Starts removing an item: focus is handed off synchronously, the
    /// scale-out runs, and the slot is excised when it completes.
    ///
    /// # Panics
    ///
    /// Panics if the item is untracked.
    pub fn remove(
        &mut self,
        id: ItemId,
        scheduler: &mut TransitionScheduler,
        signals: &mut SignalQueue,
        duration: Duration,
    ) {
        let position = self
            .position(id)
            .unwrap_or_else(|| panic!("impossible to remove untracked item: {id:?}"));
        if self.slots[position].leaving {
            return;
        }

        // Hand focus off before anything animates so interactive state never
        // dangles on a disappearing item.
        if self.focus == Focus::Item(id) {
            self.transfer_focus_from(position, signals);
        }

        let slot = &mut self.slots[position];
        slot.leaving = true;
        let from = slot
            .anim
            .take()
            .and_then(|anim| scheduler.cancel(anim))
            .unwrap_or(slot.scale);
        if let Some(slide) = slot.slide.take() {
            scheduler.cancel(slide);
        }
        match &mut slot.item {
            TrayItem::Message(message) => expansion::cancel_animation(message, scheduler),
            TrayItem::Group(group) => group.cancel_animations(scheduler),
        }
        slot.anim = Some(scheduler.start(TransitionSpec::new(
            from,
            0.0,
            duration,
            Completion::ListRemoveDone { item: id },
        )));
    }

    fn transfer_focus_from(&mut self, position: usize, signals: &mut SignalQueue) {
        let next = self.slots[position + 1..]
            .iter()
            .find(|slot| !slot.leaving)
            .or_else(|| {
                self.slots[..position]
                    .iter()
                    .rev()
                    .find(|slot| !slot.leaving)
            })
            .map(|slot| slot.item.id());
        match next {
            Some(id) => {
                self.focus = Focus::Item(id);
                signals.push(Signal::Focused(id));
            }
            None => self.focus = Focus::List,
        }
    }

    /// Gives an item input focus.
    pub fn focus_item(&mut self, id: ItemId, signals: &mut SignalQueue) {
        if !self.contains(id) || self.focus == Focus::Item(id) {
            return;
        }
        self.focus = Focus::Item(id);
        signals.push(Signal::Focused(id));
    }

    /// Closable item ids, in list order, excluding items already on the way
    /// out.
    pub fn closable_items(&self) -> Vec<ItemId> {
        self.slots
            .iter()
            .filter(|slot| !slot.leaving && slot.item.can_close())
            .map(|slot| slot.item.id())
            .collect()
    }

    /// Clears every closable item.
    ///
    /// One or no items zoom out directly. More than that slide out one by
    /// one on an increasing delay so the list empties progressively; each
    /// slide completion closes its item.
    pub fn clear(
        &mut self,
        scheduler: &mut TransitionScheduler,
        signals: &mut SignalQueue,
        duration: Duration,
    ) {
        let closable = self.closable_items();
        if closable.len() < 2 {
            for id in closable {
                self.remove(id, scheduler, signals, duration);
            }
            return;
        }

        let step = duration / closable.len().max(5) as u32;
        for (i, id) in closable.into_iter().enumerate() {
            let slide = scheduler.start(
                TransitionSpec::new(0.0, 1.0, duration, Completion::ListSlideOut { item: id })
                    .with_delay(step * i as u32),
            );
            if let Some(position) = self.position(id) {
                self.slots[position].slide = Some(slide);
            }
        }
    }

    /// Settles a finished scale-in.
    pub(crate) fn finish_enter(&mut self, id: ItemId) {
        if let Some(position) = self.position(id) {
            let slot = &mut self.slots[position];
            slot.anim = None;
            slot.scale = 1.0;
        }
    }

    /// Second half of a move: the item is at its new index, scale back in.
    pub(crate) fn finish_move_out(
        &mut self,
        id: ItemId,
        scheduler: &mut TransitionScheduler,
        duration: Duration,
    ) {
        if let Some(position) = self.position(id) {
            let slot = &mut self.slots[position];
            slot.scale = 0.0;
            slot.anim = Some(scheduler.start(TransitionSpec::new(
                0.0,
                1.0,
                duration,
                Completion::ListMoveIn { item: id },
            )));
        }
    }

    pub(crate) fn finish_move_in(&mut self, id: ItemId) {
        self.finish_enter(id);
    }

    /// Excises a removed item, reporting destroyed message ids, and
    /// refreshes the derived flags.
    pub(crate) fn finish_remove(&mut self, id: ItemId, signals: &mut SignalQueue) {
        let Some(position) = self.position(id) else {
            return;
        };
        let slot = self.slots.remove(position);
        match slot.item {
            TrayItem::Message(message) => signals.push(Signal::Destroyed(message.id())),
            TrayItem::Group(mut group) => {
                for member in group.drain_member_ids() {
                    signals.push(Signal::Destroyed(member));
                }
            }
        }
        self.refresh_flags(signals);
    }

    /// A slide reached this item; it is closed by removal. Items destroyed
    /// by their producer while the stagger was pending already cancelled the
    /// slide, so an unknown or leaving id is ignored.
    pub(crate) fn finish_slide(
        &mut self,
        id: ItemId,
        scheduler: &mut TransitionScheduler,
        signals: &mut SignalQueue,
        duration: Duration,
    ) {
        let Some(position) = self.position(id) else {
            return;
        };
        self.slots[position].slide = None;
        if !self.slots[position].leaving {
            self.remove(id, scheduler, signals, duration);
        }
    }

    /// Recomputes `empty` and `can_clear`, signalling on transitions.
    /// Group membership changes affect `can_clear` from outside this module,
    /// so the owner re-runs this after mutating a group.
    pub(crate) fn refresh_flags(&mut self, signals: &mut SignalQueue) {
        let empty = self.slots.is_empty();
        if empty != self.empty {
            self.empty = empty;
            signals.push(Signal::EmptyChanged(empty));
        }
        let can_clear = self.slots.iter().any(|slot| slot.item.can_close());
        if can_clear != self.can_clear {
            self.can_clear = can_clear;
            signals.push(Signal::CanClearChanged(can_clear));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use crate::sources::PlayerId;

    const DURATION: Duration = Duration::from_millis(120);

    fn fixture() -> (MessageList, TransitionScheduler, SignalQueue) {
        (
            MessageList::new(),
            TransitionScheduler::new(),
            SignalQueue::new(),
        )
    }

    fn notification(id: u64) -> TrayItem {
        TrayItem::Message(Message::new(
            MessageId(id),
            Some(SourceId(0)),
            MessageKind::Notification {
                acknowledged: false,
            },
        ))
    }

    fn media(id: u64) -> TrayItem {
        TrayItem::Message(Message::new(
            MessageId(id),
            None,
            MessageKind::Media {
                player: PlayerId(id),
            },
        ))
    }

    fn settle(list: &mut MessageList, scheduler: &mut TransitionScheduler, signals: &mut SignalQueue) {
        loop {
            let completed = scheduler.advance(Duration::from_secs(60));
            if completed.is_empty() {
                break;
            }
            for done in completed {
                match done {
                    Completion::ListEnterDone { item } => list.finish_enter(item),
                    Completion::ListMoveOut { item } => {
                        list.finish_move_out(item, scheduler, DURATION);
                    }
                    Completion::ListMoveIn { item } => list.finish_move_in(item),
                    Completion::ListRemoveDone { item } => list.finish_remove(item, signals),
                    Completion::ListSlideOut { item } => {
                        list.finish_slide(item, scheduler, signals, DURATION);
                    }
                    other => panic!("unexpected completion {other:?}"),
                }
            }
        }
    }

    fn order(list: &MessageList) -> Vec<ItemId> {
        list.items().map(TrayItem::id).collect()
    }

    #[test]
    #[should_panic(expected = "already added")]
    fn duplicate_insert_panics() {
        let (mut list, mut scheduler, mut signals) = fixture();
        list.insert_at(notification(1), 0, &mut scheduler, &mut signals, DURATION);
        list.insert_at(notification(1), 0, &mut scheduler, &mut signals, DURATION);
    }

    #[test]
    #[should_panic(expected = "untracked")]
    fn remove_untracked_panics() {
        let (mut list, mut scheduler, mut signals) = fixture();
        list.remove(
            ItemId::Message(MessageId(5)),
            &mut scheduler,
            &mut signals,
            DURATION,
        );
    }

    #[test]
    #[should_panic(expected = "untracked")]
    fn move_untracked_panics() {
        let (mut list, mut scheduler, _signals) = fixture();
        list.move_to(ItemId::Message(MessageId(5)), 0, &mut scheduler, DURATION);
    }

    #[test]
    fn empty_and_can_clear_are_edge_triggered() {
        let (mut list, mut scheduler, mut signals) = fixture();
        list.insert_at(media(1), 0, &mut scheduler, &mut signals, DURATION);
        let first = signals.take();
        assert!(first.contains(&Signal::EmptyChanged(false)));
        // A media message is not closable.
        assert!(!first.contains(&Signal::CanClearChanged(true)));

        list.insert_at(notification(2), 1, &mut scheduler, &mut signals, DURATION);
        let second = signals.take();
        // Already non-empty: no redundant signal.
        assert!(!second.iter().any(|s| matches!(s, Signal::EmptyChanged(_))));
        assert!(second.contains(&Signal::CanClearChanged(true)));
    }

    #[test]
    fn removal_keeps_membership_until_completion() {
        let (mut list, mut scheduler, mut signals) = fixture();
        list.insert_at(notification(1), 0, &mut scheduler, &mut signals, DURATION);
        settle(&mut list, &mut scheduler, &mut signals);
        signals.take();

        let id = ItemId::Message(MessageId(1));
        list.remove(id, &mut scheduler, &mut signals, DURATION);
        assert!(list.contains(id));
        assert!(!signals.contains(&Signal::EmptyChanged(true)));

        settle(&mut list, &mut scheduler, &mut signals);
        assert!(!list.contains(id));
        assert_eq!(list.len(), 0);
        assert!(list.empty());
        assert!(signals.contains(&Signal::EmptyChanged(true)));
        assert!(signals.contains(&Signal::Destroyed(MessageId(1))));
    }

    #[test]
    fn add_n_remove_n_round_trips_to_empty() {
        let (mut list, mut scheduler, mut signals) = fixture();
        for id in 0..5 {
            list.insert_at(notification(id), 0, &mut scheduler, &mut signals, DURATION);
        }
        settle(&mut list, &mut scheduler, &mut signals);

        // Remove out of insertion order.
        for id in [3u64, 0, 4, 1, 2] {
            list.remove(
                ItemId::Message(MessageId(id)),
                &mut scheduler,
                &mut signals,
                DURATION,
            );
        }
        settle(&mut list, &mut scheduler, &mut signals);
        assert!(list.empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn move_splices_immediately_and_supersedes() {
        let (mut list, mut scheduler, mut signals) = fixture();
        for id in 0..3 {
            list.insert_at(notification(id), id as usize, &mut scheduler, &mut signals, DURATION);
        }
        settle(&mut list, &mut scheduler, &mut signals);

        let id = ItemId::Message(MessageId(0));
        list.move_to(id, 2, &mut scheduler, DURATION);
        // The logical index reflects the request immediately.
        assert_eq!(list.index_of(id), Some(2));
        assert_eq!(scheduler.in_flight(), 1);

        // Supersede before the first move finishes: most recent wins and the
        // first move's completion is cancelled, not queued.
        list.move_to(id, 1, &mut scheduler, DURATION);
        assert_eq!(list.index_of(id), Some(1));
        assert_eq!(scheduler.in_flight(), 1);

        settle(&mut list, &mut scheduler, &mut signals);
        assert_eq!(
            order(&list),
            vec![
                ItemId::Message(MessageId(1)),
                ItemId::Message(MessageId(0)),
                ItemId::Message(MessageId(2)),
            ]
        );
    }

    #[test]
    fn move_to_current_index_is_a_noop() {
        let (mut list, mut scheduler, mut signals) = fixture();
        list.insert_at(notification(1), 0, &mut scheduler, &mut signals, DURATION);
        settle(&mut list, &mut scheduler, &mut signals);

        list.move_to(ItemId::Message(MessageId(1)), 0, &mut scheduler, DURATION);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[test]
    fn focus_moves_to_next_sibling_on_removal() {
        let (mut list, mut scheduler, mut signals) = fixture();
        for id in 0..3 {
            list.insert_at(notification(id), id as usize, &mut scheduler, &mut signals, DURATION);
        }
        settle(&mut list, &mut scheduler, &mut signals);

        // Removing the focused middle item: next sibling wins.
        list.focus_item(ItemId::Message(MessageId(1)), &mut signals);
        signals.take();
        list.remove(ItemId::Message(MessageId(1)), &mut scheduler, &mut signals, DURATION);
        assert_eq!(list.focus(), Focus::Item(ItemId::Message(MessageId(2))));
        // Synchronously, before the animation completed.
        assert!(signals.contains(&Signal::Focused(ItemId::Message(MessageId(2)))));
        settle(&mut list, &mut scheduler, &mut signals);

        // Removing the focused first item: still the next sibling.
        list.focus_item(ItemId::Message(MessageId(0)), &mut signals);
        list.remove(ItemId::Message(MessageId(0)), &mut scheduler, &mut signals, DURATION);
        assert_eq!(list.focus(), Focus::Item(ItemId::Message(MessageId(2))));
    }

    #[test]
    fn focus_falls_back_to_previous_sibling_then_list() {
        let (mut list, mut scheduler, mut signals) = fixture();
        for id in 0..2 {
            list.insert_at(notification(id), id as usize, &mut scheduler, &mut signals, DURATION);
        }
        settle(&mut list, &mut scheduler, &mut signals);

        // Removing the focused last item: previous sibling wins.
        list.focus_item(ItemId::Message(MessageId(1)), &mut signals);
        list.remove(ItemId::Message(MessageId(1)), &mut scheduler, &mut signals, DURATION);
        assert_eq!(list.focus(), Focus::Item(ItemId::Message(MessageId(0))));
        settle(&mut list, &mut scheduler, &mut signals);

        // Removing the focused only item: the list itself takes focus.
        list.focus_item(ItemId::Message(MessageId(0)), &mut signals);
        list.remove(ItemId::Message(MessageId(0)), &mut scheduler, &mut signals, DURATION);
        assert_eq!(list.focus(), Focus::List);
    }

    #[test]
    fn clear_single_item_has_no_stagger() {
        let (mut list, mut scheduler, mut signals) = fixture();
        list.insert_at(notification(1), 0, &mut scheduler, &mut signals, DURATION);
        settle(&mut list, &mut scheduler, &mut signals);

        list.clear(&mut scheduler, &mut signals, DURATION);
        // Straight to removal: one scale-out, no slide.
        let completed = scheduler.advance(DURATION);
        assert_eq!(
            completed,
            vec![Completion::ListRemoveDone {
                item: ItemId::Message(MessageId(1)),
            }]
        );
    }

    #[test]
    fn clear_staggers_slides_by_list_position() {
        let (mut list, mut scheduler, mut signals) = fixture();
        for id in 0..6 {
            list.insert_at(notification(id), id as usize, &mut scheduler, &mut signals, DURATION);
        }
        settle(&mut list, &mut scheduler, &mut signals);

        list.clear(&mut scheduler, &mut signals, DURATION);

        // Six items: the step is duration / 6. The first slide completes
        // after one full duration, each later one a step behind the last.
        let step = DURATION / 6;
        let mut closed = 0;
        let first = scheduler.advance(DURATION);
        closed += first
            .iter()
            .filter(|c| matches!(c, Completion::ListSlideOut { .. }))
            .count();
        assert_eq!(closed, 1);

        for _ in 0..5 {
            let done = scheduler.advance(step);
            closed += done
                .iter()
                .filter(|c| matches!(c, Completion::ListSlideOut { .. }))
                .count();
        }
        assert_eq!(closed, 6);
    }

    #[test]
    fn clear_skips_unclosable_items() {
        let (mut list, mut scheduler, mut signals) = fixture();
        list.insert_at(media(1), 0, &mut scheduler, &mut signals, DURATION);
        list.insert_at(notification(2), 1, &mut scheduler, &mut signals, DURATION);
        settle(&mut list, &mut scheduler, &mut signals);

        list.clear(&mut scheduler, &mut signals, DURATION);
        settle(&mut list, &mut scheduler, &mut signals);

        // The media message stays.
        assert_eq!(order(&list), vec![ItemId::Message(MessageId(1))]);
    }
}
