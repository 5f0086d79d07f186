//! Engine façade: one ordered timeline over list, groups, and transitions.
//!
//! All mutation funnels through here, triggered by user operations, producer
//! events, or transition completions surfaced by [`Tray::tick`]. The owner
//! drives the clock and drains the signal outbox; nothing calls back out.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::TrayConfig;
use crate::expansion;
use crate::group::MessageGroup;
use crate::list::{Focus, MessageList, TrayItem};
use crate::message::{ActionArea, IconRef, Message, MessageId, MessageKind, MessageSeq};
use crate::signals::{Signal, SignalQueue};
use crate::sources::{
    MediaRegistry, Notification, NotificationId, NotificationSource, PlayerDescriptor,
    PlayerEvent, PlayerId, SourceEvent, SourceId, SubscriberToken,
};
use crate::transition::{Completion, ItemId, TransitionScheduler};

/// The message-list engine.
pub struct Tray {
    config: TrayConfig,
    list: MessageList,
    scheduler: TransitionScheduler,
    signals: SignalQueue,
    seq: MessageSeq,
    /// Producer-side notification identity to engine message identity.
    notifications: HashMap<(SourceId, NotificationId), MessageId>,
    /// Player identity to its standalone media message.
    players: HashMap<PlayerId, MessageId>,
    /// Source titles learned at attach time, for group headers.
    source_titles: HashMap<SourceId, String>,
    source_subs: HashMap<SourceId, SubscriberToken>,
    media_sub: Option<SubscriberToken>,
    relabel_elapsed: Duration,
}

impl Tray {
    pub fn new(config: TrayConfig) -> Self {
        Self {
            config,
            list: MessageList::new(),
            scheduler: TransitionScheduler::new(),
            signals: SignalQueue::new(),
            seq: MessageSeq::default(),
            notifications: HashMap::new(),
            players: HashMap::new(),
            source_titles: HashMap::new(),
            source_subs: HashMap::new(),
            media_sub: None,
            relabel_elapsed: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &TrayConfig {
        &self.config
    }

    pub fn list(&self) -> &MessageList {
        &self.list
    }

    /// Read access to the animation clock, for renderers querying scales.
    pub fn scheduler(&self) -> &TransitionScheduler {
        &self.scheduler
    }

    pub fn empty(&self) -> bool {
        self.list.empty()
    }

    pub fn can_clear(&self) -> bool {
        self.list.can_clear()
    }

    /// Takes every pending change signal.
    pub fn take_signals(&mut self) -> Vec<Signal> {
        self.signals.take()
    }

    /// Resolves a producer-side notification identity to its message.
    pub fn message_for_notification(
        &self,
        source: SourceId,
        id: NotificationId,
    ) -> Option<MessageId> {
        self.notifications.get(&(source, id)).copied()
    }

    /// Resolves a player identity to its media message.
    pub fn message_for_player(&self, id: PlayerId) -> Option<MessageId> {
        self.players.get(&id).copied()
    }

    fn duration(&self) -> Duration {
        if self.config.animations {
            Duration::from_millis(self.config.animation_time_ms)
        } else {
            Duration::ZERO
        }
    }

    /// With animations disabled every transition has zero duration; settle
    /// them inside the same call so the end state applies immediately.
    fn settle_if_instant(&mut self) {
        if !self.config.animations {
            self.pump(Duration::ZERO);
        }
    }

    // ========================================================================
    // Adapter subscriptions
    // ========================================================================

    /// Subscribes to a notification source and ingests its current
    /// notifications.
    pub fn attach_notification_source(&mut self, source: &mut NotificationSource) {
        let id = source.id();
        if self.source_subs.contains_key(&id) {
            tracing::debug!(source = ?id, "source already attached");
            return;
        }
        let (token, snapshot) = source.subscribe();
        self.source_subs.insert(id, token);
        self.source_titles.insert(id, source.title().to_string());
        for notification in snapshot {
            self.handle_source_event(SourceEvent::Added {
                source: id,
                notification,
            });
        }
    }

    /// Drops the subscription on a notification source, exactly once.
    pub fn detach_notification_source(&mut self, source: &mut NotificationSource) {
        match self.source_subs.remove(&source.id()) {
            Some(token) => {
                if !source.unsubscribe(token) {
                    tracing::warn!(source = ?source.id(), "subscription was already dropped");
                }
            }
            None => tracing::debug!(source = ?source.id(), "detach for unattached source"),
        }
    }

    /// Subscribes to the media registry and ingests its current players.
    pub fn attach_media_registry(&mut self, registry: &mut MediaRegistry) {
        if self.media_sub.is_some() {
            tracing::debug!("media registry already attached");
            return;
        }
        let (token, snapshot) = registry.subscribe();
        self.media_sub = Some(token);
        for player in snapshot {
            self.handle_player_event(PlayerEvent::Added { player });
        }
    }

    /// Drops the media registry subscription, exactly once.
    pub fn detach_media_registry(&mut self, registry: &mut MediaRegistry) {
        match self.media_sub.take() {
            Some(token) => {
                if !registry.unsubscribe(token) {
                    tracing::warn!("media subscription was already dropped");
                }
            }
            None => tracing::debug!("detach for unattached media registry"),
        }
    }

    /// Drains and applies a source's queued events.
    pub fn drain_source(&mut self, source: &mut NotificationSource) {
        for event in source.take_events() {
            self.handle_source_event(event);
        }
    }

    /// Drains and applies the media registry's queued events.
    pub fn drain_media(&mut self, registry: &mut MediaRegistry) {
        for event in registry.take_events() {
            self.handle_player_event(event);
        }
    }

    // ========================================================================
    // Producer events
    // ========================================================================

    pub fn handle_source_event(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Added {
                source,
                notification,
            } => self.add_notification(source, notification),
            SourceEvent::Removed { source, id } => self.remove_notification(source, id),
            SourceEvent::Changed {
                source,
                notification,
            } => self.change_notification(source, notification),
        }
        self.settle_if_instant();
    }

    pub fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Added { player } => self.add_player(player),
            PlayerEvent::Removed { id } => self.remove_player(id),
            PlayerEvent::Changed { player } => self.change_player(player),
        }
        self.settle_if_instant();
    }

    fn add_notification(&mut self, source: SourceId, notification: Notification) {
        if self
            .notifications
            .contains_key(&(source, notification.id))
        {
            tracing::debug!(?source, id = ?notification.id, "notification already added");
            return;
        }
        let duration = self.duration();
        let max_buttons = self.config.max_notification_buttons;

        if self.list.group(source).is_none() {
            let title = self.source_titles.get(&source).cloned().unwrap_or_default();
            let group = MessageGroup::new(source, &title);
            let index = self.list.len();
            self.list.insert_at(
                TrayItem::Group(group),
                index,
                &mut self.scheduler,
                &mut self.signals,
                duration,
            );
        }

        let id = self.seq.next_id();
        let mut message = Message::new(
            id,
            Some(source),
            MessageKind::Notification {
                acknowledged: false,
            },
        );
        apply_notification(&mut message, &notification, max_buttons, &mut self.signals);
        message.set_urgency(notification.urgency);
        self.notifications.insert((source, notification.id), id);

        let Some(group) = self.list.group_mut(source) else {
            return;
        };
        group.add_message(message, &mut self.scheduler, &mut self.signals, duration);
        self.list.refresh_flags(&mut self.signals);
    }

    fn remove_notification(&mut self, source: SourceId, id: NotificationId) {
        let duration = self.duration();
        let Some(message) = self.notifications.get(&(source, id)).copied() else {
            tracing::debug!(?source, ?id, "removal for unknown notification");
            return;
        };
        let Some(group) = self.list.group_mut(source) else {
            tracing::debug!(?source, "removal for source without a group");
            return;
        };
        if !group.remove_message(message, &mut self.scheduler, &mut self.signals, duration) {
            tracing::debug!(?source, ?id, "removal for untracked group member");
        }
    }

    fn change_notification(&mut self, source: SourceId, notification: Notification) {
        let duration = self.duration();
        let max_buttons = self.config.max_notification_buttons;
        let Some(message) = self.notifications.get(&(source, notification.id)).copied() else {
            tracing::debug!(?source, id = ?notification.id, "change for unknown notification");
            return;
        };
        let Some(group) = self.list.group_mut(source) else {
            return;
        };
        if let Some(entry) = group.message_mut(message) {
            apply_notification(entry, &notification, max_buttons, &mut self.signals);
        }
        group.change_urgency(
            message,
            notification.urgency,
            &mut self.scheduler,
            &mut self.signals,
            duration,
        );
    }

    fn add_player(&mut self, player: PlayerDescriptor) {
        if self.players.contains_key(&player.id) {
            tracing::debug!(id = ?player.id, "player already added");
            return;
        }
        let duration = self.duration();
        let id = self.seq.next_id();
        let mut message = Message::new(id, None, MessageKind::Media { player: player.id });
        apply_player(&mut message, &player, &mut self.signals);
        self.players.insert(player.id, id);

        // Media messages lead the list.
        self.list.insert_at(
            TrayItem::Message(message),
            0,
            &mut self.scheduler,
            &mut self.signals,
            duration,
        );
    }

    fn remove_player(&mut self, id: PlayerId) {
        let duration = self.duration();
        let Some(message) = self.players.remove(&id) else {
            tracing::debug!(?id, "removal for unknown player");
            return;
        };
        self.list.remove(
            ItemId::Message(message),
            &mut self.scheduler,
            &mut self.signals,
            duration,
        );
    }

    fn change_player(&mut self, player: PlayerDescriptor) {
        let Some(message) = self.players.get(&player.id).copied() else {
            tracing::debug!(id = ?player.id, "change for unknown player");
            return;
        };
        if let Some(entry) = self.list.find_message_mut(message) {
            apply_player(entry, &player, &mut self.signals);
        }
    }

    // ========================================================================
    // User operations
    // ========================================================================

    /// Expands a message body, revealing its action area.
    pub fn expand(&mut self, id: MessageId) {
        let duration = self.duration();
        let Some(message) = self.list.find_message_mut(id) else {
            tracing::debug!(?id, "expand for unknown message");
            return;
        };
        expansion::expand(message, &mut self.scheduler, &mut self.signals, duration);
        self.settle_if_instant();
    }

    /// Collapses a message body.
    pub fn unexpand(&mut self, id: MessageId) {
        let duration = self.duration();
        let Some(message) = self.list.find_message_mut(id) else {
            tracing::debug!(?id, "unexpand for unknown message");
            return;
        };
        expansion::unexpand(message, &mut self.scheduler, &mut self.signals, duration);
        self.settle_if_instant();
    }

    /// Closes a message, subject to its close policy.
    pub fn close(&mut self, id: MessageId) {
        let duration = self.duration();
        let Some(message) = self.list.find_message(id) else {
            tracing::debug!(?id, "close for unknown message");
            return;
        };
        if !message.can_close() {
            tracing::debug!(?id, "close refused by policy");
            return;
        }
        let source = message.source();
        if self.list.contains(ItemId::Message(id)) {
            self.list.remove(
                ItemId::Message(id),
                &mut self.scheduler,
                &mut self.signals,
                duration,
            );
        } else if let Some(group) = source.and_then(|s| self.list.group_mut(s)) {
            group.remove_message(id, &mut self.scheduler, &mut self.signals, duration);
        }
        self.settle_if_instant();
    }

    /// Closes every closable item, staggering the exits when there are
    /// enough to be worth it.
    pub fn clear_all(&mut self) {
        let duration = self.duration();
        self.list
            .clear(&mut self.scheduler, &mut self.signals, duration);
        self.settle_if_instant();
    }

    /// Moves a top-level item to a new index. The most recent request for an
    /// item wins; a superseded in-flight move is cancelled, not queued.
    pub fn move_item(&mut self, id: ItemId, index: usize) {
        let duration = self.duration();
        self.list.move_to(id, index, &mut self.scheduler, duration);
        self.settle_if_instant();
    }

    /// Gives an item input focus.
    pub fn focus_item(&mut self, id: ItemId) {
        self.list.focus_item(id, &mut self.signals);
    }

    pub fn focus(&self) -> Focus {
        self.list.focus()
    }

    /// Layout feedback from the renderer for the expand affordance.
    pub fn set_body_ellipsized(&mut self, id: MessageId, ellipsized: bool) {
        if let Some(message) = self.list.find_message_mut(id) {
            message.set_body_ellipsized(ellipsized, &mut self.signals);
        }
    }

    /// Marks an item's notifications as seen; the renderer calls this when
    /// the item becomes visible on screen.
    pub fn mark_displayed(&mut self, id: ItemId) {
        match self.list.item_mut(id) {
            Some(TrayItem::Message(message)) => message.acknowledge(),
            Some(TrayItem::Group(group)) => {
                for message in group.messages_mut() {
                    message.acknowledge();
                }
            }
            None => tracing::debug!(?id, "mark_displayed for unknown item"),
        }
    }

    // ========================================================================
    // Clock
    // ========================================================================

    /// Advances the animation clock, applying every deferred mutation whose
    /// transition finished. Also drives the periodic time-label refresh.
    pub fn tick(&mut self, dt: Duration) {
        self.pump(dt);

        self.relabel_elapsed += dt;
        let period = Duration::from_secs(self.config.relabel_period_secs.max(1));
        while self.relabel_elapsed >= period {
            self.relabel_elapsed -= period;
            if self.any_timestamped() {
                self.signals.push(Signal::TimeLabelsChanged);
            }
        }
    }

    /// Advances once by `dt`, then settles chained transitions (the second
    /// half of moves, zero-duration completions) without further time.
    fn pump(&mut self, dt: Duration) {
        let mut step = dt;
        loop {
            let completed = self.scheduler.advance(step);
            if completed.is_empty() {
                break;
            }
            for done in completed {
                self.apply(done);
            }
            step = Duration::ZERO;
        }
    }

    fn apply(&mut self, done: Completion) {
        let duration = self.duration();
        match done {
            Completion::ListEnterDone { item } => self.list.finish_enter(item),
            Completion::ListMoveOut { item } => {
                self.list.finish_move_out(item, &mut self.scheduler, duration);
            }
            Completion::ListMoveIn { item } => self.list.finish_move_in(item),
            Completion::ListRemoveDone { item } => {
                self.prune_maps(item);
                self.list.finish_remove(item, &mut self.signals);
            }
            Completion::ListSlideOut { item } => {
                self.list
                    .finish_slide(item, &mut self.scheduler, &mut self.signals, duration);
            }
            Completion::GroupEnterDone { source, message } => {
                if let Some(group) = self.list.group_mut(source) {
                    group.finish_enter(message);
                }
            }
            Completion::GroupMoveOut { source, message } => {
                if let Some(group) = self.list.group_mut(source) {
                    group.finish_move_out(message, &mut self.scheduler, duration);
                }
            }
            Completion::GroupMoveIn { source, message } => {
                if let Some(group) = self.list.group_mut(source) {
                    group.finish_move_in(message);
                }
            }
            Completion::GroupRemoveDone { source, message } => {
                self.notifications.retain(|_, id| *id != message);
                if let Some(group) = self.list.group_mut(source) {
                    group.finish_remove(message, &mut self.signals);
                }
                self.list.refresh_flags(&mut self.signals);
            }
            Completion::ExpandDone { message } => {
                if let Some(entry) = self.list.find_message_mut(message) {
                    expansion::finish_expand(entry);
                }
            }
            Completion::CollapseDone { message } => {
                if let Some(entry) = self.list.find_message_mut(message) {
                    expansion::finish_collapse(entry, &mut self.signals);
                }
            }
        }
    }

    fn prune_maps(&mut self, item: ItemId) {
        match item {
            ItemId::Message(id) => self.players.retain(|_, message| *message != id),
            ItemId::Group(source) => {
                self.notifications.retain(|(s, _), _| *s != source);
            }
        }
    }

    fn any_timestamped(&self) -> bool {
        self.list.items().any(|item| match item {
            TrayItem::Message(message) => message.timestamp().is_some(),
            TrayItem::Group(group) => group.messages().any(|m| m.timestamp().is_some()),
        })
    }
}

/// Applies a notification descriptor onto its message.
fn apply_notification(
    message: &mut Message,
    notification: &Notification,
    max_buttons: usize,
    signals: &mut SignalQueue,
) {
    message.set_title(&notification.title, signals);
    message.set_body(&notification.body, notification.body_uses_markup, signals);
    message.set_icon(notification.icon.clone(), signals);
    message.set_timestamp(notification.timestamp, signals);
    message.set_action_area(
        ActionArea::from_actions(&notification.actions, max_buttons),
        signals,
    );
}

/// Applies a player descriptor onto its media message.
fn apply_player(message: &mut Message, player: &PlayerDescriptor, signals: &mut SignalQueue) {
    message.set_title(&player.track_title, signals);
    message.set_body(&player.track_artists.join(", "), false, signals);
    let icon = player
        .cover_art
        .clone()
        .unwrap_or_else(|| IconRef::named("audio-x-generic-symbolic"));
    message.set_icon(Some(icon), signals);
    message.set_media_controls(
        crate::message::MediaControls {
            can_go_previous: player.can_go_previous,
            can_go_next: player.can_go_next,
            status: player.status,
        },
        signals,
    );
}
