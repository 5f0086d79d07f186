//! The message entity: the data/identity unit displayed in a list.
//!
//! A message is either a notification or a media-player status line. The
//! variant decides the close policy: notifications can be dismissed by the
//! user, media messages only disappear when their backing player does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expansion::ExpansionController;
use crate::signals::{Signal, SignalQueue};
use crate::sources::{PlayerId, SourceId};

/// Stable identity of a message for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// Monotonic id generator for messages.
#[derive(Debug, Default)]
pub struct MessageSeq {
    next: u64,
}

impl MessageSeq {
    pub fn next_id(&mut self) -> MessageId {
        let id = MessageId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Priority classification placing a message ahead of non-urgent ones.
///
/// Only `Critical` counts as urgent for ordering purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Urgency {
    pub fn is_urgent(self) -> bool {
        matches!(self, Urgency::Critical)
    }
}

/// Reference to an icon by theme name or URI.
///
/// Resolving and loading the image is the rendering layer's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRef(pub String);

impl IconRef {
    pub fn named(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// An invokable action attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Key reported back to the producer when activated.
    pub key: String,
    /// Button label.
    pub label: String,
}

/// The action area below a message body, revealed while expanded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionArea {
    buttons: Vec<Action>,
}

impl ActionArea {
    /// Builds the action area from a notification's actions, keeping at most
    /// `max_buttons` of them.
    pub fn from_actions(actions: &[Action], max_buttons: usize) -> Option<Self> {
        if actions.is_empty() {
            return None;
        }
        Some(Self {
            buttons: actions.iter().take(max_buttons).cloned().collect(),
        })
    }

    pub fn buttons(&self) -> &[Action] {
        &self.buttons
    }
}

/// Playback state of a media player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

/// Media-control strip state, refreshed from player metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaControls {
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub status: PlaybackStatus,
}

impl MediaControls {
    /// Icon name for the play/pause toggle in the control strip.
    pub fn play_pause_icon(&self) -> &'static str {
        if self.status == PlaybackStatus::Playing {
            "media-playback-pause-symbolic"
        } else {
            "media-playback-start-symbolic"
        }
    }
}

/// Closed set of message variants; each supplies its own close policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A user notification; dismissable once shown.
    Notification { acknowledged: bool },
    /// A media-player status line; removed only when its player vanishes.
    Media { player: PlayerId },
}

impl MessageKind {
    pub fn can_close(self) -> bool {
        match self {
            MessageKind::Notification { .. } => true,
            MessageKind::Media { .. } => false,
        }
    }
}

/// A single displayable message.
#[derive(Debug)]
pub struct Message {
    id: MessageId,
    /// Owning notification source; media messages have none.
    source: Option<SourceId>,
    kind: MessageKind,
    title: String,
    body: String,
    body_uses_markup: bool,
    icon: Option<IconRef>,
    timestamp: Option<DateTime<Utc>>,
    urgency: Urgency,
    action_area: Option<ActionArea>,
    action_area_visible: bool,
    media_controls: Option<MediaControls>,
    /// Layout feedback from the rendering layer: the collapsed body is
    /// currently truncated.
    body_ellipsized: bool,
    expand_hint_visible: bool,
    pub expansion: ExpansionController,
}

impl Message {
    pub fn new(id: MessageId, source: Option<SourceId>, kind: MessageKind) -> Self {
        Self {
            id,
            source,
            kind,
            title: String::new(),
            body: String::new(),
            body_uses_markup: false,
            icon: None,
            timestamp: None,
            urgency: Urgency::Normal,
            action_area: None,
            action_area_visible: false,
            media_controls: None,
            body_ellipsized: false,
            expand_hint_visible: false,
            expansion: ExpansionController::new(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn source(&self) -> Option<SourceId> {
        self.source
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn body_uses_markup(&self) -> bool {
        self.body_uses_markup
    }

    pub fn icon(&self) -> Option<&IconRef> {
        self.icon.as_ref()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn action_area(&self) -> Option<&ActionArea> {
        self.action_area.as_ref()
    }

    pub fn action_area_visible(&self) -> bool {
        self.action_area_visible
    }

    pub fn media_controls(&self) -> Option<&MediaControls> {
        self.media_controls.as_ref()
    }

    pub fn can_close(&self) -> bool {
        self.kind.can_close()
    }

    /// Marks a notification as seen by the user. Media messages ignore this.
    pub fn acknowledge(&mut self) {
        if let MessageKind::Notification { acknowledged } = &mut self.kind {
            *acknowledged = true;
        }
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(self.kind, MessageKind::Notification { acknowledged: true })
    }

    /// Sets the title, flattening newlines so the header stays one line.
    pub fn set_title(&mut self, title: &str, signals: &mut SignalQueue) {
        self.title = title.replace('\n', " ");
        signals.push(Signal::MessageChanged(self.id));
    }

    pub fn set_body(&mut self, body: &str, uses_markup: bool, signals: &mut SignalQueue) {
        self.body = body.to_string();
        self.body_uses_markup = uses_markup;
        signals.push(Signal::MessageChanged(self.id));
    }

    pub fn set_icon(&mut self, icon: Option<IconRef>, signals: &mut SignalQueue) {
        self.icon = icon;
        signals.push(Signal::MessageChanged(self.id));
    }

    pub fn set_timestamp(&mut self, timestamp: Option<DateTime<Utc>>, signals: &mut SignalQueue) {
        self.timestamp = timestamp;
        signals.push(Signal::MessageChanged(self.id));
    }

    pub fn set_urgency(&mut self, urgency: Urgency) {
        self.urgency = urgency;
    }

    pub fn set_media_controls(&mut self, controls: MediaControls, signals: &mut SignalQueue) {
        if self.media_controls == Some(controls) {
            return;
        }
        self.media_controls = Some(controls);
        signals.push(Signal::MessageChanged(self.id));
    }

    /// Attaches or detaches the action area and refreshes the affordance.
    pub fn set_action_area(&mut self, area: Option<ActionArea>, signals: &mut SignalQueue) {
        self.action_area = area;
        self.action_area_visible = self.action_area.is_some() && self.expansion.is_expanded();
        self.update_expand_hint(signals);
    }

    pub(crate) fn set_action_area_visible(&mut self, visible: bool) {
        self.action_area_visible = visible && self.action_area.is_some();
    }

    /// Layout feedback from the renderer: whether the collapsed body is
    /// currently truncated. Drives the expand affordance.
    pub fn set_body_ellipsized(&mut self, ellipsized: bool, signals: &mut SignalQueue) {
        self.body_ellipsized = ellipsized;
        self.update_expand_hint(signals);
    }

    pub fn expand_hint_visible(&self) -> bool {
        self.expand_hint_visible
    }

    /// Recomputes the expand affordance: visible iff the body is truncated,
    /// the message is expanded, or an action area is present.
    pub(crate) fn update_expand_hint(&mut self, signals: &mut SignalQueue) {
        let visible =
            self.body_ellipsized || self.expansion.is_expanded() || self.action_area.is_some();
        if visible != self.expand_hint_visible {
            self.expand_hint_visible = visible;
            signals.push(Signal::ExpandHintChanged {
                message: self.id,
                visible,
            });
        }
    }

    /// Relative time label for the header, or `None` without a timestamp.
    pub fn time_label(&self, now: DateTime<Utc>) -> Option<String> {
        self.timestamp.map(|ts| format_time_span(now, ts))
    }
}

/// Formats the span between `now` and `then` as a short relative label.
pub fn format_time_span(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes().max(0);
    if minutes < 1 {
        return "now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    format!("{days}d ago")
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn message(kind: MessageKind) -> Message {
        Message::new(MessageId(1), Some(SourceId(0)), kind)
    }

    fn notification() -> Message {
        message(MessageKind::Notification {
            acknowledged: false,
        })
    }

    #[test]
    fn close_policy_follows_kind() {
        assert!(notification().can_close());
        assert!(!message(MessageKind::Media { player: PlayerId(3) }).can_close());
    }

    #[test]
    fn title_newlines_are_flattened() {
        let mut signals = SignalQueue::new();
        let mut msg = notification();
        msg.set_title("two\nlines", &mut signals);
        assert_eq!(msg.title(), "two lines");
        assert!(signals.contains(&Signal::MessageChanged(msg.id())));
    }

    #[test]
    fn expand_hint_tracks_ellipsis_and_action_area() {
        let mut signals = SignalQueue::new();
        let mut msg = notification();
        assert!(!msg.expand_hint_visible());

        msg.set_body_ellipsized(true, &mut signals);
        assert!(msg.expand_hint_visible());
        assert!(signals.contains(&Signal::ExpandHintChanged {
            message: msg.id(),
            visible: true,
        }));

        msg.set_body_ellipsized(false, &mut signals);
        assert!(!msg.expand_hint_visible());

        let area = ActionArea::from_actions(&[action("a")], 3);
        msg.set_action_area(area, &mut signals);
        assert!(msg.expand_hint_visible());
    }

    #[test]
    fn expand_hint_signal_is_edge_triggered() {
        let mut signals = SignalQueue::new();
        let mut msg = notification();
        msg.set_body_ellipsized(true, &mut signals);
        signals.take();

        // Same value again: no new signal.
        msg.set_body_ellipsized(true, &mut signals);
        assert!(signals.is_empty());
    }

    fn action(key: &str) -> Action {
        Action {
            key: key.to_string(),
            label: key.to_uppercase(),
        }
    }

    #[test]
    fn action_area_caps_buttons() {
        let actions: Vec<Action> = ["a", "b", "c", "d", "e"].iter().map(|k| action(k)).collect();
        let area = ActionArea::from_actions(&actions, 3).unwrap();
        assert_eq!(area.buttons().len(), 3);
        assert_eq!(area.buttons()[0].key, "a");

        assert_eq!(ActionArea::from_actions(&[], 3), None);
    }

    #[test]
    fn time_span_labels() {
        let now = Utc::now();
        assert_eq!(format_time_span(now, now), "now");
        assert_eq!(format_time_span(now, now - TimeDelta::minutes(5)), "5m ago");
        assert_eq!(format_time_span(now, now - TimeDelta::hours(3)), "3h ago");
        assert_eq!(format_time_span(now, now - TimeDelta::days(2)), "2d ago");
        // A future timestamp clamps to "now" rather than going negative.
        assert_eq!(format_time_span(now, now + TimeDelta::minutes(9)), "now");
    }
}
