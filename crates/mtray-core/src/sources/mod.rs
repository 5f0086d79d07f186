//! Producer adapters and their event contract.
//!
//! Adapters normalize heterogeneous producers (a notification source, a
//! media-player registry) into enumerable snapshots plus added / removed /
//! changed events. The engine subscribes once per adapter instance, drains
//! its event queue from the driver loop, and unsubscribes exactly once on
//! teardown. Events are serializable so driver scenarios can be replayed
//! from files.

pub mod media;
pub mod notification;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use media::MediaRegistry;
pub use notification::NotificationSource;

use crate::message::{Action, IconRef, PlaybackStatus, Urgency};

/// Identity of a notification-producing source (one group per source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub u64);

/// Identity of a media player within the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

/// Producer-side identity of a notification, stable across updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

/// Subscription handle returned by an adapter; redeemed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberToken(u64);

/// A notification as described by its producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub body_uses_markup: bool,
    #[serde(default)]
    pub icon: Option<IconRef>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Events emitted by a notification source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceEvent {
    Added {
        source: SourceId,
        notification: Notification,
    },
    Removed {
        source: SourceId,
        id: NotificationId,
    },
    /// Attribute refresh; carries the full updated descriptor.
    Changed {
        source: SourceId,
        notification: Notification,
    },
}

/// A media player as described by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDescriptor {
    pub id: PlayerId,
    #[serde(default)]
    pub track_title: String,
    #[serde(default)]
    pub track_artists: Vec<String>,
    #[serde(default)]
    pub cover_art: Option<IconRef>,
    #[serde(default)]
    pub status: PlaybackStatus,
    #[serde(default)]
    pub can_go_previous: bool,
    #[serde(default)]
    pub can_go_next: bool,
}

/// Events emitted by the media-player registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    Added { player: PlayerDescriptor },
    Removed { id: PlayerId },
    /// Now-playing metadata refresh; carries the full updated descriptor.
    Changed { player: PlayerDescriptor },
}

/// Shared subscription bookkeeping for adapters.
///
/// Events queue only while at least one subscriber is registered; with
/// nobody listening they are dropped, so a consumer that unsubscribed on
/// teardown cannot leak a growing queue.
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    next_token: u64,
    active: Vec<SubscriberToken>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> SubscriberToken {
        let token = SubscriberToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.active.push(token);
        token
    }

    /// Removes a subscription. Returns false if the token was never issued
    /// or was already redeemed, which indicates a double unsubscribe.
    pub(crate) fn unsubscribe(&mut self, token: SubscriberToken) -> bool {
        let Some(index) = self.active.iter().position(|t| *t == token) else {
            return false;
        };
        self.active.remove(index);
        true
    }

    pub(crate) fn any(&self) -> bool {
        !self.active.is_empty()
    }
}
