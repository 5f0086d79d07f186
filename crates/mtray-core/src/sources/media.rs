//! Media-player registry adapter.
//!
//! Normalizes a player-discovery backend into appeared / vanished / changed
//! events. Each known player backs one standalone media message in the list;
//! the message is never user-closable and follows the player's lifetime.

use crate::sources::{PlayerDescriptor, PlayerEvent, PlayerId, SubscriberToken, Subscribers};

/// Registry of currently known media players.
#[derive(Debug, Default)]
pub struct MediaRegistry {
    players: Vec<PlayerDescriptor>,
    subscribers: Subscribers,
    events: Vec<PlayerEvent>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current players, in appearance order.
    pub fn players(&self) -> &[PlayerDescriptor] {
        &self.players
    }

    /// Registers a consumer and returns its token plus a snapshot of the
    /// current players.
    pub fn subscribe(&mut self) -> (SubscriberToken, Vec<PlayerDescriptor>) {
        (self.subscribers.subscribe(), self.players.clone())
    }

    /// Drops a registration. Returns false on a double unsubscribe.
    pub fn unsubscribe(&mut self, token: SubscriberToken) -> bool {
        self.subscribers.unsubscribe(token)
    }

    /// Announces a player. A repeated id refreshes the existing player and
    /// emits a change instead of an add.
    pub fn player_appeared(&mut self, player: PlayerDescriptor) {
        match self.players.iter().position(|p| p.id == player.id) {
            Some(index) => {
                self.players[index] = player.clone();
                self.emit(PlayerEvent::Changed { player });
            }
            None => {
                self.players.push(player.clone());
                self.emit(PlayerEvent::Added { player });
            }
        }
    }

    /// Refreshes a player's now-playing metadata.
    pub fn player_changed(&mut self, player: PlayerDescriptor) {
        match self.players.iter().position(|p| p.id == player.id) {
            Some(index) => self.players[index] = player.clone(),
            None => tracing::debug!(id = ?player.id, "change for unknown player"),
        }
        self.emit(PlayerEvent::Changed { player });
    }

    /// Removes a player from the registry.
    pub fn player_vanished(&mut self, id: PlayerId) {
        match self.players.iter().position(|p| p.id == id) {
            Some(index) => {
                self.players.remove(index);
                self.emit(PlayerEvent::Removed { id });
            }
            None => tracing::debug!(?id, "vanish for unknown player"),
        }
    }

    /// Drains queued events for the consumer.
    pub fn take_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: PlayerEvent) {
        if self.subscribers.any() {
            self.events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::PlaybackStatus;

    fn player(id: u64, title: &str) -> PlayerDescriptor {
        PlayerDescriptor {
            id: PlayerId(id),
            track_title: title.to_string(),
            track_artists: vec!["Artist".to_string()],
            cover_art: None,
            status: PlaybackStatus::Playing,
            can_go_previous: false,
            can_go_next: true,
        }
    }

    #[test]
    fn appearance_then_change_then_vanish() {
        let mut registry = MediaRegistry::new();
        let (token, snapshot) = registry.subscribe();
        assert!(snapshot.is_empty());

        registry.player_appeared(player(1, "Song"));
        registry.player_changed(player(1, "Song 2"));
        registry.player_vanished(PlayerId(1));

        let events = registry.take_events();
        assert!(matches!(
            events.as_slice(),
            [
                PlayerEvent::Added { .. },
                PlayerEvent::Changed { .. },
                PlayerEvent::Removed { .. },
            ]
        ));
        assert!(registry.players().is_empty());
        assert!(registry.unsubscribe(token));
    }

    #[test]
    fn vanish_of_unknown_player_is_silent() {
        let mut registry = MediaRegistry::new();
        let _sub = registry.subscribe();
        registry.player_vanished(PlayerId(7));
        assert!(registry.take_events().is_empty());
    }
}
