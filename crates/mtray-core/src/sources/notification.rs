//! Notification source adapter.
//!
//! Wraps one producer of user notifications (an app, a chat channel) behind
//! the enumerate-plus-events contract. The source persists with zero current
//! notifications; its group lives until the source itself is dropped by the
//! driver.

use crate::sources::{
    Notification, NotificationId, SourceEvent, SourceId, SubscriberToken, Subscribers,
};

/// One notification producer.
#[derive(Debug)]
pub struct NotificationSource {
    id: SourceId,
    title: String,
    notifications: Vec<Notification>,
    subscribers: Subscribers,
    events: Vec<SourceEvent>,
}

impl NotificationSource {
    pub fn new(id: SourceId, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            notifications: Vec::new(),
            subscribers: Subscribers::default(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current notifications, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Registers a consumer and returns its token plus a snapshot of the
    /// current notifications.
    pub fn subscribe(&mut self) -> (SubscriberToken, Vec<Notification>) {
        (self.subscribers.subscribe(), self.notifications.clone())
    }

    /// Drops a registration. Returns false on a double unsubscribe.
    pub fn unsubscribe(&mut self, token: SubscriberToken) -> bool {
        self.subscribers.unsubscribe(token)
    }

    /// Publishes a notification. A repeated id replaces the existing
    /// notification and emits a change instead of an add.
    pub fn post(&mut self, notification: Notification) {
        let position = self
            .notifications
            .iter()
            .position(|n| n.id == notification.id);
        match position {
            Some(index) => {
                self.notifications[index] = notification.clone();
                self.emit(SourceEvent::Changed {
                    source: self.id,
                    notification,
                });
            }
            None => {
                self.notifications.push(notification.clone());
                self.emit(SourceEvent::Added {
                    source: self.id,
                    notification,
                });
            }
        }
    }

    /// Updates an existing notification's attributes.
    ///
    /// The change event is emitted even when the notification is unknown
    /// here; the consumer tolerates that race.
    pub fn update(&mut self, notification: Notification) {
        match self
            .notifications
            .iter()
            .position(|n| n.id == notification.id)
        {
            Some(index) => self.notifications[index] = notification.clone(),
            None => {
                tracing::debug!(id = ?notification.id, "update for unknown notification");
            }
        }
        self.emit(SourceEvent::Changed {
            source: self.id,
            notification,
        });
    }

    /// Withdraws a notification.
    pub fn retract(&mut self, id: NotificationId) {
        match self.notifications.iter().position(|n| n.id == id) {
            Some(index) => {
                self.notifications.remove(index);
                self.emit(SourceEvent::Removed {
                    source: self.id,
                    id,
                });
            }
            None => tracing::debug!(?id, "retract for unknown notification"),
        }
    }

    /// Drains queued events for the consumer.
    pub fn take_events(&mut self) -> Vec<SourceEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: SourceEvent) {
        if self.subscribers.any() {
            self.events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(id: u64, title: &str) -> Notification {
        Notification {
            id: NotificationId(id),
            title: title.to_string(),
            body: String::new(),
            body_uses_markup: false,
            icon: None,
            timestamp: None,
            urgency: crate::message::Urgency::Normal,
            actions: Vec::new(),
        }
    }

    #[test]
    fn subscribe_snapshots_current_notifications() {
        let mut source = NotificationSource::new(SourceId(1), "Mail");
        source.post(notification(1, "a"));

        let (token, snapshot) = source.subscribe();
        assert_eq!(snapshot.len(), 1);

        source.post(notification(2, "b"));
        let events = source.take_events();
        assert!(matches!(events.as_slice(), [SourceEvent::Added { .. }]));

        assert!(source.unsubscribe(token));
    }

    #[test]
    fn events_are_dropped_without_subscribers() {
        let mut source = NotificationSource::new(SourceId(1), "Mail");
        source.post(notification(1, "a"));
        assert!(source.take_events().is_empty());
    }

    #[test]
    fn reposting_an_id_becomes_a_change() {
        let mut source = NotificationSource::new(SourceId(1), "Mail");
        let _sub = source.subscribe();
        source.post(notification(1, "a"));
        source.post(notification(1, "a2"));

        let events = source.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], SourceEvent::Changed { .. }));
        assert_eq!(source.notifications().len(), 1);
        assert_eq!(source.notifications()[0].title, "a2");
    }

    #[test]
    fn retracting_unknown_id_is_silent() {
        let mut source = NotificationSource::new(SourceId(1), "Mail");
        let _sub = source.subscribe();
        source.retract(NotificationId(9));
        assert!(source.take_events().is_empty());
    }
}
