//! Scenario files: scripted producer events and user operations.
//!
//! A scenario is a list of timestamped steps replayed against the engine.
//! This is driver-side test tooling; the engine itself knows nothing about
//! the format.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use mtray_core::sources::{
    MediaRegistry, Notification, NotificationId, NotificationSource, PlayerDescriptor, PlayerId,
    SourceId,
};
use mtray_core::{Tray, TrayConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parse scenario")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Step {
    /// Milliseconds since scenario start.
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub op: Op,
}

/// One scripted operation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// Registers a notification source and attaches the engine to it.
    DeclareSource { source: SourceId, title: String },
    Post {
        source: SourceId,
        notification: Notification,
    },
    Retract {
        source: SourceId,
        id: NotificationId,
    },
    Update {
        source: SourceId,
        notification: Notification,
    },
    PlayerAppeared { player: PlayerDescriptor },
    PlayerVanished { id: PlayerId },
    PlayerChanged { player: PlayerDescriptor },
    Expand { source: SourceId, id: NotificationId },
    Unexpand { source: SourceId, id: NotificationId },
    Close { source: SourceId, id: NotificationId },
    Clear,
}

/// Drives a tray through scenario steps on a simulated clock.
pub struct Runner {
    pub tray: Tray,
    sources: HashMap<SourceId, NotificationSource>,
    registry: MediaRegistry,
    clock_ms: u64,
}

impl Runner {
    pub fn new(config: TrayConfig) -> Self {
        let mut tray = Tray::new(config);
        let mut registry = MediaRegistry::new();
        tray.attach_media_registry(&mut registry);
        Self {
            tray,
            sources: HashMap::new(),
            registry,
            clock_ms: 0,
        }
    }

    /// Advances the clock to the step's timestamp and applies its operation.
    pub fn apply(&mut self, step: &Step) {
        if step.at_ms > self.clock_ms {
            self.tray
                .tick(Duration::from_millis(step.at_ms - self.clock_ms));
            self.clock_ms = step.at_ms;
        }

        match &step.op {
            Op::DeclareSource { source, title } => {
                let mut src = NotificationSource::new(*source, title);
                self.tray.attach_notification_source(&mut src);
                self.sources.insert(*source, src);
            }
            Op::Post {
                source,
                notification,
            } => self.with_source(*source, |src| src.post(notification.clone())),
            Op::Retract { source, id } => self.with_source(*source, |src| src.retract(*id)),
            Op::Update {
                source,
                notification,
            } => self.with_source(*source, |src| src.update(notification.clone())),
            Op::PlayerAppeared { player } => {
                self.registry.player_appeared(player.clone());
                self.tray.drain_media(&mut self.registry);
            }
            Op::PlayerVanished { id } => {
                self.registry.player_vanished(*id);
                self.tray.drain_media(&mut self.registry);
            }
            Op::PlayerChanged { player } => {
                self.registry.player_changed(player.clone());
                self.tray.drain_media(&mut self.registry);
            }
            Op::Expand { source, id } => {
                if let Some(message) = self.tray.message_for_notification(*source, *id) {
                    self.tray.expand(message);
                } else {
                    tracing::warn!(?source, ?id, "expand for unknown notification");
                }
            }
            Op::Unexpand { source, id } => {
                if let Some(message) = self.tray.message_for_notification(*source, *id) {
                    self.tray.unexpand(message);
                } else {
                    tracing::warn!(?source, ?id, "unexpand for unknown notification");
                }
            }
            Op::Close { source, id } => {
                if let Some(message) = self.tray.message_for_notification(*source, *id) {
                    self.tray.close(message);
                } else {
                    tracing::warn!(?source, ?id, "close for unknown notification");
                }
            }
            Op::Clear => self.tray.clear_all(),
        }
    }

    /// Runs a producer mutation and drains the resulting events.
    fn with_source(&mut self, id: SourceId, mutate: impl FnOnce(&mut NotificationSource)) {
        let Some(mut src) = self.sources.remove(&id) else {
            tracing::warn!(source = ?id, "operation for undeclared source");
            return;
        };
        mutate(&mut src);
        self.tray.drain_source(&mut src);
        self.sources.insert(id, src);
    }

    /// Lets every in-flight transition finish.
    pub fn settle(&mut self) {
        self.tray.tick(Duration::from_secs(2));
        self.tray.tick(Duration::from_secs(2));
    }

    /// Detaches every adapter, exactly once each.
    pub fn shutdown(&mut self) {
        for (_, mut src) in self.sources.drain() {
            self.tray.detach_notification_source(&mut src);
        }
        self.tray.detach_media_registry(&mut self.registry);
    }
}
