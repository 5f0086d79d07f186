//! Built-in demo scenario.
//!
//! Walks the engine through the interesting paths: grouped notifications,
//! urgency escalation, a media player, expansion, and a staggered clear.

use anyhow::Result;
use chrono::Utc;
use mtray_core::TrayConfig;
use mtray_core::message::{Action, PlaybackStatus, Urgency};
use mtray_core::sources::{
    Notification, NotificationId, PlayerDescriptor, PlayerId, SourceId,
};

use crate::scenario::{Op, Runner, Scenario, Step};
use crate::snapshot;

const CHAT: SourceId = SourceId(1);
const MAIL: SourceId = SourceId(2);

fn notification(id: u64, title: &str, body: &str, urgency: Urgency) -> Notification {
    Notification {
        id: NotificationId(id),
        title: title.to_string(),
        body: body.to_string(),
        body_uses_markup: false,
        icon: None,
        timestamp: Some(Utc::now()),
        urgency,
        actions: Vec::new(),
    }
}

fn script() -> Scenario {
    let player = PlayerDescriptor {
        id: PlayerId(1),
        track_title: "Idioteque".to_string(),
        track_artists: vec!["Radiohead".to_string()],
        cover_art: None,
        status: PlaybackStatus::Playing,
        can_go_previous: true,
        can_go_next: true,
    };
    let steps = vec![
        Step {
            at_ms: 0,
            op: Op::DeclareSource {
                source: CHAT,
                title: "Chat".to_string(),
            },
        },
        Step {
            at_ms: 0,
            op: Op::DeclareSource {
                source: MAIL,
                title: "Mail".to_string(),
            },
        },
        Step {
            at_ms: 10,
            op: Op::Post {
                source: CHAT,
                notification: notification(1, "robin", "lunch?", Urgency::Normal),
            },
        },
        Step {
            at_ms: 40,
            op: Op::Post {
                source: CHAT,
                notification: notification(2, "sam", "build is red", Urgency::Critical),
            },
        },
        Step {
            at_ms: 80,
            op: Op::Post {
                source: MAIL,
                notification: Notification {
                    actions: vec![
                        Action {
                            key: "archive".to_string(),
                            label: "Archive".to_string(),
                        },
                        Action {
                            key: "reply".to_string(),
                            label: "Reply".to_string(),
                        },
                    ],
                    ..notification(1, "weekly report", "numbers attached", Urgency::Normal)
                },
            },
        },
        Step {
            at_ms: 120,
            op: Op::PlayerAppeared { player: player.clone() },
        },
        Step {
            at_ms: 400,
            op: Op::Expand {
                source: MAIL,
                id: NotificationId(1),
            },
        },
        Step {
            at_ms: 600,
            op: Op::Update {
                source: CHAT,
                notification: notification(1, "robin", "URGENT: lunch??", Urgency::Critical),
            },
        },
        Step {
            at_ms: 900,
            op: Op::PlayerChanged {
                player: PlayerDescriptor {
                    status: PlaybackStatus::Paused,
                    ..player
                },
            },
        },
    ];
    Scenario { steps }
}

pub fn run(config: TrayConfig) -> Result<()> {
    let mut runner = Runner::new(config);

    for step in script().steps {
        runner.apply(&step);
    }
    runner.settle();

    println!("After producers settle:");
    println!("{}", snapshot::render(&runner.tray));

    runner.tray.clear_all();
    runner.settle();
    println!();
    println!("After clear:");
    println!("{}", snapshot::render(&runner.tray));

    println!();
    println!("Signals:");
    for signal in runner.tray.take_signals() {
        println!("  {signal:?}");
    }

    runner.shutdown();
    Ok(())
}
