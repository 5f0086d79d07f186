//! Text snapshots of the tray state for the terminal.

use comfy_table::{Table, presets};
use mtray_core::message::MessageKind;
use mtray_core::{Tray, TrayItem, Urgency};

fn urgency_label(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Low => "low",
        Urgency::Normal => "normal",
        Urgency::High => "high",
        Urgency::Critical => "critical",
    }
}

/// Renders the current list as a table, groups indented under their header.
pub fn render(tray: &Tray) -> String {
    let mut table = Table::new();
    table.load_preset(presets::ASCII_MARKDOWN);
    table.set_header(vec!["#", "kind", "title", "urgency", "scale", "state"]);

    let scheduler = tray.scheduler();
    for (index, item) in tray.list().items().enumerate() {
        let scale = tray
            .list()
            .scale_of(item.id(), scheduler)
            .unwrap_or_default();
        match item {
            TrayItem::Message(message) => {
                let kind = match message.kind() {
                    MessageKind::Media { .. } => "media",
                    MessageKind::Notification { .. } => "message",
                };
                let state = if message.expansion.is_expanded() {
                    "expanded"
                } else {
                    "collapsed"
                };
                table.add_row(vec![
                    index.to_string(),
                    kind.to_string(),
                    message.title().to_string(),
                    String::new(),
                    format!("{scale:.2}"),
                    state.to_string(),
                ]);
            }
            TrayItem::Group(group) => {
                table.add_row(vec![
                    index.to_string(),
                    "group".to_string(),
                    group.title().to_string(),
                    if group.has_urgent() { "urgent" } else { "" }.to_string(),
                    format!("{scale:.2}"),
                    format!("{} message(s)", group.len()),
                ]);
                for message in group.messages() {
                    let member_scale = group
                        .scale_of(message.id(), scheduler)
                        .unwrap_or_default();
                    let state = if message.expansion.is_expanded() {
                        "expanded"
                    } else {
                        "collapsed"
                    };
                    table.add_row(vec![
                        String::new(),
                        "  msg".to_string(),
                        message.title().to_string(),
                        urgency_label(message.urgency()).to_string(),
                        format!("{member_scale:.2}"),
                        state.to_string(),
                    ]);
                }
            }
        }
    }

    let flags = format!(
        "empty: {}  can_clear: {}",
        tray.empty(),
        tray.can_clear()
    );
    format!("{table}\n{flags}")
}
