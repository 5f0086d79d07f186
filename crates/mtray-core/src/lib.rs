//! Core mtray library: the message/notification ordering and lifecycle
//! engine.
//!
//! The engine decides where an item sits in a list, how urgency promotes and
//! demotes it, how expansion state is tracked independently of visual
//! animation, how groups aggregate the messages of one source, and how
//! removal and insertion stay consistent while transitions are in flight.
//! Rendering, icon loading, and transport plumbing live elsewhere; the engine
//! talks to them only through producer events and the signal outbox.

pub mod config;
pub mod expansion;
pub mod group;
pub mod list;
pub mod message;
pub mod signals;
pub mod sources;
pub mod transition;
pub mod tray;

pub use config::TrayConfig;
pub use list::{Focus, MessageList, TrayItem};
pub use message::{Message, MessageId, Urgency};
pub use signals::Signal;
pub use transition::ItemId;
pub use tray::Tray;
