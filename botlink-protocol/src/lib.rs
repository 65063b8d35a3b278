//! # Botlink Protocol
//!
//! A single-peer TCP line protocol that lets an external automated agent
//! ("bot") observe and drive a running application.
//!
//! ## Wire Format
//!
//! Outbound telemetry is one newline-terminated text line per event:
//! ```text
//! <time> <pos_x>,<pos_y> <event> <params>\n
//! ```
//!
//! | Field | Type | Notes |
//! |-------|------|-------|
//! | time | float | host clock, sender's formatting |
//! | pos_x,pos_y | float | comma-separated pair |
//! | event | text | no embedded newline |
//! | params | text | no embedded newline, may be empty |
//!
//! Inbound data is uninterpreted text lines; parsing belongs to the host.
//!
//! The session is polled from the host's main loop: all operations are
//! non-blocking and return immediately whether or not data is available.

mod event;
mod session;
pub mod socket;

pub use event::Event;
pub use session::BotSession;
pub use socket::{LinkError, Listener, Socket};

/// Default port for bot connections
pub const DEFAULT_PORT: u16 = 2101;
