//! Real-time channel protocol types
//!
//! Frames are JSON `{"event": <name>, "data": <payload>}` in both directions.

pub mod ws;

pub use ws::*;
