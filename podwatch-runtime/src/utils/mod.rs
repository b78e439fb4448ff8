//! Helpers shared by the watch supervisor

mod reconnect;

pub use reconnect::{Reconnect, ReconnectPolicy};
