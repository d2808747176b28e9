//! Shared-listening over websockets: peers relay play/pause/resume frames
//! through a small broadcast server so every connected player mirrors the
//! same state.

pub mod client;
pub mod config;
pub mod events;
pub mod manager;
pub mod player;
pub mod server;
