//! Force-directed layout and interaction core for a space-biology knowledge
//! graph explorer.
//!
//! A [`explorer::Explorer`] turns category filter selections into cached graph
//! snapshots, lays each one out with a [`layout::LayoutEngine`] and routes
//! pointer input through [`interaction`] transitions. The desktop binary is a
//! thin `eframe` painter on top.

pub mod adjacency;
pub mod cache;
pub mod config;
pub mod error;
pub mod explorer;
pub mod fetch;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod render;
pub mod session;
