//! Topic presence: who else is replying to or editing in a topic.
//!
//! Clients embed a [`presence::PresenceManager`] per open topic; it listens on
//! the topic's channel through a [`transport::PresenceTransport`], expires
//! users who stop sending heartbeats and throttles the local user's own
//! announces. The relay server (see `main.rs`) owns the [`bus::MessageBus`]
//! and exposes it over HTTP and WebSocket.

pub mod app;
pub mod auth;
pub mod bus;
pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod presence;
pub mod routes;
pub mod services;
pub mod transport;
