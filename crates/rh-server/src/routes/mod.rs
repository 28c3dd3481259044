//! Route handlers for the HTTP API.

pub mod admin;
pub mod auth;
pub mod health;
pub mod playback;
pub mod videos;
