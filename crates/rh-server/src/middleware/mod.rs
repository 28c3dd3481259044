//! HTTP middleware: request ID, admin authorization, and login throttling.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
