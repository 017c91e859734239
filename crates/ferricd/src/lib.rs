//! ferricd: an RFC 1459 IRC server.
//!
//! The crate is layered leaf-first: `message`/`parsers` handle the wire
//! grammar, `users`/`channels`/`server_state` hold the world, the
//! `handlers` tree implements one command family per module behind the
//! dispatcher in `handlers::request`, and `broker` is the single task
//! that owns all of it.

pub mod broker;
pub mod casemap;
pub mod channels;
pub mod config;
pub mod constants;
pub mod errors;
pub mod handlers;
pub mod message;
pub mod message_models;
pub mod parsers;
pub mod replies;
pub mod server_state;
pub mod users;
