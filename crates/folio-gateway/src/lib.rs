//! # folio-gateway
//!
//! WebSocket gateway that streams project changes to browsers.
//!
//! Clients receive HELLO, may IDENTIFY with an access token, then SUBSCRIBE
//! to projects and receive a CHANGE dispatch for every committed mutation.

pub mod broadcast;
pub mod connection;
pub mod events;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use server::{
    create_app, create_gateway_state, create_gateway_state_with_context, run, GatewayState,
};
