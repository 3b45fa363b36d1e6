//! Integration test utilities for the engagement servers
//!
//! This crate provides helpers for running end-to-end tests against
//! the REST API and the realtime gateway sharing one service context.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
