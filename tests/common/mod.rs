//! Shared test utilities for relay
//!
//! - Search response and hit builders
//! - An isolated web app backed by a temporary scenario store
//! - Server-sent-event body parsing

pub mod fixtures;
