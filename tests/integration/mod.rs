//! Integration tests for relay
//!
//! These tests drive the HTTP router and the binary against mocked search and
//! ingestion services.

#[path = "../common/mod.rs"]
pub mod common;

pub mod capture_flow;
pub mod cli;
pub mod replay_flow;
