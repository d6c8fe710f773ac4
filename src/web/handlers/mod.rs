//! HTTP request handlers for the relay web API.

pub mod replay;
pub mod scenarios;
pub mod search;
