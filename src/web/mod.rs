//! HTTP service: search, capture and replay over a JSON API with a
//! server-sent-events progress stream.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::WebError;
pub use server::{build_router, run_server};
pub use state::WebAppState;
