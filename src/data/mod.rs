//! Remote data gateway.
//!
//! - `gateway`: the `Gateway` trait and response decoding
//! - `http`: the reqwest-backed implementation used by the binary

pub mod gateway;
pub mod http;

pub use gateway::*;
pub use http::HttpGateway;
