//! HTTP/JSON gateway.
//!
//! Handlers translate JSON requests into RPC messages and call the gRPC
//! implementation in-process; see [`contents`].
pub mod contents;
pub mod error;
pub mod openapi;
pub mod system;
pub mod types;
