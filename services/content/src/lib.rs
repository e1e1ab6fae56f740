//! Content service library crate.
//!
//! # Purpose
//! Exposes the content model, repositories, message bus adapters, the
//! lifecycle service and both transport surfaces (gRPC and the HTTP gateway)
//! for use by the binary and tests.
pub mod api;
pub mod app;
pub mod config;
pub mod frontdoor;
pub mod message;
pub mod model;
pub mod observability;
pub mod rpc;
pub mod service;
pub mod slug;
pub mod store;
