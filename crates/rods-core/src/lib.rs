//! rods core - shared abstractions for talking to a data-grid service
//!
//! This crate defines the seams every other rods crate builds on:
//!
//! - `Connection` - a live session with the remote service
//! - `Connector` - establishes and probes sessions for an endpoint
//! - `EndpointConfig` - where and as whom to connect
//! - `RodsError` / `Result` - the common error type

mod connection;
mod connector;
pub mod endpoint;
mod error;

pub use connection::*;
pub use connector::*;
pub use endpoint::EndpointConfig;
pub use error::*;
