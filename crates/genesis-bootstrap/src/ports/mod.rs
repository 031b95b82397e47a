//! Ports Layer
//!
//! - Driving Ports (inbound): API for callers
//! - Driven Ports (outbound): external collaborators

pub mod inbound;
pub mod outbound;

pub use inbound::BootstrapApi;
pub use outbound::{
    ChainBuilder, ChainRuntime, EventSink, Filesystem, GenesisFetcher, InitMode, NodeCommands,
};
