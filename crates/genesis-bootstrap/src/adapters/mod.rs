//! Adapters Layer
//!
//! Reference implementations of the outbound ports:
//!
//! - `TokioFilesystem`: local filesystem
//! - `StandardLayout` / `BinaryChainRuntime`: chain home layout and the
//!   chain binary's `init` / `validate-genesis` subcommands
//! - `CommandChainBuilder` / `PrebuiltBinary`: producing the chain binary
//! - `HttpGenesisFetcher`: genesis download (JSON or tarball)
//! - `ChannelEventSink` / `TracingEventSink` / `RecordingEventSink`

pub mod builder;
pub mod chain_runtime;
pub mod event_sink;
pub mod fetcher;
pub mod filesystem;
mod process;

pub use builder::{CommandChainBuilder, PrebuiltBinary, BUILD_CACHE_ENV};
pub use chain_runtime::{BinaryChainRuntime, BinaryNodeCommands, StandardLayout};
pub use event_sink::{ChannelEventSink, RecordingEventSink, TracingEventSink};
pub use fetcher::{is_tarball, HttpGenesisFetcher, GENESIS_FILE_NAME};
pub use filesystem::TokioFilesystem;
