//! # Observability
//!
//! The engine emits `tracing` events at fixed points of the pipeline:
//!
//! | Level   | Event                                                   |
//! |---------|---------------------------------------------------------|
//! | `debug` | request accepted / image ready (kind, shape, statistics) |
//! | `trace` | spectrum synthesized, filter kernel built               |
//! | `warn`  | inverse transform left a non-negligible imaginary part  |
//!
//! Nothing is printed until an application installs a subscriber, for
//! example with [`init_logging`].

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
