//! Line-level memory profiling engine for scripting runtimes.
//!
//! The runtime calls [`Profiler::on_statement`] before every statement of a profiled
//! execution context. Each call appends one [`Sample`] to the context's fixed-size
//! [`Ringbuffer`]; [`Profiler::info`] and [`Profiler::print`] collapse that history into a
//! per-line [`Report`].

extern crate serde;
#[macro_use]
extern crate serde_derive;

pub mod aggregator;
pub mod configuration;
pub mod error;
pub mod host;
pub mod profiler;
pub mod recorder;
pub mod report;
pub mod ringbuffer;
pub mod sample;
pub mod session;

pub use configuration::{Configuration, DEFAULT_CAPACITY};
pub use error::{Error, Result};
pub use host::{ContextId, Host, Location, LocationUnresolved, Statement};
pub use profiler::Profiler;
pub use report::{LineEntry, Report, SourceGroup};
pub use ringbuffer::Ringbuffer;
pub use sample::{Sample, SourceName};
