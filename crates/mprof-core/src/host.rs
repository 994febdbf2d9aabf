//! The boundary between the profiler and the runtime it observes.

use std::fmt;

/// Opaque identity of an execution context, issued by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context#{}", self.0)
    }
}

/// Source position of the statement about to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location<'a> {
    pub source: &'a str,
    pub line: i32,
}

/// The host could not tell where execution currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocationUnresolved;

/// Location descriptor handed to the statement hook.
pub trait Statement {
    fn location(&self) -> Result<Location<'_>, LocationUnresolved>;
}

impl Statement for Location<'_> {
    fn location(&self) -> Result<Location<'_>, LocationUnresolved> {
        Ok(*self)
    }
}

/// Services the profiler needs from the runtime.
///
/// `set_hook` must arrange for [`crate::Profiler::on_statement`] to be called with `id`
/// on every statement executed by `context`, until `clear_hook` is called for it.
pub trait Host {
    type Context;

    fn context_id(&self, context: &Self::Context) -> ContextId;
    fn set_hook(&self, context: &Self::Context, id: ContextId);
    fn clear_hook(&self, context: &Self::Context, id: ContextId);

    /// Absolute number of bytes currently in use by the runtime.
    fn memory_used_bytes(&self) -> u64;
}
