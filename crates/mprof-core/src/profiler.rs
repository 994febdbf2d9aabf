use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use crate::configuration::Configuration;
use crate::error::Result;
use crate::host::{ContextId, Host, Statement};
use crate::recorder;
use crate::report::annotated::{self, FileSourceLoader, SourceLoader};
use crate::report::Report;
use crate::session::SessionRegistry;

/// Per-context memory profiler driven by the host's statement hook.
///
/// All registry access, including the hook's write, happens under one lock, so `stop`
/// can never discard a buffer while the hook is writing into it.
pub struct Profiler<H: Host> {
    host: H,
    sessions: Mutex<SessionRegistry>,
}

impl<H: Host> Profiler<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            sessions: Mutex::new(SessionRegistry::new()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Starts profiling `context`, replacing any session it already has.
    pub fn start(&self, context: &H::Context, configuration: Configuration) -> Result<()> {
        let id = self.host.context_id(context);
        let capacity = configuration.capacity;
        let previous = self.sessions().start(id, configuration)?;

        if let Some(previous) = previous {
            log::debug!(
                "Replacing session for {} ({} samples discarded)",
                id,
                previous.buffer.write_index()
            );
            self.host.clear_hook(context, id);
        }
        self.host.set_hook(context, id);
        log::debug!("Started profiling {} (capacity: {})", id, capacity);
        Ok(())
    }

    pub fn stop(&self, context: &H::Context) -> Result<()> {
        let id = self.host.context_id(context);
        let session = self.sessions().stop(id)?;
        self.host.clear_hook(context, id);
        log::debug!(
            "Stopped profiling {} (number of samples: {})",
            id,
            session.buffer.write_index()
        );
        Ok(())
    }

    /// Discards the session of a context that is going away. Does nothing if it has none.
    pub fn on_context_exit(&self, context: &H::Context) {
        let id = self.host.context_id(context);
        let session = match self.sessions().stop(id) {
            Ok(session) => session,
            Err(_) => return,
        };
        self.host.clear_hook(context, id);
        log::debug!(
            "Discarded session of exited {} (number of samples: {})",
            id,
            session.buffer.write_index()
        );
    }

    pub fn is_started(&self, context: &H::Context) -> bool {
        let id = self.host.context_id(context);
        self.sessions().is_started(id)
    }

    pub fn info(&self, context: &H::Context) -> Result<Report> {
        let id = self.host.context_id(context);
        let sessions = self.sessions();
        let session = sessions.lookup(id)?;
        Ok(Report::from_buffer(&session.buffer))
    }

    /// Writes the annotated report for `context` to `out`.
    pub fn print<W: Write, L: SourceLoader>(
        &self,
        context: &H::Context,
        loader: &L,
        out: &mut W,
    ) -> Result<()> {
        // Aggregate under the lock, read source files outside of it
        let report = self.info(context)?;
        annotated::write_report(&report, loader, out)?;
        Ok(())
    }

    pub fn print_to_stdout(&self, context: &H::Context) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.print(context, &FileSourceLoader, &mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Hook entry point, called by the host on every statement of a profiled context.
    pub fn on_statement<S: Statement + ?Sized>(&self, id: ContextId, statement: &S) {
        let mut sessions = self.sessions();
        if let Some(session) = sessions.get_mut(id) {
            recorder::record(&mut session.buffer, &self.host, statement);
        }
    }

    fn sessions(&self) -> MutexGuard<'_, SessionRegistry> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
