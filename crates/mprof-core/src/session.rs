use std::collections::HashMap;

use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::host::ContextId;
use crate::ringbuffer::Ringbuffer;

/// Profiling state of one execution context.
#[derive(Debug)]
pub struct Session {
    pub configuration: Configuration,
    pub buffer: Ringbuffer,
}

impl Session {
    pub fn new(configuration: Configuration) -> Result<Self> {
        let buffer = Ringbuffer::new(configuration.capacity)?;
        Ok(Session {
            configuration,
            buffer,
        })
    }
}

/// Active sessions, at most one per execution context.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ContextId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh session for `id`, returning the one it replaces.
    pub fn start(&mut self, id: ContextId, configuration: Configuration) -> Result<Option<Session>> {
        let session = Session::new(configuration)?;
        Ok(self.sessions.insert(id, session))
    }

    pub fn stop(&mut self, id: ContextId) -> Result<Session> {
        self.sessions.remove(&id).ok_or(Error::NotStarted)
    }

    pub fn lookup(&self, id: ContextId) -> Result<&Session> {
        self.sessions.get(&id).ok_or(Error::NotStarted)
    }

    // Hot path: plain hash lookup, no allocation.
    pub fn get_mut(&mut self, id: ContextId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    pub fn is_started(&self, id: ContextId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
