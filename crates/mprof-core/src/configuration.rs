use std::env;

use crate::error::{Error, Result};

pub const DEFAULT_CAPACITY: usize = 1000;

/// Environment variable overriding the default capacity.
pub const CAPACITY_ENV: &str = "MPROF_CAPACITY";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    /// Number of samples kept per session.
    pub capacity: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Configuration {
    pub fn new(capacity: i64) -> Result<Self> {
        match usize::try_from(capacity) {
            Ok(capacity) if capacity > 0 => Ok(Self { capacity }),
            _ => Err(Error::InvalidConfiguration { capacity }),
        }
    }

    /// Reads the capacity from `MPROF_CAPACITY`, falling back to the default.
    pub fn from_env() -> Self {
        match env::var(CAPACITY_ENV) {
            Ok(value) => Self::parse_capacity(&value),
            Err(_) => Self::default(),
        }
    }

    fn parse_capacity(value: &str) -> Self {
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidConfiguration { capacity: 0 })
            .and_then(Self::new)
            .unwrap_or_else(|_| {
                log::warn!(
                    "{}={:?} is not a valid capacity. Using default value ({}).",
                    CAPACITY_ENV,
                    value,
                    DEFAULT_CAPACITY
                );
                Self::default()
            })
    }
}
