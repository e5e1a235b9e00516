use std::{io::Write, time::Duration};

use crate::{
    error::{Error, Result},
    flushable_buffer::DEFAULT_HIGH_WATER_MARK,
    writer::{BufferedWriter, ErrorHandler},
};

pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Soft limit in bytes; a write that would go past it flushes first.
    pub capacity: usize,
    /// Longest time buffered bytes wait before the flusher sends them.
    pub flush_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HIGH_WATER_MARK,
            flush_delay: DEFAULT_FLUSH_DELAY,
        }
    }
}

impl Config {
    pub fn new(capacity: usize, flush_delay: Duration) -> Self {
        Self {
            capacity,
            flush_delay,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        if self.flush_delay == Duration::from_secs(0) {
            return Err(Error::InvalidFlushDelay);
        }

        Ok(())
    }
}

/// Collects the configuration and error observer before the flusher starts,
/// so the observer is in place before any concurrent use.
#[derive(Default)]
pub struct Builder {
    config: Config,
    on_error: Option<ErrorHandler>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn flush_delay(mut self, flush_delay: Duration) -> Self {
        self.config.flush_delay = flush_delay;
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Error) + Send + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn build<W>(self, sink: W) -> Result<BufferedWriter<W>>
    where
        W: Write + Send + 'static,
    {
        BufferedWriter::start(self.config, self.on_error, sink)
    }
}
