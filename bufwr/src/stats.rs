use std::fmt;

/// Why the buffer was handed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// A write would have pushed the buffer past its capacity.
    Capacity,
    /// The contents sat for the whole flush delay.
    Delay,
    /// `BufferedWriter::flush` was called.
    Explicit,
    /// Final drain while the writer shuts down.
    Close,
}

impl fmt::Display for FlushReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlushReason::Capacity => "capacity",
            FlushReason::Delay => "delay",
            FlushReason::Explicit => "explicit",
            FlushReason::Close => "close",
        };
        f.write_str(s)
    }
}

/// Snapshot of the flush counters of a writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub capacity_flushes: u64,
    pub delay_flushes: u64,
    pub explicit_flushes: u64,
    pub close_flushes: u64,
    /// Bytes the sink accepted.
    pub bytes_flushed: u64,
    pub failed_flushes: u64,
}

impl Stats {
    /// Number of times the sink was called, failed calls included.
    pub fn flushes(&self) -> u64 {
        self.capacity_flushes + self.delay_flushes + self.explicit_flushes + self.close_flushes
    }

    pub(crate) fn record(&mut self, reason: FlushReason, result: Result<usize, ()>) {
        match reason {
            FlushReason::Capacity => self.capacity_flushes += 1,
            FlushReason::Delay => self.delay_flushes += 1,
            FlushReason::Explicit => self.explicit_flushes += 1,
            FlushReason::Close => self.close_flushes += 1,
        }

        match result {
            Ok(n) => self.bytes_flushed += n as u64,
            Err(()) => self.failed_flushes += 1,
        }
    }
}
