use std::{
    io::{self, Write},
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::{
    config::Config,
    error::{Error, Result},
    flushable_buffer::FlushableBuffer,
    stats::{FlushReason, Stats},
};

pub type ErrorHandler = Box<dyn FnMut(&Error) + Send>;

struct State<W> {
    buffer: FlushableBuffer,
    sink: W,
    on_error: Option<ErrorHandler>,
    stats: Stats,
    closed: bool,
}

impl<W: Write> State<W> {
    /// The only path to the sink. Reachable only through the lock guard.
    fn flush(&mut self, reason: FlushReason) {
        let State {
            buffer,
            sink,
            on_error,
            stats,
            ..
        } = self;

        if buffer.is_empty() {
            return;
        }

        match buffer.flush(|b| sink.write_all(b)) {
            Ok(n) => {
                trace!(%reason, bytes = n, "flushed buffer");
                stats.record(reason, Ok(n));
            }
            Err(e) => {
                stats.record(reason, Err(()));
                let err = Error::Sink(e);
                match on_error {
                    Some(handler) => {
                        // a panicking observer must not take the flusher down with it
                        if panic::catch_unwind(AssertUnwindSafe(|| handler(&err))).is_err() {
                            warn!(%reason, error = %err, "error observer panicked");
                        }
                    }
                    None => debug!(%reason, error = %err, "flush failed, no error observer"),
                }
            }
        }
    }
}

struct Shared<W> {
    state: Mutex<State<W>>,
    wakeup: Condvar,
    capacity: usize,
    flush_delay: Duration,
}

impl<W: Write> Shared<W> {
    fn run_flusher(&self) {
        debug!(capacity = self.capacity, flush_delay = ?self.flush_delay, "flusher started");

        let mut state = self.state.lock();
        while !state.closed {
            let mut wait = self.flush_delay;
            if let Some(elapsed) = state.buffer.filled_for(Instant::now()) {
                if elapsed >= self.flush_delay {
                    state.flush(FlushReason::Delay);
                } else {
                    wait = self.flush_delay - elapsed;
                }
            }

            // the lock is released while waiting; only close notifies
            self.wakeup.wait_for(&mut state, wait);
        }

        state.flush(FlushReason::Close);
        debug!("flusher stopped");
    }
}

/// Buffers writes in memory and hands them to `sink` once the buffer would
/// go past `capacity`, or once `flush_delay` has passed since the buffer
/// stopped being empty, whichever comes first.
///
/// Writes never fail. Sink errors go to the observer registered with
/// [`BufferedWriter::set_on_error`] or [`crate::Builder::on_error`], and are
/// dropped when there is none.
///
/// Dropping the writer (or calling [`BufferedWriter::close`]) stops the
/// background flusher and hands whatever is still buffered to the sink.
pub struct BufferedWriter<W>
where
    W: Write + Send + 'static,
{
    shared: Arc<Shared<W>>,
    flusher: Option<JoinHandle<()>>,
}

impl<W> BufferedWriter<W>
where
    W: Write + Send + 'static,
{
    pub fn new(capacity: usize, flush_delay: Duration, sink: W) -> Result<Self> {
        Self::start(Config::new(capacity, flush_delay), None, sink)
    }

    pub(crate) fn start(config: Config, on_error: Option<ErrorHandler>, sink: W) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                buffer: FlushableBuffer::new(Some(config.capacity)),
                sink,
                on_error,
                stats: Stats::default(),
                closed: false,
            }),
            wakeup: Condvar::new(),
            capacity: config.capacity,
            flush_delay: config.flush_delay,
        });

        let flusher_shared = shared.clone();
        let flusher = thread::Builder::new()
            .name("bufwr-flusher".to_string())
            .spawn(move || flusher_shared.run_flusher())
            .map_err(Error::Spawn)?;

        Ok(Self {
            shared,
            flusher: Some(flusher),
        })
    }

    /// Buffers `data`, flushing what is already buffered first if `data`
    /// would not fit. Always returns `data.len()`.
    pub fn write(&self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }

        let mut state = self.shared.state.lock();
        if state.buffer.would_overflow(data.len()) {
            state.flush(FlushReason::Capacity);
        }
        state.buffer.write(data);

        data.len()
    }

    /// Hands the buffered bytes to the sink now.
    pub fn flush(&self) {
        self.shared.state.lock().flush(FlushReason::Explicit);
    }

    /// Registers the observer for sink failures, replacing any previous one.
    /// It runs on whichever thread performed the flush, with the lock held,
    /// so it must not call back into this writer.
    pub fn set_on_error<F>(&self, f: F)
    where
        F: FnMut(&Error) + Send + 'static,
    {
        self.shared.state.lock().on_error = Some(Box::new(f));
    }

    pub fn buffered_len(&self) -> usize {
        self.shared.state.lock().buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn flush_delay(&self) -> Duration {
        self.shared.flush_delay
    }

    pub fn stats(&self) -> Stats {
        self.shared.state.lock().stats
    }

    /// Stops the flusher and drains the buffer into the sink.
    pub fn close(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(flusher) = self.flusher.take() {
            {
                let mut state = self.shared.state.lock();
                state.closed = true;
                self.shared.wakeup.notify_one();
            }

            if flusher.join().is_err() {
                warn!("flusher thread panicked");
            }

            // no-op unless the flusher died before draining
            self.shared.state.lock().flush(FlushReason::Close);
        }
    }
}

impl<W> Drop for BufferedWriter<W>
where
    W: Write + Send + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

impl<W> Write for BufferedWriter<W>
where
    W: Write + Send + 'static,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(BufferedWriter::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        BufferedWriter::flush(self);
        Ok(())
    }
}

impl<W> Write for &BufferedWriter<W>
where
    W: Write + Send + 'static,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(BufferedWriter::write(*self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        BufferedWriter::flush(*self);
        Ok(())
    }
}
