use std::time::{Duration, Instant};

pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// Byte accumulator that remembers when it last went from empty to non-empty.
pub(crate) struct FlushableBuffer {
    buffer: Vec<u8>,
    high_water_mark: usize,
    filled_at: Option<Instant>,
}

impl FlushableBuffer {
    pub(crate) fn new(hwm: Option<usize>) -> Self {
        let high_water_mark = hwm.unwrap_or(DEFAULT_HIGH_WATER_MARK);
        Self {
            buffer: Vec::with_capacity(high_water_mark.min(DEFAULT_HIGH_WATER_MARK)),
            high_water_mark,
            filled_at: None,
        }
    }

    /// Returns true if appending `len` more bytes would go past the high-water mark.
    pub(crate) fn would_overflow(&self, len: usize) -> bool {
        self.buffer.len().saturating_add(len) > self.high_water_mark
    }

    /// Appends `buf` whole, even past the high-water mark.
    pub(crate) fn write(&mut self, buf: &[u8]) {
        self.write_at(buf, Instant::now());
    }

    pub(crate) fn write_at(&mut self, buf: &[u8], now: Instant) {
        if buf.is_empty() {
            return;
        }

        if self.buffer.is_empty() {
            self.filled_at = Some(now);
        }
        self.buffer.extend_from_slice(buf);
    }

    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// How long the current contents have been waiting, `None` when empty.
    pub(crate) fn filled_for(&self, now: Instant) -> Option<Duration> {
        self.filled_at
            .filter(|_| !self.buffer.is_empty())
            .map(|ts| now.saturating_duration_since(ts))
    }

    /// Hands the whole contents to `f` in one call and empties the buffer,
    /// whether or not `f` failed. Returns the number of bytes handed over.
    pub(crate) fn flush<F, E>(&mut self, f: F) -> Result<usize, E>
    where
        F: FnOnce(&[u8]) -> Result<(), E>,
    {
        let mut r = Ok(0);
        if !self.buffer.is_empty() {
            let len = self.buffer.len();
            r = f(&self.buffer[..]).map(|_| len);
            self.buffer.clear();
            self.filled_at = None;
        }

        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len() {
        let mut fb = FlushableBuffer::new(Some(8));
        assert_eq!(0, fb.len());
        assert!(fb.is_empty());

        fb.write(b"abc");
        fb.write(b"de");
        assert_eq!(5, fb.len());
        assert!(!fb.is_empty());
    }

    #[test]
    fn test_default_high_water_mark() {
        let fb = FlushableBuffer::new(None);
        assert_eq!(DEFAULT_HIGH_WATER_MARK, fb.high_water_mark);
    }

    #[test]
    fn test_would_overflow() {
        let mut fb = FlushableBuffer::new(Some(8));
        assert!(!fb.would_overflow(8));
        assert!(fb.would_overflow(9));

        fb.write(b"abcd");
        assert!(!fb.would_overflow(4));
        assert!(fb.would_overflow(5));
        assert!(fb.would_overflow(usize::MAX));
    }

    #[test]
    fn test_write_past_high_water_mark() {
        let mut fb = FlushableBuffer::new(Some(4));
        fb.write(b"0123456789");
        assert_eq!(10, fb.len());
    }

    #[test]
    fn test_flush() {
        let mut fb = FlushableBuffer::new(Some(16));
        fb.write(b"Message");
        fb.write(b"A");

        let mut out = Vec::new();
        let r: Result<usize, ()> = fb.flush(|b| {
            out.extend_from_slice(b);
            Ok(())
        });

        assert_eq!(Ok(8), r);
        assert_eq!(b"MessageA".to_vec(), out);
        assert!(fb.is_empty());
        assert_eq!(None, fb.filled_for(Instant::now()));
    }

    #[test]
    fn test_flush_empty() {
        let mut fb = FlushableBuffer::new(Some(16));
        let mut called = false;
        let r: Result<usize, ()> = fb.flush(|_| {
            called = true;
            Ok(())
        });

        assert_eq!(Ok(0), r);
        assert!(!called);
    }

    #[test]
    fn test_flush_error_still_clears() {
        let mut fb = FlushableBuffer::new(Some(16));
        fb.write(b"lost");

        let r = fb.flush(|_| Err("sink down"));
        assert_eq!(Err("sink down"), r);
        assert!(fb.is_empty());
    }

    #[test]
    fn test_filled_for() {
        let start = Instant::now();
        let mut fb = FlushableBuffer::new(Some(16));
        assert_eq!(None, fb.filled_for(start));

        fb.write_at(b"a", start);
        let later = start + Duration::from_millis(30);
        assert_eq!(Some(Duration::from_millis(30)), fb.filled_for(later));

        // only the empty -> non-empty transition moves the timestamp
        fb.write_at(b"b", later);
        assert_eq!(Some(Duration::from_millis(30)), fb.filled_for(later));

        let _: Result<usize, ()> = fb.flush(|_| Ok(()));
        fb.write_at(b"c", later);
        assert_eq!(Some(Duration::from_millis(0)), fb.filled_for(later));
    }

    #[test]
    fn test_empty_write_keeps_timestamp() {
        let start = Instant::now();
        let mut fb = FlushableBuffer::new(Some(16));

        fb.write_at(b"", start);
        assert_eq!(None, fb.filled_for(start));

        fb.write_at(b"a", start);
        fb.write_at(b"", start + Duration::from_millis(10));
        assert_eq!(
            Some(Duration::from_millis(20)),
            fb.filled_for(start + Duration::from_millis(20))
        );
    }
}
