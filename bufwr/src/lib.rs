//! Size- and time-triggered buffering in front of any [`std::io::Write`] sink.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! let w = bufwr::Builder::new()
//!     .capacity(64 * 1024)
//!     .flush_delay(Duration::from_millis(200))
//!     .on_error(|e| eprintln!("log shipping failed: {}", e))
//!     .build(std::io::stdout())?;
//!
//! w.write(b"hello\n");
//! w.close();
//! # Ok::<(), bufwr::Error>(())
//! ```
#![deny(clippy::all)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

mod config;
mod error;
mod flushable_buffer;
mod stats;
mod writer;

pub use config::*;
pub use error::*;
pub use flushable_buffer::DEFAULT_HIGH_WATER_MARK;
pub use stats::*;
pub use writer::*;
