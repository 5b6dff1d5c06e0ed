//! # Logging Utilities
//!
//! Rate limiting for warnings raised on every radio event, hex dumps of
//! frames, and optional tracing spans around driver operations.
//!
//! ## Usage
//!
//! ```rust
//! use rail_netdev::util::logging::{LogThrottle, log_frame_hex};
//!
//! let mut throttle = LogThrottle::new(1000, 5); // 5 messages per second
//! if throttle.allow() {
//!     log::warn!("event queue overflow");
//! }
//!
//! log_frame_hex("tx", &[0x41, 0xd8, 0x01]);
//! ```

use std::time::Instant;

/// Throttling structure for rate-limiting log messages
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.t0).as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = now;
            self.count = 0;
        }

        self.count = self.count.saturating_add(1);
        self.count <= self.cap
    }

    /// Reset the throttle (start new window immediately)
    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
    }
}

/// Log frame data in hex format for debugging
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 64;

    if !log::log_enabled!(log::Level::Debug) {
        return;
    }

    let shown = &data[..data.len().min(MAX_LOG_BYTES)];
    let hex_str = crate::util::hex::format_hex_compact(shown);
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    log::debug!("{prefix}: {hex_str}{suffix}");
}

/// Create a tracing span around a driver operation
#[cfg(feature = "tracing")]
pub fn span_radio_op(op: &'static str, channel: u8) -> tracing::span::EnteredSpan {
    tracing::debug_span!("radio_op", op = op, channel = channel).entered()
}

/// Placeholder guard returned when tracing is not available
#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct NoSpan;

/// Fallback span creation when tracing is not available
#[cfg(not(feature = "tracing"))]
pub fn span_radio_op(_op: &'static str, _channel: u8) -> NoSpan {
    NoSpan
}

/// Log a warning with throttling
#[macro_export]
macro_rules! log_warn_throttled {
    ($throttle:expr, $($arg:tt)*) => {
        if $throttle.allow() {
            log::warn!($($arg)*);
        }
    };
}
