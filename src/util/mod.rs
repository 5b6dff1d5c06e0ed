//! # Utility Modules
//!
//! Hex encoding helpers and logging patterns shared by the driver and the
//! command line tool.

pub mod hex;
pub mod logging;

pub use hex::{decode_hex, encode_hex, format_hex_compact, pretty_hex};
pub use logging::{log_frame_hex, span_radio_op, LogThrottle};
