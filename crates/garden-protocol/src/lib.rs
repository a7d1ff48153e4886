//! Rhythm Garden Serial Protocol
//!
//! This crate provides types and utilities for talking to the garden sensor
//! board over a point-to-point serial link. The board streams newline
//! terminated text lines; the host answers with short unterminated ASCII
//! commands.
//!
//! # Protocol Overview
//!
//! - **Readings** (board → host): `<moisture>,<light>,<trigger>\n`, with
//!   moisture and light in `0..=1023` and trigger `0` or `1`
//! - **Commands** (host → board): `L1` / `L0` to switch the feedback LED
//! - **Probe dialect**: the bench probe sketch sends `SENSOR:<n>`, `LED:ON` and
//!   `LED:OFF`, and takes single byte `1` / `0` commands
//!
//! There is no handshake, checksum or acknowledgement. Framing relies entirely
//! on the newline delimiter; a malformed line is dropped and the next line is
//! parsed independently.
//!
//! # Example
//!
//! ```rust
//! use garden_protocol::{LineCodec, Reading};
//!
//! let mut codec = LineCodec::new();
//! let lines = codec.feed(b"512,300,1\n700,");
//! assert_eq!(lines, vec!["512,300,1".to_string()]);
//!
//! let reading = Reading::parse(&lines[0]).unwrap();
//! assert!(reading.triggered);
//! ```

mod codec;
mod commands;
mod error;
mod probe;
mod protocol;
mod reading;

pub use codec::*;
pub use commands::*;
pub use error::*;
pub use probe::*;
pub use protocol::*;
pub use reading::*;
