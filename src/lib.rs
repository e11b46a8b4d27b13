//! # lora-hal
//!
//! A small, portable hardware abstraction for point-to-point LoRa links, built for
//! `#![no_std]` firmware and for host-side simulation of the same firmware.
//!
//! The crate exposes one session type, [`Radio`](radio::Radio), with six operations:
//! `init`, `deinit`, `send`, `wait_recv`, `is_active` and `last_signal_strength`.
//! A session starts inactive and initializes itself on the first transfer. Receive
//! waits are bounded by a caller-supplied timeout. Every failure maps to one
//! [`Error`](error::Error) kind (and to a stable numeric [`ReturnCode`](error::ReturnCode)).
//!
//! The session drives a [`Transceiver`](transceiver::Transceiver) backend:
//! - [`rf95::Rf95`]: an SX1276/RFM95 module on an `embedded-hal` SPI bus
//! - [`sim::SimulatedTransceiver`]: a device file, for running on a host (feature `simulate`)
//!
//! ## Crate features
//! | Feature            | Description |
//! |--------------------|-------------|
//! | `std`              | Disables `#![no_std]` support |
//! | `simulate`         | Enables the file-backed simulated transceiver (implies `std`, unix only) |
//! | `global` (default) | A process-wide session guarded by `critical_section` |
//! | `defmt-0-3`        | Uses `defmt` logging |
//! | `log`              | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lora_hal::consts::{LORA_CS, LORA_INT, LORA_RST};
//! use lora_hal::radio::Radio;
//! use lora_hal::rf95::{Rf95, Rf95Config};
//!
//! // Board setup: claim the reference wiring from the board support crate.
//! let cs = pins.output(LORA_CS);
//! let rst = pins.output(LORA_RST);
//! let dio0 = pins.input(LORA_INT);
//!
//! let rf95 = Rf95::new(spi, cs, rst, dio0, Some(sd_cs), delay, Rf95Config::default());
//! let mut radio = Radio::new(rf95);
//!
//! radio.send(b"hello")?;
//!
//! let mut buf = [0u8; lora_hal::consts::PACKET_MAX_SIZE_BYTES];
//! let mut len = buf.len();
//! match radio.wait_recv(&mut buf, &mut len, 1_000) {
//!     Ok(()) => handle(&buf[..len], radio.last_signal_strength()),
//!     Err(e) if e.is_timeout() => {}
//!     Err(e) => return Err(e),
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - The module shares its SPI bus with an SD card on the reference board; pass
//!   the card's chip select as the peer pin so it is parked during transfers
//! - Packets are at most [`PACKET_MAX_SIZE_BYTES`](consts::PACKET_MAX_SIZE_BYTES) bytes
//! - Only one session should own a given radio; use [`global`] to share it

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod fmt;

#[cfg(feature = "global")]
pub use critical_section;
pub use heapless;

pub mod consts;
pub mod error;
#[cfg(feature = "global")]
pub mod global;
pub mod radio;
pub mod rf95;
#[cfg(all(feature = "simulate", unix))]
pub mod sim;
pub mod transceiver;

pub use error::{Error, Result, ReturnCode};
pub use radio::{Packet, Radio};
pub use transceiver::{Reception, Transceiver};
