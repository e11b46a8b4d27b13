//! Constants shared by the session and both transceiver backends.
//!
//! This module collects the board wiring, radio defaults and timing bounds
//! used by the hardware backend, plus the knobs of the simulated backend.
//!
//! ## Key Concepts
//!
//! - **Payload Limits**: every payload handed to [`Radio::send`](crate::radio::Radio::send)
//!   must fit the transceiver's data section, [`PACKET_MAX_SIZE_BYTES`].
//! - **Wiring**: the default pin numbers of the reference board. Real pins are injected
//!   as `embedded-hal` objects; the numbers are documentation for board setup code.
//! - **Timing**: the reset pulse and the internal send-complete bound.
//! - **Simulation**: where the simulated backend finds its pseudo-device.

/// Maximum size (in bytes) of the data section of a single packet.
pub const PACKET_MAX_SIZE_BYTES: usize = 251;

/// Default chip-select pin of the transceiver on the reference board.
pub const LORA_CS: u8 = 10;

/// Default interrupt (DIO0) pin of the transceiver on the reference board.
pub const LORA_INT: u8 = 2;

/// Default reset pin of the transceiver on the reference board.
pub const LORA_RST: u8 = 9;

/// Default operating frequency in MHz.
pub const LORA_FREQUENCY_MHZ: f32 = 915.0;

/// Default transmit power in dBm.
pub const LORA_TX_POWER_DBM: i8 = 13;

/// How long the reset line is held low, and how long the chip is given to
/// settle after release, in milliseconds.
pub const RESET_PULSE_MS: u32 = 10;

/// Upper bound on waiting for the chip to report a finished transmission.
pub const DEFAULT_TX_TIMEOUT_MS: u32 = 2_000;

/// Value of the last signal strength before any packet has been received.
pub const RSSI_SENTINEL: i16 = 1;

/// Environment value naming the simulated backend's device path.
pub const SIM_DEVICE_ENV: &str = "NEXUS_LORA";

/// Longest sleep between two poll attempts of the simulated backend.
pub const SIM_POLL_INTERVAL_MS: u64 = 1;
