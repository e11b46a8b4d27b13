//! The device session: the HAL surface application code talks to.
//!
//! [`Radio`] owns one [`Transceiver`] backend together with the session state:
//! whether the backend is currently initialized and the last signal strength
//! observed on a received packet.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --init ok--> Active --deinit ok--> Uninitialized
//! Uninitialized --send/wait_recv--> (implicit init) Active | failure, stays Uninitialized
//! Active --send/wait_recv--> Active   (whatever the transfer outcome)
//! ```
//!
//! A transfer on an inactive session runs exactly one implicit [`init`](Radio::init)
//! first; if it fails, its error is the transfer's result and nothing is moved.
//!
//! ## Example
//!
//! ```rust
//! # use lora_hal::transceiver::{Reception, Transceiver};
//! # struct Loopback(Vec<u8>);
//! # impl Transceiver for Loopback {
//! #     fn open(&mut self) -> lora_hal::error::Result { Ok(()) }
//! #     fn close(&mut self) -> lora_hal::error::Result { Ok(()) }
//! #     fn transmit(&mut self, p: &[u8]) -> lora_hal::error::Result { self.0 = p.to_vec(); Ok(()) }
//! #     fn receive(&mut self, buf: &mut [u8], _: u32) -> lora_hal::error::Result<Reception> {
//! #         buf[..self.0.len()].copy_from_slice(&self.0);
//! #         Ok(Reception { len: self.0.len(), rssi: None })
//! #     }
//! # }
//! use lora_hal::consts::PACKET_MAX_SIZE_BYTES;
//! use lora_hal::error::Error;
//! use lora_hal::radio::Radio;
//!
//! let mut radio = Radio::new(Loopback(Vec::new()));
//! assert_eq!(radio.deinit(), Err(Error::NotInit));
//!
//! // No explicit init: the first transfer brings the backend up.
//! radio.send(b"TX[0]").unwrap();
//! assert!(radio.is_active());
//!
//! let mut buf = [0u8; PACKET_MAX_SIZE_BYTES];
//! let mut len = buf.len();
//! radio.wait_recv(&mut buf, &mut len, 5_000).unwrap();
//! assert_eq!(&buf[..len], b"TX[0]");
//! ```

use crate::consts::{PACKET_MAX_SIZE_BYTES, RSSI_SENTINEL};
use crate::error::{Error, Result};
use crate::transceiver::Transceiver;

/// A received payload, as returned by [`Radio::recv_packet`].
pub type Packet = heapless::Vec<u8, PACKET_MAX_SIZE_BYTES>;

/// A radio session over the transceiver backend `T`.
///
/// Invariant: the backend holds a live handle if and only if [`is_active`](Radio::is_active)
/// is `true`. Only [`init`](Radio::init) and [`deinit`](Radio::deinit) change it.
#[derive(Debug)]
pub struct Radio<T: Transceiver> {
    transceiver: T,
    active: bool,
    last_rssi: i16,
}

impl<T: Transceiver> Radio<T> {
    /// Creates an inactive session over `transceiver`.
    pub const fn new(transceiver: T) -> Self {
        Self {
            transceiver,
            active: false,
            last_rssi: RSSI_SENTINEL,
        }
    }

    /// `true` once the backend has been initialized and not deinitialized since.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Signal strength (dBm) of the last packet received by a backend that measures it.
    ///
    /// Holds [`RSSI_SENTINEL`] until such a packet arrives.
    pub fn last_signal_strength(&self) -> i16 {
        self.last_rssi
    }

    /// The backend, but only while it is initialized.
    pub fn backend(&mut self) -> Option<&mut T> {
        if self.active {
            Some(&mut self.transceiver)
        } else {
            None
        }
    }

    /// Gives the backend back without closing it.
    pub fn into_inner(self) -> T {
        self.transceiver
    }

    /// Brings the backend into a ready state.
    ///
    /// Calling this on an active session re-acquires the backend handle. A failed
    /// call always leaves the session inactive.
    pub fn init(&mut self) -> Result {
        self.active = false;
        match self.transceiver.open() {
            Ok(()) => {
                self.active = true;
                debug!("radio initialized");
                Ok(())
            }
            Err(err) => {
                warn!("radio init failed: {}", err);
                Err(err)
            }
        }
    }

    /// Releases the backend.
    ///
    /// # Errors
    /// - [`Error::NotInit`] if the session is not active; nothing is touched.
    /// - [`Error::DeinitFailed`] if releasing the handle failed. The handle is
    ///   consumed either way, so the session is inactive afterwards.
    pub fn deinit(&mut self) -> Result {
        if !self.active {
            return Err(Error::NotInit);
        }
        self.active = false;
        let res = self.transceiver.close();
        match res {
            Ok(()) => debug!("radio deinitialized"),
            Err(err) => warn!("radio deinit failed: {}", err),
        }
        res
    }

    fn ensure_active(&mut self) -> Result {
        if self.active {
            Ok(())
        } else {
            trace!("radio inactive, initializing");
            self.init()
        }
    }

    /// Transmits `payload` as one packet.
    ///
    /// Keeping `payload` within [`PACKET_MAX_SIZE_BYTES`] is the caller's job; the
    /// hardware backend refuses longer payloads with [`Error::SendFailed`].
    ///
    /// Returns `Ok` only once the payload has fully left (hardware) or has been
    /// written in full (simulated).
    pub fn send(&mut self, payload: &[u8]) -> Result {
        self.ensure_active()?;
        let res = self.transceiver.transmit(payload);
        if let Err(err) = res {
            warn!("send of {} bytes failed: {}", payload.len(), err);
        }
        res
    }

    /// Waits for one packet and copies it into `buf`.
    ///
    /// On entry `len` is the usable capacity of `buf` (clamped to `buf.len()`); on
    /// success it is set to the number of bytes received. On failure neither `len`
    /// nor the signal strength change.
    ///
    /// A `timeout_ms` of `0` blocks until a packet arrives and never yields
    /// [`Error::TimedOut`]. Any other value bounds the wait; [`Error::TimedOut`] is an
    /// ordinary outcome and does not deactivate the session.
    pub fn wait_recv(&mut self, buf: &mut [u8], len: &mut usize, timeout_ms: u32) -> Result {
        self.ensure_active()?;
        let capacity = (*len).min(buf.len());
        let reception = self
            .transceiver
            .receive(&mut buf[..capacity], timeout_ms)
            .inspect_err(|err| {
                if err.is_timeout() {
                    trace!("receive timed out after {} ms", timeout_ms);
                } else {
                    warn!("receive failed: {}", err);
                }
            })?;
        *len = reception.len;
        if let Some(rssi) = reception.rssi {
            self.last_rssi = rssi;
        }
        Ok(())
    }

    /// Waits for one packet and returns it as an owned [`Packet`].
    pub fn recv_packet(&mut self, timeout_ms: u32) -> Result<Packet> {
        let mut buf = [0u8; PACKET_MAX_SIZE_BYTES];
        let mut len = buf.len();
        self.wait_recv(&mut buf, &mut len, timeout_ms)?;
        Packet::from_slice(&buf[..len]).map_err(|_| Error::RecvFailed)
    }
}
