//! The backend capability bound to the HAL at build time.
//!
//! A [`Transceiver`] is either the physical radio ([`Rf95`](crate::rf95::Rf95)) or its
//! simulated stand-in (`SimulatedTransceiver`, feature `simulate`). The session in
//! [`crate::radio`] owns exactly one of them and decides *when* each method runs;
//! the backend only decides *how*.

use crate::error::Result;

/// Outcome of a successful receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Reception {
    /// Number of bytes written to the front of the caller's buffer.
    pub len: usize,
    /// Signal strength of the packet in dBm, if the backend can measure it.
    pub rssi: Option<i16>,
}

/// Operations every transceiver backend provides.
///
/// The session guarantees that [`close`](Transceiver::close), [`transmit`](Transceiver::transmit)
/// and [`receive`](Transceiver::receive) are only called after a successful
/// [`open`](Transceiver::open) that has not been followed by a successful `close`.
pub trait Transceiver {
    /// Acquires the backend handle and brings the device into a ready state.
    ///
    /// May be called while already open, in which case the handle is re-acquired.
    ///
    /// # Errors
    /// [`InitFailed`](crate::error::Error::InitFailed) or
    /// [`SetFrequencyFailed`](crate::error::Error::SetFrequencyFailed).
    fn open(&mut self) -> Result;

    /// Releases the backend handle.
    ///
    /// # Errors
    /// [`DeinitFailed`](crate::error::Error::DeinitFailed) if the release itself failed.
    fn close(&mut self) -> Result;

    /// Hands `payload` to the device as one unit and waits until it has left.
    ///
    /// # Errors
    /// [`SendFailed`](crate::error::Error::SendFailed) or
    /// [`TimedOut`](crate::error::Error::TimedOut).
    fn transmit(&mut self, payload: &[u8]) -> Result;

    /// Waits for one payload and copies it to the front of `buf`.
    ///
    /// A `timeout_ms` of `0` waits indefinitely.
    ///
    /// # Errors
    /// [`RecvFailed`](crate::error::Error::RecvFailed) or
    /// [`TimedOut`](crate::error::Error::TimedOut).
    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<Reception>;
}

impl<T: Transceiver + ?Sized> Transceiver for &mut T {
    fn open(&mut self) -> Result {
        (**self).open()
    }

    fn close(&mut self) -> Result {
        (**self).close()
    }

    fn transmit(&mut self, payload: &[u8]) -> Result {
        (**self).transmit(payload)
    }

    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<Reception> {
        (**self).receive(buf, timeout_ms)
    }
}
