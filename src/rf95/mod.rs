//! Hardware backend for RFM95/SX127x LoRa transceivers.
//!
//! This module provides [`Rf95`], a blocking driver that talks to the chip over an
//! `embedded-hal` SPI bus with its own chip-select, reset and interrupt (DIO0) lines.
//! It implements [`Transceiver`], so it can be bound to a [`Radio`](crate::radio::Radio)
//! session.
//!
//! ## Bring-up
//!
//! [`open`](Transceiver::open) keeps any other device on the shared bus deselected,
//! pulses the reset line, probes the chip by switching it into LoRa sleep mode and
//! reading the mode back, applies the modem defaults (125 kHz, CR 4/5, SF7, CRC on,
//! 8 symbol preamble) and the transmit power, and finally programs the carrier
//! frequency from [`Rf95Config`].
//!
//! ## Timing
//!
//! Waiting is done by polling the interrupt line every millisecond with the
//! provided [`DelayNs`]. Sends are bounded by [`Rf95Config::tx_timeout_ms`];
//! receives by the caller's timeout.
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! # use embedded_hal_mock::eh1::digital::Mock as Pin;
//! # use embedded_hal_mock::eh1::spi::Mock as Spi;
//! use lora_hal::radio::Radio;
//! use lora_hal::rf95::{Rf95, Rf95Config};
//!
//! # let (spi, cs, rst, int) = (Spi::new(&[]), Pin::new(&[]), Pin::new(&[]), Pin::new(&[]));
//! let rf95: Rf95<_, _, _, _, Pin, _> =
//!     Rf95::new(spi, cs, rst, int, None, NoopDelay::new(), Rf95Config::default());
//! let radio = Radio::new(rf95);
//! assert!(!radio.is_active());
//! # let mut rf95 = radio.into_inner();
//! # rf95.spi.done();
//! # rf95.cs.done();
//! # rf95.rst.done();
//! # rf95.int.done();
//! ```

pub(crate) mod registers;

use crate::consts::{
    DEFAULT_TX_TIMEOUT_MS, LORA_FREQUENCY_MHZ, LORA_TX_POWER_DBM, PACKET_MAX_SIZE_BYTES,
    RESET_PULSE_MS,
};
use crate::error::{Error, Result};
use crate::transceiver::{Reception, Transceiver};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;
use registers::*;

/// Operating parameters of the hardware backend.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Rf95Config {
    /// Carrier frequency in MHz.
    pub frequency_mhz: f32,
    /// Transmit power in dBm on the PA_BOOST pin, clamped to 5..=23.
    pub tx_power_dbm: i8,
    /// Upper bound on waiting for a transmission to finish. `0` waits forever.
    pub tx_timeout_ms: u32,
}

impl Default for Rf95Config {
    fn default() -> Self {
        Self {
            frequency_mhz: LORA_FREQUENCY_MHZ,
            tx_power_dbm: LORA_TX_POWER_DBM,
            tx_timeout_ms: DEFAULT_TX_TIMEOUT_MS,
        }
    }
}

/// What the driver last asked the chip to do.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Rf95Mode {
    /// Chip-select is released; the chip has not been brought up, or has been let go.
    #[default]
    Released,
    /// Standby between transfers.
    Idle,
    /// A packet is being transmitted.
    Tx,
    /// The receiver is listening continuously.
    Rx,
}

/// Raised by the bus helpers; mapped to the failing operation's kind by the caller.
#[derive(Debug)]
struct BusFault;

type BusResult<T = ()> = core::result::Result<T, BusFault>;

/// Blocking driver for an RFM95/SX127x transceiver in LoRa mode.
///
/// ## Type Parameters
///
/// - `SPI`: the [`SpiBus`] the chip sits on
/// - `CS`: chip-select line, active low
/// - `RST`: reset line, active low
/// - `INT`: the chip's DIO0 line, raised on `TxDone`/`RxDone`
/// - `PEER`: chip-select of another device sharing the bus (e.g. an SD card), kept
///   high so that device stays off the bus
/// - `D`: delay provider
#[derive(Debug)]
pub struct Rf95<SPI, CS, RST, INT, PEER, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RST: OutputPin,
    INT: InputPin,
    PEER: OutputPin,
    D: DelayNs,
{
    /// The current mode of the chip
    pub mode: Rf95Mode,
    /// SPI bus
    pub spi: SPI,
    /// Chip-select pin
    pub cs: CS,
    /// Reset pin
    pub rst: RST,
    /// Interrupt (DIO0) pin
    pub int: INT,
    /// Chip-select of the other device on the bus
    pub peer_cs: Option<PEER>,
    delay: D,
    config: Rf95Config,

    /// Counter of packets that left the transmitter.
    pub tx_good: u16,

    /// Counter of packets received intact.
    pub rx_good: u16,

    /// Counter of packets dropped for a CRC error or receive timeout flagged by the chip.
    pub rx_bad: u16,
}

impl<SPI, CS, RST, INT, PEER, D> Rf95<SPI, CS, RST, INT, PEER, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RST: OutputPin,
    INT: InputPin,
    PEER: OutputPin,
    D: DelayNs,
{
    /// Creates a driver over the given bus and lines. Nothing is driven until
    /// [`open`](Transceiver::open).
    pub fn new(
        spi: SPI,
        cs: CS,
        rst: RST,
        int: INT,
        peer_cs: Option<PEER>,
        delay: D,
        config: Rf95Config,
    ) -> Self {
        Self {
            mode: Rf95Mode::Released,
            spi,
            cs,
            rst,
            int,
            peer_cs,
            delay,
            config,
            tx_good: 0,
            rx_good: 0,
            rx_bad: 0,
        }
    }

    /// The configuration the chip is brought up with.
    pub fn config(&self) -> &Rf95Config {
        &self.config
    }

    /// Runs `f` with the chip selected and the bus flushed before release.
    fn transaction<F>(&mut self, f: F) -> BusResult
    where
        F: FnOnce(&mut SPI) -> core::result::Result<(), SPI::Error>,
    {
        self.cs.set_low().map_err(|_| BusFault)?;
        let res = f(&mut self.spi).and_then(|()| self.spi.flush());
        let _ = self.cs.set_high();
        res.map_err(|_| BusFault)
    }

    fn read_register(&mut self, reg: u8) -> BusResult<u8> {
        let mut frame = [reg & !WRITE_MASK, 0];
        self.transaction(|spi| spi.transfer_in_place(&mut frame))?;
        Ok(frame[1])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> BusResult {
        self.transaction(|spi| spi.write(&[reg | WRITE_MASK, value]))
    }

    fn write_fifo(&mut self, payload: &[u8]) -> BusResult {
        self.transaction(|spi| {
            spi.write(&[REG_FIFO | WRITE_MASK])?;
            spi.write(payload)
        })
    }

    fn read_fifo(&mut self, buf: &mut [u8]) -> BusResult {
        self.transaction(|spi| {
            spi.write(&[REG_FIFO])?;
            spi.read(buf)
        })
    }

    fn set_mode_idle(&mut self) -> BusResult {
        if self.mode != Rf95Mode::Idle {
            self.write_register(REG_OP_MODE, MODE_STDBY)?;
            self.mode = Rf95Mode::Idle;
        }
        Ok(())
    }

    fn set_mode_tx(&mut self) -> BusResult {
        if self.mode != Rf95Mode::Tx {
            self.write_register(REG_OP_MODE, MODE_TX)?;
            self.write_register(REG_DIO_MAPPING1, DIO0_TX_DONE)?;
            self.mode = Rf95Mode::Tx;
        }
        Ok(())
    }

    fn set_mode_rx(&mut self) -> BusResult {
        if self.mode != Rf95Mode::Rx {
            self.write_register(REG_OP_MODE, MODE_RXCONTINUOUS)?;
            self.write_register(REG_DIO_MAPPING1, DIO0_RX_DONE)?;
            self.mode = Rf95Mode::Rx;
        }
        Ok(())
    }

    fn reset(&mut self) -> BusResult {
        self.rst.set_high().map_err(|_| BusFault)?;
        self.rst.set_low().map_err(|_| BusFault)?;
        self.delay.delay_ms(RESET_PULSE_MS);
        self.rst.set_high().map_err(|_| BusFault)?;
        self.delay.delay_ms(RESET_PULSE_MS);
        Ok(())
    }

    /// Resets the chip and checks that it answers by entering LoRa sleep mode.
    fn probe(&mut self) -> BusResult<bool> {
        if let Some(peer) = self.peer_cs.as_mut() {
            peer.set_high().map_err(|_| BusFault)?;
        }
        self.cs.set_high().map_err(|_| BusFault)?;
        self.reset()?;

        self.write_register(REG_OP_MODE, MODE_SLEEP | LONG_RANGE_MODE)?;
        self.delay.delay_ms(RESET_PULSE_MS);
        Ok(self.read_register(REG_OP_MODE)? == MODE_SLEEP | LONG_RANGE_MODE)
    }

    fn configure_modem(&mut self) -> BusResult {
        self.write_register(REG_FIFO_TX_BASE_ADDR, 0)?;
        self.write_register(REG_FIFO_RX_BASE_ADDR, 0)?;
        // The chip is asleep after the probe; any mode write moves it to standby.
        self.mode = Rf95Mode::Released;
        self.set_mode_idle()?;

        let [config1, config2, config3] = MODEM_CONFIG_DEFAULT;
        self.write_register(REG_MODEM_CONFIG1, config1)?;
        self.write_register(REG_MODEM_CONFIG2, config2)?;
        self.write_register(REG_MODEM_CONFIG3, config3)?;

        let [preamble_msb, preamble_lsb] = PREAMBLE_LEN.to_be_bytes();
        self.write_register(REG_PREAMBLE_MSB, preamble_msb)?;
        self.write_register(REG_PREAMBLE_LSB, preamble_lsb)?;

        self.set_tx_power(self.config.tx_power_dbm)
    }

    fn set_tx_power(&mut self, dbm: i8) -> BusResult {
        let mut power = dbm.clamp(5, 23);
        if power > 20 {
            // The high power DAC adds 3 dBm on top of the PA setting.
            self.write_register(REG_PA_DAC, PA_DAC_ENABLE)?;
            power -= 3;
        } else {
            self.write_register(REG_PA_DAC, PA_DAC_DISABLE)?;
        }
        self.write_register(REG_PA_CONFIG, PA_SELECT | (power - 5) as u8)
    }

    fn set_frequency(&mut self, mhz: f32) -> Result {
        if !(FREQUENCY_MIN_MHZ..=FREQUENCY_MAX_MHZ).contains(&mhz) {
            return Err(Error::SetFrequencyFailed);
        }
        let frf = libm::round(mhz as f64 * 1_000_000.0 / FSTEP_HZ) as u32;
        let [_, msb, mid, lsb] = frf.to_be_bytes();
        self.write_register(REG_FRF_MSB, msb)
            .and_then(|()| self.write_register(REG_FRF_MID, mid))
            .and_then(|()| self.write_register(REG_FRF_LSB, lsb))
            .map_err(|_| Error::SetFrequencyFailed)
    }

    /// Polls `poll` once per millisecond until it completes, fails, or `timeout_ms`
    /// elapses. A `timeout_ms` of `0` polls forever.
    fn wait_for<T, F>(&mut self, timeout_ms: u32, mut poll: F) -> Result<T>
    where
        F: FnMut(&mut Self) -> nb::Result<T, Error>,
    {
        let mut waited_ms: u32 = 0;
        loop {
            match poll(self) {
                Ok(value) => return Ok(value),
                Err(nb::Error::Other(err)) => return Err(err),
                Err(nb::Error::WouldBlock) => {
                    if timeout_ms != 0 && waited_ms >= timeout_ms {
                        return Err(Error::TimedOut);
                    }
                    self.delay.delay_ms(1);
                    waited_ms = waited_ms.saturating_add(1);
                }
            }
        }
    }

    fn interrupt_raised(&mut self, kind: Error) -> nb::Result<(), Error> {
        match self.int.is_high() {
            Ok(true) => Ok(()),
            Ok(false) => Err(nb::Error::WouldBlock),
            Err(_) => Err(nb::Error::Other(kind)),
        }
    }

    fn take_irq_flags(&mut self) -> BusResult<u8> {
        let flags = self.read_register(REG_IRQ_FLAGS)?;
        self.write_register(REG_IRQ_FLAGS, IRQ_CLEAR_ALL)?;
        Ok(flags)
    }

    fn poll_tx_done(&mut self) -> nb::Result<(), Error> {
        self.interrupt_raised(Error::SendFailed)?;
        let flags = self.take_irq_flags().map_err(|_| Error::SendFailed)?;
        if flags & IRQ_TX_DONE == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.set_mode_idle().map_err(|_| Error::SendFailed)?;
        self.tx_good = self.tx_good.wrapping_add(1);
        Ok(())
    }

    fn poll_rx_done(&mut self, buf: &mut [u8]) -> nb::Result<Reception, Error> {
        self.interrupt_raised(Error::RecvFailed)?;
        let flags = self.take_irq_flags().map_err(|_| Error::RecvFailed)?;
        if flags & (IRQ_RX_TIMEOUT | IRQ_PAYLOAD_CRC_ERROR) != 0 {
            self.rx_bad = self.rx_bad.wrapping_add(1);
            return Err(nb::Error::Other(Error::RecvFailed));
        }
        if flags & IRQ_RX_DONE == 0 {
            return Err(nb::Error::WouldBlock);
        }
        let reception = self.read_packet(buf).map_err(|_| Error::RecvFailed)?;
        self.rx_good = self.rx_good.wrapping_add(1);
        Ok(reception)
    }

    fn read_packet(&mut self, buf: &mut [u8]) -> BusResult<Reception> {
        let received = self.read_register(REG_RX_NB_BYTES)? as usize;
        let start = self.read_register(REG_FIFO_RX_CURRENT_ADDR)?;
        self.write_register(REG_FIFO_ADDR_PTR, start)?;
        let len = received.min(buf.len());
        self.read_fifo(&mut buf[..len])?;

        let snr = self.read_register(REG_PKT_SNR_VALUE)? as i8 as i16 / 4;
        let raw = self.read_register(REG_PKT_RSSI_VALUE)? as i16;
        let rssi = if snr < 0 { raw + snr } else { raw * 16 / 15 };
        let offset = if self.config.frequency_mhz >= HF_PORT_MIN_MHZ {
            RSSI_OFFSET_HF
        } else {
            RSSI_OFFSET_LF
        };
        self.set_mode_idle()?;
        Ok(Reception {
            len,
            rssi: Some(rssi - offset),
        })
    }
}

impl<SPI, CS, RST, INT, PEER, D> Transceiver for Rf95<SPI, CS, RST, INT, PEER, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RST: OutputPin,
    INT: InputPin,
    PEER: OutputPin,
    D: DelayNs,
{
    fn open(&mut self) -> Result {
        self.mode = Rf95Mode::Released;
        match self.probe() {
            Ok(true) => {}
            Ok(false) => {
                warn!("rf95 did not answer the presence probe");
                return Err(Error::InitFailed);
            }
            Err(BusFault) => return Err(Error::InitFailed),
        }
        self.configure_modem().map_err(|_| Error::InitFailed)?;
        self.set_frequency(self.config.frequency_mhz)?;
        debug!("rf95 up at {} MHz", self.config.frequency_mhz);
        Ok(())
    }

    fn close(&mut self) -> Result {
        // Releasing chip-select cannot be refused; a pin error leaves nothing to undo.
        let _ = self.cs.set_high();
        self.mode = Rf95Mode::Released;
        Ok(())
    }

    fn transmit(&mut self, payload: &[u8]) -> Result {
        if payload.len() > PACKET_MAX_SIZE_BYTES {
            return Err(Error::SendFailed);
        }
        self.set_mode_idle()
            .and_then(|()| self.write_register(REG_FIFO_ADDR_PTR, 0))
            .and_then(|()| self.write_fifo(payload))
            .and_then(|()| self.write_register(REG_PAYLOAD_LENGTH, payload.len() as u8))
            .and_then(|()| self.set_mode_tx())
            .map_err(|_| Error::SendFailed)?;

        let timeout_ms = self.config.tx_timeout_ms;
        self.wait_for(timeout_ms, Self::poll_tx_done).inspect_err(|err| {
            if err.is_timeout() {
                warn!("rf95 transmission not confirmed within {} ms", timeout_ms);
            }
        })?;
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<Reception> {
        self.set_mode_rx().map_err(|_| Error::RecvFailed)?;
        let res = self.wait_for(timeout_ms, |rf95| rf95.poll_rx_done(buf));
        if res == Err(Error::TimedOut) {
            let _ = self.set_mode_idle();
        }
        res
    }
}
