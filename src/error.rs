//! Result taxonomy of the radio HAL.
//!
//! Every HAL operation reports its outcome as a [`Result`]. `Ok` is the
//! `Okay` outcome; every other outcome is an [`Error`] variant. Collaborators
//! that report numeric return codes (e.g. over a serial console) can map any
//! outcome onto a [`ReturnCode`].

use thiserror::Error;

/// Failure kinds of the HAL operations.
///
/// Kinds fall into three classes:
/// - *lifecycle*: [`InitFailed`](Error::InitFailed), [`SetFrequencyFailed`](Error::SetFrequencyFailed),
///   [`NotInit`](Error::NotInit), [`DeinitFailed`](Error::DeinitFailed)
/// - *transfer*: [`SendFailed`](Error::SendFailed), [`RecvFailed`](Error::RecvFailed)
/// - *bounded wait*: [`TimedOut`](Error::TimedOut), an expected outcome rather than a fault
///
/// [`AlreadyInit`](Error::AlreadyInit) and the SD-card kinds are reserved; no
/// operation of this crate produces them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// The transceiver is already initialized.
    #[error("transceiver already initialized")]
    AlreadyInit,
    /// The operation requires an initialized transceiver.
    #[error("transceiver not initialized")]
    NotInit,
    /// The device did not answer its presence probe, or the device path could not be opened.
    #[error("transceiver initialization failed")]
    InitFailed,
    /// Releasing the backend handle failed.
    #[error("transceiver deinitialization failed")]
    DeinitFailed,
    /// The device rejected the requested operating frequency.
    #[error("transceiver rejected the operating frequency")]
    SetFrequencyFailed,
    /// The SD card sharing the bus is active.
    #[error("SD card is active on the shared bus")]
    SdActive,
    /// The SD card sharing the bus could not be released.
    #[error("failed to deinitialize the SD card")]
    FailedToDeinitSd,
    /// The SD card sharing the bus could not be restored.
    #[error("failed to restore the SD card")]
    FailedToRestoreSd,
    /// The backend rejected the payload, or wrote it only partially.
    #[error("send failed")]
    SendFailed,
    /// The backend reported a receive error or end of data.
    #[error("receive failed")]
    RecvFailed,
    /// The bounded wait elapsed without completion.
    #[error("timed out")]
    TimedOut,
}

impl Error {
    /// `true` for the bounded-wait outcome, which callers should treat as non-fatal.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::TimedOut)
    }

    /// `true` for kinds produced by bringing the backend into or out of a ready state.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Error::InitFailed | Error::SetFrequencyFailed | Error::NotInit | Error::DeinitFailed
        )
    }

    /// `true` for kinds produced while moving a payload.
    pub fn is_transfer(&self) -> bool {
        matches!(self, Error::SendFailed | Error::RecvFailed)
    }
}

/// Result of a HAL operation. `Ok` is the `Okay` outcome.
pub type Result<T = ()> = core::result::Result<T, Error>;

/// Numeric return codes, in taxonomy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
pub enum ReturnCode {
    /// Success.
    Okay = 0,
    /// See [`Error::AlreadyInit`].
    AlreadyInit,
    /// See [`Error::NotInit`].
    NotInit,
    /// See [`Error::InitFailed`].
    InitFailed,
    /// See [`Error::DeinitFailed`].
    DeinitFailed,
    /// See [`Error::SetFrequencyFailed`].
    SetFrequencyFailed,
    /// See [`Error::SdActive`].
    SdActive,
    /// See [`Error::FailedToDeinitSd`].
    FailedToDeinitSd,
    /// See [`Error::FailedToRestoreSd`].
    FailedToRestoreSd,
    /// See [`Error::SendFailed`].
    SendFailed,
    /// See [`Error::RecvFailed`].
    RecvFailed,
    /// See [`Error::TimedOut`].
    TimedOut,
}

impl From<Error> for ReturnCode {
    fn from(err: Error) -> Self {
        match err {
            Error::AlreadyInit => ReturnCode::AlreadyInit,
            Error::NotInit => ReturnCode::NotInit,
            Error::InitFailed => ReturnCode::InitFailed,
            Error::DeinitFailed => ReturnCode::DeinitFailed,
            Error::SetFrequencyFailed => ReturnCode::SetFrequencyFailed,
            Error::SdActive => ReturnCode::SdActive,
            Error::FailedToDeinitSd => ReturnCode::FailedToDeinitSd,
            Error::FailedToRestoreSd => ReturnCode::FailedToRestoreSd,
            Error::SendFailed => ReturnCode::SendFailed,
            Error::RecvFailed => ReturnCode::RecvFailed,
            Error::TimedOut => ReturnCode::TimedOut,
        }
    }
}

impl<T> From<&Result<T>> for ReturnCode {
    fn from(res: &Result<T>) -> Self {
        match res {
            Ok(_) => ReturnCode::Okay,
            Err(err) => (*err).into(),
        }
    }
}

impl From<ReturnCode> for u8 {
    fn from(rc: ReturnCode) -> Self {
        rc as u8
    }
}

impl TryFrom<u8> for ReturnCode {
    type Error = u8;

    fn try_from(code: u8) -> core::result::Result<Self, u8> {
        Ok(match code {
            0 => ReturnCode::Okay,
            1 => ReturnCode::AlreadyInit,
            2 => ReturnCode::NotInit,
            3 => ReturnCode::InitFailed,
            4 => ReturnCode::DeinitFailed,
            5 => ReturnCode::SetFrequencyFailed,
            6 => ReturnCode::SdActive,
            7 => ReturnCode::FailedToDeinitSd,
            8 => ReturnCode::FailedToRestoreSd,
            9 => ReturnCode::SendFailed,
            10 => ReturnCode::RecvFailed,
            11 => ReturnCode::TimedOut,
            other => return Err(other),
        })
    }
}

impl ReturnCode {
    /// Converts the code back into an operation outcome.
    pub fn into_result(self) -> Result {
        match self {
            ReturnCode::Okay => Ok(()),
            ReturnCode::AlreadyInit => Err(Error::AlreadyInit),
            ReturnCode::NotInit => Err(Error::NotInit),
            ReturnCode::InitFailed => Err(Error::InitFailed),
            ReturnCode::DeinitFailed => Err(Error::DeinitFailed),
            ReturnCode::SetFrequencyFailed => Err(Error::SetFrequencyFailed),
            ReturnCode::SdActive => Err(Error::SdActive),
            ReturnCode::FailedToDeinitSd => Err(Error::FailedToDeinitSd),
            ReturnCode::FailedToRestoreSd => Err(Error::FailedToRestoreSd),
            ReturnCode::SendFailed => Err(Error::SendFailed),
            ReturnCode::RecvFailed => Err(Error::RecvFailed),
            ReturnCode::TimedOut => Err(Error::TimedOut),
        }
    }
}
