//! A process-wide radio session.
//!
//! Firmware usually has exactly one radio and reaches it from several contexts
//! (main loop, interrupt handlers, threads on a host). This module keeps one
//! [`Radio`] in a `static`, guarded by a `critical_section` mutex, so every
//! operation on it runs inside a single critical section and two transfers can
//! never interleave.
//!
//! A blocking call made through [`with_global_radio`] holds the critical section
//! for as long as it blocks; prefer bounded timeouts there.
//!
//! # Example
//!
//! ```rust
//! use lora_hal::global::{GlobalRadio, global_radio_init, global_radio_setup, with_global_radio};
//! use lora_hal::sim::SimulatedTransceiver;
//!
//! static RADIO: GlobalRadio<SimulatedTransceiver> = global_radio_init();
//!
//! let _ = global_radio_setup(&RADIO, SimulatedTransceiver::new("/dev/null"));
//! let active = with_global_radio(&RADIO, |radio| {
//!     radio.init().is_ok() && radio.is_active()
//! });
//! assert_eq!(active, Some(true));
//! ```

use crate::radio::Radio;
use crate::transceiver::Transceiver;
use core::cell::RefCell;
use critical_section::Mutex;

/// Storage for the shared session; `None` until [`global_radio_setup`] runs.
pub type GlobalRadio<T> = Mutex<RefCell<Option<Radio<T>>>>;

/// Used to initialize the global static session for use with `critical_section`.
///
/// # Returns
/// * An empty slot
pub const fn global_radio_init<T: Transceiver>() -> GlobalRadio<T> {
    Mutex::new(RefCell::new(None))
}

/// Installs a fresh, inactive session over `transceiver`.
///
/// # Returns
/// * The session that was installed before, if any. It is not deinitialized.
pub fn global_radio_setup<T: Transceiver>(
    global: &'static GlobalRadio<T>,
    transceiver: T,
) -> Option<Radio<T>> {
    critical_section::with(|cs| global.borrow(cs).replace(Some(Radio::new(transceiver))))
}

/// Runs `f` on the shared session inside one critical section.
///
/// # Returns
/// * `None` if no session has been installed
pub fn with_global_radio<T, R, F>(global: &'static GlobalRadio<T>, f: F) -> Option<R>
where
    T: Transceiver,
    F: FnOnce(&mut Radio<T>) -> R,
{
    critical_section::with(|cs| global.borrow(cs).borrow_mut().as_mut().map(f))
}

/// Takes the shared session out again, leaving the slot empty.
pub fn global_radio_take<T: Transceiver>(global: &'static GlobalRadio<T>) -> Option<Radio<T>> {
    critical_section::with(|cs| global.borrow(cs).take())
}

/// Declares a static global `RADIO` session slot protected by a `critical_section` mutex.
///
/// # Arguments
/// - `$transceiver`: the concrete backend type (must implement [`Transceiver`])
///
/// # Example
/// ```rust
/// use lora_hal::sim::SimulatedTransceiver;
///
/// lora_hal::init_radio!(SimulatedTransceiver);
///
/// let _ = lora_hal::setup_radio!(SimulatedTransceiver::new("/dev/null"));
/// assert_eq!(lora_hal::global::with_global_radio(&RADIO, |radio| radio.is_active()), Some(false));
/// ```
#[macro_export]
macro_rules! init_radio {
    ( $transceiver:ty ) => {
        pub static RADIO: $crate::global::GlobalRadio<$transceiver> =
            $crate::global::global_radio_init();
    };
}

/// Installs a new session over the given backend into the `RADIO` slot declared
/// by [`init_radio!`].
///
/// Evaluates to the previously installed session, if any.
#[macro_export]
macro_rules! setup_radio {
    ( $transceiver:expr ) => {
        $crate::global::global_radio_setup(&RADIO, $transceiver)
    };
}
