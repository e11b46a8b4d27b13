//! Simulated backend: a file treated as the transceiver.
//!
//! [`SimulatedTransceiver`] lets protocol code run on a host without radios. Each
//! write to the device file is one transmitted packet, each non-empty read one
//! received packet. The file is typically a pseudo-device served by a network
//! simulator (which answers reads with no data while nothing is queued), but any
//! readable and writable path works, which is what the tests rely on. The path is
//! opened non-blocking, so a FIFO with no writer data reports `WouldBlock` instead
//! of parking the thread past the deadline.
//!
//! The device path comes from the `NEXUS_LORA` environment value at launch, or the
//! value it had at build time.
//!
//! ## Receive rule
//!
//! - a non-empty read is a packet
//! - an empty read, `WouldBlock` or `Interrupted` means nothing has arrived yet
//! - any other I/O error is [`Error::RecvFailed`], reported at once
//! - with a timeout, reaching the deadline is [`Error::TimedOut`]; without one the
//!   backend keeps polling
//!
//! Between attempts the thread sleeps for the poll interval, or whatever is left
//! until the deadline if that is shorter.

use crate::consts::{SIM_DEVICE_ENV, SIM_POLL_INTERVAL_MS};
use crate::error::{Error, Result};
use crate::transceiver::{Reception, Transceiver};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::ffi::OsString;
use std::os::fd::IntoRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// A transceiver backed by a file or pseudo-device.
#[derive(Debug)]
pub struct SimulatedTransceiver {
    path: PathBuf,
    device: Option<File>,
    poll_interval: Duration,
}

impl SimulatedTransceiver {
    /// Creates a closed backend for the device at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            device: None,
            poll_interval: Duration::from_millis(SIM_POLL_INTERVAL_MS),
        }
    }

    /// Creates a backend for the device named by `NEXUS_LORA`, read at launch and
    /// falling back to its build-time value. `None` if neither is set.
    pub fn from_env() -> Option<Self> {
        Self::from_device_path(std::env::var_os(SIM_DEVICE_ENV), option_env!("NEXUS_LORA"))
    }

    /// Picks the launch-time path over the build-time one.
    fn from_device_path(launch: Option<OsString>, built: Option<&str>) -> Option<Self> {
        launch
            .map(PathBuf::from)
            .or_else(|| built.map(PathBuf::from))
            .map(Self::new)
    }

    /// Sets the longest sleep between two poll attempts.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Path of the device file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` while the device file is open.
    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// One read attempt. `None` when nothing has arrived yet.
    fn read_once(device: &mut File, buf: &mut [u8]) -> Result<Option<usize>> {
        match device.read(buf) {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(n)),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(_) => Err(Error::RecvFailed),
        }
    }
}

impl Transceiver for SimulatedTransceiver {
    fn open(&mut self) -> Result {
        // Dropping the previous descriptor closes it.
        self.device = None;
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.path)
            .map_err(|_| Error::InitFailed)?;
        self.device = Some(device);
        debug!("simulated transceiver opened");
        Ok(())
    }

    fn close(&mut self) -> Result {
        let device = self.device.take().ok_or(Error::NotInit)?;
        // Dropping a `File` discards the result of close(2); closing the raw
        // descriptor by hand is the only way to observe a failed release.
        let fd = device.into_raw_fd();
        // SAFETY: `fd` was released from an owned `File` above; nothing else closes it.
        if unsafe { libc::close(fd) } == -1 {
            return Err(Error::DeinitFailed);
        }
        Ok(())
    }

    fn transmit(&mut self, payload: &[u8]) -> Result {
        let device = self.device.as_mut().ok_or(Error::SendFailed)?;
        match device.write(payload) {
            Ok(n) if n == payload.len() => Ok(()),
            Ok(n) => {
                warn!("short write: {} of {} bytes", n, payload.len());
                Err(Error::SendFailed)
            }
            Err(_) => Err(Error::SendFailed),
        }
    }

    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<Reception> {
        if buf.is_empty() {
            return Err(Error::RecvFailed);
        }
        let poll_interval = self.poll_interval;
        let device = self.device.as_mut().ok_or(Error::RecvFailed)?;
        let deadline =
            (timeout_ms != 0).then(|| Instant::now() + Duration::from_millis(timeout_ms.into()));

        loop {
            let now = Instant::now();
            let remaining = match deadline {
                Some(deadline) if now >= deadline => return Err(Error::TimedOut),
                Some(deadline) => Some(deadline - now),
                None => None,
            };
            if let Some(len) = Self::read_once(device, buf)? {
                return Ok(Reception { len, rssi: None });
            }
            thread::sleep(remaining.map_or(poll_interval, |left| left.min(poll_interval)));
        }
    }
}

/// A scratch device file removed again on drop.
#[cfg(test)]
pub(crate) struct ScratchDevice(pub(crate) PathBuf);

#[cfg(test)]
impl ScratchDevice {
    pub(crate) fn new(name: &str) -> Self {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        let path = std::env::temp_dir().join(format!(
            "lora-hal-{}-{}-{}",
            std::process::id(),
            name,
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = File::create(&path).expect("create scratch device");
        Self(path)
    }
}

#[cfg(test)]
impl Drop for ScratchDevice {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{PACKET_MAX_SIZE_BYTES, RSSI_SENTINEL};
    use crate::radio::Radio;

    fn session(device: &ScratchDevice) -> Radio<SimulatedTransceiver> {
        Radio::new(SimulatedTransceiver::new(&device.0))
    }

    #[test]
    fn test_open_missing_path_fails() {
        let mut backend = SimulatedTransceiver::new("/nonexistent/lora-hal/device");
        assert_eq!(backend.open(), Err(Error::InitFailed));
        assert!(!backend.is_open());
    }

    #[test]
    fn test_lazy_init_failure_skips_transfer() {
        let mut radio = Radio::new(SimulatedTransceiver::new("/nonexistent/lora-hal/device"));
        assert_eq!(radio.send(b"TX[0]"), Err(Error::InitFailed));
        assert!(!radio.is_active());

        let mut buf = [0u8; 8];
        let mut len = buf.len();
        assert_eq!(radio.wait_recv(&mut buf, &mut len, 10), Err(Error::InitFailed));
        assert_eq!(len, 8);
    }

    #[test]
    fn test_paired_sessions_exchange_payload() {
        let device = ScratchDevice::new("paired");
        let mut tx = session(&device);
        let mut rx = session(&device);

        assert_eq!(tx.init(), Ok(()));
        assert_eq!(rx.init(), Ok(()));
        assert_eq!(tx.send(b"TX[0]"), Ok(()));

        let mut buf = [0u8; PACKET_MAX_SIZE_BYTES];
        let mut len = buf.len();
        assert_eq!(rx.wait_recv(&mut buf, &mut len, 5_000), Ok(()));
        assert_eq!(len, 5);
        assert_eq!(&buf[..len], b"TX[0]");
        assert_eq!(rx.last_signal_strength(), RSSI_SENTINEL);
    }

    #[test]
    fn test_max_size_payload_arrives_intact() {
        let device = ScratchDevice::new("max");
        let mut tx = session(&device);
        let mut rx = session(&device);
        let payload: Vec<u8> = (0..PACKET_MAX_SIZE_BYTES).map(|i| (i * 7) as u8).collect();

        assert_eq!(rx.init(), Ok(()));
        assert_eq!(tx.send(&payload), Ok(()));
        let packet = rx.recv_packet(1_000).unwrap();
        assert_eq!(packet.as_slice(), payload.as_slice());
    }

    #[test]
    fn test_idle_link_times_out_after_deadline() {
        let device = ScratchDevice::new("idle");
        let mut rx = session(&device);
        let mut buf = [0x5Au8; 16];
        let mut len = buf.len();

        let started = Instant::now();
        assert_eq!(rx.wait_recv(&mut buf, &mut len, 200), Err(Error::TimedOut));
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(buf, [0x5A; 16]);
        assert_eq!(len, 16);
        assert!(rx.is_active());
    }

    #[test]
    fn test_zero_timeout_waits_for_data() {
        let device = ScratchDevice::new("blocking");
        let mut rx = session(&device);
        assert_eq!(rx.init(), Ok(()));

        let path = device.0.clone();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let mut tx = Radio::new(SimulatedTransceiver::new(path));
            tx.send(b"late")
        });

        let mut buf = [0u8; 16];
        let mut len = buf.len();
        assert_eq!(rx.wait_recv(&mut buf, &mut len, 0), Ok(()));
        assert_eq!(&buf[..len], b"late");
        assert_eq!(writer.join().unwrap(), Ok(()));
    }

    #[test]
    fn test_empty_buffer_is_recv_failed() {
        let device = ScratchDevice::new("empty");
        let mut rx = session(&device);
        let mut len = 0;
        assert_eq!(rx.wait_recv(&mut [], &mut len, 10), Err(Error::RecvFailed));
    }

    #[test]
    fn test_deinit_closes_device() {
        let device = ScratchDevice::new("deinit");
        let mut radio = session(&device);
        assert_eq!(radio.deinit(), Err(Error::NotInit));
        assert_eq!(radio.init(), Ok(()));
        assert!(radio.backend().is_some_and(|backend| backend.is_open()));
        assert_eq!(radio.deinit(), Ok(()));
        assert_eq!(radio.deinit(), Err(Error::NotInit));
        assert!(!radio.into_inner().is_open());
    }

    #[test]
    fn test_repeated_init_reopens_device() {
        let device = ScratchDevice::new("reinit");
        let mut radio = session(&device);
        for _ in 0..3 {
            assert_eq!(radio.init(), Ok(()));
            assert!(radio.is_active());
        }
        assert_eq!(radio.send(b"still usable"), Ok(()));
        assert_eq!(std::fs::read(&device.0).unwrap(), b"still usable");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_write_is_send_failed() {
        let mut radio = Radio::new(SimulatedTransceiver::new("/dev/full"));
        assert_eq!(radio.send(b"TX[0]"), Err(Error::SendFailed));
        assert!(radio.is_active());
    }

    #[test]
    fn test_device_path_prefers_launch_value() {
        let backend = SimulatedTransceiver::from_device_path(
            Some(OsString::from("/tmp/launch")),
            Some("/tmp/built"),
        )
        .unwrap();
        assert_eq!(backend.path(), Path::new("/tmp/launch"));

        let backend = SimulatedTransceiver::from_device_path(None, Some("/tmp/built")).unwrap();
        assert_eq!(backend.path(), Path::new("/tmp/built"));

        assert!(SimulatedTransceiver::from_device_path(None, None).is_none());
    }

    /// A named pipe removed again on drop.
    struct ScratchFifo(PathBuf);

    impl ScratchFifo {
        fn new(name: &str) -> Self {
            use std::ffi::CString;
            use std::os::unix::ffi::OsStrExt;

            let path = std::env::temp_dir().join(format!(
                "lora-hal-fifo-{}-{}",
                std::process::id(),
                name
            ));
            let c_path = CString::new(path.as_os_str().as_bytes()).unwrap();
            // SAFETY: `c_path` is a valid NUL-terminated string for the duration of the call.
            assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) }, 0);
            Self(path)
        }
    }

    impl Drop for ScratchFifo {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_idle_fifo_times_out_after_deadline() {
        let fifo = ScratchFifo::new("idle");
        let mut rx = Radio::new(SimulatedTransceiver::new(&fifo.0));
        let mut buf = [0x5Au8; 16];
        let mut len = buf.len();

        let started = Instant::now();
        assert_eq!(rx.wait_recv(&mut buf, &mut len, 200), Err(Error::TimedOut));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_secs(2));
        assert_eq!(buf, [0x5A; 16]);
        assert_eq!(len, 16);
        assert!(rx.is_active());
    }

    #[test]
    fn test_fifo_zero_timeout_waits_for_writer() {
        let fifo = ScratchFifo::new("blocking");
        let mut rx = Radio::new(SimulatedTransceiver::new(&fifo.0));
        assert_eq!(rx.init(), Ok(()));

        let path = fifo.0.clone();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let mut tx = Radio::new(SimulatedTransceiver::new(path));
            tx.send(b"TX[0]")
        });

        let mut buf = [0u8; PACKET_MAX_SIZE_BYTES];
        let mut len = buf.len();
        assert_eq!(rx.wait_recv(&mut buf, &mut len, 0), Ok(()));
        assert_eq!(&buf[..len], b"TX[0]");
        assert_eq!(writer.join().unwrap(), Ok(()));
    }
}
