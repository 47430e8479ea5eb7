//! Camera capture handle and public API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::capture_loop::{run_capture_loop, CaptureCommand};
use super::types::{CameraError, CameraEvent, CameraSettings, Frame};

/// Handle for one bound camera device.
///
/// Constructing the handle binds the device without touching the hardware;
/// the camera is actually opened inside the background thread when `start()`
/// is called. The thread continuously captures frames into a shared buffer
/// read via `latest_frame()`. `stop()` halts the preview but keeps the
/// binding, so a restart is cheap.
pub struct CameraCapture {
    /// Latest captured frame (shared with capture thread)
    frame_buffer: Arc<Mutex<Option<Frame>>>,
    /// Capture thread handle
    capture_thread: Option<JoinHandle<()>>,
    /// Channel to send commands to capture thread
    command_tx: Option<Sender<CaptureCommand>>,
    /// Signal to stop capture thread
    stop_signal: Arc<AtomicBool>,
    /// Asynchronous device errors from the capture thread
    event_tx: Sender<CameraEvent>,
    event_rx: Receiver<CameraEvent>,
    /// Current settings
    settings: CameraSettings,
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("settings", &self.settings)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraCapture {
    /// Bind a camera device with the specified settings.
    ///
    /// This does not open the camera stream; that happens inside the
    /// background thread after `start()`, and open failures (missing device,
    /// denied permission) surface later through `drain_events()`.
    pub fn open(settings: CameraSettings) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            frame_buffer: Arc::new(Mutex::new(None)),
            capture_thread: None,
            command_tx: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            event_tx,
            event_rx,
            settings,
        }
    }

    /// Get the current camera settings.
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Start capturing frames in a background thread.
    ///
    /// Returns as soon as the thread is spawned; the camera is opened inside
    /// it. Open failures (missing device, denied permission, stream refusal)
    /// arrive asynchronously through `drain_events()` and leave the handle
    /// stopped, so the caller's UI thread is never held up by a slow backend.
    ///
    /// # Errors
    /// * `CameraError::AlreadyRunning` - If capture is already running
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.is_running() {
            return Err(CameraError::AlreadyRunning);
        }

        self.stop_signal.store(false, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        self.command_tx = Some(tx);

        let buffer = Arc::clone(&self.frame_buffer);
        let stop = Arc::clone(&self.stop_signal);
        let settings = self.settings.clone();
        let event_tx = self.event_tx.clone();

        let handle = std::thread::spawn(move || {
            run_capture_loop(settings, buffer, stop, rx, event_tx);
        });

        self.capture_thread = Some(handle);
        Ok(())
    }

    /// Stop the capture thread, keeping the binding.
    ///
    /// Signals the background thread and waits for it to finish. The handle
    /// can be started again afterwards.
    pub fn stop(&mut self) {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(CaptureCommand::Stop);
        }
        self.join_thread();
    }

    /// Get the latest captured frame.
    ///
    /// Returns `None` if no frame has been captured yet or if capturing
    /// is not running.
    pub fn latest_frame(&self) -> Option<Frame> {
        let buffer = self.frame_buffer.lock().ok()?;
        buffer.clone()
    }

    /// Drain asynchronous device errors reported by the capture thread.
    pub fn drain_events(&self) -> Vec<CameraEvent> {
        self.event_rx.try_iter().collect()
    }

    /// Check if the capture thread is currently running.
    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    fn join_thread(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_does_not_touch_hardware() {
        let capture = CameraCapture::open(CameraSettings {
            device_index: 999,
            ..CameraSettings::default()
        });
        // Binding an absent device succeeds; the failure surfaces after start()
        assert!(!capture.is_running());
        assert!(capture.latest_frame().is_none());
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let mut capture = CameraCapture::open(CameraSettings::default());
        capture.stop();
        assert!(!capture.is_running());
    }

    #[test]
    fn test_start_on_absent_device_reports_error_async() {
        let mut capture = CameraCapture::open(CameraSettings {
            device_index: 999,
            ..CameraSettings::default()
        });

        // start() never blocks on the camera opening; the open failure for
        // an absent device arrives as an event from the background thread
        capture.start().unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        let mut events = Vec::new();
        while events.is_empty() && std::time::Instant::now() < deadline {
            events = capture.drain_events();
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let CameraEvent::Error(message) = events
            .first()
            .expect("open failure should be reported as an event");
        assert!(!message.is_empty());

        capture.stop();
        assert!(!capture.is_running());
    }
}
