//! Camera controller: lifecycle of the single active device binding.
//!
//! The controller owns the device list and the capture session. The binding
//! slot inside the session holds at most one live device; replacement always
//! tears the old binding down before constructing the new one. Preview state
//! moves `Unbound -> Bound(idle) <-> Bound(previewing)`, and switching
//! devices preserves whichever of the two run states was active.

use crate::camera::{CameraError, CameraInfo, DeviceRegistry, Frame};
use crate::permissions;
use crate::session::{CaptureSession, SessionEvent};

/// Errors surfaced by controller operations. All non-fatal; every failure
/// waits for a new explicit user action.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("No camera devices available")]
    NoDeviceAvailable,
    #[error(transparent)]
    Camera(#[from] CameraError),
}

pub struct CameraController {
    registry: Box<dyn DeviceRegistry>,
    session: Box<dyn CaptureSession>,
    devices: Vec<CameraInfo>,
    selected: usize,
    /// Device index (from config/CLI) to prefer on the first refresh.
    preferred: Option<u32>,
}

impl CameraController {
    pub fn new(registry: Box<dyn DeviceRegistry>, session: Box<dyn CaptureSession>) -> Self {
        Self {
            registry,
            session,
            devices: Vec::new(),
            selected: 0,
            preferred: None,
        }
    }

    /// Prefer the device with this nokhwa index when the list is first read.
    pub fn with_preferred_device(mut self, index: u32) -> Self {
        self.preferred = Some(index);
        self
    }

    /// Re-read the device list from the registry, wholesale.
    ///
    /// An empty list tears down any existing binding and leaves the
    /// controller in the "no device" state. Otherwise the previous selection
    /// is kept if still in bounds (defaulting to index 0) and the selected
    /// device is rebound without auto-starting preview.
    pub fn refresh_devices(&mut self) -> Result<(), ControllerError> {
        let list = self.registry.list_video_inputs()?;
        self.apply_device_list(list)
    }

    /// Hot-plug approximation: re-query the registry and refresh only when
    /// the list actually changed. Returns whether it did.
    pub fn check_hotplug(&mut self) -> Result<bool, ControllerError> {
        let list = self.registry.list_video_inputs()?;
        if list == self.devices {
            return Ok(false);
        }
        log::info!("Video input list changed: {} device(s)", list.len());
        self.apply_device_list(list)?;
        Ok(true)
    }

    fn apply_device_list(&mut self, list: Vec<CameraInfo>) -> Result<(), ControllerError> {
        self.devices = list;

        if self.devices.is_empty() {
            log::info!("No cameras detected");
            self.selected = 0;
            self.session.unbind();
            return Ok(());
        }

        if let Some(preferred) = self.preferred.take() {
            self.selected = self
                .devices
                .iter()
                .position(|d| d.index == preferred)
                .unwrap_or(0);
        }
        if self.selected >= self.devices.len() {
            self.selected = 0;
        }
        self.session.bind(&self.devices[self.selected])?;
        Ok(())
    }

    /// Switch the binding to the device at `index`.
    ///
    /// An out-of-bounds index is a silent no-op. Otherwise the old binding
    /// is torn down, the new one constructed, and preview restarted on the
    /// new device iff it was running before the switch.
    pub fn select_device(&mut self, index: usize) -> Result<(), ControllerError> {
        if index >= self.devices.len() {
            return Ok(());
        }

        let was_running = self.session.is_active();
        self.session.bind(&self.devices[index])?;
        self.selected = index;
        if was_running {
            self.session.start()?;
        }
        Ok(())
    }

    /// Bind (if unbound) and start preview.
    ///
    /// Fails with [`ControllerError::NoDeviceAvailable`] when the device
    /// list is empty and nothing is bound. On macOS a permission check gates
    /// the start; denial aborts silently without altering bound state, since
    /// the platform's own dialog has already informed the user.
    pub fn start(&mut self) -> Result<(), ControllerError> {
        if !permissions::ensure_camera_permission() {
            log::warn!("Camera permission not granted; start aborted");
            return Ok(());
        }

        if !self.session.is_bound() {
            if self.devices.is_empty() {
                return Err(ControllerError::NoDeviceAvailable);
            }
            self.session.bind(&self.devices[self.selected])?;
        }

        if !self.session.is_active() {
            self.session.start()?;
        }
        Ok(())
    }

    /// Halt preview. The binding stays intact for a fast restart; calling
    /// this while unbound is a no-op.
    pub fn stop(&mut self) {
        self.session.stop();
    }

    /// Drain pending session events, dropping empty-message camera errors
    /// (the "no error" value is a non-event).
    pub fn poll_events(&mut self) -> Vec<SessionEvent> {
        self.session
            .poll_events()
            .into_iter()
            .filter(|event| match event {
                SessionEvent::CameraError { message } => !message.is_empty(),
                _ => true,
            })
            .collect()
    }

    pub fn devices(&self) -> &[CameraInfo] {
        &self.devices
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_device(&self) -> Option<&CameraInfo> {
        self.devices.get(self.selected)
    }

    pub fn is_bound(&self) -> bool {
        self.session.is_bound()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_active()
    }

    pub fn latest_frame(&self) -> Option<Frame> {
        self.session.latest_frame()
    }

    /// Mutable access to the session, for dispatching snapshot requests.
    pub fn session_mut(&mut self) -> &mut dyn CaptureSession {
        self.session.as_mut()
    }
}
