//! Camera permission gate.
//!
//! macOS requires explicit user authorization before a process may access
//! the camera. `ensure_camera_permission` is called synchronously before
//! every preview start; a denial aborts the start silently, since the
//! system's own dialog has already informed the user. On every other
//! platform the gate is a constant pass.

/// Where to re-enable access after a denial (shown in the log only).
#[cfg(target_os = "macos")]
const SETTINGS_PATH: &str = "System Settings > Privacy & Security > Camera";

/// Check (and, on first use, request) camera authorization.
///
/// Returns `true` when the camera may be opened.
#[cfg(target_os = "macos")]
pub fn ensure_camera_permission() -> bool {
    use nokhwa::{nokhwa_check, nokhwa_initialize};

    if nokhwa_check() {
        return true;
    }

    // First use: trigger the system permission dialog
    nokhwa_initialize(|granted| {
        log::info!("Camera permission request completed: granted={}", granted);
    });

    let granted = nokhwa_check();
    if !granted {
        log::warn!("Camera access not authorized. Grant it in {}", SETTINGS_PATH);
    }
    granted
}

#[cfg(not(target_os = "macos"))]
pub fn ensure_camera_permission() -> bool {
    true
}
