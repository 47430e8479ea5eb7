//! Snapshot service: destination-path resolution and capture dispatch.
//!
//! Snapshots are fire-and-forget. The service gates on preview being
//! active, resolves where the image goes, hands the request to the capture
//! session and steps out of the way; completion arrives later as a session
//! event matched by request id.

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::{CaptureSession, ImageFormat, RequestId};

/// Subfolder created under the platform pictures directory.
const APP_FOLDER: &str = "camshot";
/// Filename prefix for generated snapshot paths.
const FILE_PREFIX: &str = "shot";

/// Errors reported by snapshot dispatch. All non-fatal: the user retries
/// explicitly, never the service.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Camera is not running")]
    NotRunning,
    #[error("Failed to initiate capture")]
    CaptureStartFailed,
    #[error("Failed to save image: {0}")]
    ImageSave(String),
}

pub struct SnapshotService {
    /// Override for the default pictures directory, from config or CLI.
    output_dir: Option<PathBuf>,
}

impl SnapshotService {
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self { output_dir }
    }

    /// Current override for the pictures directory, if any.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Replace the pictures-directory override. `None` restores the
    /// platform default.
    pub fn set_output_dir(&mut self, dir: Option<PathBuf>) {
        self.output_dir = dir;
    }

    /// Request a still-image capture.
    ///
    /// When `explicit` is `None` the destination defaults to
    /// `<pictures>/camshot/shot_<YYYYMMDD_HHMMSS>.<ext>`, creating the
    /// subfolder if absent. The output format is always derived from the
    /// final path's extension.
    ///
    /// Returns the request id and resolved path on dispatch.
    ///
    /// # Errors
    /// * `SnapshotError::NotRunning` - No device bound or preview inactive;
    ///   no request is issued.
    /// * `SnapshotError::CaptureStartFailed` - The session rejected the
    ///   request immediately.
    /// * `SnapshotError::ImageSave` - The destination directory could not
    ///   be created.
    pub fn capture(
        &self,
        session: &mut dyn CaptureSession,
        explicit: Option<PathBuf>,
        requested: ImageFormat,
    ) -> Result<(RequestId, PathBuf), SnapshotError> {
        if !session.is_bound() || !session.is_active() {
            return Err(SnapshotError::NotRunning);
        }

        let path = match explicit {
            Some(path) => path,
            None => generate_path(&self.base_dir(), requested.extension(), Local::now()),
        };
        let format = ImageFormat::from_path(&path);

        // A bare filename has `Some("")` as parent, which is not creatable
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SnapshotError::ImageSave(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let id = session.capture_to_file(&path, format);
        if !id.is_valid() {
            return Err(SnapshotError::CaptureStartFailed);
        }

        log::info!("Snapshot {} dispatched to {}", id.0, path.display());
        Ok((id, path))
    }

    fn base_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(pictures_dir)
    }
}

/// Platform pictures directory, falling back to the home directory and
/// finally the current directory.
pub fn pictures_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Build the default snapshot path for the given base directory, extension
/// and timestamp: `<base>/camshot/shot_<YYYYMMDD_HHMMSS>.<ext>`.
pub fn generate_path(base: &Path, extension: &str, at: DateTime<Local>) -> PathBuf {
    base.join(APP_FOLDER).join(format!(
        "{}_{}.{}",
        FILE_PREFIX,
        at.format("%Y%m%d_%H%M%S"),
        extension
    ))
}
