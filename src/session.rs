//! Capture session: binds one device and routes its frames.
//!
//! The session is the seam between the application and the camera stack. It
//! holds at most one live binding, feeds the preview sink (a shared
//! latest-frame buffer) and services snapshot requests. Completions arrive
//! asynchronously and are drained on the UI thread via `poll_events`.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::ImageEncoder;

use crate::camera::{CameraCapture, CameraError, CameraEvent, CameraInfo, CameraSettings, Frame};

/// JPEG quality, fixed at the highest tier the encoder offers.
const JPEG_QUALITY: u8 = 100;

/// Identifier correlating a snapshot request with its async completion.
///
/// Requests are fire-and-forget: no state is retained beyond dispatch, and
/// the id only exists so the UI can match a later saved/error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub i64);

impl RequestId {
    /// Sentinel returned when a request is rejected at dispatch. A rejected
    /// request never produces a later saved/error event.
    pub const INVALID: RequestId = RequestId(-1);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

/// Still-image output format. Closed set; chosen from the destination
/// path's extension, defaulting to JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Pick the format from a destination path: `.png` (any case) is PNG,
    /// anything else is JPEG.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => ImageFormat::Png,
            _ => ImageFormat::Jpeg,
        }
    }

    /// Default file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

/// Asynchronous completion events delivered by the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A snapshot request finished and the file is on disk.
    Saved { id: RequestId, path: PathBuf },
    /// A snapshot request failed after dispatch.
    SaveError { id: RequestId, message: String },
    /// The bound device reported a streaming error.
    CameraError { message: String },
}

/// A capture session binding one device to a preview sink and an
/// image-capture sink.
///
/// Binding is exclusive: `bind` tears down any previous binding before
/// constructing the new one, so two bindings never overlap.
pub trait CaptureSession {
    /// Bind a device, replacing any existing binding. Does not start preview.
    fn bind(&mut self, device: &CameraInfo) -> Result<(), CameraError>;

    /// Tear down the current binding, if any.
    fn unbind(&mut self);

    /// Start streaming frames from the bound device.
    fn start(&mut self) -> Result<(), CameraError>;

    /// Stop streaming. The binding stays intact for a fast restart.
    fn stop(&mut self);

    /// Whether a device is currently bound.
    fn is_bound(&self) -> bool;

    /// Whether the bound device is currently streaming.
    fn is_active(&self) -> bool;

    /// Latest preview frame, if streaming has produced one.
    fn latest_frame(&self) -> Option<Frame>;

    /// Request a still-image capture to `path`.
    ///
    /// Returns [`RequestId::INVALID`] if the request is rejected immediately
    /// (no frame available yet); otherwise the request completes later with
    /// a [`SessionEvent::Saved`] or [`SessionEvent::SaveError`].
    fn capture_to_file(&mut self, path: &Path, format: ImageFormat) -> RequestId;

    /// Drain pending asynchronous events. Called once per UI frame.
    fn poll_events(&mut self) -> Vec<SessionEvent>;
}

/// Production session backed by nokhwa via [`CameraCapture`].
///
/// Snapshots encode the latest preview frame on a short-lived worker thread
/// (JPEG via `image`'s encoder at fixed quality, or PNG) and report back
/// over an internal channel.
pub struct NokhwaSession {
    camera: Option<CameraCapture>,
    settings: CameraSettings,
    next_id: i64,
    snapshot_tx: Sender<SessionEvent>,
    snapshot_rx: Receiver<SessionEvent>,
}

impl NokhwaSession {
    pub fn new(settings: CameraSettings) -> Self {
        let (snapshot_tx, snapshot_rx) = mpsc::channel();
        Self {
            camera: None,
            settings,
            next_id: 1,
            snapshot_tx,
            snapshot_rx,
        }
    }
}

impl CaptureSession for NokhwaSession {
    fn bind(&mut self, device: &CameraInfo) -> Result<(), CameraError> {
        // Strict teardown-then-construct so two bindings never overlap
        self.unbind();

        let settings = CameraSettings {
            device_index: device.index,
            ..self.settings.clone()
        };
        log::info!("Binding camera {}", device);
        self.camera = Some(CameraCapture::open(settings));
        Ok(())
    }

    fn unbind(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            log::info!("Unbinding camera {}", camera.settings().device_index);
            camera.stop();
        }
    }

    fn start(&mut self) -> Result<(), CameraError> {
        match self.camera.as_mut() {
            Some(camera) => camera.start(),
            None => Err(CameraError::NoDevices),
        }
    }

    fn stop(&mut self) {
        if let Some(camera) = self.camera.as_mut() {
            camera.stop();
        }
    }

    fn is_bound(&self) -> bool {
        self.camera.is_some()
    }

    fn is_active(&self) -> bool {
        self.camera.as_ref().is_some_and(|c| c.is_running())
    }

    fn latest_frame(&self) -> Option<Frame> {
        self.camera.as_ref().and_then(|c| c.latest_frame())
    }

    fn capture_to_file(&mut self, path: &Path, format: ImageFormat) -> RequestId {
        // No frame yet means there is nothing to encode: immediate rejection
        let Some(frame) = self.latest_frame() else {
            return RequestId::INVALID;
        };

        let id = RequestId(self.next_id);
        self.next_id += 1;

        let tx = self.snapshot_tx.clone();
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            let event = match encode_frame(&frame, &path, format) {
                Ok(()) => {
                    log::info!("Snapshot {} saved to {}", id.0, path.display());
                    SessionEvent::Saved { id, path }
                }
                Err(message) => {
                    log::error!("Snapshot {} failed: {}", id.0, message);
                    SessionEvent::SaveError { id, message }
                }
            };
            let _ = tx.send(event);
        });

        id
    }

    fn poll_events(&mut self) -> Vec<SessionEvent> {
        let mut events: Vec<SessionEvent> = self.snapshot_rx.try_iter().collect();

        if let Some(camera) = self.camera.as_ref() {
            for event in camera.drain_events() {
                let CameraEvent::Error(message) = event;
                events.push(SessionEvent::CameraError { message });
            }
        }

        events
    }
}

/// Encode an RGB frame to disk in the requested format.
fn encode_frame(frame: &Frame, path: &Path, format: ImageFormat) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
    let writer = BufWriter::new(file);

    let result = match format {
        ImageFormat::Png => PngEncoder::new(writer).write_image(
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgb8,
        ),
        ImageFormat::Jpeg => JpegEncoder::new_with_quality(writer, JPEG_QUALITY).write_image(
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgb8,
        ),
    };

    result.map_err(|e| format!("Failed to encode {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FrameFormat;
    use std::time::Instant;

    fn test_frame() -> Frame {
        Frame {
            data: vec![128; 4 * 4 * 3],
            width: 4,
            height: 4,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ImageFormat::from_path(Path::new("/tmp/shot.png")),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("/tmp/shot.PNG")),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("/tmp/shot.jpg")),
            ImageFormat::Jpeg
        );
        // Unknown or missing extensions default to JPEG
        assert_eq!(
            ImageFormat::from_path(Path::new("/tmp/shot.webp")),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("/tmp/shot")),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_request_id_sentinel() {
        assert!(!RequestId::INVALID.is_valid());
        assert!(RequestId(0).is_valid());
        assert!(RequestId(42).is_valid());
    }

    #[test]
    fn test_capture_without_binding_is_rejected() {
        let mut session = NokhwaSession::new(CameraSettings::default());
        let id = session.capture_to_file(Path::new("/tmp/shot.jpg"), ImageFormat::Jpeg);
        assert_eq!(id, RequestId::INVALID);
        // A rejected request never produces a later event
        assert!(session.poll_events().is_empty());
    }

    #[test]
    fn test_encode_frame_png_and_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let frame = test_frame();

        let png_path = dir.path().join("shot.png");
        encode_frame(&frame, &png_path, ImageFormat::Png).unwrap();
        let decoded = image::open(&png_path).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 4);

        let jpg_path = dir.path().join("shot.jpg");
        encode_frame(&frame, &jpg_path, ImageFormat::Jpeg).unwrap();
        assert!(jpg_path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn test_encode_frame_bad_directory() {
        let frame = test_frame();
        let result = encode_frame(
            &frame,
            Path::new("/nonexistent-dir/shot.jpg"),
            ImageFormat::Jpeg,
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to create"));
    }
}
