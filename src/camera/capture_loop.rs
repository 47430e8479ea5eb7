//! Background capture thread implementation.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::frame_utils::{convert_to_rgb, mirror_horizontal};
use super::types::{CameraError, CameraEvent, CameraSettings, Frame};

/// Commands sent to the capture thread.
pub enum CaptureCommand {
    Stop,
}

/// Run the capture loop in a background thread.
///
/// Opens the camera and pumps frames into the shared buffer until told to
/// stop. Open failures and streaming errors are reported through `event_tx`,
/// the latter once per failure streak so a flaky device does not flood the
/// UI; an open failure ends the thread.
pub fn run_capture_loop(
    settings: CameraSettings,
    buffer: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    rx: Receiver<CaptureCommand>,
    event_tx: Sender<CameraEvent>,
) {
    let index = CameraIndex::Index(settings.device_index);

    let mut camera = match open_camera_with_fallback(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            log::error!("Failed to open camera {}: {}", settings.device_index, e);
            let _ = event_tx.send(CameraEvent::Error(e.to_string()));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let e = CameraError::StreamFailed(e.to_string());
        log::error!("Failed to open camera {}: {}", settings.device_index, e);
        let _ = event_tx.send(CameraEvent::Error(e.to_string()));
        return;
    }

    log::info!(
        "Camera {} streaming at {}x{} @{}fps",
        settings.device_index,
        camera.resolution().width(),
        camera.resolution().height(),
        camera.frame_rate()
    );

    let mut error_reported = false;

    while !stop.load(Ordering::Relaxed) {
        // Check for commands (non-blocking)
        if let Ok(CaptureCommand::Stop) = rx.try_recv() {
            break;
        }

        match camera.frame() {
            Ok(raw_frame) => {
                error_reported = false;

                // Conversion failures are transient; skip and take the next frame
                if let Some(mut frame) = convert_to_rgb(&raw_frame) {
                    if settings.mirror {
                        mirror_horizontal(&mut frame);
                    }

                    if let Ok(mut buf) = buffer.lock() {
                        *buf = Some(frame);
                    }
                }
            }
            Err(e) => {
                // One notification per failure streak
                if !error_reported {
                    error_reported = true;
                    log::warn!("Camera frame error: {}", e);
                    let _ = event_tx.send(CameraEvent::Error(e.to_string()));
                }
            }
        }

        // Small sleep to allow checking stop signal
        thread::sleep(Duration::from_millis(1));
    }

    let _ = camera.stop_stream();
}

/// Try to open a camera with multiple format fallback strategies.
fn open_camera_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    // In order of preference:
    // 1. Closest match with NV12 (native on macOS)
    // 2. Closest match with MJPEG (widely supported)
    // 3. Highest resolution available (let the camera pick the format)
    let format_attempts: Vec<RequestedFormat> = vec![
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height),
            NokhwaFrameFormat::NV12,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height),
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;

    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    let e = last_error.unwrap();
    let msg = e.to_string().to_lowercase();
    if msg.contains("permission")
        || msg.contains("denied")
        || msg.contains("authorization")
        || msg.contains("access")
    {
        Err(CameraError::PermissionDenied)
    } else {
        Err(CameraError::OpenFailed(e.to_string()))
    }
}
