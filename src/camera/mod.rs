//! Camera module for webcam access and live frame capture.
//!
//! This module provides the low-level camera layer:
//! - Device enumeration via [`DeviceRegistry`] / [`NokhwaRegistry`]
//! - Per-device capture via [`CameraCapture`]
//! - Configuration via [`CameraSettings`] and [`Resolution`]

mod capture;
mod capture_loop;
mod frame_utils;
mod registry;
mod types;

pub use capture::CameraCapture;
pub use registry::{DeviceRegistry, NokhwaRegistry};
pub use types::{
    CameraError, CameraEvent, CameraInfo, CameraSettings, Frame, FrameFormat, Resolution,
};
