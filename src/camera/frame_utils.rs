//! Frame conversion and transformation utilities.

use nokhwa::pixel_format::RgbFormat;
use std::time::Instant;

use super::types::{Frame, FrameFormat};

/// Convert a nokhwa buffer to our RGB `Frame` type.
///
/// Cameras deliver MJPEG, YUYV, NV12 and friends; nokhwa's `decode_image`
/// normalizes all of them to RGB. Returns `None` if decoding fails
/// (unsupported format or corrupt data), in which case the frame is dropped
/// and the next one is used instead.
pub fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame {
        data: decoded.into_raw(),
        width: resolution.width(),
        height: resolution.height(),
        format: FrameFormat::Rgb,
        timestamp: Instant::now(),
    })
}

/// Mirror a frame horizontally (flip left-right) for selfie-style preview.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let bpp = frame.bytes_per_pixel();
    let row_len = width * bpp;

    for row in frame.data.chunks_exact_mut(row_len) {
        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}
