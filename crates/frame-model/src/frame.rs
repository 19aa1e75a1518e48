//! Frame descriptors: one decoded or synthesized frame.
//!
//! A descriptor pairs sequence metadata with a reference-counted pixel
//! payload. Cloning a descriptor never copies pixels; writing through
//! [`FrameDescriptor::data_mut`] copies the payload first whenever another
//! descriptor still references it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::key::format_key;
use crate::motion::ImageMotion;

/// Pixel geometry of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes from the start of one row to the start of the next.
    /// May exceed `width * bytes_per_pixel` because of row padding.
    pub line_stride: usize,
    /// Interleaved bytes per pixel (4 for RGBA/BGRA).
    pub bytes_per_pixel: usize,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32, line_stride: usize, bytes_per_pixel: usize) -> Self {
        Self {
            width,
            height,
            line_stride,
            bytes_per_pixel,
        }
    }

    /// Geometry with no row padding.
    pub fn packed(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        Self::new(
            width,
            height,
            width as usize * bytes_per_pixel,
            bytes_per_pixel,
        )
    }

    /// Four bytes per pixel, no padding.
    pub fn rgba(width: u32, height: u32) -> Self {
        Self::packed(width, height, 4)
    }

    /// Bytes of actual pixel data in one row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel
    }

    /// Minimum payload size for this geometry.
    pub fn required_bytes(&self) -> usize {
        self.height as usize * self.line_stride
    }

    /// Byte offset of pixel `(x, y)`.
    pub fn offset(&self, x: usize, y: usize) -> usize {
        y * self.line_stride + x * self.bytes_per_pixel
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::invalid_geometry(format!(
                "zero-sized frame {}x{}",
                self.width, self.height
            )));
        }
        if self.bytes_per_pixel == 0 {
            return Err(FrameError::invalid_geometry("zero bytes per pixel"));
        }
        if self.line_stride < self.row_bytes() {
            return Err(FrameError::invalid_geometry(format!(
                "line stride {} shorter than row of {} bytes",
                self.line_stride,
                self.row_bytes()
            )));
        }
        Ok(())
    }
}

/// Errors raised while building a frame descriptor.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Invalid frame geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("Payload too small: {actual} bytes, geometry needs {required}")]
    PayloadTooSmall { required: usize, actual: usize },
}

impl FrameError {
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: msg.into(),
        }
    }
}

/// Metadata and pixel payload for one frame.
#[derive(Clone)]
pub struct FrameDescriptor {
    frame_number: f64,

    /// Number of frames decoded so far in the source sequence.
    pub num_frames: u32,

    /// Total frames in the source sequence.
    pub total_frames: u32,

    /// Nominal playback rate of the source sequence.
    pub fps: f64,

    geometry: FrameGeometry,
    data: Arc<Vec<u8>>,

    /// Presentation time in microseconds.
    pub timestamp_micros: u64,

    source_id: String,
    has_zoom: bool,

    /// Last known motion relative to the previous reference frame.
    pub motion: ImageMotion,

    /// Free-form diagnostic note.
    pub debug: String,

    key: String,
}

impl FrameDescriptor {
    /// Create a descriptor that takes ownership of `data`.
    pub fn new(
        source_id: impl Into<String>,
        frame_number: f64,
        geometry: FrameGeometry,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        Self::from_shared(source_id, frame_number, geometry, Arc::new(data))
    }

    /// Create a descriptor over an already shared payload.
    pub fn from_shared(
        source_id: impl Into<String>,
        frame_number: f64,
        geometry: FrameGeometry,
        data: Arc<Vec<u8>>,
    ) -> Result<Self, FrameError> {
        geometry.validate()?;
        if data.len() < geometry.required_bytes() {
            return Err(FrameError::PayloadTooSmall {
                required: geometry.required_bytes(),
                actual: data.len(),
            });
        }

        let source_id = source_id.into();
        let key = format_key(&source_id, frame_number, false);
        Ok(Self {
            frame_number,
            num_frames: 0,
            total_frames: 0,
            fps: 0.0,
            geometry,
            data,
            timestamp_micros: 0,
            source_id,
            has_zoom: false,
            motion: ImageMotion::default(),
            debug: String::new(),
            key,
        })
    }

    /// Mark whether a zoom transform is in effect.
    pub fn with_zoom(mut self, has_zoom: bool) -> Self {
        self.has_zoom = has_zoom;
        self.refresh_key();
        self
    }

    pub fn with_timestamp_micros(mut self, timestamp_micros: u64) -> Self {
        self.timestamp_micros = timestamp_micros;
        self
    }

    pub fn with_sequence(mut self, num_frames: u32, total_frames: u32, fps: f64) -> Self {
        self.num_frames = num_frames;
        self.total_frames = total_frames;
        self.fps = fps;
        self
    }

    /// A descriptor for the same source and geometry at another position,
    /// carrying `data` as its payload.
    ///
    /// Motion and debug notes are reset; the timestamp is kept and is
    /// expected to be overwritten by the caller.
    pub fn derive(&self, frame_number: f64, data: Arc<Vec<u8>>) -> Result<Self, FrameError> {
        if data.len() < self.geometry.required_bytes() {
            return Err(FrameError::PayloadTooSmall {
                required: self.geometry.required_bytes(),
                actual: data.len(),
            });
        }
        let mut derived = Self {
            frame_number,
            data,
            motion: ImageMotion::default(),
            debug: String::new(),
            ..self.clone()
        };
        derived.refresh_key();
        Ok(derived)
    }

    fn refresh_key(&mut self) {
        self.key = format_key(&self.source_id, self.frame_number, self.has_zoom);
    }

    pub fn frame_number(&self) -> f64 {
        self.frame_number
    }

    /// Move the descriptor to another position; the key follows.
    pub fn set_frame_number(&mut self, frame_number: f64) {
        self.frame_number = frame_number;
        self.refresh_key();
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn has_zoom(&self) -> bool {
        self.has_zoom
    }

    /// Identity key, derived from source id, frame number, and zoom flag.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    pub fn height(&self) -> u32 {
        self.geometry.height
    }

    pub fn line_stride(&self) -> usize {
        self.geometry.line_stride
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.geometry.bytes_per_pixel
    }

    /// Payload size in bytes.
    pub fn total_bytes(&self) -> usize {
        self.data.len()
    }

    /// Presentation time in milliseconds.
    pub fn timestamp_millis(&self) -> u64 {
        self.timestamp_micros / 1_000
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The shared payload handle.
    pub fn shared_data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    /// Mutable access to the payload, copying it first if any other
    /// descriptor references the same buffer.
    pub fn data_mut(&mut self) -> &mut [u8] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    /// Whether both descriptors reference the same payload buffer.
    pub fn shares_payload_with(&self, other: &FrameDescriptor) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn same_geometry(&self, other: &FrameDescriptor) -> bool {
        self.geometry == other.geometry
    }

    /// Serializable summary without the payload.
    pub fn summary(&self) -> FrameSummary {
        FrameSummary {
            key: self.key.clone(),
            source_id: self.source_id.clone(),
            frame_number: self.frame_number,
            geometry: self.geometry,
            total_bytes: self.total_bytes(),
            timestamp_micros: self.timestamp_micros,
            timestamp_millis: self.timestamp_millis(),
            motion: self.motion,
            debug: self.debug.clone(),
        }
    }
}

impl fmt::Debug for FrameDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDescriptor")
            .field("key", &self.key)
            .field("frame_number", &self.frame_number)
            .field("geometry", &self.geometry)
            .field("total_bytes", &self.data.len())
            .field("timestamp_micros", &self.timestamp_micros)
            .field("motion", &self.motion)
            .finish_non_exhaustive()
    }
}

/// Payload-free view of a descriptor, for reports and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub key: String,
    pub source_id: String,
    pub frame_number: f64,
    pub geometry: FrameGeometry,
    pub total_bytes: usize,
    pub timestamp_micros: u64,
    pub timestamp_millis: u64,
    pub motion: ImageMotion,
    pub debug: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_frame(frame_number: f64) -> FrameDescriptor {
        let geometry = FrameGeometry::new(4, 2, 20, 4);
        FrameDescriptor::new("clip.mp4", frame_number, geometry, vec![7; 40]).unwrap()
    }

    #[test]
    fn test_new_derives_key() {
        let frame = small_frame(3.0);
        assert_eq!(frame.key(), "clip.mp4-3.000000");
        assert_eq!(frame.total_bytes(), 40);
        assert_eq!(frame.line_stride(), 20);
    }

    #[test]
    fn test_payload_must_cover_geometry() {
        let geometry = FrameGeometry::new(4, 2, 20, 4);
        let err = FrameDescriptor::new("clip.mp4", 0.0, geometry, vec![0; 39]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooSmall {
                required: 40,
                actual: 39
            }
        ));
    }

    #[test]
    fn test_empty_frames_cannot_be_built() {
        let err = FrameDescriptor::new("clip.mp4", 0.0, FrameGeometry::rgba(2, 2), vec![])
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooSmall { actual: 0, .. }));

        let err = FrameDescriptor::new("clip.mp4", 0.0, FrameGeometry::rgba(0, 0), vec![])
            .unwrap_err();
        assert!(matches!(err, FrameError::InvalidGeometry { .. }));

        let frame = small_frame(0.0);
        assert!(frame.derive(1.0, Arc::new(Vec::new())).is_err());
    }

    #[test]
    fn test_stride_shorter_than_row_is_rejected() {
        let geometry = FrameGeometry::new(4, 2, 12, 4);
        assert!(FrameDescriptor::new("clip.mp4", 0.0, geometry, vec![0; 64]).is_err());
        let zero = FrameGeometry::rgba(0, 2);
        assert!(FrameDescriptor::new("clip.mp4", 0.0, zero, vec![]).is_err());
    }

    #[test]
    fn test_key_follows_frame_number_and_zoom() {
        let mut frame = small_frame(3.0).with_zoom(true);
        assert_eq!(frame.key(), "clip.mp4-3.000000-z");
        frame.set_frame_number(3.5);
        assert_eq!(frame.key(), "clip.mp4-3.500000-z");
    }

    #[test]
    fn test_timestamp_resolutions_agree() {
        let frame = small_frame(0.0).with_timestamp_micros(1_234_567);
        assert_eq!(frame.timestamp_millis(), 1_234);
    }

    #[test]
    fn test_data_mut_copies_shared_payload() {
        let original = small_frame(1.0);
        let mut working = original.clone();
        assert!(working.shares_payload_with(&original));

        working.data_mut()[0] = 99;
        assert!(!working.shares_payload_with(&original));
        assert_eq!(original.data()[0], 7);
        assert_eq!(working.data()[0], 99);
    }

    #[test]
    fn test_data_mut_in_place_when_unique() {
        let mut frame = small_frame(1.0);
        let before = Arc::as_ptr(frame.shared_data());
        frame.data_mut()[1] = 1;
        assert_eq!(Arc::as_ptr(frame.shared_data()), before);
    }

    #[test]
    fn test_derive_keeps_identity_and_geometry() {
        let frame = small_frame(2.0)
            .with_zoom(true)
            .with_sequence(3, 100, 29.97)
            .with_timestamp_micros(66_733);
        let derived = frame.derive(2.5, Arc::new(vec![1; 40])).unwrap();
        assert_eq!(derived.key(), "clip.mp4-2.500000-z");
        assert!(derived.same_geometry(&frame));
        assert_eq!(derived.total_frames, 100);
        assert!(!derived.motion.valid);

        assert!(frame.derive(2.5, Arc::new(vec![1; 39])).is_err());
    }

    #[test]
    fn test_debug_omits_payload() {
        let text = format!("{:?}", small_frame(0.0));
        assert!(text.contains("total_bytes: 40"));
        assert!(!text.contains("7, 7"));
    }
}
