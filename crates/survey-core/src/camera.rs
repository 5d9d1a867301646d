//! Camera models and overlap-derived ground spacing

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoreError, CoreResult};

/// Largest overlap/sidelap fraction accepted; higher values are clamped
pub const MAX_OVERLAP: f64 = 0.95;

/// Camera optics used to project the image footprint onto the ground
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub name: String,
    /// Sensor width in millimeters
    pub sensor_width_mm: f64,
    /// Sensor height in millimeters
    pub sensor_height_mm: f64,
    /// Focal length in millimeters
    pub focal_length_mm: f64,
    /// Image width in pixels
    pub image_width_px: u32,
    /// Image height in pixels
    pub image_height_px: u32,
    /// Pixel pitch in micrometers, alternate basis for GSD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_pitch_um: Option<f64>,
}

impl Camera {
    fn new(
        name: &str,
        sensor_width_mm: f64,
        sensor_height_mm: f64,
        focal_length_mm: f64,
        image_width_px: u32,
        image_height_px: u32,
        pixel_pitch_um: Option<f64>,
    ) -> Self {
        Self {
            name: name.to_string(),
            sensor_width_mm,
            sensor_height_mm,
            focal_length_mm,
            image_width_px,
            image_height_px,
            pixel_pitch_um,
        }
    }

    /// All built-in camera presets
    pub fn presets() -> Vec<Camera> {
        vec![
            Camera::new("DJI Mavic 3 Enterprise", 17.3, 13.0, 12.29, 5280, 3956, Some(3.3)),
            Camera::new("DJI Phantom 4 Pro", 13.2, 8.8, 8.8, 5472, 3648, Some(2.41)),
            Camera::new("DJI Mini 3 Pro", 9.7, 7.3, 6.72, 4032, 3024, None),
            Camera::new("Sony RX1R II", 35.9, 24.0, 35.0, 7952, 5304, Some(4.5)),
            Camera::new("Generic 1/2.3in", 6.3, 4.7, 4.5, 4000, 3000, None),
        ]
    }

    /// Look up a preset by name, ignoring case
    pub fn preset(name: &str) -> CoreResult<Camera> {
        Self::presets()
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CoreError::unknown_camera(name))
    }

    /// Reject optics that cannot produce a finite, non-zero footprint
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.focal_length_mm > 0.0) {
            return Err(CoreError::configuration_invalid(format!(
                "{}: focal length must be positive",
                self.name
            )));
        }
        if !(self.sensor_width_mm > 0.0 && self.sensor_height_mm > 0.0) {
            return Err(CoreError::configuration_invalid(format!(
                "{}: sensor dimensions must be positive",
                self.name
            )));
        }
        Ok(())
    }

    /// Ground sample distance in centimeters per pixel at `height_m`
    ///
    /// Uses the pixel pitch when the preset carries one, otherwise the sensor
    /// width divided across the image width. Never negative: a height at or
    /// below the ground gives zero.
    pub fn gsd_cm_per_px(&self, height_m: f64) -> f64 {
        let pixel_size_mm = match self.pixel_pitch_um {
            Some(pitch) => pitch / 1000.0,
            None => self.sensor_width_mm / self.image_width_px as f64,
        };
        // NaN from a zero focal length and sensor collapses to zero too
        (height_m * pixel_size_mm / self.focal_length_mm * 100.0).max(0.0)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Camera::new("DJI Mavic 3 Enterprise", 17.3, 13.0, 12.29, 5280, 3956, Some(3.3))
    }
}

/// Ground footprint and photo/line spacing for one camera configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    /// Footprint across track in meters
    pub footprint_width_m: f64,
    /// Footprint along track in meters
    pub footprint_height_m: f64,
    /// Distance between photo triggers along a leg
    pub along_track_m: f64,
    /// Distance between adjacent legs
    pub across_track_m: f64,
}

impl Spacing {
    /// Both spacings finite and positive
    pub fn is_valid(&self) -> bool {
        self.along_track_m.is_finite()
            && self.across_track_m.is_finite()
            && self.along_track_m > 0.0
            && self.across_track_m > 0.0
    }

    /// Surface a non-finite or negative spacing as a configuration error
    pub fn validate(&self) -> CoreResult<()> {
        if !self.along_track_m.is_finite() || !self.across_track_m.is_finite() {
            return Err(CoreError::configuration_invalid(format!(
                "spacing is not finite (along {}, across {})",
                self.along_track_m, self.across_track_m
            )));
        }
        let footprint = [self.footprint_width_m, self.footprint_height_m];
        if self.along_track_m < 0.0
            || self.across_track_m < 0.0
            || footprint.iter().any(|m| *m < 0.0)
        {
            return Err(CoreError::configuration_invalid(format!(
                "spacing is negative (along {}, across {})",
                self.along_track_m, self.across_track_m
            )));
        }
        Ok(())
    }
}

/// Project the camera footprint to the ground and derive photo/line spacing
///
/// `groundDim = height * sensorDim / focalLength`; the along-track spacing is
/// the footprint height reduced by `overlap`, the across-track spacing the
/// footprint width reduced by `sidelap`. A zero focal length propagates as a
/// non-finite spacing rather than being clamped. A footprint that would come
/// out negative (height below ground, negative optics) is zero, so every
/// spacing returned here is non-negative.
pub fn compute_spacing(height_m: f64, camera: &Camera, overlap: f64, sidelap: f64) -> Spacing {
    let overlap = overlap.clamp(0.0, MAX_OVERLAP);
    let sidelap = sidelap.clamp(0.0, MAX_OVERLAP);

    let footprint_width_m = (height_m * camera.sensor_width_mm / camera.focal_length_mm).max(0.0);
    let footprint_height_m = (height_m * camera.sensor_height_mm / camera.focal_length_mm).max(0.0);

    let spacing = Spacing {
        footprint_width_m,
        footprint_height_m,
        along_track_m: footprint_height_m * (1.0 - overlap),
        across_track_m: footprint_width_m * (1.0 - sidelap),
    };

    if spacing.validate().is_err() {
        warn!(camera = %camera.name, "camera configuration yields unusable spacing");
    }

    spacing
}

// ============================================================================
// TESTS
// ============================================================================
