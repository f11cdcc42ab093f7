//! Render configuration.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Image size and camera placement.
///
/// Missing fields in a TOML document take their [`Default`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Vertical field of view (degrees).
    pub fov_degrees: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Camera position.
    pub eye: [f32; 3],
    /// Point the camera looks at.
    pub target: [f32; 3],
    /// Up direction.
    pub up: [f32; 3],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            eye: [4.0, 1.0, 4.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

impl RenderSettings {
    /// Parse settings from TOML and validate them.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidSettings(
                "width and height must be positive".into(),
            ));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(RenderError::InvalidSettings(
                "fov_degrees must be between 0 and 180".into(),
            ));
        }
        if !(self.near > 0.0 && self.near.is_finite()) {
            return Err(RenderError::InvalidSettings("near must be positive".into()));
        }
        if !(self.far > self.near && self.far.is_finite()) {
            return Err(RenderError::InvalidSettings(
                "far must be greater than near".into(),
            ));
        }

        let finite = |v: &[f32; 3]| v.iter().all(|c| c.is_finite());
        if !(finite(&self.eye) && finite(&self.target) && finite(&self.up)) {
            return Err(RenderError::InvalidSettings(
                "eye, target and up must be finite".into(),
            ));
        }

        let forward = [
            self.target[0] - self.eye[0],
            self.target[1] - self.eye[1],
            self.target[2] - self.eye[2],
        ];
        if forward.iter().all(|&c| c == 0.0) {
            return Err(RenderError::InvalidSettings(
                "eye and target must differ".into(),
            ));
        }
        let [fx, fy, fz] = forward;
        let [ux, uy, uz] = self.up;
        let cross = [fy * uz - fz * uy, fz * ux - fx * uz, fx * uy - fy * ux];
        if cross.iter().all(|&c| c == 0.0) {
            return Err(RenderError::InvalidSettings(
                "up must not be parallel to the view direction".into(),
            ));
        }

        Ok(())
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
