//! Pinhole camera producing primary rays.

use bvhrt::Ray;
use bvhrt_math::{Point3, Transform, Vec3, Vec4};

use crate::error::{RenderError, Result};
use crate::settings::RenderSettings;

/// Camera built from [`RenderSettings`].
///
/// Rays are generated by unprojecting pixel centers from normalized device
/// coordinates on the near and far planes.
#[derive(Debug, Clone)]
pub struct Camera {
    width: u32,
    height: u32,
    eye: Point3,
    to_world: Transform,
}

impl Camera {
    /// Build a camera; settings are validated first.
    pub fn new(settings: &RenderSettings) -> Result<Self> {
        settings.validate()?;

        let eye = Point3::from(settings.eye);
        let target = Point3::from(settings.target);
        let up = Vec3::from(settings.up);

        let projection = Transform::perspective(
            settings.fov_degrees.to_radians(),
            settings.aspect(),
            settings.near,
            settings.far,
        );
        let view = Transform::look_at(&eye, &target, &up);

        let to_world = projection.then(&view).inverse().ok_or_else(|| {
            RenderError::InvalidSettings("camera matrix is not invertible".into())
        })?;

        Ok(Self {
            width: settings.width,
            height: settings.height,
            eye,
            to_world,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Camera position.
    pub fn eye(&self) -> Point3 {
        self.eye
    }

    /// Ray through the center of pixel `(x, y)`.
    ///
    /// The origin lies on the near plane and the direction spans to the far
    /// plane, so hits have `t` in `[0, 1]` inside the view frustum.
    pub fn primary_ray(&self, x: u32, y: u32) -> Ray {
        let fx = (x as f32 + 0.5) / self.width as f32 * 2.0 - 1.0;
        let fy = (y as f32 + 0.5) / self.height as f32 * 2.0 - 1.0;

        let near = self.to_world.project(&Vec4::new(fx, fy, -1.0, 1.0));
        let far = self.to_world.project(&Vec4::new(fx, fy, 1.0, 1.0));

        Ray::new(near, far - near)
    }
}
