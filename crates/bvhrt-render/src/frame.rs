//! Tracing a whole image against a hierarchy.

use bvhrt::{Bvh, Intersection};
use log::debug;
use rayon::prelude::*;

use crate::camera::Camera;

/// Per-pixel closest hits in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    hits: Vec<Option<Intersection>>,
}

impl Frame {
    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All pixels, `hits[y * width + x]`.
    pub fn hits(&self) -> &[Option<Intersection>] {
        &self.hits
    }

    /// Hit at pixel `(x, y)`, `None` when out of range or missed.
    pub fn get(&self, x: u32, y: u32) -> Option<&Intersection> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.hits[y as usize * self.width as usize + x as usize].as_ref()
    }

    /// Fraction of pixels that hit something.
    pub fn coverage(&self) -> f32 {
        if self.hits.is_empty() {
            return 0.0;
        }
        let hit = self.hits.iter().filter(|h| h.is_some()).count();
        hit as f32 / self.hits.len() as f32
    }
}

/// Trace one primary ray per pixel, rows in parallel.
pub fn trace_frame(bvh: &Bvh<'_>, camera: &Camera) -> Frame {
    let width = camera.width() as usize;
    let height = camera.height() as usize;
    let mut hits = vec![None; width * height];

    hits.par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(y, row)| {
            for (x, pixel) in row.iter_mut().enumerate() {
                let ray = camera.primary_ray(x as u32, y as u32);
                *pixel = bvh.intersect_ray(&ray);
            }
        });

    let frame = Frame {
        width: camera.width(),
        height: camera.height(),
        hits,
    };

    debug!(
        "traced {}x{} frame, coverage {:.1}%",
        frame.width,
        frame.height,
        frame.coverage() * 100.0
    );

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RenderSettings;
    use bvhrt::Primitive;
    use bvhrt_math::{Point3, Vec3};

    /// Square of side 2 in the z = 0 plane, split into two triangles.
    fn square() -> Vec<Primitive> {
        let a = Point3::new(-1.0, -1.0, 0.0);
        let b = Point3::new(1.0, -1.0, 0.0);
        let c = Point3::new(1.0, 1.0, 0.0);
        let d = Point3::new(-1.0, 1.0, 0.0);
        vec![Primitive::triangle(a, b, c), Primitive::triangle(a, c, d)]
    }

    fn front_camera(width: u32, height: u32) -> Camera {
        Camera::new(&RenderSettings {
            width,
            height,
            eye: [0.0, 0.0, 5.0],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_center_pixel_hits_square() {
        let prims = square();
        let bvh = Bvh::build(&prims).unwrap();
        let frame = trace_frame(&bvh, &front_camera(9, 9));

        assert_eq!(frame.hits().len(), 81);
        let hit = frame.get(4, 4).unwrap();
        // t is measured along the near-to-far span
        assert!(hit.t > 0.0 && hit.t < 1.0);
        assert!(frame.get(9, 0).is_none());
    }

    #[test]
    fn test_coverage_is_partial() {
        // At distance 5 with a 45 degree fov the square fills the middle of the view
        let prims = square();
        let bvh = Bvh::build(&prims).unwrap();
        let frame = trace_frame(&bvh, &front_camera(32, 32));

        let coverage = frame.coverage();
        assert!(coverage > 0.1 && coverage < 0.9, "coverage {coverage}");
        assert!(frame.get(0, 0).is_none());
    }

    #[test]
    fn test_matches_serial_trace() {
        let prims = square();
        let bvh = Bvh::build(&prims).unwrap();
        let camera = Camera::new(&RenderSettings {
            width: 17,
            height: 11,
            eye: [1.0, 2.0, 6.0],
            ..Default::default()
        })
        .unwrap();
        let frame = trace_frame(&bvh, &camera);

        for y in 0..camera.height() {
            for x in 0..camera.width() {
                let ray = camera.primary_ray(x, y);
                assert_eq!(frame.get(x, y).copied(), bvh.intersect_ray(&ray));
            }
        }
    }

    #[test]
    fn test_rows_are_row_major() {
        // A horizontal strip only covers the two middle rows
        let prims = vec![Primitive::parallelogram(
            Point3::new(-10.0, -0.3, 0.0),
            Vec3::new(20.0, 0.0, 0.0),
            Vec3::new(0.0, 0.6, 0.0),
        )];
        let bvh = Bvh::build(&prims).unwrap();
        let frame = trace_frame(&bvh, &front_camera(8, 8));

        for y in 0..8 {
            let row_hits = (0..8).filter(|&x| frame.get(x, y).is_some()).count();
            let expected = if y == 3 || y == 4 { 8 } else { 0 };
            assert_eq!(row_hits, expected, "row {y}");
        }
    }
}
