#![warn(missing_docs)]

//! Host-side drivers around the bvhrt core.
//!
//! Turns [`RenderSettings`] into a [`Camera`], traces one primary ray per
//! pixel against a [`bvhrt::Bvh`] on the rayon pool, and builds the
//! [`ZOrder`] tables a GPU kernel uses to map thread ids to pixels.
//!
//! # Example
//!
//! ```
//! use bvhrt::{Bvh, Primitive};
//! use bvhrt_math::Point3;
//! use bvhrt_render::{trace_frame, Camera, RenderSettings};
//!
//! let prims = vec![Primitive::triangle(
//!     Point3::new(-1.0, -1.0, 0.0),
//!     Point3::new(1.0, -1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! )];
//! let bvh = Bvh::build(&prims).unwrap();
//!
//! let settings = RenderSettings::from_toml_str("width = 16\nheight = 16\neye = [0.0, 0.0, 5.0]").unwrap();
//! let camera = Camera::new(&settings).unwrap();
//! let frame = trace_frame(&bvh, &camera);
//! assert!(frame.coverage() > 0.0);
//! ```

pub mod camera;
pub mod error;
pub mod frame;
pub mod settings;
pub mod zorder;

pub use camera::Camera;
pub use error::{RenderError, Result};
pub use frame::{trace_frame, Frame};
pub use settings::RenderSettings;
pub use zorder::ZOrder;
