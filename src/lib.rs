#![forbid(unsafe_code)]
//! Depth-sorted point volume rendering for 3-D scatter plots.
//!
//! Upstream code projects table rows into screen space and hands this crate
//! an unordered stream of points: position, depth, style index, optional
//! error-bar offsets. A [`render::bitmap::BitmapVolume`],
//! [`render::packed::PackedVolume`], or [`render::vector::VectorVolume`]
//! turns that stream into a picture where nearer points correctly occlude or
//! blend over farther ones, whatever order they arrived in.
//!
//! ```
//! use image::RgbaImage;
//! use plotvol::{
//!     BitmapVolume, DepthRange, FogConfig, MarkShape, MarkStyle, PointVolume, Rgba, Workspace,
//! };
//!
//! let styles = vec![
//!     MarkStyle::new(MarkShape::FilledCircle, 2, Rgba::opaque(0.9, 0.2, 0.1), 4).unwrap(),
//! ];
//! let range = DepthRange::new(0.0, 1.0).unwrap();
//! let mut dest = RgbaImage::new(200, 200);
//! let mut ws = Workspace::new();
//!
//! let mut vol =
//!     BitmapVolume::new(&mut dest, &styles, range, FogConfig::default(), 0, &mut ws).unwrap();
//! vol.plot(100, 100, 0.3, 0);
//! vol.plot(102, 101, 0.7, 0);
//! vol.flush();
//! ```

pub mod fog;
pub mod foundation;
pub mod pack;
pub mod render;
pub mod style;

pub use fog::{ColorTweaker, FogConfig, Fogger};
pub use foundation::error::{PlotError, PlotResult};
pub use foundation::geom::{DepthRange, PixelRect, Rgba};
pub use render::PointVolume;
pub use render::bitmap::BitmapVolume;
pub use render::packed::PackedVolume;
pub use render::vector::{DrawSurface, VectorVolume};
pub use render::workspace::Workspace;
pub use style::error_bars::ErrorRenderer;
pub use style::{MarkShape, MarkStyle, PixelOffset, StyleDef};
