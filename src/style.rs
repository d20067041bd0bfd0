//! Marker styles: shape, color, opacity, and precomputed pixel coverage.

pub mod error_bars;

use std::collections::BTreeSet;

use kurbo::{BezPath, Circle, Rect, Shape};

use crate::foundation::error::{PlotError, PlotResult};
use crate::foundation::geom::Rgba;
use crate::style::error_bars::ErrorRenderer;

/// Pixel offset relative to a marker's center.
pub type PixelOffset = (i32, i32);

const PATH_TOLERANCE: f64 = 0.1;

/// Marker shapes, a closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MarkShape {
    FilledCircle,
    OpenCircle,
    FilledSquare,
    OpenSquare,
    FilledDiamond,
    OpenDiamond,
    Cross,
    X,
}

impl MarkShape {
    /// Duplicate-free pixel offsets covering this shape at the given size.
    ///
    /// `size` is the shape's pixel radius; size 0 degenerates to a single
    /// pixel for every shape.
    pub fn pixel_offsets(self, size: u32) -> Vec<PixelOffset> {
        let r = size as i32;
        if r == 0 {
            return vec![(0, 0)];
        }
        let mut pixels = BTreeSet::new();
        match self {
            MarkShape::FilledCircle => {
                for y in -r..=r {
                    for x in -r..=r {
                        if x * x + y * y <= r * r {
                            pixels.insert((x, y));
                        }
                    }
                }
            }
            MarkShape::OpenCircle => {
                for y in -r..=r {
                    for x in -r..=r {
                        let d2 = x * x + y * y;
                        if d2 <= r * r && d2 > (r - 1) * (r - 1) {
                            pixels.insert((x, y));
                        }
                    }
                }
            }
            MarkShape::FilledSquare => {
                for y in -r..=r {
                    for x in -r..=r {
                        pixels.insert((x, y));
                    }
                }
            }
            MarkShape::OpenSquare => {
                for i in -r..=r {
                    pixels.insert((i, -r));
                    pixels.insert((i, r));
                    pixels.insert((-r, i));
                    pixels.insert((r, i));
                }
            }
            MarkShape::FilledDiamond => {
                for y in -r..=r {
                    for x in -r..=r {
                        if x.abs() + y.abs() <= r {
                            pixels.insert((x, y));
                        }
                    }
                }
            }
            MarkShape::OpenDiamond => {
                for y in -r..=r {
                    for x in -r..=r {
                        if x.abs() + y.abs() == r {
                            pixels.insert((x, y));
                        }
                    }
                }
            }
            MarkShape::Cross => {
                for i in -r..=r {
                    pixels.insert((i, 0));
                    pixels.insert((0, i));
                }
            }
            MarkShape::X => {
                for i in -r..=r {
                    pixels.insert((i, i));
                    pixels.insert((i, -i));
                }
            }
        }
        pixels.into_iter().collect()
    }

    /// Outline geometry centered at the origin, for vector destinations.
    pub fn outline_path(self, size: u32) -> BezPath {
        let r = f64::from(size) + 0.5;
        match self {
            MarkShape::FilledCircle | MarkShape::OpenCircle => {
                Circle::new((0.0, 0.0), r).to_path(PATH_TOLERANCE)
            }
            MarkShape::FilledSquare | MarkShape::OpenSquare => {
                Rect::new(-r, -r, r, r).to_path(PATH_TOLERANCE)
            }
            MarkShape::FilledDiamond | MarkShape::OpenDiamond => {
                let mut p = BezPath::new();
                p.move_to((-r, 0.0));
                p.line_to((0.0, -r));
                p.line_to((r, 0.0));
                p.line_to((0.0, r));
                p.close_path();
                p
            }
            MarkShape::Cross => {
                let mut p = BezPath::new();
                p.move_to((-r, 0.0));
                p.line_to((r, 0.0));
                p.move_to((0.0, -r));
                p.line_to((0.0, r));
                p
            }
            MarkShape::X => {
                let mut p = BezPath::new();
                p.move_to((-r, -r));
                p.line_to((r, r));
                p.move_to((-r, r));
                p.line_to((r, -r));
                p
            }
        }
    }

    /// Whether the shape is drawn as a filled region (vs a stroked outline).
    pub fn is_filled(self) -> bool {
        matches!(
            self,
            MarkShape::FilledCircle | MarkShape::FilledSquare | MarkShape::FilledDiamond
        )
    }
}

/// Serializable marker style definition.
///
/// This is the configuration-level form; [`StyleDef::build`] validates it and
/// precomputes the pixel coverage into a runtime [`MarkStyle`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StyleDef {
    pub shape: MarkShape,
    pub size: u32,
    pub color: Rgba,
    /// Number of fully-overlapping points of this style needed to reach full
    /// opacity; must be >= 1.
    #[serde(default = "default_opaque_limit")]
    pub opaque_limit: u32,
    #[serde(default)]
    pub error_renderer: Option<ErrorRenderer>,
}

fn default_opaque_limit() -> u32 {
    1
}

impl StyleDef {
    pub fn build(&self) -> PlotResult<MarkStyle> {
        let mut style = MarkStyle::new(self.shape, self.size, self.color, self.opaque_limit)?;
        if let Some(er) = self.error_renderer {
            style = style.with_error_renderer(er);
        }
        Ok(style)
    }
}

/// Immutable runtime marker style with precomputed pixel coverage.
///
/// Identity must not change during a rendering pass; volumes refer to styles
/// by index into the style list they were constructed with.
#[derive(Clone, Debug)]
pub struct MarkStyle {
    shape: MarkShape,
    size: u32,
    color: Rgba,
    opaque_limit: u32,
    pixoffs: Vec<PixelOffset>,
    max_radius: i32,
    error_renderer: Option<ErrorRenderer>,
}

impl MarkStyle {
    pub fn new(shape: MarkShape, size: u32, color: Rgba, opaque_limit: u32) -> PlotResult<Self> {
        if opaque_limit < 1 {
            return Err(PlotError::validation("opaque_limit must be >= 1"));
        }
        let pixoffs = shape.pixel_offsets(size);
        let max_radius = pixoffs
            .iter()
            .map(|&(x, y)| x.abs().max(y.abs()))
            .max()
            .unwrap_or(0);
        Ok(Self {
            shape,
            size,
            color,
            opaque_limit,
            pixoffs,
            max_radius,
            error_renderer: None,
        })
    }

    pub fn with_error_renderer(mut self, renderer: ErrorRenderer) -> Self {
        self.error_renderer = Some(renderer);
        self
    }

    pub fn shape(&self) -> MarkShape {
        self.shape
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn opaque_limit(&self) -> u32 {
        self.opaque_limit
    }

    /// Base color with the per-point alpha contribution `1 / opaque_limit`.
    pub fn base_rgba(&self) -> [f32; 4] {
        let [r, g, b, _] = self.color.0;
        [r, g, b, 1.0 / self.opaque_limit as f32]
    }

    /// Precomputed, duplicate-free pixel offsets for the marker shape.
    pub fn pixel_offsets(&self) -> &[PixelOffset] {
        &self.pixoffs
    }

    /// Maximum pixel distance from the center the marker can touch.
    pub fn max_radius(&self) -> i32 {
        self.max_radius
    }

    pub fn error_renderer(&self) -> Option<ErrorRenderer> {
        self.error_renderer
    }

    /// Marker outline centered at the origin, for vector destinations.
    pub fn outline_path(&self) -> BezPath {
        self.shape.outline_path(self.size)
    }
}
