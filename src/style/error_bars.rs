//! Error-bar rendering.
//!
//! Unlike marker shapes, error-bar coverage depends on each point's own
//! endpoint offsets and cannot be precomputed per style; pixels are produced
//! on demand at flush time, clipped to the working grid.

use kurbo::BezPath;

use crate::foundation::geom::PixelRect;
use crate::style::PixelOffset;

/// How error bars are drawn around a point, a closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorRenderer {
    /// Plain lines from the point's center to each endpoint offset.
    Lines,
    /// Lines with a perpendicular crossbar of half-length `cap` pixels at
    /// each endpoint.
    CappedLines { cap: u32 },
}

impl Default for ErrorRenderer {
    fn default() -> Self {
        Self::Lines
    }
}

impl ErrorRenderer {
    /// Pixel offsets (relative to the point's center) covered by error bars
    /// with the given endpoint offsets, deduplicated and clipped to `clip`.
    ///
    /// `clip` is expressed in the same center-relative coordinates as the
    /// offsets.
    pub fn pixels(self, clip: PixelRect, offsets: &[PixelOffset]) -> Vec<PixelOffset> {
        let mut out = Vec::new();
        for &(ex, ey) in offsets {
            if (ex, ey) == (0, 0) {
                continue;
            }
            line_pixels(0, 0, ex, ey, clip, &mut out);
            if let ErrorRenderer::CappedLines { cap } = self {
                let c = cap as i32;
                if c > 0 {
                    // Crossbar runs perpendicular to the dominant direction.
                    if ex.abs() >= ey.abs() {
                        line_pixels(ex, ey - c, ex, ey + c, clip, &mut out);
                    } else {
                        line_pixels(ex - c, ey, ex + c, ey, clip, &mut out);
                    }
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Error-bar geometry as line segments, for vector destinations.
    pub fn path(self, offsets: &[PixelOffset]) -> BezPath {
        let mut p = BezPath::new();
        for &(ex, ey) in offsets {
            if (ex, ey) == (0, 0) {
                continue;
            }
            let (fx, fy) = (f64::from(ex), f64::from(ey));
            p.move_to((0.0, 0.0));
            p.line_to((fx, fy));
            if let ErrorRenderer::CappedLines { cap } = self {
                let c = f64::from(cap);
                if c > 0.0 {
                    if ex.abs() >= ey.abs() {
                        p.move_to((fx, fy - c));
                        p.line_to((fx, fy + c));
                    } else {
                        p.move_to((fx - c, fy));
                        p.line_to((fx + c, fy));
                    }
                }
            }
        }
        p
    }
}

/// Bresenham line rasterization, emitting only pixels inside `clip`.
fn line_pixels(x0: i32, y0: i32, x1: i32, y1: i32, clip: PixelRect, out: &mut Vec<PixelOffset>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    loop {
        if clip.contains(x, y) {
            out.push((x, y));
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
