use crate::foundation::error::{PlotError, PlotResult};

/// Straight-alpha RGBA color, components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba([0.0, 0.0, 0.0, 0.0]);

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    /// Fully opaque color from RGB components.
    pub fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b, 1.0])
    }

    pub fn alpha(self) -> f32 {
        self.0[3]
    }

    /// Quantize to 8-bit straight-alpha RGBA, clamping each component.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.0[0]), q(self.0[1]), q(self.0[2]), q(self.0[3])]
    }

    pub fn from_rgba8(px: [u8; 4]) -> Self {
        let d = |c: u8| f32::from(c) / 255.0;
        Self([d(px[0]), d(px[1]), d(px[2]), d(px[3])])
    }
}

/// Declared `[zmin, zmax]` depth range for one rendering pass.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DepthRange {
    /// Nearest admissible depth.
    pub zmin: f64,
    /// Farthest admissible depth.
    pub zmax: f64,
}

impl DepthRange {
    /// Create a validated range with `zmin < zmax`, both finite.
    pub fn new(zmin: f64, zmax: f64) -> PlotResult<Self> {
        if !zmin.is_finite() || !zmax.is_finite() {
            return Err(PlotError::validation("DepthRange bounds must be finite"));
        }
        if zmin >= zmax {
            return Err(PlotError::validation("DepthRange zmin must be < zmax"));
        }
        Ok(Self { zmin, zmax })
    }

    pub fn span(self) -> f64 {
        self.zmax - self.zmin
    }

    /// Return `true` when `z` lies inside `[zmin, zmax]`.
    pub fn contains(self, z: f64) -> bool {
        z >= self.zmin && z <= self.zmax
    }

    /// Position of `z` within the range as a fraction in `[0, 1]`.
    pub fn fraction(self, z: f64) -> f64 {
        ((z - self.zmin) / self.span()).clamp(0.0, 1.0)
    }
}

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Shift both corners by `(dx, dy)`.
    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_range_rejects_degenerate_bounds() {
        assert!(DepthRange::new(0.0, 0.0).is_err());
        assert!(DepthRange::new(1.0, 0.0).is_err());
        assert!(DepthRange::new(f64::NAN, 1.0).is_err());
        assert!(DepthRange::new(0.0, f64::INFINITY).is_err());
        assert!(DepthRange::new(-1.0, 1.0).is_ok());
    }

    #[test]
    fn depth_range_contains_is_inclusive() {
        let r = DepthRange::new(0.0, 2.0).unwrap();
        assert!(r.contains(0.0));
        assert!(r.contains(2.0));
        assert!(!r.contains(2.0 + 1e-9));
        assert!(!r.contains(-1e-9));
    }

    #[test]
    fn rgba8_round_trip_is_exact_at_endpoints() {
        assert_eq!(Rgba::opaque(1.0, 0.0, 0.5).to_rgba8(), [255, 0, 128, 255]);
        assert_eq!(Rgba::TRANSPARENT.to_rgba8(), [0, 0, 0, 0]);
        let c = Rgba::from_rgba8([12, 34, 56, 78]);
        assert_eq!(c.to_rgba8(), [12, 34, 56, 78]);
    }

    #[test]
    fn pixel_rect_translate_and_contains() {
        let r = PixelRect::new(0, 0, 4, 4).translate(-2, -2);
        assert!(r.contains(-2, -2));
        assert!(r.contains(1, 1));
        assert!(!r.contains(2, 2));
    }
}
