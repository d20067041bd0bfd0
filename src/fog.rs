//! Depth cueing and per-point color adjustment.

use crate::foundation::geom::DepthRange;

/// Fog parameters, independent of any particular depth range.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FogConfig {
    /// Fog thickness; 0 disables fogging entirely.
    pub fogginess: f64,
    /// Tone that distant points fade toward.
    pub fog_rgb: [f32; 3],
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            fogginess: 0.0,
            fog_rgb: [0.0, 0.0, 0.0],
        }
    }
}

/// Depth fog function for one rendering pass.
///
/// Attenuates a color toward the fog tone with depth: at fraction `f` of the
/// declared range the surviving clarity is `exp(-fogginess * f)`. Alpha is
/// left untouched; fog dims, it does not hide.
#[derive(Clone, Copy, Debug)]
pub struct Fogger {
    fogginess: f64,
    fog_rgb: [f32; 3],
    range: DepthRange,
}

impl Fogger {
    pub fn new(config: FogConfig, range: DepthRange) -> Self {
        Self {
            fogginess: config.fogginess.max(0.0),
            fog_rgb: config.fog_rgb,
            range,
        }
    }

    /// A fogger that leaves colors alone.
    pub fn none(range: DepthRange) -> Self {
        Self::new(FogConfig::default(), range)
    }

    pub fn is_clear(&self) -> bool {
        self.fogginess == 0.0
    }

    /// Adjust `rgba` in place for a point at depth `z`.
    pub fn fog_at(&self, z: f64, rgba: &mut [f32; 4]) {
        if self.is_clear() {
            return;
        }
        let clarity = (-self.fogginess * self.range.fraction(z)).exp() as f32;
        for (c, fog) in rgba[..3].iter_mut().zip(self.fog_rgb) {
            *c = *c * clarity + fog * (1.0 - clarity);
        }
    }
}

/// Per-point color adjustment driven by auxiliary coordinates.
///
/// Returning `false` marks the point as not visible (for example an
/// auxiliary coordinate out of its range); the volume drops it instead of
/// drawing it.
pub trait ColorTweaker {
    fn tweak(&self, aux: &[f64], rgba: &mut [f32; 4]) -> bool;
}
