//! Point-volume renderers.
//!
//! A volume accepts one rendering pass worth of depth-positioned points and,
//! on `flush`, produces a correctly occluded picture regardless of submission
//! order. Three backends implement the same submission contract with
//! different trade-offs:
//!
//! - [`bitmap::BitmapVolume`]: object-stored points, error bars, full alpha
//!   compositing.
//! - [`packed::PackedVolume`]: one packed `u64` per point, fastest, no error
//!   bars.
//! - [`vector::VectorVolume`]: no blending; depth-ordered opaque draw calls
//!   against a vector destination.
//!
//! `flush` consumes the volume, so flushing twice or submitting after a
//! flush is a compile error rather than a caller contract.

pub mod bitmap;
pub mod composite;
pub mod packed;
pub mod vector;
pub mod workspace;

use crate::foundation::error::{PlotError, PlotResult};
use crate::foundation::geom::PixelRect;
use crate::pack::STYLE_LIMIT;
use crate::style::{MarkStyle, PixelOffset};

/// Common submission surface for the three volume backends.
///
/// Points whose coordinates fall outside the packable range, or whose depth
/// falls outside the volume's declared `[zmin, zmax]`, are **silently
/// dropped** at submission. This is deliberate policy, not an error: it
/// keeps the hot path free of error plumbing, but it can mask upstream
/// projection bugs, so callers needing guaranteed inclusion must range-check
/// before submitting. Dropped-point counts are logged at debug level on
/// flush.
pub trait PointVolume {
    /// Submit a plain marker point.
    fn plot(&mut self, x: i32, y: i32, z: f64, istyle: usize);

    /// Submit a point with error-bar endpoint offsets relative to its
    /// center. `show_marker` controls whether the marker shape is drawn in
    /// addition to the bars.
    ///
    /// # Panics
    ///
    /// Panics on backends without error-bar support
    /// ([`packed::PackedVolume`]); that is a programmer error, not a
    /// recoverable condition.
    fn plot_with_errors(
        &mut self,
        x: i32,
        y: i32,
        z: f64,
        istyle: usize,
        show_marker: bool,
        error_offsets: &[PixelOffset],
    );
}

pub(crate) fn check_styles(styles: &[MarkStyle]) -> PlotResult<()> {
    if styles.is_empty() {
        return Err(PlotError::validation("style list must not be empty"));
    }
    if styles.len() > STYLE_LIMIT {
        return Err(PlotError::validation(format!(
            "style list has {} entries, limit is {STYLE_LIMIT}",
            styles.len()
        )));
    }
    Ok(())
}

/// Working pixel grid: the canvas plus a margin wide enough that any marker
/// whose center is on the canvas rasterizes fully in bounds.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PixelGrid {
    pub width: u32,
    pub height: u32,
    pub ppad: i32,
    pub xdim: usize,
    pub ydim: usize,
}

impl PixelGrid {
    pub(crate) fn for_canvas(width: u32, height: u32, styles: &[MarkStyle], margin: u32) -> Self {
        let mut ppad = 2;
        for style in styles {
            ppad = ppad.max(2 + 2 * style.max_radius());
        }
        ppad += margin as i32;
        Self {
            width,
            height,
            ppad,
            xdim: width as usize + 2 * ppad as usize,
            ydim: height as usize + 2 * ppad as usize,
        }
    }

    pub(crate) fn npix(&self) -> usize {
        self.xdim * self.ydim
    }

    /// True when a point center is on the canvas proper.
    pub(crate) fn contains_center(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as u32) < self.width && y >= 0 && (y as u32) < self.height
    }

    /// Linear grid index of a canvas position (which has margin applied).
    pub(crate) fn base(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.contains_center(x, y));
        (y + self.ppad) as usize * self.xdim + (x + self.ppad) as usize
    }

    /// The whole grid as a rect relative to a point center at `(x, y)`.
    ///
    /// Error-bar pixels clipped against this rect index the grid in bounds
    /// by construction.
    pub(crate) fn clip_for(&self, x: i32, y: i32) -> PixelRect {
        PixelRect::new(
            -self.ppad - x,
            -self.ppad - y,
            self.width as i32 + self.ppad - x,
            self.height as i32 + self.ppad - y,
        )
    }
}
