//! Packed volume: the fastest backend, one `u64` per point, no error bars.

use image::RgbaImage;
use tracing::debug;

use crate::fog::{FogConfig, Fogger};
use crate::foundation::error::PlotResult;
use crate::foundation::geom::DepthRange;
use crate::pack::{self, DepthScale};
use crate::render::composite::{accumulate, blit_over, normalize_into};
use crate::render::workspace::Workspace;
use crate::render::{PixelGrid, PointVolume, check_styles};
use crate::style::{MarkStyle, PixelOffset};

/// Raster point volume storing each point as a packed key in a primitive
/// array.
///
/// Same compositing algorithm as [`super::bitmap::BitmapVolume`], restricted
/// to plain marker points: no per-point heap objects exist, the depth sort
/// is an ordinary numeric sort of the key array, and fields are decoded on
/// the fly while compositing. The key array lives in the workspace,
/// preallocated to the caller-supplied upper bound on point count.
pub struct PackedVolume<'a> {
    dest: &'a mut RgbaImage,
    ws: &'a mut Workspace,
    styles: &'a [MarkStyle],
    range: DepthRange,
    scale: DepthScale,
    fogger: Fogger,
    grid: PixelGrid,
    dropped: u64,
}

impl<'a> PackedVolume<'a> {
    /// Wire a fresh volume to a destination surface and a workspace.
    ///
    /// `capacity` is an upper bound on the number of points that will be
    /// submitted; the workspace's key array is grown to it up front so the
    /// submission path never reallocates.
    pub fn new(
        dest: &'a mut RgbaImage,
        styles: &'a [MarkStyle],
        range: DepthRange,
        fog: FogConfig,
        margin: u32,
        capacity: usize,
        ws: &'a mut Workspace,
    ) -> PlotResult<Self> {
        check_styles(styles)?;
        let grid = PixelGrid::for_canvas(dest.width(), dest.height(), styles, margin);
        ws.init_with_capacity(grid.xdim, grid.ydim, capacity);
        Ok(Self {
            dest,
            ws,
            styles,
            range,
            scale: DepthScale::new(range),
            fogger: Fogger::new(fog, range),
            grid,
            dropped: 0,
        })
    }

    /// Composite all submitted points and write the result onto the
    /// destination surface.
    pub fn flush(self) {
        let grid = self.grid;
        let (planes, staging, keys) = self.ws.parts_with_keys();
        let npoints = keys.len();
        // Numeric ascending order is nearest-first: the quantized depth
        // occupies the high bits of every key.
        keys.sort_unstable();

        for &key in keys.iter() {
            let x = pack::decode_x(key);
            let y = pack::decode_y(key);
            let istyle = pack::decode_style(key);
            let z = self.scale.dequantize(pack::decode_zq(key));
            let style = &self.styles[istyle];

            let mut rgba = style.base_rgba();
            self.fogger.fog_at(z, &mut rgba);
            accumulate(
                planes,
                grid.xdim,
                grid.base(x, y),
                style.pixel_offsets().iter().copied(),
                rgba,
            );
        }

        normalize_into(planes, staging);
        blit_over(staging, self.dest, &grid);
        debug!(
            points = npoints,
            dropped = self.dropped,
            xdim = grid.xdim,
            ydim = grid.ydim,
            "packed volume flushed"
        );
    }
}

impl PointVolume for PackedVolume<'_> {
    fn plot(&mut self, x: i32, y: i32, z: f64, istyle: usize) {
        if !pack::admissible(x, y, z, self.range) || !self.grid.contains_center(x, y) {
            self.dropped += 1;
            return;
        }
        let key = pack::encode(x, y, self.scale.quantize(z), istyle);
        self.ws.keys_mut().push(key);
    }

    fn plot_with_errors(
        &mut self,
        _x: i32,
        _y: i32,
        _z: f64,
        _istyle: usize,
        _show_marker: bool,
        _error_offsets: &[PixelOffset],
    ) {
        panic!("error bars are not supported by the packed volume; use the bitmap volume");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::geom::Rgba;
    use crate::style::MarkShape;

    fn range() -> DepthRange {
        DepthRange::new(0.0, 1.0).unwrap()
    }

    fn dot(color: Rgba, limit: u32) -> MarkStyle {
        MarkStyle::new(MarkShape::FilledSquare, 0, color, limit).unwrap()
    }

    #[test]
    fn occlusion_matches_the_bitmap_semantics() {
        let styles = vec![
            dot(Rgba::opaque(1.0, 0.0, 0.0), 1),
            dot(Rgba::opaque(0.0, 0.0, 1.0), 1),
        ];
        for near_first in [true, false] {
            let mut dest = RgbaImage::new(8, 8);
            let mut ws = Workspace::new();
            let mut vol = PackedVolume::new(
                &mut dest,
                &styles,
                range(),
                FogConfig::default(),
                0,
                16,
                &mut ws,
            )
            .unwrap();
            if near_first {
                vol.plot(4, 4, 0.1, 0);
                vol.plot(4, 4, 0.9, 1);
            } else {
                vol.plot(4, 4, 0.9, 1);
                vol.plot(4, 4, 0.1, 0);
            }
            vol.flush();
            assert_eq!(dest.get_pixel(4, 4).0, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn translucent_blend_accumulates_front_to_back() {
        let styles = vec![
            dot(Rgba::opaque(1.0, 0.0, 0.0), 2),
            dot(Rgba::opaque(0.0, 0.0, 1.0), 2),
        ];
        let mut dest = RgbaImage::new(8, 8);
        let mut ws = Workspace::new();
        let mut vol = PackedVolume::new(
            &mut dest,
            &styles,
            range(),
            FogConfig::default(),
            0,
            16,
            &mut ws,
        )
        .unwrap();
        vol.plot(4, 4, 0.2, 0);
        vol.plot(4, 4, 0.8, 1);
        vol.flush();
        // Half red over half blue: equal weights, full final alpha.
        let px = dest.get_pixel(4, 4).0;
        assert_eq!(px[3], 255);
        assert_eq!(px[0], px[2], "equal red and blue contributions");
        assert!(px[0] > 0);
    }

    #[test]
    #[should_panic(expected = "not supported by the packed volume")]
    fn error_bar_submission_fails_fast() {
        let styles = vec![dot(Rgba::opaque(0.0, 0.0, 0.0), 1)];
        let mut dest = RgbaImage::new(8, 8);
        let mut ws = Workspace::new();
        let mut vol = PackedVolume::new(
            &mut dest,
            &styles,
            range(),
            FogConfig::default(),
            0,
            16,
            &mut ws,
        )
        .unwrap();
        vol.plot_with_errors(4, 4, 0.5, 0, true, &[(1, 0)]);
    }

    #[test]
    fn packable_but_off_canvas_points_are_dropped() {
        let styles = vec![dot(Rgba::opaque(1.0, 1.0, 1.0), 1)];
        let mut dest = RgbaImage::new(8, 8);
        let mut ws = Workspace::new();
        let mut vol = PackedVolume::new(
            &mut dest,
            &styles,
            range(),
            FogConfig::default(),
            0,
            16,
            &mut ws,
        )
        .unwrap();
        // Within the 12-bit packing range but outside the 8x8 canvas.
        vol.plot(600, 4, 0.5, 0);
        vol.plot(4, 600, 0.5, 0);
        vol.flush();
        assert!(dest.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn workspace_key_array_is_reused_across_volumes() {
        let styles = vec![dot(Rgba::opaque(1.0, 1.0, 1.0), 1)];
        let mut ws = Workspace::new();
        for _ in 0..3 {
            let mut dest = RgbaImage::new(8, 8);
            let mut vol = PackedVolume::new(
                &mut dest,
                &styles,
                range(),
                FogConfig::default(),
                0,
                1000,
                &mut ws,
            )
            .unwrap();
            for i in 0..100 {
                vol.plot(i % 8, (i / 8) % 8, 0.5, 0);
            }
            vol.flush();
            assert_eq!(dest.get_pixel(0, 0).0, [255, 255, 255, 255]);
        }
    }
}
