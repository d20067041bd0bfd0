//! Pixel accumulation and the final raster passes shared by the bitmap and
//! packed volumes.

use image::RgbaImage;
use rayon::prelude::*;

use crate::render::PixelGrid;
use crate::style::PixelOffset;

/// Straight-alpha source-over for 8-bit RGBA pixels.
pub fn over_rgba8(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(src[3]);
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = u32::from(dst[3]);
    // Combined alpha, scaled by 255 to stay in integers.
    let ra = sa * 255 + da * (255 - sa);
    if ra == 0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * da * (255 - sa);
        out[i] = ((num + ra / 2) / ra) as u8;
    }
    out[3] = ((ra + 127) / 255) as u8;
    out
}

/// Accumulate one point's coverage into the channel planes, front to back.
///
/// `rgba` is the point's fogged color with its per-point alpha contribution;
/// pixels already at full opacity are skipped, and the weight of the rest is
/// clamped to the remaining headroom.
pub(crate) fn accumulate(
    planes: &mut [Vec<f32>; 4],
    xdim: usize,
    base: usize,
    offsets: impl Iterator<Item = PixelOffset>,
    rgba: [f32; 4],
) {
    let [rbuf, gbuf, bbuf, abuf] = planes;
    for (dx, dy) in offsets {
        let ipix = (base as i64 + i64::from(dx) + i64::from(dy) * xdim as i64) as usize;
        let alpha = abuf[ipix];
        if alpha < 1.0 {
            let weight = (1.0 - alpha).min(rgba[3]);
            abuf[ipix] += weight;
            rbuf[ipix] += weight * rgba[0];
            gbuf[ipix] += weight * rgba[1];
            bbuf[ipix] += weight * rgba[2];
        }
    }
}

/// Un-premultiply the accumulated channels and write them into the staging
/// surface; untouched pixels stay fully transparent.
pub(crate) fn normalize_into(planes: &[Vec<f32>; 4], staging: &mut RgbaImage) {
    let [rbuf, gbuf, bbuf, abuf] = planes;
    let bytes: &mut [u8] = staging;
    bytes
        .par_chunks_exact_mut(4)
        .enumerate()
        .for_each(|(ipix, px)| {
            let a = abuf[ipix];
            if a > 0.0 {
                let inv = 1.0 / a;
                let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
                px[0] = q(rbuf[ipix] * inv);
                px[1] = q(gbuf[ipix] * inv);
                px[2] = q(bbuf[ipix] * inv);
                px[3] = q(a);
            } else {
                px.fill(0);
            }
        });
}

/// Source-over the canvas region of the staging surface onto the
/// destination, dropping the working margin.
pub(crate) fn blit_over(staging: &RgbaImage, dest: &mut RgbaImage, grid: &PixelGrid) {
    let ppad = grid.ppad as u32;
    let w = grid.width.min(dest.width());
    let h = grid.height.min(dest.height());
    for y in 0..h {
        for x in 0..w {
            let src = staging.get_pixel(x + ppad, y + ppad).0;
            if src[3] == 0 {
                continue;
            }
            let d = dest.get_pixel_mut(x, y);
            d.0 = over_rgba8(d.0, src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_src_transparent_is_noop() {
        let dst = [10, 20, 30, 40];
        assert_eq!(over_rgba8(dst, [255, 255, 255, 0]), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let src = [255, 0, 0, 255];
        assert_eq!(over_rgba8([0, 0, 0, 255], src), src);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let src = [100, 110, 120, 200];
        assert_eq!(over_rgba8([0, 0, 0, 0], src), src);
    }

    #[test]
    fn over_half_alpha_mixes_colors() {
        let out = over_rgba8([0, 0, 0, 255], [255, 255, 255, 128]);
        assert_eq!(out[3], 255);
        assert!((out[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn accumulate_respects_saturation() {
        let mut planes: [Vec<f32>; 4] = std::array::from_fn(|_| vec![0.0; 16]);
        let rgba = [1.0, 0.5, 0.0, 0.6];
        accumulate(&mut planes, 4, 5, [(0, 0)].into_iter(), rgba);
        accumulate(&mut planes, 4, 5, [(0, 0)].into_iter(), rgba);
        // Second deposit is clamped to the 0.4 headroom.
        assert!((planes[3][5] - 1.0).abs() < 1e-6);
        // Third deposit must change nothing.
        let before = planes[0][5];
        accumulate(&mut planes, 4, 5, [(0, 0)].into_iter(), rgba);
        assert_eq!(planes[0][5], before);
    }

    #[test]
    fn normalize_unpremultiplies() {
        let mut planes: [Vec<f32>; 4] = std::array::from_fn(|_| vec![0.0; 4]);
        planes[0][1] = 0.25; // r accumulated with weight 0.25
        planes[3][1] = 0.25;
        let mut staging = RgbaImage::new(2, 2);
        normalize_into(&planes, &mut staging);
        assert_eq!(staging.get_pixel(1, 0).0, [255, 0, 0, 64]);
        assert_eq!(staging.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }
}
