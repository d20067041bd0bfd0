//! Reusable scratch buffers for the raster volume backends.

use image::RgbaImage;

/// Buffer pool shared across sequential rendering passes.
///
/// Owns the four per-channel float accumulator planes, the staging pixel
/// surface, and the packed-key array. These are expensive to allocate and to
/// reclaim, so a sequence of volumes should reuse one workspace; exclusive
/// use is enforced by the `&mut Workspace` borrow each volume holds for its
/// whole lifetime, so two volumes can never be active against the same
/// workspace at once.
#[derive(Debug)]
pub struct Workspace {
    xdim: usize,
    ydim: usize,
    accum: [Vec<f32>; 4],
    staging: RgbaImage,
    keys: Vec<u64>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            xdim: 0,
            ydim: 0,
            accum: std::array::from_fn(|_| Vec::new()),
            staging: RgbaImage::new(0, 0),
            keys: Vec::new(),
        }
    }

    /// Prepare buffers for a grid of `xdim * ydim` pixels.
    ///
    /// Requesting the dimensions already held zeroes the existing buffers in
    /// place; anything else discards them and allocates fresh ones.
    pub fn init(&mut self, xdim: usize, ydim: usize) {
        if xdim == self.xdim && ydim == self.ydim {
            for plane in &mut self.accum {
                plane.fill(0.0);
            }
            self.staging.fill(0);
        } else {
            self.xdim = xdim;
            self.ydim = ydim;
            let npix = xdim * ydim;
            self.accum = std::array::from_fn(|_| vec![0.0; npix]);
            self.staging = RgbaImage::new(xdim as u32, ydim as u32);
        }
        self.keys.clear();
    }

    /// As [`Workspace::init`], also reserving room for `capacity` packed
    /// point keys. The key array only regrows when the requested capacity
    /// exceeds what is already held.
    pub fn init_with_capacity(&mut self, xdim: usize, ydim: usize, capacity: usize) {
        self.init(xdim, ydim);
        if self.keys.capacity() < capacity {
            // Keys were cleared by init, so this reserves the full bound.
            self.keys.reserve_exact(capacity);
        }
    }

    pub(crate) fn parts(&mut self) -> (&mut [Vec<f32>; 4], &mut RgbaImage) {
        (&mut self.accum, &mut self.staging)
    }

    pub(crate) fn parts_with_keys(
        &mut self,
    ) -> (&mut [Vec<f32>; 4], &mut RgbaImage, &mut Vec<u64>) {
        (&mut self.accum, &mut self.staging, &mut self.keys)
    }

    pub(crate) fn keys_mut(&mut self) -> &mut Vec<u64> {
        &mut self.keys
    }
}
