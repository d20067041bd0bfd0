//! Bitmap volume: alpha-composited raster rendering with error-bar support.

use image::RgbaImage;
use smallvec::SmallVec;
use tracing::debug;

use crate::fog::{FogConfig, Fogger};
use crate::foundation::error::PlotResult;
use crate::foundation::geom::DepthRange;
use crate::pack::{self, DepthScale};
use crate::render::composite::{accumulate, blit_over, normalize_into};
use crate::render::workspace::Workspace;
use crate::render::{PixelGrid, PointVolume, check_styles};
use crate::style::{MarkStyle, PixelOffset};

/// Per-point payload beyond the packed key, a closed set of kinds.
#[derive(Clone, Debug)]
enum PointKind {
    /// Marker shape only; coverage is the style's precomputed offsets.
    Marker,
    /// Error bars, whose coverage is point-specific and computed at flush.
    Decorated {
        show_marker: bool,
        offsets: SmallVec<[PixelOffset; 8]>,
    },
}

#[derive(Clone, Debug)]
struct BitmapPoint {
    key: u64,
    /// Submission sequence number, a stable tie-break for equal keys.
    seq: u32,
    kind: PointKind,
}

/// Raster point volume with full alpha compositing.
///
/// Points are stored as objects (they may carry error-bar offsets whose
/// coverage cannot be precomputed), sorted nearest-first by packed depth key
/// on flush, and composited front to back with early saturation: a pixel
/// already at full opacity is skipped, which is the principal performance
/// lever when many points overlap.
pub struct BitmapVolume<'a> {
    dest: &'a mut RgbaImage,
    ws: &'a mut Workspace,
    styles: &'a [MarkStyle],
    range: DepthRange,
    scale: DepthScale,
    fogger: Fogger,
    grid: PixelGrid,
    points: Vec<BitmapPoint>,
    dropped: u64,
}

impl<'a> BitmapVolume<'a> {
    /// Wire a fresh volume to a destination surface and a workspace.
    ///
    /// `margin` is extra working-grid padding beyond what the styles' marker
    /// radii already require. The workspace is initialized (reused if the
    /// grid size is unchanged) and exclusively borrowed until flush.
    pub fn new(
        dest: &'a mut RgbaImage,
        styles: &'a [MarkStyle],
        range: DepthRange,
        fog: FogConfig,
        margin: u32,
        ws: &'a mut Workspace,
    ) -> PlotResult<Self> {
        check_styles(styles)?;
        let grid = PixelGrid::for_canvas(dest.width(), dest.height(), styles, margin);
        ws.init(grid.xdim, grid.ydim);
        Ok(Self {
            dest,
            ws,
            styles,
            range,
            scale: DepthScale::new(range),
            fogger: Fogger::new(fog, range),
            grid,
            points: Vec::new(),
            dropped: 0,
        })
    }

    fn admit(&mut self, x: i32, y: i32, z: f64) -> bool {
        // Centers off the canvas are dropped along with unpackable ones:
        // marker coverage is only guaranteed in-bounds for on-canvas centers.
        let ok = pack::admissible(x, y, z, self.range) && self.grid.contains_center(x, y);
        if !ok {
            self.dropped += 1;
        }
        ok
    }

    /// Composite all submitted points and write the result onto the
    /// destination surface.
    pub fn flush(mut self) {
        let npoints = self.points.len();
        self.points.sort_unstable_by_key(|p| (p.key, p.seq));

        let grid = self.grid;
        let (planes, staging) = self.ws.parts();
        for point in &self.points {
            let x = pack::decode_x(point.key);
            let y = pack::decode_y(point.key);
            let istyle = pack::decode_style(point.key);
            let z = self.scale.dequantize(pack::decode_zq(point.key));
            let style = &self.styles[istyle];

            let mut rgba = style.base_rgba();
            self.fogger.fog_at(z, &mut rgba);

            let base = grid.base(x, y);
            match &point.kind {
                PointKind::Marker => {
                    accumulate(planes, grid.xdim, base, style.pixel_offsets().iter().copied(), rgba);
                }
                PointKind::Decorated {
                    show_marker,
                    offsets,
                } => {
                    let renderer = style.error_renderer().unwrap_or_default();
                    let mut coverage = renderer.pixels(grid.clip_for(x, y), offsets);
                    if *show_marker {
                        coverage.extend_from_slice(style.pixel_offsets());
                        // One point must not touch a pixel twice: the bars
                        // can cross the marker shape.
                        coverage.sort_unstable();
                        coverage.dedup();
                    }
                    accumulate(planes, grid.xdim, base, coverage.into_iter(), rgba);
                }
            }
        }

        normalize_into(planes, staging);
        blit_over(staging, self.dest, &grid);
        debug!(
            points = npoints,
            dropped = self.dropped,
            xdim = grid.xdim,
            ydim = grid.ydim,
            "bitmap volume flushed"
        );
    }
}

impl PointVolume for BitmapVolume<'_> {
    fn plot(&mut self, x: i32, y: i32, z: f64, istyle: usize) {
        if !self.admit(x, y, z) {
            return;
        }
        let key = pack::encode(x, y, self.scale.quantize(z), istyle);
        let seq = self.points.len() as u32;
        self.points.push(BitmapPoint {
            key,
            seq,
            kind: PointKind::Marker,
        });
    }

    fn plot_with_errors(
        &mut self,
        x: i32,
        y: i32,
        z: f64,
        istyle: usize,
        show_marker: bool,
        error_offsets: &[PixelOffset],
    ) {
        if !self.admit(x, y, z) {
            return;
        }
        if error_offsets.is_empty() && !show_marker {
            // Nothing to draw.
            self.dropped += 1;
            return;
        }
        let key = pack::encode(x, y, self.scale.quantize(z), istyle);
        let seq = self.points.len() as u32;
        self.points.push(BitmapPoint {
            key,
            seq,
            kind: PointKind::Decorated {
                show_marker,
                offsets: SmallVec::from_slice(error_offsets),
            },
        });
    }
}
