//! Vector volume: depth-ordered opaque draw calls, no blending.

use kurbo::{Affine, BezPath};
use smallvec::SmallVec;
use tracing::debug;

use crate::fog::{ColorTweaker, FogConfig, Fogger};
use crate::foundation::error::PlotResult;
use crate::foundation::geom::{DepthRange, Rgba};
use crate::pack::{self, DepthScale};
use crate::render::{PointVolume, check_styles};
use crate::style::{MarkStyle, PixelOffset};

/// Destination for vector drawing commands, e.g. a print/export surface.
pub trait DrawSurface {
    fn fill_path(&mut self, path: &BezPath, color: Rgba);
    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba);
}

#[derive(Clone, Debug)]
enum PointKind {
    Marker,
    Decorated {
        show_marker: bool,
        offsets: SmallVec<[PixelOffset; 8]>,
    },
}

#[derive(Clone, Debug)]
struct VectorPoint {
    key: u64,
    seq: u32,
    aux: SmallVec<[f64; 2]>,
    kind: PointKind,
}

/// Point volume that draws each point directly onto a vector destination.
///
/// On flush, points are sorted farthest-first and drawn with opaque
/// operations, so nearer markers simply overwrite farther ones: a plain
/// painter's algorithm with no alpha accumulation. Overlapping translucent
/// markers therefore occlude rather than blend; where blending matters, use
/// the bitmap volume.
///
/// An optional [`ColorTweaker`] adjusts each point's color from its
/// auxiliary coordinates before drawing; a point the tweaker reports as not
/// visible is dropped from the render.
pub struct VectorVolume<'a, S: DrawSurface> {
    surface: &'a mut S,
    styles: &'a [MarkStyle],
    range: DepthRange,
    scale: DepthScale,
    fogger: Fogger,
    tweaker: Option<&'a dyn ColorTweaker>,
    points: Vec<VectorPoint>,
    dropped: u64,
}

impl<'a, S: DrawSurface> VectorVolume<'a, S> {
    pub fn new(
        surface: &'a mut S,
        styles: &'a [MarkStyle],
        range: DepthRange,
        fog: FogConfig,
        tweaker: Option<&'a dyn ColorTweaker>,
    ) -> PlotResult<Self> {
        check_styles(styles)?;
        Ok(Self {
            surface,
            styles,
            range,
            scale: DepthScale::new(range),
            fogger: Fogger::new(fog, range),
            tweaker,
            points: Vec::new(),
            dropped: 0,
        })
    }

    /// Submit a plain marker point with auxiliary coordinates for the
    /// tweaker.
    pub fn plot_aux(&mut self, x: i32, y: i32, z: f64, istyle: usize, aux: &[f64]) {
        self.push(x, y, z, istyle, aux, PointKind::Marker);
    }

    /// Submit an error-bar point with auxiliary coordinates for the
    /// tweaker.
    #[allow(clippy::too_many_arguments)]
    pub fn plot_aux_with_errors(
        &mut self,
        x: i32,
        y: i32,
        z: f64,
        istyle: usize,
        aux: &[f64],
        show_marker: bool,
        error_offsets: &[PixelOffset],
    ) {
        if error_offsets.is_empty() && !show_marker {
            self.dropped += 1;
            return;
        }
        self.push(
            x,
            y,
            z,
            istyle,
            aux,
            PointKind::Decorated {
                show_marker,
                offsets: SmallVec::from_slice(error_offsets),
            },
        );
    }

    fn push(&mut self, x: i32, y: i32, z: f64, istyle: usize, aux: &[f64], kind: PointKind) {
        if !pack::admissible(x, y, z, self.range) {
            self.dropped += 1;
            return;
        }
        let key = pack::encode(x, y, self.scale.quantize(z), istyle);
        let seq = self.points.len() as u32;
        self.points.push(VectorPoint {
            key,
            seq,
            aux: SmallVec::from_slice(aux),
            kind,
        });
    }

    /// Draw all submitted points onto the destination, farthest first.
    pub fn flush(mut self) {
        let npoints = self.points.len();
        // Descending key order: farthest first, later submissions of equal
        // keys drawn last (on top).
        self.points
            .sort_unstable_by(|a, b| b.key.cmp(&a.key).then(a.seq.cmp(&b.seq)));

        let mut tweaked_away = 0u64;
        for point in &self.points {
            let x = pack::decode_x(point.key);
            let y = pack::decode_y(point.key);
            let istyle = pack::decode_style(point.key);
            let z = self.scale.dequantize(pack::decode_zq(point.key));
            let style = &self.styles[istyle];

            let [r, g, b, _] = style.color().0;
            let mut rgba = [r, g, b, 1.0];
            if let Some(tweaker) = self.tweaker
                && !tweaker.tweak(&point.aux, &mut rgba)
            {
                tweaked_away += 1;
                continue;
            }
            self.fogger.fog_at(z, &mut rgba);
            let color = Rgba(rgba);

            let to_center = Affine::translate((f64::from(x), f64::from(y)));
            match &point.kind {
                PointKind::Marker => {
                    draw_marker(self.surface, style, to_center, color);
                }
                PointKind::Decorated {
                    show_marker,
                    offsets,
                } => {
                    let renderer = style.error_renderer().unwrap_or_default();
                    let bars = to_center * renderer.path(offsets);
                    if !bars.elements().is_empty() {
                        self.surface.stroke_path(&bars, 1.0, color);
                    }
                    if *show_marker {
                        draw_marker(self.surface, style, to_center, color);
                    }
                }
            }
        }
        debug!(
            points = npoints,
            dropped = self.dropped,
            tweaked_away,
            "vector volume flushed"
        );
    }
}

fn draw_marker<S: DrawSurface>(surface: &mut S, style: &MarkStyle, to_center: Affine, color: Rgba) {
    let path = to_center * style.outline_path();
    if style.shape().is_filled() {
        surface.fill_path(&path, color);
    } else {
        surface.stroke_path(&path, 1.0, color);
    }
}

impl<S: DrawSurface> PointVolume for VectorVolume<'_, S> {
    fn plot(&mut self, x: i32, y: i32, z: f64, istyle: usize) {
        self.plot_aux(x, y, z, istyle, &[]);
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
        self.plot_aux_with_errors(x, y, z, istyle, &[], show_marker, error_offsets);
    }
}
