use image::RgbaImage;
use plotvol::{
    BitmapVolume, DepthRange, DrawSurface, FogConfig, MarkShape, MarkStyle, PackedVolume,
    PointVolume, Rgba, VectorVolume, Workspace,
};

/// Make the volumes' flush statistics visible under `--nocapture`.
///
/// `try_init` because the subscriber is process-global and tests share one
/// process.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic pseudo-random stream for test point clouds.
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(mix64(seed ^ 0x9E37_79B9_7F4A_7C15))
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = mix64(self.0.wrapping_add(0x9E37_79B9_7F4A_7C15));
        self.0
    }

    fn int(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }

    fn unit_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn four_styles() -> Vec<MarkStyle> {
    let colors = [
        Rgba::opaque(1.0, 0.0, 0.0),
        Rgba::opaque(0.0, 1.0, 0.0),
        Rgba::opaque(0.0, 0.0, 1.0),
        Rgba::opaque(1.0, 1.0, 0.0),
    ];
    let limits = [1, 2, 4, 8];
    colors
        .iter()
        .zip(limits)
        .map(|(&c, lim)| MarkStyle::new(MarkShape::FilledCircle, 2, c, lim).unwrap())
        .collect()
}

struct Cloud {
    points: Vec<(i32, i32, f64, usize)>,
}

fn cloud(seed: u64, n: usize, extent: u64, nstyles: usize) -> Cloud {
    let mut rng = Rng::new(seed);
    let points = (0..n)
        .map(|_| {
            (
                rng.int(extent) as i32,
                rng.int(extent) as i32,
                rng.unit_f64(),
                rng.int(nstyles as u64) as usize,
            )
        })
        .collect();
    Cloud { points }
}

#[test]
fn end_to_end_bitmap_stays_in_gamut() {
    init_tracing();
    let styles = four_styles();
    let range = DepthRange::new(0.0, 1.0).unwrap();
    let mut dest = RgbaImage::new(500, 500);
    let mut ws = Workspace::new();
    let mut vol =
        BitmapVolume::new(&mut dest, &styles, range, FogConfig::default(), 0, &mut ws).unwrap();
    for &(x, y, z, s) in &cloud(42, 1000, 500, 4).points {
        vol.plot(x, y, z, s);
    }
    vol.flush();

    let mut colored = 0usize;
    for p in dest.pixels() {
        let [r, g, b, a] = p.0;
        if a == 0 {
            assert_eq!([r, g, b], [0, 0, 0], "transparent pixels stay background");
        } else {
            colored += 1;
        }
    }
    assert!(colored > 1000, "1000 radius-2 markers must color many pixels");
}

#[test]
fn final_picture_is_independent_of_submission_order() {
    init_tracing();
    let styles = four_styles();
    let range = DepthRange::new(0.0, 1.0).unwrap();
    let cloud = cloud(7, 500, 200, 4);

    let render = |points: &[(i32, i32, f64, usize)]| {
        let mut dest = RgbaImage::new(200, 200);
        let mut ws = Workspace::new();
        let mut vol =
            BitmapVolume::new(&mut dest, &styles, range, FogConfig::default(), 0, &mut ws)
                .unwrap();
        for &(x, y, z, s) in points {
            vol.plot(x, y, z, s);
        }
        vol.flush();
        dest
    };

    let forward = render(&cloud.points);
    let mut reversed = cloud.points.clone();
    reversed.reverse();
    let backward = render(&reversed);
    assert_eq!(forward.as_raw(), backward.as_raw());
}

#[test]
fn packed_and_bitmap_backends_agree_on_plain_points() {
    init_tracing();
    let styles = four_styles();
    let range = DepthRange::new(0.0, 1.0).unwrap();
    let cloud = cloud(99, 800, 300, 4);

    let mut bitmap_dest = RgbaImage::new(300, 300);
    let mut ws = Workspace::new();
    let mut vol = BitmapVolume::new(
        &mut bitmap_dest,
        &styles,
        range,
        FogConfig::default(),
        0,
        &mut ws,
    )
    .unwrap();
    for &(x, y, z, s) in &cloud.points {
        vol.plot(x, y, z, s);
    }
    vol.flush();

    let mut packed_dest = RgbaImage::new(300, 300);
    let mut vol = PackedVolume::new(
        &mut packed_dest,
        &styles,
        range,
        FogConfig::default(),
        0,
        cloud.points.len(),
        &mut ws,
    )
    .unwrap();
    for &(x, y, z, s) in &cloud.points {
        vol.plot(x, y, z, s);
    }
    vol.flush();

    assert_eq!(bitmap_dest.as_raw(), packed_dest.as_raw());
}

#[test]
fn one_workspace_serves_sequential_volumes_of_mixed_kinds() {
    init_tracing();
    let styles = four_styles();
    let range = DepthRange::new(0.0, 1.0).unwrap();
    let mut ws = Workspace::new();
    let mut last = None;
    for pass in 0..4 {
        let mut dest = RgbaImage::new(120, 120);
        let points = cloud(5, 300, 120, 4).points;
        if pass % 2 == 0 {
            let mut vol =
                BitmapVolume::new(&mut dest, &styles, range, FogConfig::default(), 0, &mut ws)
                    .unwrap();
            for &(x, y, z, s) in &points {
                vol.plot(x, y, z, s);
            }
            vol.flush();
        } else {
            let mut vol = PackedVolume::new(
                &mut dest,
                &styles,
                range,
                FogConfig::default(),
                0,
                points.len(),
                &mut ws,
            )
            .unwrap();
            for &(x, y, z, s) in &points {
                vol.plot(x, y, z, s);
            }
            vol.flush();
        }
        // Every pass over the same input must produce the same picture:
        // stale state leaking through the pool would show up here.
        let raw = dest.into_raw();
        if let Some(prev) = &last {
            assert_eq!(prev, &raw, "pass {pass} differs");
        }
        last = Some(raw);
    }
}

#[test]
fn fogged_render_only_darkens_distant_points() {
    init_tracing();
    let styles = vec![MarkStyle::new(MarkShape::FilledSquare, 1, Rgba::opaque(1.0, 1.0, 1.0), 1).unwrap()];
    let range = DepthRange::new(0.0, 1.0).unwrap();
    let fog = FogConfig {
        fogginess: 2.0,
        fog_rgb: [0.0, 0.0, 0.0],
    };
    let mut dest = RgbaImage::new(64, 64);
    let mut ws = Workspace::new();
    let mut vol = BitmapVolume::new(&mut dest, &styles, range, fog, 0, &mut ws).unwrap();
    for i in 0..8 {
        // A row of points marching away from the viewer.
        vol.plot(8 * i + 4, 32, f64::from(i) / 7.0, 0);
    }
    vol.flush();
    let mut prev = 256i32;
    for i in 0..8 {
        let v = i32::from(dest.get_pixel((8 * i + 4) as u32, 32).0[0]);
        assert!(v <= prev, "brightness must not increase with depth");
        prev = v;
    }
}

#[derive(Default)]
struct DepthRecorder {
    fills: Vec<Rgba>,
}

impl DrawSurface for DepthRecorder {
    fn fill_path(&mut self, _path: &kurbo::BezPath, color: Rgba) {
        self.fills.push(color);
    }

    fn stroke_path(&mut self, _path: &kurbo::BezPath, _width: f64, color: Rgba) {
        self.fills.push(color);
    }
}

#[test]
fn vector_backend_draws_back_to_front() {
    init_tracing();
    // Encode each point's depth in its green channel via one style per rank.
    let styles: Vec<MarkStyle> = (0..8)
        .map(|i| {
            MarkStyle::new(
                MarkShape::FilledCircle,
                1,
                Rgba::opaque(0.0, i as f32 / 7.0, 0.0),
                1,
            )
            .unwrap()
        })
        .collect();
    let range = DepthRange::new(0.0, 1.0).unwrap();
    let mut rec = DepthRecorder::default();
    let mut vol =
        VectorVolume::new(&mut rec, &styles, range, FogConfig::default(), None).unwrap();
    // Submit in a scrambled order; style i sits at depth i/7.
    for &i in &[3usize, 0, 7, 5, 1, 6, 2, 4] {
        vol.plot(50, 50, i as f64 / 7.0, i);
    }
    vol.flush();
    let greens: Vec<f32> = rec.fills.iter().map(|c| c.0[1]).collect();
    let mut sorted = greens.clone();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
    assert_eq!(greens, sorted, "deepest (greenest) must be drawn first");
}
