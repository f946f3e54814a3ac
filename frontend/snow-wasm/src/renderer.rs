//! Snowpack rendering
//!
//! Flakes are plain filled circles. The ground is drawn as a smooth silhouette:
//! the field is sampled every `silhouette_step` columns, the samples are joined
//! by a uniform Catmull-Rom spline emitted as cubic Bézier segments, and the
//! shape is closed along the bottom of the canvas and filled with a grain tile.

use rand::Rng;

use crate::config::SnowpackConfig;
use crate::constants::{BACKGROUND_COLOR, OUTLINE_COLOR, OUTLINE_WIDTH};
use crate::flake::Flake;
use crate::ground::GroundField;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { c1: Point, c2: Point, to: Point },
    Close,
}

/// Square RGBA tile of random grey levels, repeated as the ground fill.
#[derive(Clone, Debug, PartialEq)]
pub struct GrainTile {
    size: u32,
    rgba: Vec<u8>,
}

impl GrainTile {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, size: u32, min: u8, max: u8) -> Self {
        let pixels = size as usize * size as usize;
        let mut rgba = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            let v = rng.gen_range(min..=max);
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
        Self { size, rgba }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// The 2-D drawing context the simulation paints on.
pub trait Surface {
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: &str);
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, opacity: f32);
    /// Make `tile` the repeating pattern used by [`Surface::fill_path_with_grain`].
    fn install_grain(&mut self, tile: &GrainTile);
    fn fill_path_with_grain(&mut self, path: &[PathCommand]);
    fn stroke_path(&mut self, path: &[PathCommand], color: &str, line_width: f32);
}

/// Sample the ground at a fixed stride and map it to canvas coordinates.
/// The last point always sits on the right edge of the canvas.
pub fn silhouette_points(
    ground: &GroundField,
    width: f32,
    height: f32,
    step: usize,
    smoothing: usize,
) -> Vec<Point> {
    let step = step.max(1);
    let len = ground.len();
    let mut columns: Vec<usize> = (0..len).step_by(step).collect();
    if columns.is_empty() {
        columns.push(0);
    }
    let mut heights: Vec<f32> = columns.iter().map(|&c| ground.height_at(c)).collect();
    heights.push(ground.height_at(len.saturating_sub(1)));

    if smoothing > 0 {
        heights = moving_average(&heights, smoothing);
    }

    columns
        .iter()
        .map(|&c| c as f32)
        .chain(std::iter::once(width))
        .zip(heights)
        .map(|(x, h)| Point::new(x, height - h))
        .collect()
}

fn moving_average(values: &[f32], half_window: usize) -> Vec<f32> {
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half_window);
            let hi = (i + half_window + 1).min(values.len());
            let window = &values[lo..hi];
            window.iter().sum::<f32>() / window.len() as f32
        })
        .collect()
}

/// Cubic segments through `points`; tangents come from each point's neighbours,
/// with the ends reusing their own point.
pub fn catmull_rom_segments(points: &[Point]) -> Vec<PathCommand> {
    let mut segments = Vec::with_capacity(points.len().saturating_sub(1));
    for i in 0..points.len().saturating_sub(1) {
        let p0 = points[i];
        let p1 = points[i + 1];
        let prev = if i == 0 { p0 } else { points[i - 1] };
        let next = points.get(i + 2).copied().unwrap_or(p1);
        segments.push(PathCommand::CubicTo {
            c1: Point::new(p0.x + (p1.x - prev.x) / 6.0, p0.y + (p1.y - prev.y) / 6.0),
            c2: Point::new(p1.x - (next.x - p0.x) / 6.0, p1.y - (next.y - p0.y) / 6.0),
            to: p1,
        });
    }
    segments
}

pub struct Renderer {
    width: f32,
    height: f32,
    step: usize,
    smoothing: usize,
    grain: GrainTile,
    grain_pending: bool,
}

impl Renderer {
    pub fn new<R: Rng + ?Sized>(
        width: f32,
        height: f32,
        config: &SnowpackConfig,
        rng: &mut R,
    ) -> Self {
        Self {
            width,
            height,
            step: config.silhouette_step,
            smoothing: config.silhouette_smoothing,
            grain: GrainTile::generate(rng, config.grain_size, config.grain_min, config.grain_max),
            grain_pending: true,
        }
    }

    /// New canvas size: the grain tile is rebuilt and reinstalled on the next frame.
    pub fn resize<R: Rng + ?Sized>(
        &mut self,
        width: f32,
        height: f32,
        config: &SnowpackConfig,
        rng: &mut R,
    ) {
        self.width = width;
        self.height = height;
        self.grain = GrainTile::generate(rng, config.grain_size, config.grain_min, config.grain_max);
        self.grain_pending = true;
    }

    pub fn grain(&self) -> &GrainTile {
        &self.grain
    }

    /// Paint the background, installing the grain pattern first if it changed.
    pub fn begin_frame<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        if self.grain_pending {
            surface.install_grain(&self.grain);
            self.grain_pending = false;
        }
        surface.fill_rect(0.0, 0.0, self.width, self.height, BACKGROUND_COLOR);
    }

    pub fn draw_flakes<S: Surface + ?Sized>(&self, surface: &mut S, flakes: &[Flake]) {
        for flake in flakes {
            surface.fill_circle(flake.x, flake.y, flake.radius, flake.opacity);
        }
    }

    pub fn draw_ground_silhouette<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        ground: &GroundField,
    ) {
        let points = silhouette_points(ground, self.width, self.height, self.step, self.smoothing);
        let curve = catmull_rom_segments(&points);

        let mut outline = Vec::with_capacity(curve.len() + 1);
        outline.push(PathCommand::MoveTo(points[0]));
        outline.extend_from_slice(&curve);

        let mut fill = Vec::with_capacity(curve.len() + 4);
        fill.push(PathCommand::MoveTo(Point::new(0.0, self.height)));
        fill.push(PathCommand::LineTo(points[0]));
        fill.extend_from_slice(&curve);
        fill.push(PathCommand::LineTo(Point::new(self.width, self.height)));
        fill.push(PathCommand::Close);

        surface.fill_path_with_grain(&fill);
        surface.stroke_path(&outline, OUTLINE_COLOR, OUTLINE_WIDTH);
    }
}

/// One recorded call on a [`Recorder`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    FillRect {
        width: f32,
        height: f32,
        color: String,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
        opacity: f32,
    },
    InstallGrain {
        size: u32,
    },
    FillGrain(Vec<PathCommand>),
    Stroke(Vec<PathCommand>),
}

/// Surface that keeps a log of what was drawn, for headless runs.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<DrawCall>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn circles(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Circle { .. }))
            .count()
    }
}

impl Surface for Recorder {
    fn fill_rect(&mut self, _x: f32, _y: f32, width: f32, height: f32, color: &str) {
        self.calls.push(DrawCall::FillRect {
            width,
            height,
            color: color.to_string(),
        });
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, opacity: f32) {
        self.calls.push(DrawCall::Circle {
            x,
            y,
            radius,
            opacity,
        });
    }

    fn install_grain(&mut self, tile: &GrainTile) {
        self.calls.push(DrawCall::InstallGrain { size: tile.size() });
    }

    fn fill_path_with_grain(&mut self, path: &[PathCommand]) {
        self.calls.push(DrawCall::FillGrain(path.to_vec()));
    }

    fn stroke_path(&mut self, path: &[PathCommand], _color: &str, _line_width: f32) {
        self.calls.push(DrawCall::Stroke(path.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn samples_every_step_and_ends_on_the_right_edge() {
        let ground = GroundField::from_samples((0..100).map(|x| x as f32).collect());
        let points = silhouette_points(&ground, 100.0, 500.0, 8, 0);
        assert_eq!(points.len(), 14);
        assert_eq!(points[0], Point::new(0.0, 500.0));
        assert_eq!(points[1], Point::new(8.0, 492.0));
        assert_eq!(points[12], Point::new(96.0, 404.0));
        assert_eq!(points[13], Point::new(100.0, 401.0));
    }

    #[test]
    fn empty_ground_still_has_a_baseline() {
        let points = silhouette_points(&GroundField::flat(0), 0.0, 50.0, 8, 0);
        assert_eq!(points, vec![Point::new(0.0, 50.0), Point::new(0.0, 50.0)]);
    }

    #[test]
    fn moving_average_flattens_a_spike() {
        let smoothed = moving_average(&[0.0, 0.0, 9.0, 0.0, 0.0], 1);
        assert_eq!(smoothed, vec![0.0, 3.0, 3.0, 3.0, 0.0]);
        assert_eq!(moving_average(&[4.0], 3), vec![4.0]);
    }

    #[test]
    fn catmull_rom_passes_through_every_point() {
        let points = vec![
            Point::new(0.0, 10.0),
            Point::new(8.0, 4.0),
            Point::new(16.0, 7.0),
            Point::new(20.0, 7.0),
        ];
        let segments = catmull_rom_segments(&points);
        assert_eq!(segments.len(), 3);
        for (segment, target) in segments.iter().zip(&points[1..]) {
            match segment {
                PathCommand::CubicTo { to, .. } => assert_eq!(to, target),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn catmull_rom_on_a_line_stays_on_the_line() {
        let points: Vec<Point> = (0..5)
            .map(|i| Point::new(i as f32 * 6.0, 30.0 - i as f32 * 3.0))
            .collect();
        for segment in catmull_rom_segments(&points).iter().skip(1).take(2) {
            if let PathCommand::CubicTo { c1, c2, .. } = segment {
                for c in [c1, c2] {
                    assert!((c.y - (30.0 - c.x / 2.0)).abs() < 1e-4, "{c:?} off the line");
                }
            }
        }
    }

    #[test]
    fn grain_stays_in_band() {
        let mut rng = SmallRng::seed_from_u64(3);
        let tile = GrainTile::generate(&mut rng, 16, 220, 255);
        assert_eq!(tile.rgba().len(), 16 * 16 * 4);
        for px in tile.rgba().chunks_exact(4) {
            assert!(px[0] >= 220);
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn silhouette_is_closed_against_the_bottom() {
        let mut rng = SmallRng::seed_from_u64(3);
        let config = SnowpackConfig::default();
        let mut renderer = Renderer::new(40.0, 30.0, &config, &mut rng);
        let ground = GroundField::from_samples(vec![2.0; 40]);
        let mut recorder = Recorder::new();

        renderer.begin_frame(&mut recorder);
        renderer.draw_ground_silhouette(&mut recorder, &ground);
        renderer.begin_frame(&mut recorder);

        let installs = recorder
            .calls
            .iter()
            .filter(|c| matches!(c, DrawCall::InstallGrain { .. }))
            .count();
        assert_eq!(installs, 1);

        let fill = recorder
            .calls
            .iter()
            .find_map(|c| match c {
                DrawCall::FillGrain(path) => Some(path.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(fill[0], PathCommand::MoveTo(Point::new(0.0, 30.0)));
        assert_eq!(fill[1], PathCommand::LineTo(Point::new(0.0, 28.0)));
        assert_eq!(fill[fill.len() - 2], PathCommand::LineTo(Point::new(40.0, 30.0)));
        assert_eq!(fill[fill.len() - 1], PathCommand::Close);

        let stroke = recorder
            .calls
            .iter()
            .find_map(|c| match c {
                DrawCall::Stroke(path) => Some(path.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(stroke[0], PathCommand::MoveTo(Point::new(0.0, 28.0)));
        assert!(!stroke.contains(&PathCommand::Close));
    }
}
