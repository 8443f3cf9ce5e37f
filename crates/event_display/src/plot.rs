//! Software rendering of the event-display figure.
//!
//! The figure is composed by hand on a plain plotters canvas: the scene is
//! mapped into a box, projected with the orbit [`Camera`], and drawn back to
//! front (painter's algorithm) so surface cells and hits occlude correctly.

use crate::camera::Camera;
use anyhow::{Context, Result};
use cylmesh::{AxisLimits, Normalize, Scene};
use glam::{DVec2, DVec3};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const TITLE_BAND: i32 = 36;
const COLORBAR_SLOT: i32 = 80;
const COLORBAR_WIDTH: i32 = 16;
/// Relative box edge lengths (x, y, z), as in matplotlib's default 3D axes.
const BOX_ASPECT: DVec3 = DVec3::new(1.0, 1.0, 0.75);
const MAX_TICKS: usize = 6;

const PANE_FILL: RGBColor = RGBColor(238, 238, 238);
const PANE_EDGE: RGBColor = RGBColor(190, 190, 190);
const GRID_LINE: RGBColor = RGBColor(212, 212, 212);
const LABEL: RGBColor = RGBColor(40, 40, 40);

/// Figure dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

impl FigureSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn dims(self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Length of a packed RGB buffer holding the figure.
    pub fn rgb_len(self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl Default for FigureSize {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

/// Maps data coordinates inside the axis limits onto a box centred on the
/// origin with edge lengths [`BOX_ASPECT`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMap {
    lo: DVec3,
    span: DVec3,
}

impl BoxMap {
    pub fn new(limits: &AxisLimits) -> Self {
        let mut lo = DVec3::new(limits.x[0], limits.y[0], limits.z[0]);
        let mut span = DVec3::new(limits.x[1], limits.y[1], limits.z[1]) - lo;

        for k in 0..3 {
            if !(span[k] > 0.0 && span[k].is_finite()) {
                lo[k] -= 0.5;
                span[k] = 1.0;
            }
        }

        Self { lo, span }
    }

    #[inline]
    pub fn to_box(&self, p: DVec3) -> DVec3 {
        ((p - self.lo) / self.span - 0.5) * BOX_ASPECT
    }

    /// Box coordinate of a single data value on axis `k`.
    #[inline]
    fn axis_value(&self, k: usize, v: f64) -> f64 {
        ((v - self.lo[k]) / self.span[k] - 0.5) * BOX_ASPECT[k]
    }
}

/// Screen placement of the projected box.
#[derive(Debug, Clone, Copy)]
struct Viewport {
    center: DVec2,
    scale: f64,
}

impl Viewport {
    fn new(x0: i32, y0: i32, x1: i32, y1: i32, zoom: f64) -> Self {
        let w = (x1 - x0).max(1) as f64;
        let h = (y1 - y0).max(1) as f64;
        Self {
            center: DVec2::new(x0 as f64 + w * 0.5, y0 as f64 + h * 0.5),
            scale: 0.5 * w.min(h) * zoom / 0.95,
        }
    }

    #[inline]
    fn to_pixel(&self, s: DVec2) -> (i32, i32) {
        (
            (self.center.x + self.scale * s.x).round() as i32,
            (self.center.y - self.scale * s.y).round() as i32,
        )
    }
}

struct Projector<'a> {
    camera: &'a Camera,
    map: BoxMap,
    viewport: Viewport,
}

impl Projector<'_> {
    #[inline]
    fn pixel(&self, q: DVec3) -> (i32, i32) {
        self.viewport.to_pixel(self.camera.project(q))
    }

    #[inline]
    fn screen(&self, q: DVec3) -> DVec2 {
        let (x, y) = self.pixel(q);
        DVec2::new(x as f64, y as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Quad([(i32, i32); 4]),
    Marker { center: (i32, i32), radius: u32 },
}

#[derive(Debug, Clone, PartialEq)]
struct Primitive {
    /// Camera depth; larger is nearer.
    depth: f64,
    rgb: [u8; 3],
    shape: Shape,
}

fn shade(rgb: [u8; 3], factor: f64) -> [u8; 3] {
    rgb.map(|c| (c as f64 * factor).round().clamp(0.0, 255.0) as u8)
}

/// Surface cells and hit markers, sorted far to near.
fn scene_primitives(scene: &Scene, proj: &Projector<'_>) -> Vec<Primitive> {
    let surface = &scene.surface;
    let grid = surface.grid();
    let eye = proj.camera.eye_dir();
    let along = Normalize::new(0.0, surface.frame().magnitude);

    let mut prims: Vec<Primitive> = Vec::with_capacity(surface.len() + scene.total_hits());

    for cell in surface.quads() {
        let q = cell.map(|(i, j)| proj.map.to_box(surface.point(i, j)));
        let centroid = (q[0] + q[1] + q[2] + q[3]) * 0.25;
        let t_mid = cell.iter().map(|&(_, j)| grid.t[j]).sum::<f64>() * 0.25;

        let normal = (q[1] - q[0]).cross(q[3] - q[0]).normalize_or_zero();
        let lit = 0.65 + 0.35 * normal.dot(eye).abs();

        prims.push(Primitive {
            depth: proj.camera.depth(centroid),
            rgb: shade(scene.surface_colormap.sample(along.apply(t_mid)), lit),
            shape: Shape::Quad(q.map(|p| proj.pixel(p))),
        });
    }

    for species in &scene.species {
        let cloud = &species.cloud;
        let norm = Normalize::from_values(&cloud.z);
        let cmap = species.config.colormap;

        prims.extend(cloud.points().map(|p| {
            let q = proj.map.to_box(p);
            Primitive {
                depth: proj.camera.depth(q),
                rgb: cmap.sample(norm.apply(p.z)),
                shape: Shape::Marker {
                    center: proj.pixel(q),
                    radius: species.config.marker_size,
                },
            }
        }));
    }

    prims.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    prims
}

/// Tick positions at 1, 2 or 5 times a power of ten, at most
/// `max_ticks + 1` of them, all inside `[lo, hi]`.
pub fn nice_ticks(lo: f64, hi: f64, max_ticks: usize) -> Vec<f64> {
    if !(lo.is_finite() && hi.is_finite()) || max_ticks == 0 {
        return Vec::new();
    }
    if hi <= lo {
        return vec![lo];
    }

    let raw = (hi - lo) / max_ticks as f64;
    let mag = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * mag)
        .find(|&s| s >= raw)
        .unwrap_or(10.0 * mag);

    let first = (lo / step - 1e-9).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    (first..=last)
        .map(|k| {
            let v = k as f64 * step;
            if v.abs() < step * 1e-9 {
                0.0
            } else {
                v
            }
        })
        .collect()
}

fn tick_decimals(ticks: &[f64]) -> usize {
    match ticks {
        [a, b, ..] => (-(b - a).log10().floor()).max(0.0) as usize,
        _ => 1,
    }
}

fn label(root: &Canvas<'_>, text: &str, pos: (i32, i32), size: u32, anchor: Pos) {
    let style = ("sans-serif", size as f64).into_font().color(&LABEL).pos(anchor);
    if let Err(e) = root.draw_text(text, &style, pos) {
        // Missing system fonts should not cost the rest of the figure.
        log::debug!("skipping label {text:?}: {e}");
    }
}

fn centered() -> Pos {
    Pos::new(HPos::Center, VPos::Center)
}

fn compose(k: usize, vk: f64, a: usize, va: f64, b: usize, vb: f64) -> DVec3 {
    let mut v = DVec3::ZERO;
    v[k] = vk;
    v[a] = va;
    v[b] = vb;
    v
}

/// Coordinate of the pane on axis `k` that faces away from the eye.
#[inline]
fn far_side(eye: DVec3, k: usize) -> f64 {
    let h = BOX_ASPECT[k] * 0.5;
    if eye[k] >= 0.0 {
        -h
    } else {
        h
    }
}

/// A point on the box edge that carries axis `m`'s tick labels, with the
/// coordinate along `m` left at zero.
fn label_edge(m: usize, proj: &Projector<'_>) -> DVec3 {
    let eye = proj.camera.eye_dir();
    let h = BOX_ASPECT * 0.5;

    match m {
        // Front bottom edges for x and y.
        0 => DVec3::new(0.0, -far_side(eye, 1), -h.z),
        1 => DVec3::new(-far_side(eye, 0), 0.0, -h.z),
        // The vertical edge furthest right on screen for z.
        _ => [(-h.x, -h.y), (-h.x, h.y), (h.x, -h.y), (h.x, h.y)]
            .into_iter()
            .map(|(x, y)| DVec3::new(x, y, 0.0))
            .max_by(|a, b| {
                proj.camera
                    .project(*a)
                    .x
                    .total_cmp(&proj.camera.project(*b).x)
            })
            .unwrap_or(DVec3::new(h.x, h.y, 0.0)),
    }
}

fn draw_axes(root: &Canvas<'_>, proj: &Projector<'_>, limits: &AxisLimits) -> Result<()> {
    let eye = proj.camera.eye_dir();
    let h = BOX_ASPECT * 0.5;
    let ranges = [limits.x, limits.y, limits.z];
    let ticks: Vec<Vec<f64>> = ranges
        .iter()
        .map(|r| nice_ticks(r[0], r[1], MAX_TICKS))
        .collect();

    // Back panes with their grid lines.
    for k in 0..3 {
        let (a, b) = ((k + 1) % 3, (k + 2) % 3);
        let far = far_side(eye, k);

        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .map(|(sa, sb)| proj.pixel(compose(k, far, a, sa * h[a], b, sb * h[b])));
        root.draw(&Polygon::new(corners.to_vec(), PANE_FILL.filled()))?;

        for (m, n) in [(a, b), (b, a)] {
            for &v in &ticks[m] {
                let qm = proj.map.axis_value(m, v);
                let from = proj.pixel(compose(k, far, m, qm, n, -h[n]));
                let to = proj.pixel(compose(k, far, m, qm, n, h[n]));
                root.draw(&PathElement::new(vec![from, to], GRID_LINE.stroke_width(1)))?;
            }
        }

        let mut outline = corners.to_vec();
        outline.push(corners[0]);
        root.draw(&PathElement::new(outline, PANE_EDGE.stroke_width(1)))?;
    }

    // Tick labels and axis names, pushed outwards from the box centre.
    let origin = proj.screen(DVec3::ZERO);
    for (m, name) in ["x", "y", "z"].into_iter().enumerate() {
        let edge = label_edge(m, proj);
        let outward = (proj.screen(edge) - origin).normalize_or_zero();
        let decimals = tick_decimals(&ticks[m]);

        for &v in &ticks[m] {
            let mut p = edge;
            p[m] = proj.map.axis_value(m, v);
            let at = proj.screen(p) + outward * 18.0;
            label(
                root,
                &format!("{v:.decimals$}"),
                (at.x as i32, at.y as i32),
                12,
                centered(),
            );
        }

        let at = proj.screen(edge) + outward * 42.0;
        label(root, name, (at.x as i32, at.y as i32), 15, centered());
    }

    Ok(())
}

fn draw_primitives(root: &Canvas<'_>, prims: &[Primitive]) -> Result<()> {
    for prim in prims {
        let color = RGBColor(prim.rgb[0], prim.rgb[1], prim.rgb[2]);
        match &prim.shape {
            Shape::Quad(pts) => {
                root.draw(&Polygon::new(pts.to_vec(), color.filled()))?;
                // Stroke the border too so neighbouring cells leave no seams.
                let mut ring = pts.to_vec();
                ring.push(pts[0]);
                root.draw(&PathElement::new(ring, color.stroke_width(1)))?;
            }
            Shape::Marker { center, radius } => {
                root.draw(&Circle::new(*center, *radius, color.filled()))?;
            }
        }
    }
    Ok(())
}

fn draw_colorbars(root: &Canvas<'_>, scene: &Scene, size: FigureSize) -> Result<()> {
    let bars: Vec<_> = scene.species.iter().filter(|s| !s.cloud.is_empty()).collect();
    let top = TITLE_BAND + 40;
    let bottom = size.height as i32 - 70;
    if bottom - top < 10 {
        return Ok(());
    }

    for (c, species) in bars.iter().enumerate() {
        let slot = size.width as i32 - COLORBAR_SLOT * (bars.len() - c) as i32;
        let x0 = slot + (COLORBAR_SLOT - COLORBAR_WIDTH) / 2;
        let x1 = x0 + COLORBAR_WIDTH;
        let cmap = species.config.colormap;

        for y in top..bottom {
            let v = 1.0 - (y - top) as f64 / (bottom - top - 1).max(1) as f64;
            let [r, g, b] = cmap.sample(v);
            root.draw(&Rectangle::new(
                [(x0, y), (x1, y + 1)],
                RGBColor(r, g, b).filled(),
            ))?;
        }
        root.draw(&Rectangle::new([(x0, top), (x1, bottom)], PANE_EDGE.stroke_width(1)))?;

        let norm = Normalize::from_values(&species.cloud.z);
        let mid = (x0 + x1) / 2;
        label(root, &format!("{:.2}", norm.max), (mid, top - 12), 12, centered());
        label(root, &format!("{:.2}", norm.min), (mid, bottom + 12), 12, centered());
        label(root, &species.config.name, (mid, bottom + 32), 13, centered());
    }

    Ok(())
}

fn draw_figure(root: &Canvas<'_>, scene: &Scene, camera: &Camera, size: FigureSize) -> Result<()> {
    root.fill(&WHITE)?;

    let bars = scene.species.iter().filter(|s| !s.cloud.is_empty()).count() as i32;
    let plot_right = (size.width as i32 - bars * COLORBAR_SLOT).max(100);
    let proj = Projector {
        camera,
        map: BoxMap::new(&scene.limits),
        viewport: Viewport::new(0, TITLE_BAND, plot_right, size.height as i32, camera.zoom),
    };

    draw_axes(root, &proj, &scene.limits)?;
    draw_primitives(root, &scene_primitives(scene, &proj))?;
    draw_colorbars(root, scene, size)?;

    label(
        root,
        &scene.title,
        (size.width as i32 / 2, TITLE_BAND / 2),
        20,
        centered(),
    );

    Ok(())
}

/// Renders the figure for the given view and writes it as an image file.
pub fn render_to_file(scene: &Scene, camera: &Camera, size: FigureSize, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, size.dims()).into_drawing_area();
    draw_figure(&root, scene, camera, size)?;
    root.present()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Renders the figure into a packed RGB buffer of `size.rgb_len()` bytes.
pub fn render_to_rgb(scene: &Scene, camera: &Camera, size: FigureSize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; size.rgb_len()];
    {
        let root = BitMapBackend::with_buffer(&mut buf, size.dims()).into_drawing_area();
        draw_figure(&root, scene, camera, size)?;
        root.present()?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cylmesh::{
        generate_surface, AngularSpan, Colormap, Cylinder, ParticlePointCloud, Samples,
        SpeciesConfig, SpeciesData,
    };

    fn unit_limits() -> AxisLimits {
        AxisLimits {
            x: [-1.1, 1.1],
            y: [-1.1, 1.1],
            z: [0.0, 1.1],
        }
    }

    fn test_scene(hits: ParticlePointCloud) -> Scene {
        let cylinder = Cylinder::from_axis(DVec3::Z, 1.0).unwrap();
        let surface = generate_surface(&cylinder, AngularSpan::Half, Samples::square(12)).unwrap();
        Scene {
            title: "Event 79".to_string(),
            cylinder,
            surface,
            surface_colormap: Colormap::Blues,
            species: vec![SpeciesData {
                config: SpeciesConfig::muons(),
                cloud: hits,
            }],
            limits: unit_limits(),
        }
    }

    fn projector<'a>(camera: &'a Camera) -> Projector<'a> {
        Projector {
            camera,
            map: BoxMap::new(&unit_limits()),
            viewport: Viewport::new(0, 0, 400, 300, 1.0),
        }
    }

    #[test]
    fn ticks_are_round_numbers() {
        assert_eq!(nice_ticks(-1.1, 1.1, 6), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(nice_ticks(0.0, 8.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0]);

        let t = nice_ticks(0.0, 1.1, 6);
        assert_eq!(t.len(), 6);
        for (v, want) in t.iter().zip([0.0, 0.2, 0.4, 0.6, 0.8, 1.0]) {
            assert_abs_diff_eq!(*v, want, epsilon = 1e-12);
        }

        assert_eq!(nice_ticks(3.0, 3.0, 6), vec![3.0]);
        assert!(nice_ticks(0.0, f64::NAN, 6).is_empty());

        let t = nice_ticks(-2.875, 10.875, 6);
        assert!(t.len() <= 7);
        assert!(t.iter().all(|v| (-2.875..=10.875).contains(v)));
    }

    #[test]
    fn decimals_follow_step() {
        assert_eq!(tick_decimals(&[0.0, 0.5, 1.0]), 1);
        assert_eq!(tick_decimals(&[0.0, 2.0]), 0);
        assert_eq!(tick_decimals(&[0.0, 0.05]), 2);
    }

    #[test]
    fn box_map_centres_limits() {
        let map = BoxMap::new(&unit_limits());
        let lo = map.to_box(DVec3::new(-1.1, -1.1, 0.0));
        let hi = map.to_box(DVec3::new(1.1, 1.1, 1.1));
        assert_abs_diff_eq!(lo.x, -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(lo.z, -0.375, epsilon = 1e-12);
        assert_abs_diff_eq!(hi.y, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(hi.z, 0.375, epsilon = 1e-12);

        // Collapsed ranges still map to finite coordinates.
        let flat = BoxMap::new(&AxisLimits {
            x: [1.0, 1.0],
            y: [0.0, 1.0],
            z: [0.0, 1.0],
        });
        assert_abs_diff_eq!(flat.to_box(DVec3::new(1.0, 0.5, 0.5)).x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn primitives_are_sorted_far_to_near() {
        let hits = ParticlePointCloud::from_columns(
            vec![1.0, -1.0, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![0.5, 0.5, 0.5],
        )
        .unwrap();
        let scene = test_scene(hits);
        let camera = Camera::new(0.0, 0.0);
        let prims = scene_primitives(&scene, &projector(&camera));

        assert_eq!(prims.len(), 11 * 11 + 3);
        assert!(prims.windows(2).all(|w| w[0].depth <= w[1].depth));

        let markers: Vec<_> = prims
            .iter()
            .filter(|p| matches!(p.shape, Shape::Marker { .. }))
            .collect();
        // Viewed from +x, the hit at x = -1 is drawn first and x = +1 last.
        assert!(markers[0].depth < markers[1].depth);
        assert!(markers[1].depth < markers[2].depth);
        assert_abs_diff_eq!(markers[2].depth, 2.1 / 2.2 - 0.5, epsilon = 1e-9);
    }

    #[test]
    fn far_quads_come_first() {
        let scene = test_scene(ParticlePointCloud::default());
        // Half cylinder spans y >= 0 (n1 = z x x = y). Looking from +y, cells
        // near y = 1 face the eye and must be drawn after those near y = 0.
        let camera = Camera::new(90.0, 0.0);
        let prims = scene_primitives(&scene, &projector(&camera));
        let first = &prims[0];
        let last = &prims[prims.len() - 1];
        assert!(first.depth < last.depth);
        assert!(last.depth > 0.3);
    }

    #[test]
    fn markers_use_species_colormap_by_z() {
        let hits = ParticlePointCloud::from_columns(
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![0.1, 0.9],
        )
        .unwrap();
        let scene = test_scene(hits);
        let camera = Camera::default();
        let prims = scene_primitives(&scene, &projector(&camera));
        let mut colors: Vec<[u8; 3]> = prims
            .iter()
            .filter(|p| matches!(p.shape, Shape::Marker { .. }))
            .map(|p| p.rgb)
            .collect();
        colors.sort();
        let mut expected = vec![Colormap::Reds.sample(0.0), Colormap::Reds.sample(1.0)];
        expected.sort();
        assert_eq!(colors, expected);
    }

    #[test]
    fn renders_into_rgb_buffer() {
        let hits = ParticlePointCloud::from_columns(vec![0.2], vec![0.3], vec![0.5]).unwrap();
        let scene = test_scene(hits);
        let size = FigureSize::new(320, 240);
        let buf = render_to_rgb(&scene, &Camera::default(), size).unwrap();

        assert_eq!(buf.len(), 320 * 240 * 3);
        assert!(buf.chunks(3).any(|px| px != [255, 255, 255]));
        // Corners outside the box stay background white.
        assert_eq!(&buf[..3], &[255, 255, 255]);
    }

    #[test]
    fn renders_png_file() {
        let scene = test_scene(ParticlePointCloud::default());
        let path = std::env::temp_dir().join(format!("event_display_plot_{}.png", std::process::id()));
        render_to_file(&scene, &Camera::default(), FigureSize::new(200, 150), &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        let _ = std::fs::remove_file(&path);
    }
}
