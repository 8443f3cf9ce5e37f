//! One parameterised event-display scene: detector cylinder, mesh settings,
//! particle species and axis limits.
//!
//! Scenes come from a named [`Preset`] or from a JSON scene file, e.g.
//!
//! ```json
//! {
//!   "cylinder": { "axis": [0, 0, 8], "radius": 2.5 },
//!   "span": "half",
//!   "species": [
//!     { "name": "muons", "files": { "x": "mu_x.txt", "y": "mu_y.txt", "z": "mu_z.txt" },
//!       "colormap": "reds" }
//!   ]
//! }
//! ```

use crate::bounds::Bounds;
use crate::cloud::{ParticlePointCloud, SpeciesFiles, DEFAULT_SENTINEL};
use crate::colormap::Colormap;
use crate::error::{CylmeshError, Result};
use crate::geometry::{AngularSpan, Cylinder};
use crate::surface::{generate_surface, Samples, SurfacePointSet};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CylinderConfig {
    #[serde(default)]
    pub base: [f64; 3],
    pub axis: [f64; 3],
    pub radius: f64,
}

impl CylinderConfig {
    pub fn build(&self) -> Result<Cylinder> {
        Cylinder::new(
            DVec3::from_array(self.base),
            DVec3::from_array(self.axis),
            self.radius,
        )
    }
}

fn default_marker_size() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_surface_colormap() -> Colormap {
    Colormap::Blues
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub name: String,
    pub files: SpeciesFiles,
    pub colormap: Colormap,
    /// Marker radius in pixels.
    #[serde(default = "default_marker_size")]
    pub marker_size: u32,
}

impl SpeciesConfig {
    pub fn from_prefix(name: &str, prefix: &str, colormap: Colormap) -> Self {
        Self {
            name: name.to_string(),
            files: SpeciesFiles::from_prefix(prefix),
            colormap,
            marker_size: default_marker_size(),
        }
    }

    pub fn muons() -> Self {
        Self::from_prefix("muons", "mu", Colormap::Reds)
    }

    pub fn photons() -> Self {
        Self::from_prefix("photons", "ph", Colormap::Greens)
    }
}

/// Plot ranges per axis, `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub z: [f64; 2],
}

impl AxisLimits {
    /// Bounds padded by 5% of their extent on each side.
    pub fn padded(bounds: &Bounds) -> Self {
        let pad = |lo: f64, hi: f64| {
            let ext = hi - lo;
            let margin = if ext > 0.0 { 0.05 * ext } else { 0.5 };
            [lo - margin, hi + margin]
        };

        Self {
            x: pad(bounds.min.x, bounds.max.x),
            y: pad(bounds.min.y, bounds.max.y),
            z: pad(bounds.min.z, bounds.max.z),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub cylinder: CylinderConfig,
    #[serde(default)]
    pub span: AngularSpan,
    #[serde(default)]
    pub samples: Samples,
    #[serde(default)]
    pub species: Vec<SpeciesConfig>,
    #[serde(default)]
    pub limits: Option<AxisLimits>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_surface_colormap")]
    pub surface_colormap: Colormap,
    /// Drop rows whose x coordinate is at or below the -999 sentinel.
    #[serde(default = "default_true")]
    pub drop_sentinels: bool,
}

impl SceneConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| CylmeshError::from_io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| CylmeshError::SceneFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// The variants the display has historically been run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Unit half cylinder, shown on screen.
    Unit,
    /// 8 x 2.5 half cylinder, saved as `79_EventDisplay.png`.
    Tank,
    /// 8 x 2.5 full cylinder.
    Full,
}

impl Preset {
    pub fn config(self) -> SceneConfig {
        let (axis, radius, span, limits) = match self {
            Preset::Unit => (
                [0.0, 0.0, 1.0],
                1.0,
                AngularSpan::Half,
                Some(AxisLimits {
                    x: [-1.1, 1.1],
                    y: [-1.1, 1.1],
                    z: [0.0, 1.1],
                }),
            ),
            Preset::Tank => ([0.0, 0.0, 8.0], 2.5, AngularSpan::Half, None),
            Preset::Full => ([0.0, 0.0, 8.0], 2.5, AngularSpan::Full, None),
        };

        SceneConfig {
            cylinder: CylinderConfig {
                base: [0.0; 3],
                axis,
                radius,
            },
            span,
            samples: Samples::default(),
            species: vec![SpeciesConfig::muons(), SpeciesConfig::photons()],
            limits,
            title: None,
            surface_colormap: default_surface_colormap(),
            drop_sentinels: true,
        }
    }

    /// Image the preset writes to when no output mode is given.
    pub fn default_output(self) -> Option<PathBuf> {
        match self {
            Preset::Tank => Some(PathBuf::from("79_EventDisplay.png")),
            Preset::Unit | Preset::Full => None,
        }
    }
}

/// Axis-aligned box of the whole (full-turn) cylinder.
pub fn cylinder_bounds(cylinder: &Cylinder) -> Bounds {
    let frame = cylinder.frame();
    let u = frame.unit_axis;
    let r = cylinder.radius();
    let reach = DVec3::new(
        r * (1.0 - u.x * u.x).max(0.0).sqrt(),
        r * (1.0 - u.y * u.y).max(0.0).sqrt(),
        r * (1.0 - u.z * u.z).max(0.0).sqrt(),
    );

    let a = cylinder.base();
    let b = a + cylinder.axis();
    Bounds {
        min: a.min(b) - reach,
        max: a.max(b) + reach,
    }
}

#[derive(Debug, Clone)]
pub struct SpeciesData {
    pub config: SpeciesConfig,
    pub cloud: ParticlePointCloud,
}

/// Everything the figure needs, computed once.
#[derive(Debug, Clone)]
pub struct Scene {
    pub title: String,
    pub cylinder: Cylinder,
    pub surface: SurfacePointSet,
    pub surface_colormap: Colormap,
    pub species: Vec<SpeciesData>,
    pub limits: AxisLimits,
}

impl Scene {
    /// Validates the geometry, samples the surface and loads every species.
    /// Relative species paths are resolved against `data_dir`.
    pub fn build(config: &SceneConfig, data_dir: &Path) -> Result<Scene> {
        let cylinder = config.cylinder.build()?;
        let surface = generate_surface(&cylinder, config.span, config.samples)?;
        let (rows, cols) = surface.shape();
        log::info!(
            "Cylinder surface: axis={}, radius={}, span={:.4} rad, mesh {}x{}",
            cylinder.axis(),
            cylinder.radius(),
            config.span.radians(),
            rows,
            cols
        );

        let mut species = Vec::with_capacity(config.species.len());
        for sc in &config.species {
            let files = sc.files.resolve(data_dir);
            let mut cloud = ParticlePointCloud::load(&files)?;

            if config.drop_sentinels {
                let dropped = cloud.drop_sentinels(DEFAULT_SENTINEL);
                if dropped > 0 {
                    log::warn!("{}: dropped {} sentinel rows", sc.name, dropped);
                }
            }

            if cloud.is_empty() {
                log::warn!("{}: no hits in {}", sc.name, files.x.display());
            } else {
                let b = cloud.bounds();
                log::info!("{}: {} hits", sc.name, cloud.len());
                log::debug!("{}: bounds min={} max={}", sc.name, b.min, b.max);
            }

            species.push(SpeciesData {
                config: sc.clone(),
                cloud,
            });
        }

        let limits = match config.limits {
            Some(limits) => limits,
            None => {
                let bounds = species
                    .iter()
                    .fold(cylinder_bounds(&cylinder), |acc, s| acc.union(&s.cloud.bounds()));
                AxisLimits::padded(&bounds)
            }
        };

        Ok(Scene {
            title: config
                .title
                .clone()
                .unwrap_or_else(|| "Event display".to_string()),
            cylinder,
            surface,
            surface_colormap: config.surface_colormap,
            species,
            limits,
        })
    }

    pub fn total_hits(&self) -> usize {
        self.species.iter().map(|s| s.cloud.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cylmesh_scene_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_prefix(dir: &Path, prefix: &str, x: &str, y: &str, z: &str) {
        std::fs::write(dir.join(format!("{prefix}_x.txt")), x).unwrap();
        std::fs::write(dir.join(format!("{prefix}_y.txt")), y).unwrap();
        std::fs::write(dir.join(format!("{prefix}_z.txt")), z).unwrap();
    }

    #[test]
    fn presets_reproduce_script_variants() {
        let unit = Preset::Unit.config();
        assert_eq!(unit.cylinder.axis, [0.0, 0.0, 1.0]);
        assert_eq!(unit.cylinder.radius, 1.0);
        assert_eq!(unit.span, AngularSpan::Half);
        assert_eq!(unit.samples, Samples::square(100));
        assert_eq!(unit.species.len(), 2);
        assert_eq!(unit.species[0].files.x, PathBuf::from("mu_x.txt"));
        assert_eq!(unit.species[1].colormap, Colormap::Greens);
        assert_eq!(Preset::Unit.default_output(), None);

        let tank = Preset::Tank.config();
        assert_eq!(tank.cylinder.axis, [0.0, 0.0, 8.0]);
        assert_eq!(tank.cylinder.radius, 2.5);
        assert_eq!(
            Preset::Tank.default_output(),
            Some(PathBuf::from("79_EventDisplay.png"))
        );

        assert_eq!(Preset::Full.config().span, AngularSpan::Full);
    }

    #[test]
    fn parses_minimal_scene_json() {
        let cfg = SceneConfig::from_json_str(
            r#"{ "cylinder": { "axis": [0, 0, 8], "radius": 2.5 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.cylinder.base, [0.0; 3]);
        assert_eq!(cfg.span, AngularSpan::Half);
        assert_eq!(cfg.samples, Samples::square(100));
        assert!(cfg.species.is_empty());
        assert!(cfg.drop_sentinels);
        assert_eq!(cfg.surface_colormap, Colormap::Blues);
    }

    #[test]
    fn parses_full_scene_json() {
        let cfg = SceneConfig::from_json_str(
            r#"{
                "cylinder": { "base": [1, 2, 3], "axis": [0, 1, 0], "radius": 0.5 },
                "span": { "radians": 4.0 },
                "samples": { "longitudinal": 20, "angular": 40 },
                "species": [
                    { "name": "photons",
                      "files": { "x": "a.txt", "y": "b.txt", "z": "c.txt" },
                      "colormap": "viridis", "marker_size": 5 }
                ],
                "limits": { "x": [-1, 1], "y": [0, 4], "z": [2, 4] },
                "title": "Event 12",
                "drop_sentinels": false
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.span, AngularSpan::Radians(4.0));
        assert_eq!(cfg.samples.angular, 40);
        assert_eq!(cfg.species[0].marker_size, 5);
        assert_eq!(cfg.species[0].colormap, Colormap::Viridis);
        assert_eq!(cfg.limits.unwrap().y, [0.0, 4.0]);
        assert_eq!(cfg.title.as_deref(), Some("Event 12"));
        assert!(!cfg.drop_sentinels);
    }

    #[test]
    fn rejects_unknown_span() {
        let err = SceneConfig::from_json_str(
            r#"{ "cylinder": { "axis": [0, 0, 1], "radius": 1 }, "span": "quarter" }"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn scene_file_errors_are_typed() {
        let dir = scratch_dir("badjson");
        let path = dir.join("scene.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SceneConfig::from_json_file(&path),
            Err(CylmeshError::SceneFormat { .. })
        ));
        assert!(matches!(
            SceneConfig::from_json_file(&dir.join("missing.json")),
            Err(CylmeshError::FileNotFound { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn cylinder_bounds_for_tilted_axis() {
        let cyl = Cylinder::from_axis(DVec3::new(0.0, 0.0, 8.0), 2.5).unwrap();
        let b = cylinder_bounds(&cyl);
        assert_eq!(b.min, DVec3::new(-2.5, -2.5, 0.0));
        assert_eq!(b.max, DVec3::new(2.5, 2.5, 8.0));

        let tilted = Cylinder::from_axis(DVec3::new(3.0, 0.0, 4.0), 1.0).unwrap();
        let b = cylinder_bounds(&tilted);
        // u = (0.6, 0, 0.8): x reach 0.8, y reach 1, z reach 0.6
        assert_abs_diff_eq!(b.min.x, -0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(b.max.x, 3.8, epsilon = 1e-12);
        assert_abs_diff_eq!(b.max.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.min.z, -0.6, epsilon = 1e-12);
    }

    #[test]
    fn builds_scene_from_data_dir() {
        let dir = scratch_dir("build");
        write_prefix(&dir, "mu", "0.1\n-999\n0.2\n", "0.0\n-999\n0.1\n", "0.3\n1000\n0.6\n");
        write_prefix(&dir, "ph", "0.5\n", "0.5\n", "0.9\n");

        let scene = Scene::build(&Preset::Unit.config(), &dir).unwrap();
        assert_eq!(scene.species.len(), 2);
        assert_eq!(scene.species[0].cloud.len(), 2);
        assert_eq!(scene.species[1].cloud.len(), 1);
        assert_eq!(scene.total_hits(), 3);
        assert_eq!(scene.limits.z, [0.0, 1.1]);
        assert_eq!(scene.surface.shape(), (100, 100));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn auto_limits_cover_surface_and_hits() {
        let dir = scratch_dir("limits");
        write_prefix(&dir, "mu", "0\n", "0\n", "12\n");
        write_prefix(&dir, "ph", "", "", "");

        let scene = Scene::build(&Preset::Tank.config(), &dir).unwrap();
        let l = scene.limits;
        assert!(l.x[0] < -2.5 && l.x[1] > 2.5);
        assert!(l.y[0] < -2.5 && l.y[1] > 2.5);
        assert!(l.z[0] < 0.0 && l.z[1] > 12.0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_species_file_fails_build() {
        let dir = scratch_dir("missing");
        write_prefix(&dir, "mu", "1\n", "1\n", "1\n");
        let err = Scene::build(&Preset::Unit.config(), &dir).unwrap_err();
        assert!(matches!(err, CylmeshError::FileNotFound { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn degenerate_scene_is_rejected() {
        let mut cfg = Preset::Unit.config();
        cfg.cylinder.axis = [0.0; 3];
        let err = Scene::build(&cfg, Path::new(".")).unwrap_err();
        assert!(matches!(err, CylmeshError::DegenerateGeometry(_)));
    }
}
