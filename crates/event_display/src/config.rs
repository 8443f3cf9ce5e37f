use crate::camera::Camera;
use crate::plot::FigureSize;
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use cylmesh::{AngularSpan, Preset, Samples, Scene, SceneConfig};
use std::path::PathBuf;

/// `event_display` - renders one Cherenkov detector event.
///
/// Muon and photon hit coordinates are read from `{prefix}_{x,y,z}.txt`
/// files and drawn as coloured 3D scatter points over the detector cylinder.
/// The figure is shown in a window or written as a PNG.
#[derive(Parser, Debug, Clone)]
#[command(name = "event_display", version, about, long_about = None)]
pub struct Args {
    /// Built-in scene to start from.
    #[arg(long, value_enum, default_value_t = PresetArg::Unit)]
    pub preset: PresetArg,

    /// JSON scene file. Replaces the preset entirely.
    #[arg(long, env = "EVENT_DISPLAY_SCENE")]
    pub scene: Option<PathBuf>,

    /// Directory that relative hit-file paths are resolved against.
    #[arg(long, env = "EVENT_DISPLAY_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Cylinder axis vector `X,Y,Z`; its length is the cylinder height.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub axis: Option<Vec<f64>>,

    /// Point the axis starts from, `X,Y,Z`.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub base: Option<Vec<f64>>,

    #[arg(long)]
    pub radius: Option<f64>,

    #[arg(long, value_enum)]
    pub span: Option<SpanArg>,

    /// Mesh samples along both the axis and the angle.
    #[arg(long)]
    pub samples: Option<usize>,

    /// Show a window or write an image. Defaults to `save` when `--out` is
    /// given or the preset has an output file, `display` otherwise.
    #[arg(long, value_enum)]
    pub output: Option<OutputArg>,

    /// Image path for `save` mode and the viewer's save button.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Event number; names the image `{N}_EventDisplay.png`.
    #[arg(long)]
    pub event: Option<u64>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, default_value_t = 1024, value_parser = clap::value_parser!(u32).range(16..))]
    pub width: u32,

    #[arg(long, default_value_t = 768, value_parser = clap::value_parser!(u32).range(16..))]
    pub height: u32,

    /// Initial view azimuth in degrees.
    #[arg(long, default_value_t = -60.0, allow_negative_numbers = true)]
    pub azimuth: f64,

    /// Initial view elevation in degrees, clamped to +-89.
    #[arg(long, default_value_t = 30.0, allow_negative_numbers = true)]
    pub elevation: f64,

    /// Keep rows carrying the -999 missing-hit sentinel.
    #[arg(long)]
    pub keep_sentinels: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    /// Unit half cylinder, shown on screen.
    Unit,
    /// 8 x 2.5 half cylinder, saved as `79_EventDisplay.png`.
    Tank,
    /// 8 x 2.5 full cylinder.
    Full,
}

impl From<PresetArg> for Preset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::Unit => Preset::Unit,
            PresetArg::Tank => Preset::Tank,
            PresetArg::Full => Preset::Full,
        }
    }
}

impl std::fmt::Display for PresetArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PresetArg::Unit => "unit",
            PresetArg::Tank => "tank",
            PresetArg::Full => "full",
        };

        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SpanArg {
    /// Half turn (pi).
    Half,
    /// Full turn (2 pi).
    Full,
}

impl From<SpanArg> for AngularSpan {
    fn from(s: SpanArg) -> Self {
        match s {
            SpanArg::Half => AngularSpan::Half,
            SpanArg::Full => AngularSpan::Full,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    Display,
    Save,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Interactive window.
    Display,
    /// Write the image and exit.
    Save(PathBuf),
}

/// Fully resolved run configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub scene: SceneConfig,
    pub data_dir: PathBuf,
    pub output: OutputMode,
    /// Where the viewer's save button writes.
    pub save_path: PathBuf,
    pub figure: FigureSize,
    pub camera: Camera,
}

impl Settings {
    /// Validates the geometry and loads the hit files under `data_dir`.
    pub fn build_scene(&self) -> Result<Scene> {
        Scene::build(&self.scene, &self.data_dir).context("Failed to build scene")
    }
}

fn vec3(flag: &str, v: &[f64]) -> Result<[f64; 3]> {
    match v {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => bail!("--{flag} takes exactly three comma-separated values, got {}", v.len()),
    }
}

impl Args {
    /// Applies preset, then scene file, then the individual overrides.
    pub fn resolve(self) -> Result<Settings> {
        let preset = Preset::from(self.preset);

        let (mut scene, preset_output) = match &self.scene {
            Some(path) => {
                let scene = SceneConfig::from_json_file(path)
                    .with_context(|| format!("Failed to load scene file {}", path.display()))?;
                (scene, None)
            }
            None => (preset.config(), preset.default_output()),
        };

        if let Some(axis) = &self.axis {
            scene.cylinder.axis = vec3("axis", axis)?;
        }
        if let Some(base) = &self.base {
            scene.cylinder.base = vec3("base", base)?;
        }
        if let Some(radius) = self.radius {
            scene.cylinder.radius = radius;
        }
        if let Some(span) = self.span {
            scene.span = span.into();
        }
        if let Some(n) = self.samples {
            scene.samples = Samples::square(n);
        }
        if self.keep_sentinels {
            scene.drop_sentinels = false;
        }

        if self.title.is_some() {
            scene.title = self.title.clone();
        } else if scene.title.is_none() {
            scene.title = self.event.map(|n| format!("Event {n}"));
        }

        let save_path = self
            .out
            .clone()
            .or_else(|| self.event.map(|n| PathBuf::from(format!("{n}_EventDisplay.png"))))
            .or_else(|| preset_output.clone())
            .unwrap_or_else(|| PathBuf::from("EventDisplay.png"));

        let output = match self.output {
            Some(OutputArg::Save) => OutputMode::Save(save_path.clone()),
            Some(OutputArg::Display) => OutputMode::Display,
            None if self.out.is_some() || preset_output.is_some() => {
                OutputMode::Save(save_path.clone())
            }
            None => OutputMode::Display,
        };

        Ok(Settings {
            scene,
            data_dir: self.data_dir,
            output,
            save_path,
            figure: FigureSize::new(self.width, self.height),
            camera: Camera::new(self.azimuth, self.elevation),
        })
    }
}
