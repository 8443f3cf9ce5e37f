//! cylmesh: geometry and data for Cherenkov detector event displays.
//!
//! - Lateral-surface meshes of a cylindrical detector volume (full or half
//!   turn) around an arbitrary axis, plus the inverse `(t, theta)` projection.
//! - Per-species hit coordinates read from flat one-number-per-line files.
//! - Sequential colour maps for colouring hits by coordinate.
//! - A single [`SceneConfig`] with presets and a JSON scene-file form.

pub mod bounds;
pub mod cloud;
pub mod colormap;
pub mod error;
pub mod geometry;
pub mod scene;
pub mod surface;

pub use bounds::Bounds;
pub use cloud::{read_column, ParticlePointCloud, SpeciesFiles, DEFAULT_SENTINEL};
pub use colormap::{Colormap, Normalize};
pub use error::{CylmeshError, Result};
pub use geometry::{linspace, orthonormal_basis, AngularSpan, CylCoords, Cylinder, CylinderFrame, OrthonormalBasis};
pub use scene::{AxisLimits, CylinderConfig, Preset, Scene, SceneConfig, SpeciesConfig, SpeciesData};
pub use surface::{generate_surface, ParameterGrid, Samples, SurfacePointSet};
