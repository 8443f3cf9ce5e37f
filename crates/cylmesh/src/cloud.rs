//! Per-species hit coordinates read from flat text columns.
//!
//! Each species is stored as three files holding one real number per line,
//! aligned by row index: `{prefix}_x.txt`, `{prefix}_y.txt`, `{prefix}_z.txt`.

use crate::bounds::Bounds;
use crate::error::{CylmeshError, Result};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Value the hit producer writes for a missing coordinate.
pub const DEFAULT_SENTINEL: f64 = -999.0;

/// The three coordinate files of one species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesFiles {
    pub x: PathBuf,
    pub y: PathBuf,
    pub z: PathBuf,
}

impl SpeciesFiles {
    /// `mu` -> `mu_x.txt`, `mu_y.txt`, `mu_z.txt`.
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            x: PathBuf::from(format!("{prefix}_x.txt")),
            y: PathBuf::from(format!("{prefix}_y.txt")),
            z: PathBuf::from(format!("{prefix}_z.txt")),
        }
    }

    /// Resolves relative paths against `dir`; absolute paths are kept.
    pub fn resolve(&self, dir: &Path) -> Self {
        Self {
            x: dir.join(&self.x),
            y: dir.join(&self.y),
            z: dir.join(&self.z),
        }
    }
}

/// Reads one coordinate column.
///
/// Blank lines and `#` comments are skipped. Every remaining line must hold
/// exactly one finite number.
pub fn read_column(path: &Path) -> Result<Vec<f64>> {
    let file = File::open(path).map_err(|e| CylmeshError::from_io(path, e))?;
    parse_column(BufReader::new(file), path)
}

/// Parses column text from any reader; `path` is only used in errors.
pub fn parse_column<R: BufRead>(reader: R, path: &Path) -> Result<Vec<f64>> {
    let mut values = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CylmeshError::from_io(path, e))?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let malformed = || CylmeshError::MalformedNumericData {
            path: path.to_path_buf(),
            line: idx + 1,
            token: trimmed.to_string(),
        };

        let mut parts = trimmed.split_whitespace();
        let token = parts.next().ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        let value: f64 = token.parse().map_err(|_| malformed())?;
        if !value.is_finite() {
            return Err(malformed());
        }

        values.push(value);
    }

    Ok(values)
}

/// Index-aligned hit coordinates of one particle species.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticlePointCloud {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl ParticlePointCloud {
    pub fn from_columns(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(CylmeshError::ShapeMismatch {
                x: x.len(),
                y: y.len(),
                z: z.len(),
            });
        }
        Ok(Self { x, y, z })
    }

    /// Reads the three columns concurrently and checks they line up.
    pub fn load(files: &SpeciesFiles) -> Result<Self> {
        let (x, (y, z)) = rayon::join(
            || read_column(&files.x),
            || rayon::join(|| read_column(&files.y), || read_column(&files.z)),
        );
        Self::from_columns(x?, y?, z?)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    #[inline]
    pub fn point(&self, i: usize) -> DVec3 {
        DVec3::new(self.x[i], self.y[i], self.z[i])
    }

    pub fn points(&self) -> impl Iterator<Item = DVec3> + '_ {
        (0..self.len()).map(move |i| self.point(i))
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.points())
    }

    /// Drops rows whose x coordinate is at or below `threshold`.
    /// Returns how many rows were removed.
    pub fn drop_sentinels(&mut self, threshold: f64) -> usize {
        let before = self.len();
        let keep: Vec<bool> = self.x.iter().map(|&v| v > threshold).collect();

        for column in [&mut self.x, &mut self.y, &mut self.z] {
            let mut flags = keep.iter();
            column.retain(|_| *flags.next().unwrap_or(&false));
        }

        before - self.len()
    }
}
