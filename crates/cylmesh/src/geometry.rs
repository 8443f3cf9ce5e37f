//! Cylinder frames: axis, transverse orthonormal basis and the
//! `(t, theta) <-> point` mapping used by the surface generator.

use crate::error::{CylmeshError, Result};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Below this `|unit_axis x reference|` the reference is treated as parallel
/// to the axis and the fallback reference is used instead.
pub const PARALLEL_EPS: f64 = 1e-6;

/// Angular sweep of the generated surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngularSpan {
    /// Half cylinder, `theta` in `[0, pi]`.
    #[default]
    Half,
    /// Full cylinder, `theta` in `[0, 2 pi]`.
    Full,
    /// Explicit sweep in radians, `(0, 2 pi]`.
    Radians(f64),
}

impl AngularSpan {
    #[inline]
    pub fn radians(self) -> f64 {
        match self {
            AngularSpan::Half => PI,
            AngularSpan::Full => TAU,
            AngularSpan::Radians(r) => r,
        }
    }

    pub fn validate(self) -> Result<f64> {
        let r = self.radians();
        if !r.is_finite() || r <= 0.0 || r > TAU {
            return Err(CylmeshError::degenerate(format!(
                "angular span must lie in (0, 2pi], got {r}"
            )));
        }
        Ok(r)
    }
}

/// Two unit vectors spanning the plane transverse to an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthonormalBasis {
    pub n1: DVec3,
    pub n2: DVec3,
}

/// Builds `{n1, n2}` so that `{unit_axis, n1, n2}` is right-handed and
/// orthonormal.
///
/// `n1 = normalize(unit_axis x X)`, falling back to `Y` as the reference when
/// the axis runs along `X`. `unit_axis` must already be normalised.
pub fn orthonormal_basis(unit_axis: DVec3) -> OrthonormalBasis {
    let mut cross = unit_axis.cross(DVec3::X);
    if cross.length() < PARALLEL_EPS {
        cross = unit_axis.cross(DVec3::Y);
    }

    let n1 = cross.normalize();
    let n2 = unit_axis.cross(n1);

    OrthonormalBasis { n1, n2 }
}

/// `n` evenly spaced samples over `[start, end]`, both ends included.
///
/// `n == 1` yields `[start]`; the last sample is pinned to `end` exactly.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Length and direction of `v`, computed on `v` rescaled by its largest
/// component so the squared norm neither underflows nor overflows.
fn scaled_norm(v: DVec3) -> (f64, DVec3) {
    let scale = v.abs().max_element();
    if scale == 0.0 || !scale.is_finite() {
        return (scale, DVec3::ZERO);
    }
    let w = v / scale;
    (scale * w.length(), w.normalize())
}

/// A validated cylinder: base point, axis (direction and height) and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    base: DVec3,
    axis: DVec3,
    radius: f64,
}

impl Cylinder {
    pub fn new(base: DVec3, axis: DVec3, radius: f64) -> Result<Self> {
        if !base.is_finite() {
            return Err(CylmeshError::degenerate(format!(
                "base point must be finite, got {base}"
            )));
        }

        if !axis.is_finite() {
            return Err(CylmeshError::degenerate(format!(
                "axis must be finite, got {axis}"
            )));
        }

        let (magnitude, _) = scaled_norm(axis);
        if magnitude <= 0.0 {
            return Err(CylmeshError::degenerate("axis must be a non-zero vector"));
        }
        if !magnitude.is_finite() {
            return Err(CylmeshError::degenerate(format!(
                "axis length overflows f64, got {axis}"
            )));
        }

        if !radius.is_finite() || radius <= 0.0 {
            return Err(CylmeshError::degenerate(format!(
                "radius must be positive, got {radius}"
            )));
        }

        Ok(Self { base, axis, radius })
    }

    /// Cylinder standing on the origin.
    pub fn from_axis(axis: DVec3, radius: f64) -> Result<Self> {
        Self::new(DVec3::ZERO, axis, radius)
    }

    #[inline]
    pub fn base(&self) -> DVec3 {
        self.base
    }

    #[inline]
    pub fn axis(&self) -> DVec3 {
        self.axis
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Cylinder height, `||axis||`.
    #[inline]
    pub fn magnitude(&self) -> f64 {
        scaled_norm(self.axis).0
    }

    pub fn frame(&self) -> CylinderFrame {
        let (magnitude, unit_axis) = scaled_norm(self.axis);

        CylinderFrame {
            base: self.base,
            unit_axis,
            basis: orthonormal_basis(unit_axis),
            magnitude,
            radius: self.radius,
        }
    }
}

/// Cylindrical coordinates of a point relative to a [`CylinderFrame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylCoords {
    /// Offset along the axis from the base.
    pub t: f64,
    /// Angle in `[0, 2 pi)`, measured from `n2` towards `n1`.
    pub theta: f64,
    /// Distance from the axis line.
    pub radial: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderFrame {
    pub base: DVec3,
    pub unit_axis: DVec3,
    pub basis: OrthonormalBasis,
    pub magnitude: f64,
    pub radius: f64,
}

impl CylinderFrame {
    /// Surface point at axis offset `t` and angle `theta`.
    #[inline]
    pub fn point_at(&self, t: f64, theta: f64) -> DVec3 {
        let (sin, cos) = theta.sin_cos();
        self.base
            + self.unit_axis * t
            + self.basis.n1 * (self.radius * sin)
            + self.basis.n2 * (self.radius * cos)
    }

    /// Inverse of [`point_at`](Self::point_at) for any point in space.
    pub fn project(&self, point: DVec3) -> CylCoords {
        let d = point - self.base;
        let t = d.dot(self.unit_axis);
        let a = d.dot(self.basis.n1);
        let b = d.dot(self.basis.n2);

        let mut theta = a.atan2(b).rem_euclid(TAU);
        if theta >= TAU {
            theta -= TAU;
        }

        CylCoords {
            t,
            theta,
            radial: a.hypot(b),
        }
    }

    pub fn distance_to_axis(&self, point: DVec3) -> f64 {
        let d = point - self.base;
        (d - self.unit_axis * d.dot(self.unit_axis)).length()
    }
}
