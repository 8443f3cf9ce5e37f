//! Lateral-surface mesh generation for a [`Cylinder`].
//!
//! The mesh has shape `(angular_samples, longitudinal_samples)`: row `i`
//! holds angle `theta[i]`, column `j` holds axis offset `t[j]`. Coordinates
//! are stored as three row-major planes, one per axis.

use crate::bounds::Bounds;
use crate::error::{CylmeshError, Result};
use crate::geometry::{linspace, AngularSpan, Cylinder, CylinderFrame};
use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Mesh resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Samples {
    pub longitudinal: usize,
    pub angular: usize,
}

impl Samples {
    pub const fn square(n: usize) -> Self {
        Self {
            longitudinal: n,
            angular: n,
        }
    }
}

impl Default for Samples {
    fn default() -> Self {
        Self::square(100)
    }
}

/// The two 1D parameter ranges whose outer product forms the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    /// Axis offsets, `0..=magnitude`.
    pub t: Vec<f64>,
    /// Angles, `0..=span`.
    pub theta: Vec<f64>,
}

impl ParameterGrid {
    pub fn new(magnitude: f64, span: f64, samples: Samples) -> Self {
        Self {
            t: linspace(0.0, magnitude, samples.longitudinal),
            theta: linspace(0.0, span, samples.angular),
        }
    }

    /// `(rows, cols)` = `(angular, longitudinal)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.theta.len(), self.t.len())
    }

    /// `(t, theta)` at mesh position `(i, j)`.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> (f64, f64) {
        (self.t[j], self.theta[i])
    }
}

/// X, Y and Z planes of the generated surface.
#[derive(Debug, Clone)]
pub struct SurfacePointSet {
    frame: CylinderFrame,
    grid: ParameterGrid,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl SurfacePointSet {
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn frame(&self) -> &CylinderFrame {
        &self.frame
    }

    pub fn grid(&self) -> &ParameterGrid {
        &self.grid
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    #[inline]
    fn index(&self, i: usize, j: usize) -> usize {
        i * self.grid.t.len() + j
    }

    /// Point at row `i` (angle) and column `j` (axis offset).
    #[inline]
    pub fn point(&self, i: usize, j: usize) -> DVec3 {
        let k = self.index(i, j);
        DVec3::new(self.x[k], self.y[k], self.z[k])
    }

    pub fn points(&self) -> impl Iterator<Item = DVec3> + '_ {
        (0..self.len()).map(move |k| DVec3::new(self.x[k], self.y[k], self.z[k]))
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.points())
    }

    /// Mesh cells as corner positions `(i, j)`, walked around the cell.
    pub fn quads(&self) -> impl Iterator<Item = [(usize, usize); 4]> {
        let (rows, cols) = self.shape();
        (0..rows.saturating_sub(1)).flat_map(move |i| {
            (0..cols.saturating_sub(1))
                .map(move |j| [(i, j), (i, j + 1), (i + 1, j + 1), (i + 1, j)])
        })
    }
}

/// Samples the lateral surface of `cylinder` over `span`.
///
/// Fails with `DegenerateGeometry` for a zero sample count or an invalid
/// span; the cylinder itself was validated on construction.
pub fn generate_surface(
    cylinder: &Cylinder,
    span: AngularSpan,
    samples: Samples,
) -> Result<SurfacePointSet> {
    if samples.longitudinal == 0 || samples.angular == 0 {
        return Err(CylmeshError::degenerate(format!(
            "sample counts must be positive, got {}x{}",
            samples.angular, samples.longitudinal
        )));
    }
    let span = span.validate()?;

    let frame = cylinder.frame();
    let grid = ParameterGrid::new(frame.magnitude, span, samples);

    let points: Vec<DVec3> = grid
        .theta
        .par_iter()
        .flat_map_iter(|&theta| grid.t.iter().map(move |&t| frame.point_at(t, theta)))
        .collect();

    let n = points.len();
    let (mut x, mut y, mut z) = (Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n));
    for p in points {
        x.push(p.x);
        y.push(p.y);
        z.push(p.z);
    }

    log::debug!(
        "Cylinder surface {}x{}: unit_axis={}, n1={}, n2={}",
        grid.theta.len(),
        grid.t.len(),
        frame.unit_axis,
        frame.basis.n1,
        frame.basis.n2
    );

    Ok(SurfacePointSet { frame, grid, x, y, z })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use std::f64::consts::{PI, TAU};

    fn surface(axis: DVec3, radius: f64, span: AngularSpan) -> SurfacePointSet {
        let cyl = Cylinder::from_axis(axis, radius).unwrap();
        generate_surface(&cyl, span, Samples::default()).unwrap()
    }

    #[test]
    fn unit_half_cylinder() {
        let s = surface(DVec3::Z, 1.0, AngularSpan::Half);
        assert_eq!(s.shape(), (100, 100));
        assert_eq!(s.len(), 100 * 100);

        let b = s.bounds();
        assert_abs_diff_eq!(b.min.z, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.max.z, 1.0, epsilon = 1e-12);
        assert!(b.min.x >= -1.0 - 1e-12 && b.max.x <= 1.0 + 1e-12);
        assert!(b.min.y >= -1.0 - 1e-12 && b.max.y <= 1.0 + 1e-12);

        // theta in [0, pi] with n1 = +y: only the y >= 0 half is swept.
        assert!(b.min.y >= -1e-12);
        assert_abs_diff_eq!(b.max.y, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(b.min.x, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.max.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn tank_half_cylinder() {
        let s = surface(DVec3::new(0.0, 0.0, 8.0), 2.5, AngularSpan::Half);
        let b = s.bounds();
        assert_abs_diff_eq!(b.min.z, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.max.z, 8.0, epsilon = 1e-12);
        assert!(b.min.x >= -2.5 - 1e-12 && b.max.x <= 2.5 + 1e-12);
        assert!(b.min.y >= -2.5 - 1e-12 && b.max.y <= 2.5 + 1e-12);
    }

    #[test]
    fn full_span_closes_the_ring() {
        let s = surface(DVec3::Z, 1.0, AngularSpan::Full);
        let (rows, cols) = s.shape();
        for j in 0..cols {
            let first = s.point(0, j);
            let last = s.point(rows - 1, j);
            assert!((first - last).length() < 1e-12);
        }
        assert_abs_diff_eq!(s.bounds().min.y, -1.0, epsilon = 1e-3);
    }

    #[test]
    fn zero_axis_is_rejected_without_output() {
        let err = Cylinder::from_axis(DVec3::ZERO, 1.0).unwrap_err();
        assert!(matches!(err, CylmeshError::DegenerateGeometry(_)));
    }

    #[test]
    fn zero_samples_are_rejected() {
        let cyl = Cylinder::from_axis(DVec3::Z, 1.0).unwrap();
        for samples in [
            Samples { longitudinal: 0, angular: 10 },
            Samples { longitudinal: 10, angular: 0 },
        ] {
            let err = generate_surface(&cyl, AngularSpan::Half, samples).unwrap_err();
            assert!(matches!(err, CylmeshError::DegenerateGeometry(_)));
        }

        let err = generate_surface(&cyl, AngularSpan::Radians(0.0), Samples::default()).unwrap_err();
        assert!(matches!(err, CylmeshError::DegenerateGeometry(_)));
    }

    #[test]
    fn rows_are_angles_and_columns_are_offsets() {
        let cyl = Cylinder::from_axis(DVec3::Z, 2.0).unwrap();
        let s = generate_surface(&cyl, AngularSpan::Half, Samples { longitudinal: 5, angular: 3 }).unwrap();
        assert_eq!(s.shape(), (3, 5));
        assert_eq!(s.grid().t, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(s.grid().theta, vec![0.0, PI / 2.0, PI]);

        // theta = pi/2 points along n1 = +y
        let p = s.point(1, 4);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn quads_cover_every_cell() {
        let cyl = Cylinder::from_axis(DVec3::Z, 1.0).unwrap();
        let s = generate_surface(&cyl, AngularSpan::Full, Samples { longitudinal: 4, angular: 6 }).unwrap();
        let quads: Vec<_> = s.quads().collect();
        assert_eq!(quads.len(), 5 * 3);
        assert_eq!(quads[0], [(0, 0), (0, 1), (1, 1), (1, 0)]);

        let single = generate_surface(&cyl, AngularSpan::Full, Samples::square(1)).unwrap();
        assert_eq!(single.quads().count(), 0);
    }

    #[test]
    fn inverse_projection_recovers_parameters() {
        let cyl = Cylinder::new(DVec3::new(0.5, -1.0, 2.0), DVec3::new(1.0, 2.0, -3.0), 1.7).unwrap();
        let s = generate_surface(&cyl, AngularSpan::Radians(5.0), Samples::square(25)).unwrap();
        let (rows, cols) = s.shape();

        for i in 0..rows {
            for j in 0..cols {
                let (t, theta) = s.grid().at(i, j);
                let c = s.frame().project(s.point(i, j));
                assert_abs_diff_eq!(c.t, t, epsilon = 1e-9);
                assert_abs_diff_eq!(c.radial, 1.7, epsilon = 1e-9);
                let gap = (c.theta - theta).rem_euclid(TAU);
                assert!(gap.min(TAU - gap) < 1e-9, "theta {theta} -> {}", c.theta);
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn every_point_sits_on_the_lateral_surface(
            ax in -5.0f64..5.0,
            ay in -5.0f64..5.0,
            az in -5.0f64..5.0,
            radius in 0.05f64..10.0,
            full in any::<bool>(),
        ) {
            let axis = DVec3::new(ax, ay, az);
            prop_assume!(axis.length() > 1e-2);

            let span = if full { AngularSpan::Full } else { AngularSpan::Half };
            let cyl = Cylinder::from_axis(axis, radius).unwrap();
            let s = generate_surface(&cyl, span, Samples::square(12)).unwrap();
            let frame = s.frame();
            let (rows, cols) = s.shape();
            let tol = 1e-9 * (1.0 + radius + frame.magnitude);

            for i in 0..rows {
                for j in 0..cols {
                    let p = s.point(i, j);
                    let (t, _) = s.grid().at(i, j);
                    prop_assert!((frame.distance_to_axis(p) - radius).abs() < tol);
                    prop_assert!((p.dot(frame.unit_axis) - t).abs() < tol);
                }
            }
        }
    }
}
