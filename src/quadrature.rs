//! Quadrature point sets for discretizing source volumes.
//!
//! Every generator returns a [`WeightedPoints`] whose weights sum to one, so a
//! source's total emission rate can be split across its points directly.
//!
//! - line segments and boxes: uniform midpoint grids
//! - spheres: Gauss-Jacobi in radius, Gauss-Legendre in `cos θ`, uniform in `φ`
//! - cylinders: equal-area annuli, uniform angles, uniform axial midpoints

use std::f64::consts::PI;

use nalgebra::{DMatrix, Point3, SymmetricEigen, Vector3};

use crate::shield::{CappedCylinder, Cuboid, Sphere};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shield::{Axis, Crossing};

    #[test]
    fn gauss_legendre_two_points() {
        let (x, w) = gauss_jacobi(2, 0);
        let d = 0.5 / 3f64.sqrt();
        assert!((x[0] - (0.5 - d)).abs() < 1e-12);
        assert!((x[1] - (0.5 + d)).abs() < 1e-12);
        assert!((w[0] - 0.5).abs() < 1e-12);
        assert!((w[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn gauss_jacobi_integrates_polynomials_exactly() {
        // with weight x^k, n nodes integrate x^m exactly for m <= 2n - 1
        for k in [0, 2] {
            let n = 4;
            let (x, w) = gauss_jacobi(n, k);
            for m in 0..(2 * n as i32) {
                let sum: f64 = x.iter().zip(&w).map(|(xi, wi)| wi * xi.powi(m)).sum();
                let exact = 1.0 / (k as f64 + m as f64 + 1.0);
                assert!((sum - exact).abs() < 1e-12, "k={} m={} sum={}", k, m, sum);
            }
        }
    }

    #[test]
    fn single_node() {
        let (x, w) = gauss_jacobi(1, 2);
        assert!((x[0] - 0.75).abs() < 1e-12);
        assert!((w[0] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn line_midpoints() {
        let set = line_points(&Point3::origin(), &Point3::new(10.0, 0.0, 0.0), 5);
        assert_eq!(set.len(), 5);
        assert!((set.points[0] - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((set.points[4] - Point3::new(9.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((set.total_weight() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn box_cell_centers() {
        let cuboid = Cuboid::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(2.0, 4.0, 6.0)).unwrap();
        let set = box_points(&cuboid, [2, 2, 3]);
        assert_eq!(set.len(), 12);
        assert!((set.total_weight() - 1.0).abs() < 1e-12);
        assert!((set.points[0] - Point3::new(-0.5, -1.0, -2.0)).norm() < 1e-12);
        let centroid = set.centroid();
        assert!(centroid.coords.norm() < 1e-12);
    }

    #[test]
    fn sphere_points_inside_and_weighted() {
        let sphere = Sphere::new(Point3::new(1.0, -2.0, 3.0), 4.0).unwrap();
        let set = sphere_points(&sphere, [3, 4, 5]);
        assert_eq!(set.len(), 60);
        assert!((set.total_weight() - 1.0).abs() < 1e-12);
        for p in &set.points {
            assert!((p - sphere.center()).norm() < 4.0);
        }
        // the weighted centroid is the centre
        assert!((set.centroid() - sphere.center()).norm() < 1e-9);
        // the weighted mean of r^2 is 3R^2/5 for a uniform ball
        let mean_r2: f64 = set
            .points
            .iter()
            .zip(&set.weights)
            .map(|(p, w)| w * (p - sphere.center()).norm_squared())
            .sum();
        assert!((mean_r2 - 0.6 * 16.0).abs() < 1e-9);
    }

    #[test]
    fn cylinder_points_fill_the_body() {
        let cyl = CappedCylinder::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 10.0, 0.0), 2.0).unwrap();
        let set = cylinder_points(&cyl, [3, 6, 4]);
        assert_eq!(set.len(), 72);
        assert!((set.total_weight() - 1.0).abs() < 1e-12);
        for p in &set.points {
            assert!(cyl.contains(p));
        }
        assert!((set.centroid() - Point3::new(0.0, 5.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn aligned_cylinders_are_rotated_copies() {
        let n = [3, 10, 4];
        let along_z = CappedCylinder::aligned(Axis::Z, Point3::origin(), 10.0, 2.0).unwrap();
        let along_x = CappedCylinder::aligned(Axis::X, Point3::origin(), 10.0, 2.0).unwrap();
        let along_y = CappedCylinder::aligned(Axis::Y, Point3::origin(), 10.0, 2.0).unwrap();
        let z_points = cylinder_points(&along_z, n).points;
        let x_points = cylinder_points(&along_x, n).points;
        let y_points = cylinder_points(&along_y, n).points;
        for ((p, px), py) in z_points.iter().zip(&x_points).zip(&y_points) {
            assert!((px - Point3::new(p.z, p.y, -p.x)).norm() < 1e-12, "{:?} vs {:?}", px, p);
            assert!((py - Point3::new(p.x, p.z, -p.y)).norm() < 1e-12, "{:?} vs {:?}", py, p);
        }

        let (e1, e2) = perpendicular_basis(&Vector3::new(1.0, 1.0, 1.0).normalize());
        assert!(e1.dot(&e2).abs() < 1e-12);
        assert!((e1.cross(&e2) - Vector3::new(1.0, 1.0, 1.0).normalize()).norm() < 1e-12);
    }
}

/// Source points with quadrature weights.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeightedPoints {
    pub points: Vec<Point3<f64>>,
    pub weights: Vec<f64>,
}

impl WeightedPoints {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Weight-averaged location of the points.
    pub fn centroid(&self) -> Point3<f64> {
        let sum = self
            .points
            .iter()
            .zip(&self.weights)
            .fold(Vector3::zeros(), |acc, (p, w)| acc + p.coords * *w);
        Point3::from(sum / self.total_weight())
    }

    /// Points with equal weights.
    fn uniform(points: Vec<Point3<f64>>) -> Self {
        let w = 1.0 / points.len() as f64;
        let weights = vec![w; points.len()];
        Self { points, weights }
    }
}

/// Midpoints of `n` equal intervals on `[0, 1]`.
fn midpoints(n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |i| (i as f64 + 0.5) / n as f64)
}

/// Gauss-Jacobi nodes and weights on `[0, 1]` for the weight function `x^k`.
///
/// **Context**: Radial integration over a ball carries an `r²` Jacobian, so
/// the sphere quadrature uses `k = 2`; `k = 0` gives Gauss-Legendre.
///
/// **How it Works**: The nodes are the eigenvalues of the symmetric tridiagonal
/// Jacobi matrix built from the three-term recurrence of the orthogonal
/// polynomials, mapped from `[-1, 1]` to `[0, 1]`. Each weight is the squared
/// first component of the matching normalized eigenvector times the integral
/// of the weight function.
pub fn gauss_jacobi(n: usize, k: u32) -> (Vec<f64>, Vec<f64>) {
    if n == 0 {
        return (Vec::new(), Vec::new());
    }
    let k = k as f64;
    let k1 = k + 1.0;
    let k2 = k + 2.0;

    // diagonal
    let mut diag = Vec::with_capacity(n);
    diag.push(k / k2);
    for i in 1..n {
        let nnk = 2.0 * i as f64 + k;
        diag.push(k * k / (nnk * (nnk + 2.0)));
    }

    // squared off-diagonal
    let mut off2 = Vec::with_capacity(n.saturating_sub(1));
    if n > 1 {
        off2.push(4.0 * k1 / (k2 * k2 * (k + 3.0)));
    }
    for i in 2..n {
        let i = i as f64;
        let nnk2 = (2.0 * i + k).powi(2);
        off2.push(4.0 * (i * (i + k)).powi(2) / (nnk2 * nnk2 - nnk2));
    }

    let jacobi = DMatrix::from_fn(n, n, |r, c| {
        if r == c {
            diag[r]
        } else if r + 1 == c {
            off2[r].sqrt()
        } else if c + 1 == r {
            off2[c].sqrt()
        } else {
            0.0
        }
    });
    let eigen = SymmetricEigen::new(jacobi);

    let mut pairs: Vec<(f64, f64)> = (0..n)
        .map(|j| {
            let v0 = eigen.eigenvectors[(0, j)];
            ((eigen.eigenvalues[j] + 1.0) / 2.0, v0 * v0 / k1)
        })
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs.into_iter().unzip()
}

/// `n` points at the midpoints of equal segments of a line.
pub fn line_points(start: &Point3<f64>, end: &Point3<f64>, n: usize) -> WeightedPoints {
    let v = end - start;
    WeightedPoints::uniform(midpoints(n).map(|f| start + v * f).collect())
}

/// Cell centres of a regular `nx × ny × nz` grid over a box.
pub fn box_points(cuboid: &Cuboid, n: [usize; 3]) -> WeightedPoints {
    let min = cuboid.min_corner();
    let dim = cuboid.dimensions();
    let mut points = Vec::with_capacity(n[0] * n[1] * n[2]);
    for fx in midpoints(n[0]) {
        for fy in midpoints(n[1]) {
            for fz in midpoints(n[2]) {
                points.push(min + Vector3::new(fx * dim.x, fy * dim.y, fz * dim.z));
            }
        }
    }
    WeightedPoints::uniform(points)
}

/// Product quadrature over a ball with `[n_radial, n_polar, n_azimuthal]`
/// points per dimension.
pub fn sphere_points(sphere: &Sphere, n: [usize; 3]) -> WeightedPoints {
    let radius = sphere.radius();
    let center = sphere.center();
    let volume = sphere.volume();

    let (r, wr) = gauss_jacobi(n[0], 2);
    let radial: Vec<(f64, f64)> = r
        .iter()
        .zip(&wr)
        .map(|(x, w)| (x * radius, w * radius.powi(3)))
        .collect();
    let (x, wx) = gauss_jacobi(n[1], 0);
    let polar: Vec<(f64, f64)> = x
        .iter()
        .zip(&wx)
        .map(|(x, w)| ((2.0 * x - 1.0).acos(), 2.0 * w))
        .collect();
    let wp = 2.0 * PI / n[2] as f64;

    let total = n[0] * n[1] * n[2];
    let mut points = Vec::with_capacity(total);
    let mut weights = Vec::with_capacity(total);
    for k in 0..n[2] {
        let phi = wp * k as f64;
        for (rj, wrj) in &radial {
            for (ti, wti) in &polar {
                let offset = Vector3::new(
                    rj * ti.sin() * phi.cos(),
                    rj * ti.sin() * phi.sin(),
                    rj * ti.cos(),
                );
                points.push(center + offset);
                weights.push(wrj * wti * wp / volume);
            }
        }
    }
    WeightedPoints { points, weights }
}

/// Points in a capped cylinder with `[n_radial, n_angular, n_axial]` points per
/// dimension. Radial points sit in the middle of annuli of equal area, so
/// every point carries the same weight.
pub fn cylinder_points(cylinder: &CappedCylinder, n: [usize; 3]) -> WeightedPoints {
    let radius = cylinder.radius();
    let axis = cylinder.axis();
    let (e1, e2) = perpendicular_basis(&axis);

    let annulus_area = PI * radius * radius / n[0] as f64;
    let mut radii = Vec::with_capacity(n[0]);
    let mut inner: f64 = 0.0;
    for i in 1..=n[0] {
        let outer = (i as f64 * annulus_area / PI).sqrt();
        radii.push((inner + outer) / 2.0);
        inner = outer;
    }
    let angles: Vec<f64> = midpoints(n[1]).map(|f| 2.0 * PI * f).collect();
    let heights: Vec<f64> = midpoints(n[2]).map(|f| f * cylinder.length()).collect();

    let mut points = Vec::with_capacity(n[0] * n[1] * n[2]);
    for r in &radii {
        for theta in &angles {
            let radial = e1 * (r * theta.cos()) + e2 * (r * theta.sin());
            for h in &heights {
                points.push(cylinder.start() + axis * *h + radial);
            }
        }
    }
    WeightedPoints::uniform(points)
}

/// Two unit vectors completing a right-handed frame with `axis`. The X and Y
/// axes get the frames that rotate a Z-aligned cylinder onto them:
/// (x, y, z) → (z, y, −x) for X and (x, y, z) → (x, z, −y) for Y.
fn perpendicular_basis(axis: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    if *axis == Vector3::x() {
        return (-Vector3::z(), Vector3::y());
    }
    if *axis == Vector3::y() {
        return (Vector3::x(), -Vector3::z());
    }
    if *axis == Vector3::z() {
        return (Vector3::x(), Vector3::y());
    }
    let helper = match axis.iamax() {
        0 => Vector3::y(),
        1 => Vector3::z(),
        _ => Vector3::x(),
    };
    let e2 = axis.cross(&helper).normalize();
    let e1 = e2.cross(axis);
    (e1, e2)
}
