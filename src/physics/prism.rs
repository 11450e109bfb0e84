//! Closed-form field of a uniformly magnetized rectangular prism.
use nalgebra::{DMatrix, DVector};
use rayon::{iter::ParallelIterator, slice::ParallelSlice};

use crate::{
    chunksize,
    error::MagError,
    math::{atan_ratio, clip_nonfinite, rss3},
    MU0_OVER_4PI, NT,
};

/// Sign of each node in the corner sums, indexed [lower, upper]
const NODE_SIGN: [f64; 2] = [-1.0, 1.0];

/// (nT-m/A) Scale from the geometric tensor to flux density in nT
/// per unit magnetization in A/m
const TENSOR_TO_NT: f64 = MU0_OVER_4PI / NT;

/// Geometric tensor of a rectangular prism seen from one observation point.
///
/// # Arguments
///
/// * `xn`:  (m) `[min, max]` x-extent of the prism
/// * `yn`:  (m) `[min, max]` y-extent of the prism
/// * `zn`:  (m) `[min, max]` z-extent of the prism
/// * `obs`: (m) observation point
///
/// # Returns
///
/// * `t`:         [dimensionless] symmetric tensor such that the flux density is
///                $\frac{\mu_0}{4 \pi} T M$ for a uniform magnetization $M$ (A/m)
/// * `nsingular`: number of prism corners coincident with the observation point
///
/// # Commentary
///
/// With $u, v, w$ the offsets from the observation point to a corner, $R$ the
/// distance to it, and $s = \pm 1$ by whether the corner takes the upper or
/// lower node on each axis, the components are the triple differences
///
/// $$
/// T_{xx} = -\sum s \arctan \frac{v w}{u R} \quad
/// T_{xy} = \sum s \ln (w + R)
/// $$
///
/// and their permutations, per \[1\], \[2\]. The trace is zero outside the
/// prism and $-4\pi$ inside it.
///
/// The arctangents are on the principal branch. For $w < 0$, $\ln(w + R)$ is
/// evaluated as $\ln(u^2 + v^2) - \ln(R - w)$, which avoids cancellation below
/// and above the prism. On the line through a vertical prism edge the
/// $\ln(u^2 + v^2)$ terms cancel between the two z-nodes and are dropped.
/// Any remaining non-finite log (the observation point on a corner) contributes 0.
///
/// # References
///
///   \[1\] B. K. Bhattacharyya, “Magnetic anomalies due to prism-shaped bodies with arbitrary polarization,”
///         Geophysics, vol. 29, no. 4, pp. 517-531, 1964, doi: [10.1190/1.1439386](https://doi.org/10.1190/1.1439386).
///
///   \[2\] R. J. Blakely, *Potential Theory in Gravity and Magnetic Applications*. Cambridge University Press, 1995.
pub fn prism_tensor_scalar(
    xn: [f64; 2],
    yn: [f64; 2],
    zn: [f64; 2],
    obs: [f64; 3],
) -> ([[f64; 3]; 3], usize) {
    let mut txx = 0.0;
    let mut tyy = 0.0;
    let mut tzz = 0.0;
    let mut txy = 0.0;
    let mut txz = 0.0;
    let mut tyz = 0.0;
    let mut nsingular = 0;

    for (i, &x) in xn.iter().enumerate() {
        let u = x - obs[0]; // [m]
        for (j, &y) in yn.iter().enumerate() {
            let v = y - obs[1]; // [m]
            for (k, &z) in zn.iter().enumerate() {
                let w = z - obs[2]; // [m]
                let s = NODE_SIGN[i] * NODE_SIGN[j] * NODE_SIGN[k];
                let r = rss3(u, v, w); // [m]

                if r == 0.0 {
                    nsingular += 1;
                }

                txx -= s * atan_ratio(v * w, u * r);
                tyy -= s * atan_ratio(u * w, v * r);
                tzz -= s * atan_ratio(u * v, w * r);

                txy += s * log_term(u, v, w, r);
                txz += s * log_term(w, u, v, r);
                tyz += s * log_term(v, w, u, r);
            }
        }
    }

    let t = [[txx, txy, txz], [txy, tyy, tyz], [txz, tyz, tzz]];
    (t, nsingular)
}

/// $\ln(c + R)$ for a corner where `a`, `b` are the other two offsets.
#[inline]
fn log_term(a: f64, b: f64, c: f64, r: f64) -> f64 {
    if c >= 0.0 {
        clip_nonfinite(libm::log(c + r), 0.0)
    } else {
        // (c + R)(R - c) = a^2 + b^2
        let q = a.mul_add(a, b * b);
        clip_nonfinite(libm::log(q), 0.0) - libm::log(r - c)
    }
}

/// Dense linear map from a prism's magnetization to the flux density at a
/// set of receivers.
///
/// The matrix has shape `(3n, 3)` for `n` receivers. Rows `[0, n)` give Bx,
/// `[n, 2n)` give By and `[2n, 3n)` give Bz, each in nT per A/m of
/// magnetization.
#[derive(Clone, Debug, PartialEq)]
pub struct ForwardOperator {
    g: DMatrix<f64>,
}

impl ForwardOperator {
    /// Assemble the operator for a prism and receivers that are both
    /// expressed in the prism's body frame.
    ///
    /// # Arguments
    ///
    /// * `xn`, `yn`, `zn`: (m) `[min, max]` prism extents on each axis
    /// * `rx`:             (m) receiver locations, length `n`
    ///
    /// # Errors
    ///
    /// * [`MagError::NonFinite`] if any coefficient is NaN or infinite
    pub fn build(
        xn: [f64; 2],
        yn: [f64; 2],
        zn: [f64; 2],
        rx: &[[f64; 3]],
    ) -> Result<Self, MagError> {
        let tensors: Vec<_> = rx
            .iter()
            .map(|&obs| prism_tensor_scalar(xn, yn, zn, obs))
            .collect();

        Self::assemble(&tensors)
    }

    /// Same as [`ForwardOperator::build`], parallelized over chunks of receivers.
    pub fn build_par(
        xn: [f64; 2],
        yn: [f64; 2],
        zn: [f64; 2],
        rx: &[[f64; 3]],
    ) -> Result<Self, MagError> {
        let n = chunksize(rx.len());
        let tensors: Vec<_> = rx
            .par_chunks(n)
            .flat_map_iter(|chunk| {
                chunk
                    .iter()
                    .map(move |&obs| prism_tensor_scalar(xn, yn, zn, obs))
            })
            .collect();

        Self::assemble(&tensors)
    }

    fn assemble(tensors: &[([[f64; 3]; 3], usize)]) -> Result<Self, MagError> {
        let n = tensors.len();
        tracing::debug!(receivers = n, "computing prism forward operator");

        let mut g = DMatrix::<f64>::zeros(3 * n, 3);
        let mut nsingular = 0;
        for (i, (t, ns)) in tensors.iter().enumerate() {
            nsingular += ns;
            for (row, trow) in t.iter().enumerate() {
                for (col, &v) in trow.iter().enumerate() {
                    let coeff = TENSOR_TO_NT * v;
                    if !coeff.is_finite() {
                        return Err(MagError::NonFinite { receiver: i });
                    }
                    g[(row * n + i, col)] = coeff;
                }
            }
        }

        if nsingular > 0 {
            tracing::warn!(
                corners = nsingular,
                "receivers coincide with prism corners; singular terms set to zero"
            );
        }

        Ok(Self { g })
    }

    /// Number of receivers
    pub fn nrx(&self) -> usize {
        self.g.nrows() / 3
    }

    /// (nT-m/A) the stacked `(3n, 3)` operator
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.g
    }

    /// Stacked `[Bx..., By..., Bz...]` (nT) for a magnetization (A/m).
    pub fn apply(&self, m: [f64; 3]) -> Vec<f64> {
        let b = &self.g * DVector::from_column_slice(&m);
        b.as_slice().to_vec()
    }

    /// Per-receiver `[Bx, By, Bz]` (nT) for a magnetization (A/m).
    pub fn apply_vectors(&self, m: [f64; 3]) -> Vec<[f64; 3]> {
        let n = self.nrx();
        let b = self.apply(m);
        (0..n).map(|i| [b[i], b[n + i], b[2 * n + i]]).collect()
    }
}

#[cfg(test)]
mod test {
    use core::f64::consts::PI;

    use super::*;
    use crate::physics::point_source::flux_density_dipole_scalar;
    use crate::testing::{approx, linspace, meshgrid};

    const XN: [f64; 2] = [-0.5, 0.5];
    const YN: [f64; 2] = [-0.5, 0.5];
    const ZN: [f64; 2] = [-1.5, -0.5];

    fn trace(t: &[[f64; 3]; 3]) -> f64 {
        t[0][0] + t[1][1] + t[2][2]
    }

    /// Far from the prism, the field matches a dipole with the prism's total moment
    #[test]
    fn test_far_field_matches_dipole() {
        let m = [12.0, -7.0, 30.0]; // [A/m]
        let volume = 1.0; // [m^3]
        let moment = (m[0] * volume, m[1] * volume, m[2] * volume); // [A-m^2]
        let center = (0.0, 0.0, -1.0);

        let rx = [[3.0, 2.0, 20.0], [-25.0, 4.0, -1.0], [6.0, -18.0, -15.0]];
        let g = ForwardOperator::build(XN, YN, ZN, &rx).unwrap();
        let b = g.apply_vectors(m);

        for (i, obs) in rx.iter().enumerate() {
            let (bx, by, bz) = flux_density_dipole_scalar(center, moment, (obs[0], obs[1], obs[2]));
            let bmag = (bx * bx + by * by + bz * bz).sqrt() / NT;
            assert!(approx(bx / NT, b[i][0], 0.0, 1e-4 * bmag));
            assert!(approx(by / NT, b[i][1], 0.0, 1e-4 * bmag));
            assert!(approx(bz / NT, b[i][2], 0.0, 1e-4 * bmag));
        }
    }

    /// The tensor is harmonic outside the prism and has trace -4pi inside
    #[test]
    fn test_trace() {
        let grid = linspace(-2.05, 2.05, 9);
        let zgrid = linspace(-3.05, 1.05, 9);
        let mesh = meshgrid(&[&grid[..], &grid[..], &zgrid[..]]);

        for i in 0..mesh[0].len() {
            let obs = [mesh[0][i], mesh[1][i], mesh[2][i]];
            let (t, _) = prism_tensor_scalar(XN, YN, ZN, obs);
            let inside = (XN[0] < obs[0] && obs[0] < XN[1])
                && (YN[0] < obs[1] && obs[1] < YN[1])
                && (ZN[0] < obs[2] && obs[2] < ZN[1]);
            let expected = if inside { -4.0 * PI } else { 0.0 };
            assert!(approx(expected, trace(&t), 0.0, 1e-9));
        }
    }

    /// Demagnetizing factor of a cube is 1/3 on each axis
    #[test]
    fn test_cube_center() {
        let (t, _) = prism_tensor_scalar(XN, YN, ZN, [0.0, 0.0, -1.0]);
        for k in 0..3 {
            assert!(approx(-4.0 * PI / 3.0, t[k][k], 1e-12, 0.0));
        }
        for (j, k) in [(0, 1), (0, 2), (1, 2)] {
            assert!(approx(0.0, t[j][k], 0.0, 1e-12));
        }
    }

    /// The field is continuous across the line through a vertical edge
    #[test]
    fn test_edge_line_continuity() {
        for obs in [[0.5, 0.5, 10.0], [0.5, 0.5, -30.0], [0.5, -0.5, 3.0]] {
            let near = [obs[0] + 1e-7, obs[1] - 1e-7, obs[2]];
            let (t0, n0) = prism_tensor_scalar(XN, YN, ZN, obs);
            let (t1, _) = prism_tensor_scalar(XN, YN, ZN, near);
            assert_eq!(0, n0);
            for j in 0..3 {
                for k in 0..3 {
                    assert!(approx(t1[j][k], t0[j][k], 1e-5, 1e-9));
                }
            }
        }
    }

    /// Singular inputs give finite values rather than errors
    #[test]
    fn test_degenerate_inputs() {
        // Observation point on a corner
        let (t, nsingular) = prism_tensor_scalar(XN, YN, ZN, [0.5, 0.5, -0.5]);
        assert_eq!(1, nsingular);
        assert!(t.iter().flatten().all(|v| v.is_finite()));

        let g = ForwardOperator::build(XN, YN, ZN, &[[0.5, 0.5, -0.5]]).unwrap();
        assert!(g.matrix().iter().all(|v| v.is_finite()));

        // Zero-thickness prism has no field
        let (t, _) = prism_tensor_scalar(XN, YN, [-1.0, -1.0], [0.0, 0.0, 1.9]);
        assert!(t.iter().flatten().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_symmetric_and_stacked() {
        let rx = [[0.1, 0.2, 1.9], [-3.0, 1.0, 0.5], [2.0, -2.0, -4.0]];
        let g = ForwardOperator::build(XN, YN, ZN, &rx).unwrap();
        assert_eq!(3, g.nrx());
        assert_eq!((9, 3), g.matrix().shape());

        for (i, &obs) in rx.iter().enumerate() {
            let (t, _) = prism_tensor_scalar(XN, YN, ZN, obs);
            assert_eq!(t[0][1], t[1][0]);
            assert_eq!(t[0][2], t[2][0]);
            assert_eq!(t[1][2], t[2][1]);
            for row in 0..3 {
                for col in 0..3 {
                    assert_eq!(TENSOR_TO_NT * t[row][col], g.matrix()[(row * 3 + i, col)]);
                }
            }
        }

        // Stacked and per-receiver outputs agree
        let m = [1.0, 2.0, 3.0];
        let stacked = g.apply(m);
        let vectors = g.apply_vectors(m);
        for i in 0..3 {
            assert_eq!(stacked[i], vectors[i][0]);
            assert_eq!(stacked[3 + i], vectors[i][1]);
            assert_eq!(stacked[6 + i], vectors[i][2]);
        }
    }

    #[test]
    fn test_serial_vs_parallel() {
        let grid = linspace(-4.0, 4.0, 13);
        let mesh = meshgrid(&[&grid[..], &grid[..]]);
        let rx: Vec<[f64; 3]> = (0..mesh[0].len())
            .map(|i| [mesh[0][i], mesh[1][i], 1.9])
            .collect();

        let serial = ForwardOperator::build(XN, YN, ZN, &rx).unwrap();
        let parallel = ForwardOperator::build_par(XN, YN, ZN, &rx).unwrap();
        assert_eq!(serial, parallel);
    }

    /// NaN receiver coordinates are reported with the receiver index
    #[test]
    fn test_nonfinite_receiver() {
        let rx = [[0.1, 0.2, 1.9], [f64::NAN, 0.0, 1.9], [2.0, -2.0, -4.0]];
        let err = ForwardOperator::build(XN, YN, ZN, &rx).unwrap_err();
        assert_eq!(MagError::NonFinite { receiver: 1 }, err);

        let err = ForwardOperator::build_par(XN, YN, ZN, &rx).unwrap_err();
        assert_eq!(MagError::NonFinite { receiver: 1 }, err);

        let rx = [[0.1, 0.2, f64::INFINITY]];
        let err = ForwardOperator::build(XN, YN, ZN, &rx).unwrap_err();
        assert_eq!(MagError::NonFinite { receiver: 0 }, err);
    }
}
