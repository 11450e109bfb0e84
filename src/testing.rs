//! Test utilities

use core::f64::consts::PI;

use itertools::Itertools;

/// Divide-by-zero-resistant approximate comparison
pub(crate) fn approx(truth: f64, val: f64, rtol: f64, atol: f64) -> bool {
    let abs_err = (val - truth).abs();
    let lim = rtol * truth.abs() + atol;
    abs_err < lim
}

/// Evenly spaced values from start to end
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| start + (i as f64 / (n - 1) as f64) * (end - start))
        .collect::<Vec<f64>>()
}

/// Dense N-dimensional meshgrid; cartesian product of
/// input grids, in canonical array order
pub(crate) fn meshgrid(grids: &[&[f64]]) -> Vec<Vec<f64>> {
    let ngrids = grids.len();

    // Interleaved cartesian product
    let interleaved = grids
        .iter()
        .map(|&x| x.iter())
        .multi_cartesian_product()
        .flatten()
        .cloned()
        .collect_vec();

    // Deinterleave
    let mut meshes = Vec::with_capacity(ngrids);
    for i in 0..ngrids {
        meshes.push(
            interleaved[i..]
                .iter()
                .step_by(ngrids)
                .cloned()
                .collect_vec(),
        )
    }

    meshes
}

/// Convert a circular loop of radius `r` at height `z` to `ndiscr - 1`
/// piecewise linear segments, returned as (start points, segment vectors)
pub(crate) fn discretize_circular_loop(
    r: f64,
    z: f64,
    ndiscr: usize,
) -> ((Vec<f64>, Vec<f64>, Vec<f64>), (Vec<f64>, Vec<f64>, Vec<f64>)) {
    let phi = linspace(0.0, 2.0 * PI, ndiscr);
    let x: Vec<f64> = phi.iter().map(|v| r * libm::cos(*v)).collect();
    let y: Vec<f64> = phi.iter().map(|v| r * libm::sin(*v)).collect();

    let dx = diff(&x);
    let dy = diff(&y);
    let dz = vec![0.0; ndiscr - 1];

    let x0 = x[..ndiscr - 1].to_vec();
    let y0 = y[..ndiscr - 1].to_vec();
    let z0 = vec![z; ndiscr - 1];

    ((x0, y0, z0), (dx, dy, dz))
}

/// First-order forward difference; returns n-1 sized output
pub(crate) fn diff(v: &[f64]) -> Vec<f64> {
    v[1..]
        .iter()
        .zip(v[0..v.len() - 1].iter())
        .map(|(&b, &a)| b - a)
        .collect::<Vec<f64>>()
}

/// A spread of observation points around the origin that avoids the
/// coordinate axes and the unit circle in the z=0 plane
pub(crate) fn example_observation_points() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let grid = [-2.3, -0.7, 0.45, 1.9];
    let mesh = meshgrid(&[&grid[..], &grid[..], &grid[..]]);
    (mesh[0].clone(), mesh[1].clone(), mesh[2].clone())
}

#[cfg(test)]
mod test {
    use super::*;

    /// Check that meshgrid returns the correct shape and values for
    /// a 2-dimensional input.
    #[test]
    fn test_meshgrid_2d() {
        let x = [0.0, 1.0, 2.0];
        let y = [3.0, 4.0, 5.0, 6.0];
        let m = meshgrid(&[&x, &y]);

        // Check that the meshgrid has the correct shape
        assert_eq!(2, m.len()); // should be number of dimensions
        for mi in m.iter() {
            assert_eq!(x.len() * y.len(), mi.len());
        }

        // Check that the meshgrid contains the correct values
        for (i, &xi) in x.iter().enumerate() {
            for (j, &yj) in y.iter().enumerate() {
                let k = i * y.len() + j;
                assert_eq!(xi, m[0][k]);
                assert_eq!(yj, m[1][k]);
            }
        }
    }
}
