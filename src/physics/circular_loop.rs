//! Magnetics calculations for circular current loops in cartesian coordinates.
use core::f64::consts::PI;

use rayon::{
    iter::{IntoParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};

use crate::{
    chunksize,
    macros::{check_length, check_length_3tup, mut_par_chunks_3tup, par_chunks_3tup},
    math::{clip_nan, ellipe, ellipk},
    MU_0,
};

/// Off-axis flux density of a circular current loop centered on the z-axis,
/// in cartesian components.
///
/// # Arguments
///
/// * `lp`:  ((m) radius, (m) z-coord of the loop plane, (A) current)
/// * `obs`: (m) observation point
///
/// # Returns
///
/// * (bx, by, bz) [T] magnetic flux density at the observation point
///
/// # Commentary
///
/// Uses Simpson's closed form in terms of the complete elliptic integrals
/// with parameter $k^2 = 1 - \alpha^2 / \beta^2$, where
/// $\alpha^2 = a^2 + r^2 - 2 a \rho$ and $\beta^2 = a^2 + r^2 + 2 a \rho$.
///
/// On the axis the transverse terms are 0/0 and on the wire everything is;
/// NaN components are replaced with zero. Infinite values are left alone.
///
/// $K$ and $E$ come from the polynomial fits in [`ellipk`] and [`ellipe`], each
/// good to about 2e-8 absolute. Near the loop the relative error of the field is
/// of that order. Far from it, $(a^2 + r^2) E - \alpha^2 K$ and its axial
/// counterpart cancel to a remainder of order $(a / r)^2$, so the fit error
/// grows to roughly $2 \times 10^{-8} (r / a)^2$ relative: about 2e-6 at
/// $r = 10 a$ and 2e-4 at $r = 100 a$. Use [`crate::physics::point_source`]
/// beyond that.
///
/// # References
///
///   \[1\] J. Simpson, J. Lane, C. Immer, and R. Youngquist, “Simple Analytic Expressions
///         for the Magnetic Field of a Circular Current Loop,” NASA Technical Reports, Jan. 2001.
///         Available: <https://ntrs.nasa.gov/citations/20010038494>
#[inline]
pub fn flux_density_circular_loop_scalar(
    lp: (f64, f64, f64),
    obs: (f64, f64, f64),
) -> (f64, f64, f64) {
    let (a, zfil, current) = lp;
    let (x, y) = (obs.0, obs.1); // [m]
    let z = obs.2 - zfil; // [m]

    let rho2 = x.mul_add(x, y * y); // [m^2]
    let r2 = z.mul_add(z, rho2); // [m^2]
    let rho = rho2.sqrt(); // [m]
    let a2 = a * a; // [m^2]

    let two_a_rho = 2.0 * a * rho; // [m^2]
    let alpha2 = a2 + r2 - two_a_rho; // [m^2]
    let beta2 = a2 + r2 + two_a_rho; // [m^2]
    let beta = beta2.sqrt(); // [m]
    let k2 = 1.0 - alpha2 / beta2; // [nondim]

    let e = ellipe(k2); // [nondim]
    let k = ellipk(k2); // [nondim]

    let c = MU_0 * current / PI; // [T-m]
    let transverse = (a2 + r2).mul_add(e, -alpha2 * k); // [m^2]
    let c_rho = c * z / (2.0 * alpha2 * beta * rho2); // [T/m^3]

    let bx = c_rho * x * transverse;
    let by = c_rho * y * transverse;
    let bz = c / (2.0 * alpha2 * beta) * (a2 - r2).mul_add(e, alpha2 * k);

    (clip_nan(bx, 0.0), clip_nan(by, 0.0), clip_nan(bz, 0.0)) // [T]
}

/// Flux density of many coaxial circular loops, summed at each observation point.
/// For more details, see [flux_density_circular_loop_scalar].
///
/// # Arguments
///
/// * `loops`: ((m) radius, (m) z-coord of the loop plane, (A) current), each length `m`
/// * `obs`:   (m) observation points, each length `n`
/// * `out`:   (T) bx, by, bz accumulated at observation points, each length `n`
pub fn flux_density_circular_loop(
    loops: (&[f64], &[f64], &[f64]),
    obs: (&[f64], &[f64], &[f64]),
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    let m = loops.0.len();
    let n = obs.0.len();
    check_length_3tup!(m, &loops);
    check_length_3tup!(n, &obs);
    check_length!(n, out.0, out.1, out.2);

    // Iterating over filaments first, as for the filament calcs
    for j in 0..m {
        let lp = (loops.0[j], loops.1[j], loops.2[j]);
        for i in 0..n {
            let obsi = (obs.0[i], obs.1[i], obs.2[i]);
            let (bx, by, bz) = flux_density_circular_loop_scalar(lp, obsi);
            out.0[i] += bx;
            out.1[i] += by;
            out.2[i] += bz;
        }
    }

    Ok(())
}

/// Flux density of many coaxial circular loops.
/// Parallelized over chunks of observation points.
/// For more details, see [flux_density_circular_loop_scalar].
pub fn flux_density_circular_loop_par(
    loops: (&[f64], &[f64], &[f64]),
    obs: (&[f64], &[f64], &[f64]),
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    let n = obs.0.len();
    check_length_3tup!(n, &obs);
    check_length!(n, out.0, out.1, out.2);

    // Chunk inputs
    let nchunk = chunksize(n);
    let (obsxc, obsyc, obszc) = par_chunks_3tup!(obs, nchunk);
    let (outxc, outyc, outzc) = mut_par_chunks_3tup!(out, nchunk);

    // Run calcs
    (outxc, outyc, outzc, obsxc, obsyc, obszc)
        .into_par_iter()
        .try_for_each(|(outx, outy, outz, obsx, obsy, obsz)| {
            flux_density_circular_loop(loops, (obsx, obsy, obsz), (outx, outy, outz))
        })?;

    Ok(())
}
