//! Calculations for 0D field sources such as dipoles.

use rayon::{
    iter::{IntoParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};

use crate::{
    chunksize,
    macros::{check_length, check_length_3tup, mut_par_chunks_3tup, par_chunks_3tup},
    math::dot3,
    MU0_OVER_4PI,
};

/// (m) Distance substituted for an observation point exactly at the dipole.
///
/// This is not a physical limit. It keeps the field finite (and tiny) at the
/// source location, which interactive plots of dipole fields rely on.
pub const DIPOLE_SINGULAR_DISTANCE: f64 = 1e6;

/// Magnetic flux density of a dipole in cartesian coordinates.
///
/// Arguments
///
/// * loc: (m) location of the point source
/// * moment: (A-m^2) magnetic moment vector of the point source
/// * obs: (m) observation point to examine
///
/// Returns
///
/// * (bx, by, bz) [T] magnetic field components at observation point
///
/// At the source location the distance is replaced by
/// [`DIPOLE_SINGULAR_DISTANCE`] and the unit vector by zero, so the result
/// there is $-\frac{\mu_0}{4\pi} m / d^3$ with $d = 10^6$.
#[inline]
pub fn flux_density_dipole_scalar(
    loc: (f64, f64, f64),
    moment: (f64, f64, f64),
    obs: (f64, f64, f64),
) -> (f64, f64, f64) {
    // Radius vector decomposed into direction and magnitude
    let r = (obs.0 - loc.0, obs.1 - loc.1, obs.2 - loc.2); // [m]
    let r2 = dot3(r.0, r.1, r.2, r.0, r.1, r.2);
    let rmag = match r2 == 0.0 {
        true => DIPOLE_SINGULAR_DISTANCE,
        false => r2.sqrt(),
    }; // [m]
    let rhat = (r.0 / rmag, r.1 / rmag, r.2 / rmag); // [dimensionless]
    let r3 = rmag * rmag * rmag; // [m^3]

    // r(dot(m, r))/|r|^5 reordered to avoid computing the 5th power for improved float resolution
    let m_dot_rhat = dot3(moment.0, moment.1, moment.2, rhat.0, rhat.1, rhat.2);

    // Assemble components
    let c = MU0_OVER_4PI / r3; // [H/m^4]
    let c1 = 3.0 * m_dot_rhat; // [A-m^2]

    (
        c * rhat.0.mul_add(c1, -moment.0),
        c * rhat.1.mul_add(c1, -moment.1),
        c * rhat.2.mul_add(c1, -moment.2),
    ) // [T]
}

/// Magnetic flux density of many dipoles, summed at each observation point.
/// For more details, see [flux_density_dipole_scalar].
///
/// # Arguments
///
/// * `loc`:    (m) dipole locations, each length `m`
/// * `moment`: (A-m^2) dipole moments, each length `m`
/// * `obs`:    (m) observation points, each length `n`
/// * `out`:    (T) bx, by, bz accumulated at observation points, each length `n`
pub fn flux_density_dipole(
    loc: (&[f64], &[f64], &[f64]),
    moment: (&[f64], &[f64], &[f64]),
    obs: (&[f64], &[f64], &[f64]),
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    // Check lengths
    let m = loc.0.len();
    let n = obs.0.len();

    check_length_3tup!(m, &loc);
    check_length_3tup!(m, &moment);
    check_length_3tup!(n, &obs);
    check_length_3tup!(n, &out);

    // Do calcs
    for i in 0..n {
        let obsi = (obs.0[i], obs.1[i], obs.2[i]);
        for j in 0..m {
            let locj = (loc.0[j], loc.1[j], loc.2[j]);
            let momentj = (moment.0[j], moment.1[j], moment.2[j]);
            let (bx, by, bz) = flux_density_dipole_scalar(locj, momentj, obsi);
            out.0[i] += bx;
            out.1[i] += by;
            out.2[i] += bz;
        }
    }

    Ok(())
}

/// Magnetic flux density of many dipoles.
/// Parallelized over chunks of observation points.
/// For more details, see [flux_density_dipole_scalar].
pub fn flux_density_dipole_par(
    loc: (&[f64], &[f64], &[f64]),
    moment: (&[f64], &[f64], &[f64]),
    obs: (&[f64], &[f64], &[f64]),
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    // Chunks are only guaranteed to line up if the lengths match
    let n = obs.0.len();
    check_length_3tup!(n, &obs);
    check_length_3tup!(n, &out);

    // Chunk inputs
    let nchunk = chunksize(n);
    let (obsxc, obsyc, obszc) = par_chunks_3tup!(obs, nchunk);
    let (outxc, outyc, outzc) = mut_par_chunks_3tup!(out, nchunk);

    // Run calcs
    (outxc, outyc, outzc, obsxc, obsyc, obszc)
        .into_par_iter()
        .try_for_each(|(outx, outy, outz, obsx, obsy, obsz)| {
            flux_density_dipole(loc, moment, (obsx, obsy, obsz), (outx, outy, outz))
        })?;

    Ok(())
}

/// Magnetic flux density of a single z-oriented dipole at the origin.
///
/// # Arguments
///
/// * `moment`: (A-m^2) magnetic moment along +z
/// * `obs`:    (m) observation points, each length `n`
/// * `out`:    (T) bx, by, bz accumulated at observation points, each length `n`
pub fn flux_density_dipole_z(
    moment: f64,
    obs: (&[f64], &[f64], &[f64]),
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    let n = obs.0.len();
    check_length!(n, obs.1, obs.2, out.0, out.1, out.2);

    for i in 0..n {
        let (bx, by, bz) = flux_density_dipole_scalar(
            (0.0, 0.0, 0.0),
            (0.0, 0.0, moment),
            (obs.0[i], obs.1[i], obs.2[i]),
        );
        out.0[i] += bx;
        out.1[i] += by;
        out.2[i] += bz;
    }

    Ok(())
}
