//! Magnetics calculations for infinitely long straight wires.
use core::f64::consts::PI;

use rayon::{
    iter::{IntoParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};

use crate::{
    chunksize,
    macros::{check_length, check_length_3tup, mut_par_chunks_3tup, par_chunks_3tup},
    math::{cross3, dot3, rss3},
    MU_0,
};

/// Perpendicular offsets smaller than this fraction of the distance to the
/// reference point are taken as lying on the wire
const ON_WIRE_RTOL: f64 = 1e-12;

/// Unit tangent of a wire, or an error for a zero-length orientation
#[inline]
fn unit_tangent(orientation: (f64, f64, f64)) -> Result<(f64, f64, f64), &'static str> {
    let mag = rss3(orientation.0, orientation.1, orientation.2);
    if !(mag > 0.0) || !mag.is_finite() {
        return Err("Wire orientation must be a nonzero finite vector");
    }
    Ok((orientation.0 / mag, orientation.1 / mag, orientation.2 / mag))
}

/// $\mu_0 I / (2 \pi |\rho|^2) \hat{t} \times \rho$ for a radial vector `rho`.
///
/// `r2` is the squared distance from the reference point on the wire that
/// `rho` was measured from, and sets the scale for the on-wire check.
#[inline]
fn flux_density_from_radial(
    t: (f64, f64, f64),
    rho: (f64, f64, f64),
    r2: f64,
    current: f64,
) -> Result<(f64, f64, f64), &'static str> {
    let d2 = dot3(rho.0, rho.1, rho.2, rho.0, rho.1, rho.2); // [m^2]
    if !(d2 > ON_WIRE_RTOL * ON_WIRE_RTOL * r2) {
        return Err("Observation point lies on the wire");
    }

    let c = MU_0 * current / (2.0 * PI * d2); // [T/m]
    let (cx, cy, cz) = cross3(t.0, t.1, t.2, rho.0, rho.1, rho.2);

    Ok((c * cx, c * cy, c * cz)) // [T]
}

/// Flux density of an infinite straight wire.
///
/// # Arguments
///
/// * `loc`:         (m) any point on the wire
/// * `orientation`: direction of current flow; need not be normalized
/// * `current`:     (A) wire current
/// * `obs`:         (m) observation point
///
/// # Returns
///
/// * (bx, by, bz) [T], or an error if the observation point is on the wire
///   or the orientation is zero
///
/// # Commentary
///
/// With $\rho = r - (r \cdot \hat{t})\hat{t}$ the perpendicular offset from the wire,
/// $B = \frac{\mu_0 I}{2 \pi |\rho|^2} \hat{t} \times \rho$.
///
/// The projection leaves a residual of a few ulp of $|r|$ for points on an
/// oblique wire, so a point is on the wire when $|\rho| \le 10^{-12} |r|$.
#[inline]
pub fn flux_density_infinite_wire_scalar(
    loc: (f64, f64, f64),
    orientation: (f64, f64, f64),
    current: f64,
    obs: (f64, f64, f64),
) -> Result<(f64, f64, f64), &'static str> {
    let t = unit_tangent(orientation)?;

    // Perpendicular offset from the wire
    let r = (obs.0 - loc.0, obs.1 - loc.1, obs.2 - loc.2); // [m]
    let r2 = dot3(r.0, r.1, r.2, r.0, r.1, r.2); // [m^2]
    let r_dot_t = dot3(r.0, r.1, r.2, t.0, t.1, t.2); // [m]
    let rho = (
        t.0.mul_add(-r_dot_t, r.0),
        t.1.mul_add(-r_dot_t, r.1),
        t.2.mul_add(-r_dot_t, r.2),
    ); // [m]

    flux_density_from_radial(t, rho, r2, current)
}

/// Flux density of an infinite straight wire at many observation points.
/// For more details, see [flux_density_infinite_wire_scalar].
///
/// `out` is left untouched if any observation point is on the wire.
///
/// # Arguments
///
/// * `loc`:         (m) any point on the wire
/// * `orientation`: direction of current flow
/// * `current`:     (A) wire current
/// * `obs`:         (m) observation points, each length `n`
/// * `out`:         (T) bx, by, bz accumulated at observation points, each length `n`
pub fn flux_density_infinite_wire(
    loc: (f64, f64, f64),
    orientation: (f64, f64, f64),
    current: f64,
    obs: (&[f64], &[f64], &[f64]),
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    let n = obs.0.len();
    check_length_3tup!(n, &obs);
    check_length!(n, out.0, out.1, out.2);

    let b = (0..n)
        .map(|i| {
            let obsi = (obs.0[i], obs.1[i], obs.2[i]);
            flux_density_infinite_wire_scalar(loc, orientation, current, obsi)
        })
        .collect::<Result<Vec<_>, _>>()?;

    accumulate(&b, out);

    Ok(())
}

/// Flux density of an infinite straight wire.
/// Parallelized over chunks of observation points.
/// For more details, see [flux_density_infinite_wire_scalar].
pub fn flux_density_infinite_wire_par(
    loc: (f64, f64, f64),
    orientation: (f64, f64, f64),
    current: f64,
    obs: (&[f64], &[f64], &[f64]),
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    let n = obs.0.len();
    check_length_3tup!(n, &obs);
    check_length!(n, out.0, out.1, out.2);

    // Scratch outputs; `out` is only touched once every chunk has succeeded
    let (mut sx, mut sy, mut sz) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
    let scratch = (&mut sx[..], &mut sy[..], &mut sz[..]);

    // Chunk inputs
    let nchunk = chunksize(n);
    let (obsxc, obsyc, obszc) = par_chunks_3tup!(obs, nchunk);
    let (outxc, outyc, outzc) = mut_par_chunks_3tup!(scratch, nchunk);

    // Run calcs
    (outxc, outyc, outzc, obsxc, obsyc, obszc)
        .into_par_iter()
        .try_for_each(|(outx, outy, outz, obsx, obsy, obsz)| {
            flux_density_infinite_wire(
                loc,
                orientation,
                current,
                (obsx, obsy, obsz),
                (outx, outy, outz),
            )
        })?;

    for i in 0..n {
        out.0[i] += sx[i];
        out.1[i] += sy[i];
        out.2[i] += sz[i];
    }

    Ok(())
}

/// Flux density of an infinite straight wire given as a set of sample points.
///
/// # Arguments
///
/// * `samples`:     (m) points along the wire, each length `m`, at least one
/// * `orientation`: direction of current flow
/// * `current`:     (A) wire current
/// * `obs`:         (m) observation points, each length `n`
/// * `out`:         (T) bx, by, bz accumulated at observation points, each length `n`
///
/// # Commentary
///
/// The radial vector runs from the nearest sample to each observation point
/// rather than from the closest point on the wire, so the result matches
/// [flux_density_infinite_wire] only where an observation point is abeam
/// of a sample. Sample the wire finely relative to the observation distance.
///
/// `out` is left untouched if any observation point coincides with a sample.
pub fn flux_density_infinite_wire_sampled(
    samples: (&[f64], &[f64], &[f64]),
    orientation: (f64, f64, f64),
    current: f64,
    obs: (&[f64], &[f64], &[f64]),
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    let m = samples.0.len();
    let n = obs.0.len();
    check_length_3tup!(m, &samples);
    check_length_3tup!(n, &obs);
    check_length!(n, out.0, out.1, out.2);
    if m == 0 {
        return Err("Wire must have at least one sample point");
    }

    let t = unit_tangent(orientation)?;

    let b = (0..n)
        .map(|i| {
            // Radial vector to the nearest sample
            let mut r = (f64::INFINITY, f64::INFINITY, f64::INFINITY);
            let mut dmin = f64::INFINITY;
            for j in 0..m {
                let rj = (
                    obs.0[i] - samples.0[j],
                    obs.1[i] - samples.1[j],
                    obs.2[i] - samples.2[j],
                );
                let dj = dot3(rj.0, rj.1, rj.2, rj.0, rj.1, rj.2);
                if dj < dmin {
                    dmin = dj;
                    r = rj;
                }
            }

            flux_density_from_radial(t, r, dmin, current)
        })
        .collect::<Result<Vec<_>, _>>()?;

    accumulate(&b, out);

    Ok(())
}

/// Add per-point field vectors into the output slices
#[inline]
fn accumulate(b: &[(f64, f64, f64)], out: (&mut [f64], &mut [f64], &mut [f64])) {
    for (i, &(bx, by, bz)) in b.iter().enumerate() {
        out.0[i] += bx;
        out.1[i] += by;
        out.2[i] += bz;
    }
}
