//! Rotations between a body-fixed frame and the survey frame.
//!
//! A body frame is described by the inclination and declination of the
//! direction that it maps onto the reference axis [`REFERENCE_NORMAL`] (+y).
//! Rotating with `(inc, dec)` takes survey-frame quantities into the body
//! frame, and rotating with `(-inc, -dec)` takes them back.
use nalgebra::geometry::Rotation3;
use nalgebra::Vector3;

use crate::math::{cross3, direction, dot3, rss3};

/// Reference direction that the body frame's defining normal is rotated onto.
pub const REFERENCE_NORMAL: (f64, f64, f64) = (0.0, 1.0, 0.0);

/// Below this magnitude of `n0 x n1` the normals are treated as parallel.
const PARALLEL_TOL: f64 = 1e-20;

/// Rotation taking the direction `n0` onto the direction `n1`,
/// about the axis `n0 x n1`.
///
/// Neither input needs to be normalized. Parallel and anti-parallel
/// normals both give the identity.
pub fn rotation_from_normals(n0: (f64, f64, f64), n1: (f64, f64, f64)) -> Rotation3<f64> {
    let n0 = normalize(n0);
    let n1 = normalize(n1);

    let (ax, ay, az) = cross3(n0.0, n0.1, n0.2, n1.0, n1.1, n1.2);
    let sin_t = rss3(ax, ay, az);
    if !(sin_t >= PARALLEL_TOL) {
        return Rotation3::identity();
    }
    let cos_t = dot3(n0.0, n0.1, n0.2, n1.0, n1.1, n1.2);
    let angle = libm::atan2(sin_t, cos_t);

    let axis = Vector3::new(ax / sin_t, ay / sin_t, az / sin_t);
    Rotation3::from_scaled_axis(angle * axis)
}

/// Rotation from the survey frame into the body frame defined by `(inc, dec)`.
///
/// # Arguments
///
/// * `inc`: (deg) inclination of the body frame's defining normal
/// * `dec`: (deg) declination of the body frame's defining normal
pub fn body_rotation(inc: f64, dec: f64) -> Rotation3<f64> {
    rotation_from_normals(direction(inc, dec), REFERENCE_NORMAL)
}

/// Rotate points about `center` with the rotation taking `n0` onto `n1`.
///
/// # Arguments
///
/// * `points`: (m) points to rotate, length `n`
/// * `n0`:     direction to rotate from
/// * `n1`:     direction to rotate onto
/// * `center`: (m) fixed point of the rotation
///
/// # Returns
///
/// * (m) rotated points, length `n`
pub fn rotate_points_from_normals(
    points: &[[f64; 3]],
    n0: (f64, f64, f64),
    n1: (f64, f64, f64),
    center: [f64; 3],
) -> Vec<[f64; 3]> {
    let rotation = rotation_from_normals(n0, n1);
    apply_about(&rotation, points, center)
}

/// Rotate points about `center` into the body frame defined by `(inc, dec)`.
///
/// Calling this again with `(-inc, -dec)` and the same center undoes it.
pub fn rotate_points(points: &[[f64; 3]], inc: f64, dec: f64, center: [f64; 3]) -> Vec<[f64; 3]> {
    rotate_points_from_normals(points, direction(inc, dec), REFERENCE_NORMAL, center)
}

/// Apply a rotation to each point about a fixed center.
pub fn apply_about(
    rotation: &Rotation3<f64>,
    points: &[[f64; 3]],
    center: [f64; 3],
) -> Vec<[f64; 3]> {
    let c = Vector3::from(center);
    points
        .iter()
        .map(|p| {
            let r = rotation * (Vector3::from(*p) - c) + c;
            [r.x, r.y, r.z]
        })
        .collect()
}

/// Normalize a vector stored as a tuple
#[inline(always)]
fn normalize(a: (f64, f64, f64)) -> (f64, f64, f64) {
    let mag = rss3(a.0, a.1, a.2);
    (a.0 / mag, a.1 / mag, a.2 / mag)
}
