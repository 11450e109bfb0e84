//! Geometry primitives: rectangular prisms and receiver sets.
use serde::{Deserialize, Serialize};

use crate::error::{require_positive, MagError};
use crate::rotation::rotate_points;

/// A rectangular prism, possibly rotated.
///
/// The prism is axis-aligned in its own body frame. Its orientation
/// `(pinc, pdec)` is the direction in the survey frame that corresponds
/// to the body frame's +y axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prism {
    /// (m) center x
    pub x0: f64,
    /// (m) center y
    pub y0: f64,
    /// (m) center z, positive up
    pub z0: f64,
    /// (m) extent along body x
    pub dx: f64,
    /// (m) extent along body y
    pub dy: f64,
    /// (m) extent along body z
    pub dz: f64,
    /// (deg) inclination of the body frame
    pub pinc: f64,
    /// (deg) declination of the body frame
    pub pdec: f64,
}

impl Prism {
    /// Make an unrotated prism, checking that every extent is positive.
    ///
    /// # Arguments
    ///
    /// * `center`:  (m) x, y, z of the prism center
    /// * `extents`: (m) dx, dy, dz widths
    pub fn new(center: [f64; 3], extents: [f64; 3]) -> Result<Self, MagError> {
        let prism = Self {
            x0: center[0],
            y0: center[1],
            z0: center[2],
            dx: extents[0],
            dy: extents[1],
            dz: extents[2],
            pinc: 0.0,
            pdec: 0.0,
        };
        prism.validate()?;
        Ok(prism)
    }

    /// Set the body-frame orientation in degrees.
    pub fn with_orientation(mut self, pinc: f64, pdec: f64) -> Self {
        self.pinc = pinc;
        self.pdec = pdec;
        self
    }

    /// Check the extents of a prism built field-by-field or deserialized.
    pub fn validate(&self) -> Result<(), MagError> {
        require_positive("dx", self.dx)?;
        require_positive("dy", self.dy)?;
        require_positive("dz", self.dz)?;
        Ok(())
    }

    /// (m) `[min, max]` x-extent of the nodes
    pub fn xn(&self) -> [f64; 2] {
        [-self.dx / 2.0 + self.x0, self.dx / 2.0 + self.x0]
    }

    /// (m) `[min, max]` y-extent of the nodes
    pub fn yn(&self) -> [f64; 2] {
        [-self.dy / 2.0 + self.y0, self.dy / 2.0 + self.y0]
    }

    /// (m) `[min, max]` z-extent of the nodes
    pub fn zn(&self) -> [f64; 2] {
        [-self.dz / 2.0 + self.z0, self.dz / 2.0 + self.z0]
    }

    /// (m) centroid as the mean of the nodes on each axis
    pub fn centroid(&self) -> [f64; 3] {
        let (xn, yn, zn) = (self.xn(), self.yn(), self.zn());
        [
            (xn[0] + xn[1]) / 2.0,
            (yn[0] + yn[1]) / 2.0,
            (zn[0] + zn[1]) / 2.0,
        ]
    }

    /// (m) the 8 corners in the body frame, bottom face first.
    ///
    /// Each face is ordered (x1, y1), (x1, y2), (x2, y2), (x2, y1).
    pub fn corners(&self) -> [[f64; 3]; 8] {
        let ([x1, x2], [y1, y2], [z1, z2]) = (self.xn(), self.yn(), self.zn());
        [
            [x1, y1, z1],
            [x1, y2, z1],
            [x2, y2, z1],
            [x2, y1, z1],
            [x1, y1, z2],
            [x1, y2, z2],
            [x2, y2, z2],
            [x2, y1, z2],
        ]
    }

    /// (m) the 8 corners rotated about the centroid into the survey frame.
    pub fn oriented_corners(&self) -> Vec<[f64; 3]> {
        rotate_points(&self.corners(), self.pinc, self.pdec, self.centroid())
    }
}

/// An ordered, immutable set of observation points.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceiverSet {
    locs: Vec<[f64; 3]>,
}

impl ReceiverSet {
    /// Receivers at explicit locations. At least one is required.
    pub fn from_points(locs: Vec<[f64; 3]>) -> Result<Self, MagError> {
        if locs.is_empty() {
            return Err(MagError::InvalidParameter {
                name: "receivers",
                value: 0.0,
            });
        }
        Ok(Self { locs })
    }

    /// Square grid of `npts x npts` receivers spanning `[-xylim, xylim]`
    /// on both horizontal axes at a fixed height.
    ///
    /// Points are ordered with y varying fastest.
    pub fn grid(xylim: f64, npts: usize, height: f64) -> Result<Self, MagError> {
        if npts < 2 {
            return Err(MagError::InvalidParameter {
                name: "npts",
                value: npts as f64,
            });
        }
        let axis = linspace(-xylim, xylim, npts);
        let locs = axis
            .iter()
            .flat_map(|&x| axis.iter().map(move |&y| [x, y, height]))
            .collect();
        Self::from_points(locs)
    }

    /// `n` receivers along the straight line from `(x1, y1)` to `(x2, y2)`
    /// at a fixed height. See [`line_points`].
    pub fn line(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        n: usize,
        height: f64,
    ) -> Result<Self, MagError> {
        if n < 2 {
            return Err(MagError::InvalidParameter {
                name: "n",
                value: n as f64,
            });
        }
        let (x, y) = line_points(x1, x2, y1, y2, n, LINE_TOL);
        let locs = x.iter().zip(y.iter()).map(|(&x, &y)| [x, y, height]).collect();
        Self::from_points(locs)
    }

    /// Number of receivers
    pub fn len(&self) -> usize {
        self.locs.len()
    }

    /// Always false for a constructed set; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.locs.is_empty()
    }

    /// (m) receiver locations
    pub fn locs(&self) -> &[[f64; 3]] {
        &self.locs
    }
}

/// (m) Offset below which a survey line is treated as axis-parallel
pub const LINE_TOL: f64 = 1e-3;

/// Evenly spaced (x, y) points along a line.
///
/// A line with `|x2 - x1| < tol` holds x fixed and spaces y; one with
/// `|y2 - y1| < tol` holds y fixed and spaces x. Otherwise x is spaced
/// evenly and y follows the slope.
pub fn line_points(x1: f64, x2: f64, y1: f64, y2: f64, n: usize, tol: f64) -> (Vec<f64>, Vec<f64>) {
    let dx = x2 - x1;
    let dy = y2 - y1;

    if dx.abs() < tol {
        let y = linspace(y1, y2, n);
        let x = vec![x1; y.len()];
        (x, y)
    } else if dy.abs() < tol {
        let x = linspace(x1, x2, n);
        let y = vec![y1; x.len()];
        (x, y)
    } else {
        let x = linspace(x1, x2, n);
        let slope = dy / dx;
        let y = x.iter().map(|&xi| slope * (xi - x1) + y1).collect();
        (x, y)
    }
}

/// Evenly spaced values from start to end, inclusive
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
