//! Prism responses at a set of receivers.
//!
//! Field vectors are evaluated in the prism's body frame, where the prism is
//! axis-aligned, and rotated back into the survey frame before projection
//! onto the requested component. [`forward_response`] is the pure entry point;
//! [`Evaluator`] adds reuse of the forward operator between calls with the
//! same geometry.
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    error::{require_nonnegative, require_positive, MagError},
    geometry::{Prism, ReceiverSet},
    math::{direction, dot3},
    physics::prism::ForwardOperator,
    rotation::{body_rotation, rotate_points},
    MU_0, NT,
};

/// Ambient geomagnetic field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EarthField {
    /// (deg) inclination, positive down
    pub inc: f64,
    /// (deg) declination, clockwise from north
    pub dec: f64,
    /// (nT) field intensity
    pub intensity: f64,
}

impl EarthField {
    pub fn new(inc: f64, dec: f64, intensity: f64) -> Result<Self, MagError> {
        let field = Self { inc, dec, intensity };
        field.validate()?;
        Ok(field)
    }

    /// Check the intensity of a field built field-by-field or deserialized.
    pub fn validate(&self) -> Result<(), MagError> {
        require_positive("intensity", self.intensity)?;
        Ok(())
    }

    /// Unit vector along the field
    pub fn direction(&self) -> (f64, f64, f64) {
        direction(self.inc, self.dec)
    }

    /// (A/m) field intensity as H
    pub fn h0(&self) -> f64 {
        self.intensity * NT / MU_0
    }
}

/// Magnetic properties of the prism material.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Magnetization {
    /// (SI) magnetic susceptibility
    pub susc: f64,
    /// Koenigsberger ratio of remanent to induced magnetization
    pub q: f64,
    /// (deg) inclination of the remanent magnetization
    pub rinc: f64,
    /// (deg) declination of the remanent magnetization
    pub rdec: f64,
}

impl Magnetization {
    pub fn new(susc: f64, q: f64, rinc: f64, rdec: f64) -> Result<Self, MagError> {
        let m = Self { susc, q, rinc, rdec };
        m.validate()?;
        Ok(m)
    }

    /// Purely induced magnetization
    pub fn induced_only(susc: f64) -> Result<Self, MagError> {
        Self::new(susc, 0.0, 0.0, 0.0)
    }

    pub fn validate(&self) -> Result<(), MagError> {
        require_nonnegative("susc", self.susc)?;
        require_nonnegative("q", self.q)?;
        Ok(())
    }

    /// (A/m) induced magnetization in the survey frame
    pub fn induced(&self, earth: &EarthField) -> [f64; 3] {
        let (x, y, z) = earth.direction();
        let m = self.susc * earth.h0();
        [m * x, m * y, m * z]
    }

    /// (A/m) remanent magnetization in the survey frame
    pub fn remanent(&self, earth: &EarthField) -> [f64; 3] {
        let (x, y, z) = direction(self.rinc, self.rdec);
        let m = self.q * self.susc * earth.h0();
        [m * x, m * y, m * z]
    }
}

/// Which part of the magnetization to evaluate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MagnetizationMode {
    Induced,
    Remanent,
    /// Both parts, returned separately
    Total,
}

impl FromStr for MagnetizationMode {
    type Err = MagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "induced" => Ok(Self::Induced),
            "remanent" => Ok(Self::Remanent),
            "total" => Ok(Self::Total),
            _ => Err(MagError::UnknownMode(s.to_owned())),
        }
    }
}

impl fmt::Display for MagnetizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Induced => "induced",
            Self::Remanent => "remanent",
            Self::Total => "total",
        };
        f.write_str(s)
    }
}

/// Which field component to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    Bx,
    By,
    Bz,
    /// Projection onto the Earth field direction
    Tf,
}

impl FromStr for Component {
    type Err = MagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bx" => Ok(Self::Bx),
            "by" => Ok(Self::By),
            "bz" => Ok(Self::Bz),
            "tf" | "total-field" => Ok(Self::Tf),
            _ => Err(MagError::UnknownComponent(s.to_owned())),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bx => "bx",
            Self::By => "by",
            Self::Bz => "bz",
            Self::Tf => "tf",
        };
        f.write_str(s)
    }
}

/// (nT) one value per receiver, by magnetization part.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Induced(Vec<f64>),
    Remanent(Vec<f64>),
    Total { induced: Vec<f64>, remanent: Vec<f64> },
}

impl Response {
    /// Sum of whichever parts are present
    pub fn combined(&self) -> Vec<f64> {
        match self {
            Self::Induced(v) | Self::Remanent(v) => v.clone(),
            Self::Total { induced, remanent } => {
                induced.iter().zip(remanent.iter()).map(|(a, b)| a + b).collect()
            }
        }
    }

    pub fn mode(&self) -> MagnetizationMode {
        match self {
            Self::Induced(_) => MagnetizationMode::Induced,
            Self::Remanent(_) => MagnetizationMode::Remanent,
            Self::Total { .. } => MagnetizationMode::Total,
        }
    }
}

/// Forward operator for a prism with receivers rotated into its body frame
/// about the prism centroid.
pub fn body_frame_operator(
    prism: &Prism,
    receivers: &ReceiverSet,
) -> Result<ForwardOperator, MagError> {
    prism.validate()?;
    let rx = rotate_points(receivers.locs(), prism.pinc, prism.pdec, prism.centroid());
    ForwardOperator::build_par(prism.xn(), prism.yn(), prism.zn(), &rx)
}

/// (nT) survey-frame field vector at each receiver for a survey-frame
/// magnetization `m` (A/m).
///
/// `operator` must come from [`body_frame_operator`] for the same prism.
pub fn field_vectors(operator: &ForwardOperator, prism: &Prism, m: [f64; 3]) -> Vec<[f64; 3]> {
    let into_body = body_rotation(prism.pinc, prism.pdec);
    let out_of_body = body_rotation(-prism.pinc, -prism.pdec);

    let m_body = into_body * Vector3::from(m);
    operator
        .apply_vectors([m_body.x, m_body.y, m_body.z])
        .iter()
        .map(|b| {
            let b = out_of_body * Vector3::from(*b);
            [b.x, b.y, b.z]
        })
        .collect()
}

/// Reduce field vectors to one component.
pub fn project(vectors: &[[f64; 3]], component: Component, earth: &EarthField) -> Vec<f64> {
    match component {
        Component::Bx => vectors.iter().map(|b| b[0]).collect(),
        Component::By => vectors.iter().map(|b| b[1]).collect(),
        Component::Bz => vectors.iter().map(|b| b[2]).collect(),
        Component::Tf => {
            let (x, y, z) = earth.direction();
            vectors.iter().map(|b| dot3(x, y, z, b[0], b[1], b[2])).collect()
        }
    }
}

/// Evaluate the response of a prism at a set of receivers from an
/// already-built operator.
fn response_from_operator(
    operator: &ForwardOperator,
    prism: &Prism,
    earth: &EarthField,
    material: &Magnetization,
    mode: MagnetizationMode,
    component: Component,
) -> Result<Response, MagError> {
    earth.validate()?;
    material.validate()?;

    let part = |m: [f64; 3]| project(&field_vectors(operator, prism, m), component, earth);

    let response = match mode {
        MagnetizationMode::Induced => Response::Induced(part(material.induced(earth))),
        MagnetizationMode::Remanent => Response::Remanent(part(material.remanent(earth))),
        MagnetizationMode::Total => Response::Total {
            induced: part(material.induced(earth)),
            remanent: part(material.remanent(earth)),
        },
    };

    Ok(response)
}

/// Magnetic response (nT) of a uniformly magnetized prism at each receiver.
///
/// # Arguments
///
/// * `prism`:     prism geometry and orientation
/// * `receivers`: observation points in the survey frame
/// * `earth`:     ambient field, which sets the induced magnetization and the
///                total-field direction
/// * `material`:  susceptibility and remanence
/// * `mode`:      which magnetization part(s) to evaluate
/// * `component`: which field component to report
///
/// # Commentary
///
/// Receivers and magnetization are rotated into the body frame with the
/// prism's `(pinc, pdec)`, and field vectors come back with the negated
/// angles. Receivers rotate about the prism centroid.
pub fn forward_response(
    prism: &Prism,
    receivers: &ReceiverSet,
    earth: &EarthField,
    material: &Magnetization,
    mode: MagnetizationMode,
    component: Component,
) -> Result<Response, MagError> {
    let operator = body_frame_operator(prism, receivers)?;
    response_from_operator(&operator, prism, earth, material, mode, component)
}

/// Hash of the bit patterns of everything the forward operator depends on
fn fingerprint(prism: &Prism, receivers: &ReceiverSet) -> u64 {
    let mut hasher = DefaultHasher::new();
    let geometry = prism
        .xn()
        .iter()
        .chain(prism.yn().iter())
        .chain(prism.zn().iter())
        .chain([prism.pinc, prism.pdec].iter())
        .map(|v| v.to_bits())
        .collect::<Vec<u64>>();
    geometry.hash(&mut hasher);

    receivers.len().hash(&mut hasher);
    for loc in receivers.locs() {
        for v in loc {
            v.to_bits().hash(&mut hasher);
        }
    }

    hasher.finish()
}

/// Forward evaluator that keeps the most recent operator and reuses it while
/// the prism geometry and receivers are unchanged.
///
/// Material and Earth-field changes never trigger a rebuild.
#[derive(Debug, Default)]
pub struct Evaluator {
    cached: Option<(u64, ForwardOperator)>,
    builds: usize,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times an operator has been built
    pub fn builds(&self) -> usize {
        self.builds
    }

    /// Operator for this geometry, rebuilt only if the geometry changed
    pub fn operator(
        &mut self,
        prism: &Prism,
        receivers: &ReceiverSet,
    ) -> Result<&ForwardOperator, MagError> {
        let key = fingerprint(prism, receivers);

        let stale = !matches!(&self.cached, Some((k, _)) if *k == key);
        if stale {
            tracing::debug!(fingerprint = key, "geometry changed; rebuilding forward operator");
            let operator = body_frame_operator(prism, receivers)?;
            self.builds += 1;
            self.cached = Some((key, operator));
        } else {
            tracing::debug!(fingerprint = key, "reusing forward operator");
        }

        match &self.cached {
            Some((_, operator)) => Ok(operator),
            None => Err(MagError::Numeric("Forward operator was not built")),
        }
    }

    /// Same as [`forward_response`], reusing the operator when possible.
    pub fn response(
        &mut self,
        prism: &Prism,
        receivers: &ReceiverSet,
        earth: &EarthField,
        material: &Magnetization,
        mode: MagnetizationMode,
        component: Component,
    ) -> Result<Response, MagError> {
        let operator = self.operator(prism, receivers)?;
        response_from_operator(operator, prism, earth, material, mode, component)
    }

    /// (nT) survey-frame field vectors for a survey-frame magnetization (A/m).
    pub fn field_vectors(
        &mut self,
        prism: &Prism,
        receivers: &ReceiverSet,
        m: [f64; 3],
    ) -> Result<Vec<[f64; 3]>, MagError> {
        let operator = self.operator(prism, receivers)?;
        Ok(field_vectors(operator, prism, m))
    }
}
