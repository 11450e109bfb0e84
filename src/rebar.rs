//! Magnetic profile across a buried reinforcing bar.
//!
//! The bar is a thin prism lying along x, buried below a receiver line that
//! runs along x at the configured height. Field data collected along such a
//! line are compared with [`profile`] after subtracting a base station
//! reading with [`anomaly`].
use crate::{
    config::ModelConfig,
    error::MagError,
    survey::{forward_response, Component, Magnetization, MagnetizationMode, Response},
};

/// (nT) vertical field along a profile line, by magnetization part.
#[derive(Clone, Debug, PartialEq)]
pub struct RebarProfile {
    /// (m) receiver locations
    pub locations: Vec<[f64; 3]>,
    pub induced: Vec<f64>,
    pub remanent: Vec<f64>,
    /// Sum of induced and remanent
    pub total: Vec<f64>,
}

/// Vertical field of a rebar along the configured profile line.
///
/// # Arguments
///
/// * `config`: survey layout, rebar dimensions and Earth field
/// * `x0`:     (m) x-coord of the rebar center; the bar is centered on y = 0
/// * `depth`:  (m) depth of the rebar center below the surface
/// * `susc`:   (SI) susceptibility
/// * `q`:      Koenigsberger ratio
/// * `rinc`:   (deg) remanent inclination
/// * `rdec`:   (deg) remanent declination
pub fn profile(
    config: &ModelConfig,
    x0: f64,
    depth: f64,
    susc: f64,
    q: f64,
    rinc: f64,
    rdec: f64,
) -> Result<RebarProfile, MagError> {
    config.validate()?;
    let prism = config.rebar_prism(x0, depth)?;
    let rx = config.profile_receivers()?;
    let material = Magnetization::new(susc, q, rinc, rdec)?;

    let response = forward_response(
        &prism,
        &rx,
        &config.earth,
        &material,
        MagnetizationMode::Total,
        Component::Bz,
    )?;
    let total = response.combined();
    let (induced, remanent) = match response {
        Response::Total { induced, remanent } => (induced, remanent),
        _ => return Err(MagError::Numeric("Expected both magnetization parts")),
    };

    Ok(RebarProfile {
        locations: rx.locs().to_vec(),
        induced,
        remanent,
        total,
    })
}

/// (nT) field readings less a base station reading `b0`.
pub fn anomaly(observed: &[f64], b0: f64) -> Vec<f64> {
    observed.iter().map(|v| v - b0).collect()
}
