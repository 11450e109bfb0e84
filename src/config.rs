//! Model configuration.
//!
//! Survey layout, rebar dimensions and the ambient field default to the
//! values used for the rebar detection exercise. Any subset can be
//! overridden from JSON; missing keys keep their defaults.
use serde::{Deserialize, Serialize};

use crate::{
    error::{require_positive, MagError},
    geometry::{Prism, ReceiverSet},
    survey::EarthField,
};

/// Top-level configuration for survey layout, rebar geometry and the Earth field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Ambient field
    pub earth: EarthField,
    /// (m) receiver height above the ground surface at z = 0
    pub rx_height: f64,
    /// Points per axis of the square receiver grid
    pub grid_points: usize,
    /// (m) half-width of the square receiver grid
    pub grid_extent: f64,
    pub rebar: RebarConfig,
    pub profile: ProfileConfig,
}

/// Rebar modeled as a long thin prism lying along x.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebarConfig {
    /// (m) length along x
    pub length: f64,
    /// (m) side of the square cross-section
    pub diameter: f64,
}

/// Receiver line crossing the rebar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// (m) start and end x of the line, at y = 0
    pub xlim: [f64; 2],
    /// Number of receivers along the line
    pub npts: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            earth: EarthField {
                inc: 70.205,
                dec: 16.63,
                intensity: 54399.0,
            },
            rx_height: 1.9,
            grid_points: 20,
            grid_extent: 5.0,
            rebar: RebarConfig::default(),
            profile: ProfileConfig::default(),
        }
    }
}

impl Default for RebarConfig {
    fn default() -> Self {
        Self {
            length: 3.0,
            diameter: 1.4e-2,
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            xlim: [5.0, 25.0],
            npts: 100,
        }
    }
}

impl ModelConfig {
    /// Parse and validate a JSON document. Missing keys take their defaults.
    pub fn from_json(s: &str) -> Result<Self, MagError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, MagError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), MagError> {
        self.earth.validate()?;
        require_positive("grid_extent", self.grid_extent)?;
        require_positive("rebar.length", self.rebar.length)?;
        require_positive("rebar.diameter", self.rebar.diameter)?;
        if self.grid_points < 2 {
            return Err(MagError::InvalidParameter {
                name: "grid_points",
                value: self.grid_points as f64,
            });
        }
        if self.profile.npts < 2 {
            return Err(MagError::InvalidParameter {
                name: "profile.npts",
                value: self.profile.npts as f64,
            });
        }
        Ok(())
    }

    /// Square receiver grid at the configured height
    pub fn grid_receivers(&self) -> Result<ReceiverSet, MagError> {
        ReceiverSet::grid(self.grid_extent, self.grid_points, self.rx_height)
    }

    /// Receiver line along x at y = 0 and the configured height
    pub fn profile_receivers(&self) -> Result<ReceiverSet, MagError> {
        let [x1, x2] = self.profile.xlim;
        ReceiverSet::line(x1, 0.0, x2, 0.0, self.profile.npts, self.rx_height)
    }

    /// Unrotated rebar prism centered at `x0` along the profile, `depth` below the surface
    pub fn rebar_prism(&self, x0: f64, depth: f64) -> Result<Prism, MagError> {
        let d = self.rebar.diameter;
        Prism::new([x0, 0.0, -depth], [self.rebar.length, d, d])
    }
}
