#![allow(non_snake_case)]
//! Forward modeling of static magnetic fields.
//!
//! Two families of sources are covered:
//!
//! * uniformly magnetized rectangular prisms (induced and remanent magnetization
//!   in the Earth's field), evaluated through a closed-form linear operator, see
//!   [`physics::prism`] and [`survey`];
//! * current-carrying wires, loops and dipoles, see [`physics`].

pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod mesh;
pub mod physics;
pub mod rebar;
pub mod rotation;
pub mod survey;

mod macros;

#[cfg(test)]
pub(crate) mod testing;

pub use error::MagError;

use std::num::NonZeroUsize;

/// (H/m) vacuum magnetic permeability.
/// Value from 2022 CODATA recommended values, [NIST SPI 961](https://physics.nist.gov/cuu/pdf/wall_2022.pdf).
pub const MU_0: f64 = 0.999_999_999_87 * core::f64::consts::PI * 4e-7; // [H/m]

/// (H/m) Recurring constant multiple of `mu_0`
pub const MU0_OVER_4PI: f64 = MU_0 / (4.0 * core::f64::consts::PI);

/// (T/nT) Conversion from nanotesla
pub const NT: f64 = 1e-9;

/// Chunk size for splitting `n` observation points across the available cores.
pub(crate) fn chunksize(n: usize) -> usize {
    let ncores = std::thread::available_parallelism()
        .unwrap_or(NonZeroUsize::MIN)
        .get();

    (n / ncores).max(1)
}
