//! Magnetostatics calculations.
pub mod biotsavart;
pub mod circular_loop;
pub mod infinite_wire;
pub mod point_source;
pub mod prism;

pub use biotsavart::{flux_density_biot_savart, flux_density_mesh_biot_savart};
pub use circular_loop::flux_density_circular_loop;
pub use infinite_wire::flux_density_infinite_wire;
pub use point_source::flux_density_dipole;
pub use prism::ForwardOperator;
