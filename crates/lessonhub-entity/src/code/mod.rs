//! Access code entity.

pub mod model;

pub use model::AccessCode;
