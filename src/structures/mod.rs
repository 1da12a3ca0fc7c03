// private sub-module defined in other files
mod fixed_radius_search;

// exports identifiers from private sub-modules in the current module namespace
pub use self::fixed_radius_search::{DistanceMetric, FixedRadiusSearch2D, FixedRadiusSearch3D};
