mod fit;
mod proposal;

pub use fit::{fit, LShape};
pub use proposal::{propose_boundary, BoundaryPoint};
