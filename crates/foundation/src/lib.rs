pub mod bounds;
pub mod crs;
pub mod point;
pub mod ticket;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use crs::*;
pub use point::*;
pub use ticket::*;
