pub mod error;
pub mod geometry;
pub mod result;

pub use error::*;
pub use geometry::*;
pub use result::*;
