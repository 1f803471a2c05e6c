pub mod counters;
pub mod entities;
pub mod ids;
pub mod vector;

pub use counters::*;
pub use entities::*;
pub use ids::*;
pub use vector::*;
