pub mod csv;
pub mod json;

pub use self::csv::*;
pub use self::json::*;
