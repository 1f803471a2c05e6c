pub mod history;
pub mod samples;

pub use history::*;
pub use samples::*;
