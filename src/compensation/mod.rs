pub mod calculator;
pub mod constructor;
pub mod history;

pub use calculator::{Compensation, DirectCalculator, PairShare, split_by_theta};
pub use constructor::*;
pub use history::*;
