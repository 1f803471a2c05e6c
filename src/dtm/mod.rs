pub mod manager;
pub mod scheduler;
pub mod suppression;
pub mod task;

pub use manager::*;
pub use scheduler::*;
pub use suppression::*;
pub use task::*;
