pub mod remote;
pub mod sdn;

pub use remote::*;
pub use sdn::*;
