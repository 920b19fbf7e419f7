pub mod error;
pub mod scenario;
pub mod size;
pub mod step;

pub use error::*;
pub use scenario::*;
pub use size::*;
pub use step::*;
