pub mod candidate;
pub mod validation;
pub mod ranking;
pub mod selection;
pub mod stats;
pub mod outcome;

pub use candidate::*;
pub use validation::*;
pub use ranking::*;
pub use selection::*;
pub use stats::*;
pub use outcome::*;
