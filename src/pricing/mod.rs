pub mod error;
pub mod units;
pub mod parser;
pub mod calculator;

pub use error::*;
pub use units::*;
pub use parser::*;
pub use calculator::*;
