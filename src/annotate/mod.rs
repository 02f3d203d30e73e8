pub mod config;
pub mod tree;
pub mod memory;
pub mod placement;
pub mod orchestrator;

pub use config::*;
pub use tree::*;
pub use memory::*;
pub use placement::*;
pub use orchestrator::*;
