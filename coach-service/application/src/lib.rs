pub mod capture;
pub mod dto;
pub mod error;
pub mod orchestrator;
pub mod usecase;

pub use capture::*;
pub use dto::*;
pub use error::*;
pub use orchestrator::*;
pub use usecase::*;
