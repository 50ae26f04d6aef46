pub mod badge;
pub mod classifier;
pub mod entity;
pub mod error;
pub mod metrics;
pub mod port;
pub mod prompt;
pub mod response;

pub use badge::*;
pub use classifier::*;
pub use entity::*;
pub use error::DomainError;
pub use metrics::*;
pub use port::*;
pub use prompt::*;
pub use response::*;
