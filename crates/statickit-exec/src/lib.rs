pub mod contracts;
pub mod encode;
pub mod error;
pub mod runtime;
pub mod service;

pub use contracts::*;
pub use encode::*;
pub use error::*;
pub use runtime::*;
pub use service::*;
