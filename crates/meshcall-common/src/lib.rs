pub mod errors;
pub mod id;

pub use errors::{CallError, EngineError, MediaError};
pub use id::new_id;

pub type Result<T> = std::result::Result<T, CallError>;
