// Public modules
pub mod corpus;
pub mod defaults;
pub mod error;
pub mod lint;
pub mod output;
pub mod refactor;
pub mod scanner;
pub mod underscore;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use output::{ItemStatus, PassItem, PassReport};
