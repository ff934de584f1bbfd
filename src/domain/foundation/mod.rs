//! Foundation module - Shared domain primitives.
//!
//! Contains the error and time types shared by the billing domain,
//! the ports and the adapters.

mod errors;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use timestamp::Timestamp;
