//! Unified error system for the booking engine
//!
//! This module provides the error vocabulary shared by the engine and its
//! consumers:
//! - [`ErrorCode`]: standardized numeric error codes
//! - [`ErrorCategory`]: classification of errors by domain
//! - [`ErrorBody`]: the `{code, message}` wire shape returned on failure
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Validation errors
//! - 2xxx: Permission errors
//! - 3xxx: Settings errors
//! - 4xxx: Reservation errors
//! - 5xxx: Queue errors
//! - 9xxx: System errors

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::ErrorBody;
