//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (errors, timestamps)
//! - `billing` - Stripe events, signature verification and record updates

pub mod billing;
pub mod foundation;
