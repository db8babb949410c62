//! cl-core: stable foundation for the coronal loop model.
//!
//! Contains:
//! - constants (physical constants, cgs)
//! - units (uom SI types + conversions into cgs)
//! - numeric (Real + finiteness/positivity checks)
//! - error (shared error types)

pub mod constants;
pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{ClError, ClResult};
pub use numeric::*;
