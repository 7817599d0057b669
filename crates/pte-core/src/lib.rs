//! pte-core: shared foundation for the EOS and PTE crates.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - units (CGS working units, uom-derived conversion factors)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
