//! pte-eos: equation-of-state models for the PTE solver.
//!
//! Provides:
//! - the `EosModel` capability contract and its batched extension
//! - analytic base models (ideal gas, Gruneisen, JWL, stiffened gas, Noble-Abel)
//! - modifiers (scaled, shifted, unit system, relativistic, bilinear ramp)
//! - `Eos`, the closed-set tagged union over every legal composition
//!
//! # Example
//!
//! ```
//! use pte_eos::{Eos, EosModel, IdealGas, MAX_NUM_LAMBDAS, Modifier};
//!
//! let air = Eos::from(IdealGas::new(0.4, 7.18e6).unwrap());
//! let shifted = air.modify(Modifier::Shifted { shift: 1e8 }).unwrap();
//! let mut lambda = [0.0; MAX_NUM_LAMBDAS];
//! let p = shifted.pressure_from_density_internal_energy(1.2e-3, 2.6e9, &mut lambda);
//! assert!(p > 0.0);
//! ```

pub mod batch;
pub mod error;
pub mod model;
pub mod models;
pub mod modifiers;
pub mod variant;

pub use batch::{BatchReport, EosBatch, EvalStatus, PtOutputs};
pub use error::{EosError, EosResult};
pub use model::{EosModel, MAX_NUM_LAMBDAS, PtDerivatives, ReferenceState};
pub use models::{Gruneisen, GruneisenParams, IdealGas, Jwl, JwlParams, NobleAbel, StiffGas};
pub use modifiers::{
    BilinearRamp, Modifier, ModifierKind, Relativistic, Scaled, Shifted, UnitSystem,
};
pub use variant::Eos;
