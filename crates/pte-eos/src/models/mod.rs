//! Analytic base models. Formulas are in CGS.

mod gruneisen;
mod ideal_gas;
mod jwl;
mod noble_abel;
mod stiff_gas;

pub use gruneisen::{Gruneisen, GruneisenParams};
pub use ideal_gas::IdealGas;
pub use jwl::{Jwl, JwlParams};
pub use noble_abel::NobleAbel;
pub use stiff_gas::StiffGas;
