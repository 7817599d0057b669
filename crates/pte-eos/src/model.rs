//! Capability contract shared by every concrete model and modifier.

use enum_dispatch::enum_dispatch;
use pte_core::Real;

use crate::error::{EosError, EosResult};

/// Upper bound on the per-call cache length any model may request.
pub const MAX_NUM_LAMBDAS: usize = 3;

/// Relative density perturbation for the finite-difference `dT/drho` fallback.
const FD_REL_RHO: Real = 1.0e-6;

/// Pressure, temperature and their first derivatives at one `(rho, sie)` state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PtDerivatives {
    pub press: Real,
    pub temp: Real,
    /// dP/drho at constant sie
    pub dpdr: Real,
    /// dP/dsie at constant rho
    pub dpde: Real,
    /// dT/drho at constant sie
    pub dtdr: Real,
    /// dT/dsie at constant rho
    pub dtde: Real,
}

/// Thermodynamic values at a model's reference point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReferenceState {
    pub rho: Real,
    pub temp: Real,
    pub sie: Real,
    pub press: Real,
    pub cv: Real,
    pub bmod: Real,
    pub dpde: Real,
    pub dvdt: Real,
}

impl ReferenceState {
    /// Fills the derived entries from `(rho, temp)` using the model itself.
    ///
    /// `dvdt` is the isobaric expansion `(dv/dT)_P = Gamma cv / K_T`, with the
    /// isothermal modulus `K_T = B - Gamma^2 rho cv T`.
    pub fn at<E: EosModel + ?Sized>(eos: &E, rho: Real, temp: Real) -> Self {
        let mut lambda = [0.0; MAX_NUM_LAMBDAS];
        let sie = eos.internal_energy_from_density_temperature(rho, temp, &mut lambda);
        let press = eos.pressure_from_density_temperature(rho, temp, &mut lambda);
        let cv = eos.specific_heat_from_density_temperature(rho, temp, &mut lambda);
        let bmod = eos.bulk_modulus_from_density_temperature(rho, temp, &mut lambda);
        let gamma = eos.gruneisen_param_from_density_temperature(rho, temp, &mut lambda);
        let k_t = bmod - gamma * gamma * rho * cv * temp;
        let dvdt = if k_t > 0.0 { gamma * cv / k_t } else { 0.0 };
        Self {
            rho,
            temp,
            sie,
            press,
            cv,
            bmod,
            dpde: gamma * rho,
            dvdt,
        }
    }
}

/// Every EOS in the closed set implements this.
///
/// All queries take a per-call cache (`lambda`) of at least `nlambda()` reals. Queries
/// never fail: out-of-domain inputs return whatever the formula yields and
/// [`EosModel::check_domain`] is the way to flag them.
#[enum_dispatch]
pub trait EosModel: Send + Sync {
    fn temperature_from_density_internal_energy(
        &self,
        rho: Real,
        sie: Real,
        lambda: &mut [Real],
    ) -> Real;

    fn internal_energy_from_density_temperature(
        &self,
        rho: Real,
        temp: Real,
        lambda: &mut [Real],
    ) -> Real;

    fn pressure_from_density_temperature(
        &self,
        rho: Real,
        temp: Real,
        lambda: &mut [Real],
    ) -> Real;

    fn pressure_from_density_internal_energy(
        &self,
        rho: Real,
        sie: Real,
        lambda: &mut [Real],
    ) -> Real;

    /// Lowest admissible specific internal energy at this density.
    fn min_internal_energy_from_density(&self, rho: Real, lambda: &mut [Real]) -> Real;

    fn specific_heat_from_density_temperature(
        &self,
        rho: Real,
        temp: Real,
        lambda: &mut [Real],
    ) -> Real;

    fn specific_heat_from_density_internal_energy(
        &self,
        rho: Real,
        sie: Real,
        lambda: &mut [Real],
    ) -> Real;

    fn bulk_modulus_from_density_temperature(
        &self,
        rho: Real,
        temp: Real,
        lambda: &mut [Real],
    ) -> Real;

    fn bulk_modulus_from_density_internal_energy(
        &self,
        rho: Real,
        sie: Real,
        lambda: &mut [Real],
    ) -> Real;

    fn gruneisen_param_from_density_temperature(
        &self,
        rho: Real,
        temp: Real,
        lambda: &mut [Real],
    ) -> Real;

    fn gruneisen_param_from_density_internal_energy(
        &self,
        rho: Real,
        sie: Real,
        lambda: &mut [Real],
    ) -> Real;

    fn reference_state(&self) -> ReferenceState;

    /// Composed type name, e.g. `Scaled<Shifted<IdealGas>>`.
    fn eos_type(&self) -> String;

    /// Pressure, temperature and derivatives in one call.
    ///
    /// The default uses `dP/de = Gamma rho` and `dP/drho = (B - Gamma P) / rho`, with
    /// `dT/drho` from a one-sided difference. Models with closed forms override it.
    fn p_t_of_r_e(&self, rho: Real, sie: Real, lambda: &mut [Real]) -> PtDerivatives {
        let press = self.pressure_from_density_internal_energy(rho, sie, lambda);
        let temp = self.temperature_from_density_internal_energy(rho, sie, lambda);
        let gamma = self.gruneisen_param_from_density_internal_energy(rho, sie, lambda);
        let bmod = self.bulk_modulus_from_density_internal_energy(rho, sie, lambda);
        let cv = self.specific_heat_from_density_internal_energy(rho, sie, lambda);

        let dpde = gamma * rho;
        let (dpdr, dtdr) = if rho > 0.0 {
            let drho = FD_REL_RHO * rho;
            let t_hi = self.temperature_from_density_internal_energy(rho + drho, sie, lambda);
            ((bmod - gamma * press) / rho, (t_hi - temp) / drho)
        } else {
            (0.0, 0.0)
        };
        let dtde = if cv > 0.0 { 1.0 / cv } else { 0.0 };

        PtDerivatives {
            press,
            temp,
            dpdr,
            dpde,
            dtdr,
            dtde,
        }
    }

    /// Flags `(rho, sie)` inputs the model cannot evaluate meaningfully.
    fn check_domain(&self, rho: Real, sie: Real) -> EosResult<()> {
        domain::finite_positive_density(self.min_density(), rho, sie)
    }

    /// Flags `(rho, temp)` inputs the model cannot evaluate meaningfully.
    fn check_domain_temperature(&self, rho: Real, temp: Real) -> EosResult<()> {
        domain::finite_positive_density(self.min_density(), rho, temp)?;
        if temp < self.min_temperature() {
            return Err(EosError::OutOfDomain {
                model: "eos",
                what: "temperature below model minimum",
                rho,
                x: temp,
            });
        }
        Ok(())
    }

    fn min_density(&self) -> Real {
        0.0
    }

    fn min_temperature(&self) -> Real {
        0.0
    }

    /// Number of cache entries the model reads or writes.
    fn nlambda(&self) -> usize {
        0
    }

    fn is_modified(&self) -> bool {
        false
    }
}

pub(crate) mod domain {
    use pte_core::{ensure_finite, ensure_positive};

    use super::*;

    pub fn finite_positive_density(min_density: Real, rho: Real, x: Real) -> EosResult<()> {
        if !rho.is_finite() || !x.is_finite() {
            return Err(EosError::OutOfDomain {
                model: "eos",
                what: "non-finite input",
                rho,
                x,
            });
        }
        if rho <= 0.0 || rho < min_density {
            return Err(EosError::OutOfDomain {
                model: "eos",
                what: "density must be positive",
                rho,
                x,
            });
        }
        Ok(())
    }

    pub fn positive(model: &'static str, what: &'static str, v: Real) -> EosResult<Real> {
        ensure_positive(v, what).map_err(|_| EosError::param(model, what))
    }

    pub fn finite(model: &'static str, what: &'static str, v: Real) -> EosResult<Real> {
        ensure_finite(v, what).map_err(|_| EosError::param(model, what))
    }
}
