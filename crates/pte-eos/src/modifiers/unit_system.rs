use pte_core::{Real, UnitFactors};

use super::{Modifier, ModifierKind, mismatch};
use crate::error::{EosError, EosResult};
use crate::model::{EosModel, PtDerivatives, ReferenceState};

/// Converts caller units to the wrapped model's working units and back.
///
/// `factors` map one caller unit onto the model unit, e.g.
/// [`UnitFactors::si_to_cgs`] lets SI callers query a CGS model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSystem<T> {
    t: T,
    to: UnitFactors,
    inv_press: Real,
    inv_sie: Real,
    inv_temp: Real,
    inv_cv: Real,
}

impl<T: EosModel> UnitSystem<T> {
    pub fn new(t: T, to: UnitFactors) -> EosResult<Self> {
        for f in [to.rho, to.sie, to.temp] {
            if !f.is_finite() || f <= 0.0 {
                return Err(EosError::param("UnitSystem", "conversion factors must be positive"));
            }
        }
        Ok(Self {
            t,
            to,
            inv_press: 1.0 / to.press(),
            inv_sie: 1.0 / to.sie,
            inv_temp: 1.0 / to.temp,
            inv_cv: 1.0 / to.cv(),
        })
    }

    /// SI caller over a CGS model.
    pub fn si(t: T) -> EosResult<Self> {
        Self::new(t, UnitFactors::si_to_cgs())
    }

    pub fn wrap(t: T, m: &Modifier) -> EosResult<Self> {
        match *m {
            Modifier::UnitSystem(f) => Self::new(t, f),
            _ => Err(mismatch(ModifierKind::UnitSystem, m)),
        }
    }

    pub fn inner(&self) -> &T {
        &self.t
    }

    pub fn factors(&self) -> UnitFactors {
        self.to
    }
}

impl<T: EosModel> EosModel for UnitSystem<T> {
    fn temperature_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.inv_temp
            * self
                .t
                .temperature_from_density_internal_energy(rho * self.to.rho, sie * self.to.sie, l)
    }

    fn internal_energy_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.inv_sie
            * self
                .t
                .internal_energy_from_density_temperature(rho * self.to.rho, temp * self.to.temp, l)
    }

    fn pressure_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.inv_press
            * self
                .t
                .pressure_from_density_temperature(rho * self.to.rho, temp * self.to.temp, l)
    }

    fn pressure_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.inv_press
            * self
                .t
                .pressure_from_density_internal_energy(rho * self.to.rho, sie * self.to.sie, l)
    }

    fn min_internal_energy_from_density(&self, rho: Real, l: &mut [Real]) -> Real {
        self.inv_sie * self.t.min_internal_energy_from_density(rho * self.to.rho, l)
    }

    fn specific_heat_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.inv_cv
            * self
                .t
                .specific_heat_from_density_temperature(rho * self.to.rho, temp * self.to.temp, l)
    }

    fn specific_heat_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.inv_cv
            * self
                .t
                .specific_heat_from_density_internal_energy(rho * self.to.rho, sie * self.to.sie, l)
    }

    fn bulk_modulus_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.inv_press
            * self
                .t
                .bulk_modulus_from_density_temperature(rho * self.to.rho, temp * self.to.temp, l)
    }

    fn bulk_modulus_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.inv_press
            * self
                .t
                .bulk_modulus_from_density_internal_energy(rho * self.to.rho, sie * self.to.sie, l)
    }

    fn gruneisen_param_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t
            .gruneisen_param_from_density_temperature(rho * self.to.rho, temp * self.to.temp, l)
    }

    fn gruneisen_param_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t
            .gruneisen_param_from_density_internal_energy(rho * self.to.rho, sie * self.to.sie, l)
    }

    fn reference_state(&self) -> ReferenceState {
        let r = self.t.reference_state();
        ReferenceState {
            rho: r.rho / self.to.rho,
            temp: r.temp * self.inv_temp,
            sie: r.sie * self.inv_sie,
            press: r.press * self.inv_press,
            cv: r.cv * self.inv_cv,
            bmod: r.bmod * self.inv_press,
            dpde: r.dpde * self.to.sie * self.inv_press,
            dvdt: r.dvdt * self.to.rho * self.to.temp,
        }
    }

    fn eos_type(&self) -> String {
        format!("UnitSystem<{}>", self.t.eos_type())
    }

    fn p_t_of_r_e(&self, rho: Real, sie: Real, l: &mut [Real]) -> PtDerivatives {
        let d = self.t.p_t_of_r_e(rho * self.to.rho, sie * self.to.sie, l);
        PtDerivatives {
            press: d.press * self.inv_press,
            temp: d.temp * self.inv_temp,
            dpdr: d.dpdr * self.to.rho * self.inv_press,
            dpde: d.dpde * self.to.sie * self.inv_press,
            dtdr: d.dtdr * self.to.rho * self.inv_temp,
            dtde: d.dtde * self.to.sie * self.inv_temp,
        }
    }

    fn check_domain(&self, rho: Real, sie: Real) -> EosResult<()> {
        self.t.check_domain(rho * self.to.rho, sie * self.to.sie)
    }

    fn check_domain_temperature(&self, rho: Real, temp: Real) -> EosResult<()> {
        self.t.check_domain_temperature(rho * self.to.rho, temp * self.to.temp)
    }

    fn min_density(&self) -> Real {
        self.t.min_density() / self.to.rho
    }

    fn min_temperature(&self) -> Real {
        self.t.min_temperature() * self.inv_temp
    }

    fn nlambda(&self) -> usize {
        self.t.nlambda()
    }

    fn is_modified(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAX_NUM_LAMBDAS;
    use crate::models::IdealGas;
    use pte_core::{Tolerances, nearly_equal, pressure_si_to_cgs};

    const TOL: Tolerances = Tolerances {
        abs: 0.0,
        rel: 1e-12,
    };

    #[test]
    fn si_caller_gets_pascals() {
        let base = IdealGas::new(0.4, 7.18e6).unwrap();
        let eos = UnitSystem::si(base).unwrap();
        let mut l = [0.0; MAX_NUM_LAMBDAS];
        // 1.2 kg/m^3, 2.5e5 J/kg
        let p_si = eos.pressure_from_density_internal_energy(1.2, 2.5e5, &mut l);
        let p_cgs = base.pressure_from_density_internal_energy(1.2e-3, 2.5e9, &mut l);
        assert!(nearly_equal(p_si * pressure_si_to_cgs(), p_cgs, TOL));
        // cv in J/kg/K
        let cv = eos.specific_heat_from_density_internal_energy(1.2, 2.5e5, &mut l);
        assert!(nearly_equal(cv, 718.0, TOL));
        assert_eq!(eos.eos_type(), "UnitSystem<IdealGas>");
    }

    #[test]
    fn rejects_zero_factor() {
        let base = IdealGas::new(0.4, 7.18e6).unwrap();
        let bad = UnitFactors {
            rho: 0.0,
            ..UnitFactors::IDENTITY
        };
        assert!(UnitSystem::new(base, bad).is_err());
    }
}
