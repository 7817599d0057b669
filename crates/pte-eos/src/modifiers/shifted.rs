use pte_core::Real;

use super::{Modifier, ModifierKind, mismatch};
use crate::error::{EosError, EosResult};
use crate::model::{EosModel, PtDerivatives, ReferenceState};

/// Energy-origin shift: the wrapped model sees `sie - shift`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shifted<T> {
    t: T,
    shift: Real,
}

impl<T: EosModel> Shifted<T> {
    pub fn new(t: T, shift: Real) -> EosResult<Self> {
        if !shift.is_finite() {
            return Err(EosError::param("Shifted", "shift must be finite"));
        }
        Ok(Self { t, shift })
    }

    pub fn wrap(t: T, m: &Modifier) -> EosResult<Self> {
        match *m {
            Modifier::Shifted { shift } => Self::new(t, shift),
            _ => Err(mismatch(ModifierKind::Shifted, m)),
        }
    }

    pub fn inner(&self) -> &T {
        &self.t
    }
}

impl<T: EosModel> EosModel for Shifted<T> {
    fn temperature_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.temperature_from_density_internal_energy(rho, sie - self.shift, l)
    }

    fn internal_energy_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.internal_energy_from_density_temperature(rho, temp, l) + self.shift
    }

    fn pressure_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.pressure_from_density_temperature(rho, temp, l)
    }

    fn pressure_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.pressure_from_density_internal_energy(rho, sie - self.shift, l)
    }

    fn min_internal_energy_from_density(&self, rho: Real, l: &mut [Real]) -> Real {
        self.t.min_internal_energy_from_density(rho, l) + self.shift
    }

    fn specific_heat_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.specific_heat_from_density_temperature(rho, temp, l)
    }

    fn specific_heat_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.specific_heat_from_density_internal_energy(rho, sie - self.shift, l)
    }

    fn bulk_modulus_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.bulk_modulus_from_density_temperature(rho, temp, l)
    }

    fn bulk_modulus_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.bulk_modulus_from_density_internal_energy(rho, sie - self.shift, l)
    }

    fn gruneisen_param_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.gruneisen_param_from_density_temperature(rho, temp, l)
    }

    fn gruneisen_param_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.gruneisen_param_from_density_internal_energy(rho, sie - self.shift, l)
    }

    fn reference_state(&self) -> ReferenceState {
        let r = self.t.reference_state();
        ReferenceState {
            sie: r.sie + self.shift,
            ..r
        }
    }

    fn eos_type(&self) -> String {
        format!("Shifted<{}>", self.t.eos_type())
    }

    fn p_t_of_r_e(&self, rho: Real, sie: Real, l: &mut [Real]) -> PtDerivatives {
        self.t.p_t_of_r_e(rho, sie - self.shift, l)
    }

    fn check_domain(&self, rho: Real, sie: Real) -> EosResult<()> {
        self.t.check_domain(rho, sie - self.shift)
    }

    fn check_domain_temperature(&self, rho: Real, temp: Real) -> EosResult<()> {
        self.t.check_domain_temperature(rho, temp)
    }

    fn min_density(&self) -> Real {
        self.t.min_density()
    }

    fn min_temperature(&self) -> Real {
        self.t.min_temperature()
    }

    fn nlambda(&self) -> usize {
        self.t.nlambda()
    }

    fn is_modified(&self) -> bool {
        true
    }
}
