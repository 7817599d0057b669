use pte_core::Real;

use super::{Modifier, ModifierKind, mismatch};
use crate::error::{EosError, EosResult};
use crate::model::{EosModel, PtDerivatives, ReferenceState};

/// Caps the sound speed at the speed of light `cl` by rescaling the bulk modulus
/// with the specific enthalpy, `B cl^2 / |cl^2 + e + P/rho|`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Relativistic<T> {
    t: T,
    cl: Real,
    inv_cl2: Real,
}

impl<T: EosModel> Relativistic<T> {
    pub fn new(t: T, cl: Real) -> EosResult<Self> {
        if !cl.is_finite() || cl <= 0.0 {
            return Err(EosError::param("Relativistic", "cl must be positive"));
        }
        Ok(Self {
            t,
            cl,
            inv_cl2: 1.0 / (cl * cl),
        })
    }

    pub fn wrap(t: T, m: &Modifier) -> EosResult<Self> {
        match *m {
            Modifier::Relativistic { cl } => Self::new(t, cl),
            _ => Err(mismatch(ModifierKind::Relativistic, m)),
        }
    }

    pub fn inner(&self) -> &T {
        &self.t
    }

    pub fn cl(&self) -> Real {
        self.cl
    }

    fn limit(&self, bmod: Real, rho: Real, sie: Real, press: Real) -> Real {
        let h = 1.0 + (sie + press / rho) * self.inv_cl2;
        (bmod / h.abs()).max(0.0)
    }
}

impl<T: EosModel> EosModel for Relativistic<T> {
    fn temperature_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.temperature_from_density_internal_energy(rho, sie, l)
    }

    fn internal_energy_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.internal_energy_from_density_temperature(rho, temp, l)
    }

    fn pressure_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.pressure_from_density_temperature(rho, temp, l)
    }

    fn pressure_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.pressure_from_density_internal_energy(rho, sie, l)
    }

    fn min_internal_energy_from_density(&self, rho: Real, l: &mut [Real]) -> Real {
        self.t.min_internal_energy_from_density(rho, l)
    }

    fn specific_heat_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.specific_heat_from_density_temperature(rho, temp, l)
    }

    fn specific_heat_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.specific_heat_from_density_internal_energy(rho, sie, l)
    }

    fn bulk_modulus_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        let sie = self.t.internal_energy_from_density_temperature(rho, temp, l);
        self.bulk_modulus_from_density_internal_energy(rho, sie, l)
    }

    fn bulk_modulus_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        let bmod = self.t.bulk_modulus_from_density_internal_energy(rho, sie, l);
        let press = self.t.pressure_from_density_internal_energy(rho, sie, l);
        self.limit(bmod, rho, sie, press)
    }

    fn gruneisen_param_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.gruneisen_param_from_density_temperature(rho, temp, l)
    }

    fn gruneisen_param_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.gruneisen_param_from_density_internal_energy(rho, sie, l)
    }

    fn reference_state(&self) -> ReferenceState {
        let r = self.t.reference_state();
        ReferenceState {
            bmod: self.limit(r.bmod, r.rho, r.sie, r.press),
            ..r
        }
    }

    fn eos_type(&self) -> String {
        format!("Relativistic<{}>", self.t.eos_type())
    }

    fn p_t_of_r_e(&self, rho: Real, sie: Real, l: &mut [Real]) -> PtDerivatives {
        self.t.p_t_of_r_e(rho, sie, l)
    }

    fn check_domain(&self, rho: Real, sie: Real) -> EosResult<()> {
        self.t.check_domain(rho, sie)
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
