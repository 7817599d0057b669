use pte_core::Real;
use pte_core::units::constants::{ROOM_TEMPERATURE, atmosphere_cgs};

use crate::error::EosResult;
use crate::model::{EosModel, PtDerivatives, ReferenceState, domain};

/// Calorically perfect gas, `P = (gamma - 1) rho e`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdealGas {
    gm1: Real,
    cv: Real,
}

impl IdealGas {
    pub fn new(gm1: Real, cv: Real) -> EosResult<Self> {
        Ok(Self {
            gm1: domain::positive("IdealGas", "gm1 must be positive", gm1)?,
            cv: domain::positive("IdealGas", "cv must be positive", cv)?,
        })
    }

    pub fn gm1(&self) -> Real {
        self.gm1
    }

    pub fn cv(&self) -> Real {
        self.cv
    }
}

impl EosModel for IdealGas {
    fn temperature_from_density_internal_energy(&self, _rho: Real, sie: Real, _: &mut [Real]) -> Real {
        sie / self.cv
    }

    fn internal_energy_from_density_temperature(&self, _rho: Real, temp: Real, _: &mut [Real]) -> Real {
        self.cv * temp
    }

    fn pressure_from_density_temperature(&self, rho: Real, temp: Real, _: &mut [Real]) -> Real {
        self.gm1 * rho * self.cv * temp
    }

    fn pressure_from_density_internal_energy(&self, rho: Real, sie: Real, _: &mut [Real]) -> Real {
        self.gm1 * rho * sie
    }

    fn min_internal_energy_from_density(&self, _rho: Real, _: &mut [Real]) -> Real {
        0.0
    }

    fn specific_heat_from_density_temperature(&self, _rho: Real, _temp: Real, _: &mut [Real]) -> Real {
        self.cv
    }

    fn specific_heat_from_density_internal_energy(&self, _rho: Real, _sie: Real, _: &mut [Real]) -> Real {
        self.cv
    }

    fn bulk_modulus_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        (self.gm1 + 1.0) * self.pressure_from_density_temperature(rho, temp, l)
    }

    fn bulk_modulus_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        (self.gm1 + 1.0) * self.pressure_from_density_internal_energy(rho, sie, l)
    }

    fn gruneisen_param_from_density_temperature(&self, _rho: Real, _temp: Real, _: &mut [Real]) -> Real {
        self.gm1
    }

    fn gruneisen_param_from_density_internal_energy(&self, _rho: Real, _sie: Real, _: &mut [Real]) -> Real {
        self.gm1
    }

    fn reference_state(&self) -> ReferenceState {
        let rho = atmosphere_cgs() / (self.gm1 * self.cv * ROOM_TEMPERATURE);
        ReferenceState::at(self, rho, ROOM_TEMPERATURE)
    }

    fn eos_type(&self) -> String {
        "IdealGas".to_string()
    }

    fn p_t_of_r_e(&self, rho: Real, sie: Real, _: &mut [Real]) -> PtDerivatives {
        PtDerivatives {
            press: self.gm1 * rho * sie,
            temp: sie / self.cv,
            dpdr: self.gm1 * sie,
            dpde: self.gm1 * rho,
            dtdr: 0.0,
            dtde: 1.0 / self.cv,
        }
    }
}
