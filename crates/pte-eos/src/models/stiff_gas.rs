use pte_core::Real;
use pte_core::units::constants::{ROOM_TEMPERATURE, atmosphere_cgs};

use crate::error::EosResult;
use crate::model::{EosModel, PtDerivatives, ReferenceState, domain};

/// Stiffened gas, `P = (gamma - 1) rho (e - q) - gamma P_inf`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StiffGas {
    gm1: Real,
    cv: Real,
    pinf: Real,
    qq: Real,
}

impl StiffGas {
    pub fn new(gm1: Real, cv: Real, pinf: Real, qq: Real) -> EosResult<Self> {
        Ok(Self {
            gm1: domain::positive("StiffGas", "gm1 must be positive", gm1)?,
            cv: domain::positive("StiffGas", "cv must be positive", cv)?,
            pinf: domain::finite("StiffGas", "pinf must be finite", pinf)?,
            qq: domain::finite("StiffGas", "qq must be finite", qq)?,
        })
    }
}

impl EosModel for StiffGas {
    fn temperature_from_density_internal_energy(&self, rho: Real, sie: Real, _: &mut [Real]) -> Real {
        (sie - self.qq - self.pinf / rho) / self.cv
    }

    fn internal_energy_from_density_temperature(&self, rho: Real, temp: Real, _: &mut [Real]) -> Real {
        self.cv * temp + self.pinf / rho + self.qq
    }

    fn pressure_from_density_temperature(&self, rho: Real, temp: Real, _: &mut [Real]) -> Real {
        self.gm1 * rho * self.cv * temp - self.pinf
    }

    fn pressure_from_density_internal_energy(&self, rho: Real, sie: Real, _: &mut [Real]) -> Real {
        self.gm1 * rho * (sie - self.qq) - (self.gm1 + 1.0) * self.pinf
    }

    fn min_internal_energy_from_density(&self, rho: Real, _: &mut [Real]) -> Real {
        self.qq + self.pinf / rho
    }

    fn specific_heat_from_density_temperature(&self, _rho: Real, _temp: Real, _: &mut [Real]) -> Real {
        self.cv
    }

    fn specific_heat_from_density_internal_energy(&self, _rho: Real, _sie: Real, _: &mut [Real]) -> Real {
        self.cv
    }

    fn bulk_modulus_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        (self.gm1 + 1.0) * (self.pressure_from_density_temperature(rho, temp, l) + self.pinf)
    }

    fn bulk_modulus_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        (self.gm1 + 1.0) * (self.pressure_from_density_internal_energy(rho, sie, l) + self.pinf)
    }

    fn gruneisen_param_from_density_temperature(&self, _rho: Real, _temp: Real, _: &mut [Real]) -> Real {
        self.gm1
    }

    fn gruneisen_param_from_density_internal_energy(&self, _rho: Real, _sie: Real, _: &mut [Real]) -> Real {
        self.gm1
    }

    fn reference_state(&self) -> ReferenceState {
        let rho = (atmosphere_cgs() + self.pinf) / (self.gm1 * self.cv * ROOM_TEMPERATURE);
        ReferenceState::at(self, rho, ROOM_TEMPERATURE)
    }

    fn eos_type(&self) -> String {
        "StiffGas".to_string()
    }

    fn p_t_of_r_e(&self, rho: Real, sie: Real, l: &mut [Real]) -> PtDerivatives {
        PtDerivatives {
            press: self.pressure_from_density_internal_energy(rho, sie, l),
            temp: self.temperature_from_density_internal_energy(rho, sie, l),
            dpdr: self.gm1 * (sie - self.qq),
            dpde: self.gm1 * rho,
            dtdr: self.pinf / (rho * rho * self.cv),
            dtde: 1.0 / self.cv,
        }
    }
}
