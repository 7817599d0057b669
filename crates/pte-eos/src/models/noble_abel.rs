use pte_core::Real;
use pte_core::units::constants::{ROOM_TEMPERATURE, atmosphere_cgs};

use crate::error::{EosError, EosResult};
use crate::model::{EosModel, ReferenceState, domain};

/// Noble-Abel gas with co-volume `bb` and energy offset `qq`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NobleAbel {
    gm1: Real,
    cv: Real,
    bb: Real,
    qq: Real,
}

impl NobleAbel {
    pub fn new(gm1: Real, cv: Real, bb: Real, qq: Real) -> EosResult<Self> {
        let bb = domain::finite("NobleAbel", "bb must be finite", bb)?;
        if bb < 0.0 {
            return Err(EosError::param("NobleAbel", "bb must be non-negative"));
        }
        Ok(Self {
            gm1: domain::positive("NobleAbel", "gm1 must be positive", gm1)?,
            cv: domain::positive("NobleAbel", "cv must be positive", cv)?,
            bb,
            qq: domain::finite("NobleAbel", "qq must be finite", qq)?,
        })
    }

    fn free_volume(&self, rho: Real) -> Real {
        1.0 - self.bb * rho
    }
}

impl EosModel for NobleAbel {
    fn temperature_from_density_internal_energy(&self, _rho: Real, sie: Real, _: &mut [Real]) -> Real {
        (sie - self.qq) / self.cv
    }

    fn internal_energy_from_density_temperature(&self, _rho: Real, temp: Real, _: &mut [Real]) -> Real {
        self.cv * temp + self.qq
    }

    fn pressure_from_density_temperature(&self, rho: Real, temp: Real, _: &mut [Real]) -> Real {
        self.gm1 * rho * self.cv * temp / self.free_volume(rho)
    }

    fn pressure_from_density_internal_energy(&self, rho: Real, sie: Real, _: &mut [Real]) -> Real {
        self.gm1 * rho * (sie - self.qq) / self.free_volume(rho)
    }

    fn min_internal_energy_from_density(&self, _rho: Real, _: &mut [Real]) -> Real {
        self.qq
    }

    fn specific_heat_from_density_temperature(&self, _rho: Real, _temp: Real, _: &mut [Real]) -> Real {
        self.cv
    }

    fn specific_heat_from_density_internal_energy(&self, _rho: Real, _sie: Real, _: &mut [Real]) -> Real {
        self.cv
    }

    fn bulk_modulus_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        (self.gm1 + 1.0) * self.pressure_from_density_temperature(rho, temp, l) / self.free_volume(rho)
    }

    fn bulk_modulus_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        (self.gm1 + 1.0) * self.pressure_from_density_internal_energy(rho, sie, l) / self.free_volume(rho)
    }

    fn gruneisen_param_from_density_temperature(&self, rho: Real, _temp: Real, _: &mut [Real]) -> Real {
        self.gm1 / self.free_volume(rho)
    }

    fn gruneisen_param_from_density_internal_energy(&self, rho: Real, _sie: Real, _: &mut [Real]) -> Real {
        self.gm1 / self.free_volume(rho)
    }

    fn reference_state(&self) -> ReferenceState {
        let p = atmosphere_cgs();
        let rho = p / (self.gm1 * self.cv * ROOM_TEMPERATURE + self.bb * p);
        ReferenceState::at(self, rho, ROOM_TEMPERATURE)
    }

    fn eos_type(&self) -> String {
        "NobleAbel".to_string()
    }

    fn check_domain(&self, rho: Real, sie: Real) -> EosResult<()> {
        domain::finite_positive_density(self.min_density(), rho, sie)?;
        if self.free_volume(rho) <= 0.0 {
            return Err(EosError::OutOfDomain {
                model: "NobleAbel",
                what: "density exceeds co-volume limit",
                rho,
                x: sie,
            });
        }
        Ok(())
    }
}
