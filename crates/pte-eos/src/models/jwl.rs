use pte_core::Real;
use pte_core::units::constants::ROOM_TEMPERATURE;

use crate::error::EosResult;
use crate::model::{EosModel, PtDerivatives, ReferenceState, domain};

/// Parameters of the Jones-Wilkins-Lee detonation-products EOS.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JwlParams {
    pub a: Real,
    pub b: Real,
    pub r1: Real,
    pub r2: Real,
    pub w: Real,
    pub rho0: Real,
    pub cv: Real,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Jwl {
    p: JwlParams,
}

impl Jwl {
    pub fn new(p: JwlParams) -> EosResult<Self> {
        domain::positive("JWL", "r1 must be positive", p.r1)?;
        domain::positive("JWL", "r2 must be positive", p.r2)?;
        domain::positive("JWL", "w must be positive", p.w)?;
        domain::positive("JWL", "rho0 must be positive", p.rho0)?;
        domain::positive("JWL", "cv must be positive", p.cv)?;
        domain::finite("JWL", "a must be finite", p.a)?;
        domain::finite("JWL", "b must be finite", p.b)?;
        Ok(Self { p })
    }

    pub fn params(&self) -> &JwlParams {
        &self.p
    }

    /// Exponential terms `(A e^{-R1 x}, B e^{-R2 x})` with `x = rho0 / rho`.
    fn exps(&self, rho: Real) -> (Real, Real) {
        let x = self.p.rho0 / rho;
        (
            self.p.a * (-self.p.r1 * x).exp(),
            self.p.b * (-self.p.r2 * x).exp(),
        )
    }

    fn reference_pressure(&self, rho: Real) -> Real {
        let (ea, eb) = self.exps(rho);
        ea + eb
    }

    fn reference_energy(&self, rho: Real) -> Real {
        let (ea, eb) = self.exps(rho);
        (ea / self.p.r1 + eb / self.p.r2) / self.p.rho0
    }
}

impl EosModel for Jwl {
    fn temperature_from_density_internal_energy(&self, rho: Real, sie: Real, _: &mut [Real]) -> Real {
        (sie - self.reference_energy(rho)) / self.p.cv
    }

    fn internal_energy_from_density_temperature(&self, rho: Real, temp: Real, _: &mut [Real]) -> Real {
        self.reference_energy(rho) + self.p.cv * temp
    }

    fn pressure_from_density_temperature(&self, rho: Real, temp: Real, _: &mut [Real]) -> Real {
        self.reference_pressure(rho) + self.p.w * rho * self.p.cv * temp
    }

    fn pressure_from_density_internal_energy(&self, rho: Real, sie: Real, _: &mut [Real]) -> Real {
        self.reference_pressure(rho) + self.p.w * rho * (sie - self.reference_energy(rho))
    }

    fn min_internal_energy_from_density(&self, rho: Real, _: &mut [Real]) -> Real {
        self.reference_energy(rho)
    }

    fn specific_heat_from_density_temperature(&self, _rho: Real, _temp: Real, _: &mut [Real]) -> Real {
        self.p.cv
    }

    fn specific_heat_from_density_internal_energy(&self, _rho: Real, _sie: Real, _: &mut [Real]) -> Real {
        self.p.cv
    }

    fn bulk_modulus_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        let sie = self.internal_energy_from_density_temperature(rho, temp, l);
        self.bulk_modulus_from_density_internal_energy(rho, sie, l)
    }

    fn bulk_modulus_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        let d = self.p_t_of_r_e(rho, sie, l);
        rho * d.dpdr + self.p.w * d.press
    }

    fn gruneisen_param_from_density_temperature(&self, _rho: Real, _temp: Real, _: &mut [Real]) -> Real {
        self.p.w
    }

    fn gruneisen_param_from_density_internal_energy(&self, _rho: Real, _sie: Real, _: &mut [Real]) -> Real {
        self.p.w
    }

    fn reference_state(&self) -> ReferenceState {
        ReferenceState::at(self, self.p.rho0, ROOM_TEMPERATURE)
    }

    fn eos_type(&self) -> String {
        "JWL".to_string()
    }

    fn p_t_of_r_e(&self, rho: Real, sie: Real, _: &mut [Real]) -> PtDerivatives {
        let JwlParams {
            r1, r2, w, rho0, cv, ..
        } = self.p;
        let (ea, eb) = self.exps(rho);
        let p_ref = ea + eb;
        let e_ref = (ea / r1 + eb / r2) / rho0;
        let rho2 = rho * rho;
        // d e_ref / d rho = P_ref / rho^2
        let de_ref = p_ref / rho2;
        let dp_ref = rho0 / rho2 * (r1 * ea + r2 * eb);
        PtDerivatives {
            press: p_ref + w * rho * (sie - e_ref),
            temp: (sie - e_ref) / cv,
            dpdr: dp_ref + w * (sie - e_ref) - w * rho * de_ref,
            dpde: w * rho,
            dtdr: -de_ref / cv,
            dtde: 1.0 / cv,
        }
    }
}
