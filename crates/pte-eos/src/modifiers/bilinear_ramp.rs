use pte_core::Real;

use super::{Modifier, ModifierKind, mismatch};
use crate::error::{EosError, EosResult};
use crate::model::{EosModel, PtDerivatives, ReferenceState};

/// Pressure floor made of two linear segments in density, used to model porous
/// compaction: zero below `r0`, slope `a / r0` up to `rmid`, slope `b / r0` beyond.
/// The floor replaces the wrapped pressure wherever it is larger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BilinearRamp<T> {
    t: T,
    r0: Real,
    a: Real,
    b: Real,
    c: Real,
    rmid: Real,
}

impl<T: EosModel> BilinearRamp<T> {
    pub fn new(t: T, r0: Real, a: Real, b: Real, c: Real) -> EosResult<Self> {
        if !r0.is_finite() || r0 <= 0.0 {
            return Err(EosError::param("BilinearRamp", "r0 must be positive"));
        }
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return Err(EosError::param("BilinearRamp", "a, b, c must be finite"));
        }
        if a == b {
            return Err(EosError::param("BilinearRamp", "a and b must differ"));
        }
        Ok(Self {
            t,
            r0,
            a,
            b,
            c,
            rmid: r0 * (a - b * c) / (a - b),
        })
    }

    pub fn wrap(t: T, m: &Modifier) -> EosResult<Self> {
        match *m {
            Modifier::BilinearRamp { r0, a, b, c } => Self::new(t, r0, a, b, c),
            _ => Err(mismatch(ModifierKind::BilinearRamp, m)),
        }
    }

    pub fn inner(&self) -> &T {
        &self.t
    }

    /// Density where the two segments meet.
    pub fn rmid(&self) -> Real {
        self.rmid
    }

    /// Floor pressure and its density derivative.
    fn ramp(&self, rho: Real) -> (Real, Real) {
        if rho < self.r0 {
            (0.0, 0.0)
        } else if rho < self.rmid {
            (self.a * (rho / self.r0 - 1.0), self.a / self.r0)
        } else {
            (self.b * (rho / self.r0 - self.c), self.b / self.r0)
        }
    }

    fn bulk(&self, rho: Real, press: Real, bmod: Real) -> Real {
        let (p_ramp, dp_ramp) = self.ramp(rho);
        if p_ramp > press { rho * dp_ramp } else { bmod }
    }
}

impl<T: EosModel> EosModel for BilinearRamp<T> {
    fn temperature_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.temperature_from_density_internal_energy(rho, sie, l)
    }

    fn internal_energy_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.internal_energy_from_density_temperature(rho, temp, l)
    }

    fn pressure_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.pressure_from_density_temperature(rho, temp, l).max(self.ramp(rho).0)
    }

    fn pressure_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.pressure_from_density_internal_energy(rho, sie, l).max(self.ramp(rho).0)
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
        let press = self.t.pressure_from_density_temperature(rho, temp, l);
        let bmod = self.t.bulk_modulus_from_density_temperature(rho, temp, l);
        self.bulk(rho, press, bmod)
    }

    fn bulk_modulus_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        let press = self.t.pressure_from_density_internal_energy(rho, sie, l);
        let bmod = self.t.bulk_modulus_from_density_internal_energy(rho, sie, l);
        self.bulk(rho, press, bmod)
    }

    fn gruneisen_param_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.gruneisen_param_from_density_temperature(rho, temp, l)
    }

    fn gruneisen_param_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t.gruneisen_param_from_density_internal_energy(rho, sie, l)
    }

    fn reference_state(&self) -> ReferenceState {
        let r = self.t.reference_state();
        let (p_ramp, _) = self.ramp(r.rho);
        ReferenceState {
            press: r.press.max(p_ramp),
            bmod: self.bulk(r.rho, r.press, r.bmod),
            ..r
        }
    }

    fn eos_type(&self) -> String {
        format!("BilinearRamp<{}>", self.t.eos_type())
    }

    fn p_t_of_r_e(&self, rho: Real, sie: Real, l: &mut [Real]) -> PtDerivatives {
        let d = self.t.p_t_of_r_e(rho, sie, l);
        let (p_ramp, dp_ramp) = self.ramp(rho);
        if p_ramp > d.press {
            PtDerivatives {
                press: p_ramp,
                dpdr: dp_ramp,
                dpde: 0.0,
                ..d
            }
        } else {
            d
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAX_NUM_LAMBDAS;
    use crate::models::IdealGas;

    fn ramp() -> BilinearRamp<IdealGas> {
        let base = IdealGas::new(0.4, 7.18e6).unwrap();
        // rmid = 1.0 * (1e10 - 2e9 * 0.5) / (1e10 - 2e9) = 1.125
        BilinearRamp::new(base, 1.0, 1e10, 2e9, 0.5).unwrap()
    }

    #[test]
    fn floor_segments() {
        let eos = ramp();
        assert!((eos.rmid() - 1.125).abs() < 1e-12);
        let mut l = [0.0; MAX_NUM_LAMBDAS];
        // tiny energy: ramp dominates above r0
        let p = eos.pressure_from_density_internal_energy(1.1, 1.0, &mut l);
        assert!((p - 1e10 * 0.1).abs() < 1e-3);
        let p = eos.pressure_from_density_internal_energy(1.5, 1.0, &mut l);
        assert!((p - 2e9 * 1.0).abs() < 1e-3);
        let b = eos.bulk_modulus_from_density_internal_energy(1.5, 1.0, &mut l);
        assert!((b - 1.5 * 2e9).abs() < 1e-3);
        // below r0 the gas pressure is kept
        let p = eos.pressure_from_density_internal_energy(0.5, 1e9, &mut l);
        assert_eq!(p, 0.4 * 0.5 * 1e9);
    }

    #[test]
    fn segments_meet_at_rmid() {
        let eos = ramp();
        let r = eos.rmid();
        let lo = eos.a * (r / eos.r0 - 1.0);
        let hi = eos.b * (r / eos.r0 - eos.c);
        assert!((lo - hi).abs() < 1e-3);
    }

    #[test]
    fn equal_slopes_rejected() {
        let base = IdealGas::new(0.4, 7.18e6).unwrap();
        assert!(BilinearRamp::new(base, 1.0, 2.0, 2.0, 0.0).is_err());
    }
}
