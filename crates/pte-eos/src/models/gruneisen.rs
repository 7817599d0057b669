use pte_core::Real;

use crate::error::{EosError, EosResult};
use crate::model::{EosModel, PtDerivatives, ReferenceState, domain};

/// Parameters of the Us-up Gruneisen model.
///
/// `c0` is the bulk sound speed (cm/s), `s1..s3` the Hugoniot slope coefficients,
/// `g0` the reference Gruneisen parameter and `b` its first-order volume correction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GruneisenParams {
    pub c0: Real,
    pub s1: Real,
    pub s2: Real,
    pub s3: Real,
    pub g0: Real,
    pub b: Real,
    pub rho0: Real,
    pub t0: Real,
    pub p0: Real,
    pub cv: Real,
}

/// Mie-Gruneisen EOS with a shock Hugoniot reference curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gruneisen {
    p: GruneisenParams,
}

/// Reference-curve quantities at one density.
struct Hugoniot {
    /// Gruneisen parameter
    gamma: Real,
    /// dGamma/drho
    dgamma: Real,
    /// Reference pressure (excluding `p0`)
    press: Real,
    dpress: Real,
    /// Reference energy
    sie: Real,
    dsie: Real,
}

impl Gruneisen {
    pub fn new(p: GruneisenParams) -> EosResult<Self> {
        domain::positive("Gruneisen", "c0 must be positive", p.c0)?;
        domain::positive("Gruneisen", "rho0 must be positive", p.rho0)?;
        domain::positive("Gruneisen", "cv must be positive", p.cv)?;
        for v in [p.s1, p.s2, p.s3, p.g0, p.b, p.t0, p.p0] {
            domain::finite("Gruneisen", "parameters must be finite", v)?;
        }
        if p.t0 < 0.0 {
            return Err(EosError::param("Gruneisen", "t0 must be non-negative"));
        }
        Ok(Self { p })
    }

    pub fn params(&self) -> &GruneisenParams {
        &self.p
    }

    fn denominator(&self, eta: Real) -> (Real, Real) {
        let GruneisenParams { s1, s2, s3, .. } = self.p;
        let d = 1.0 - eta * (s1 + eta * (s2 + eta * s3));
        let dd = -(s1 + eta * (2.0 * s2 + 3.0 * eta * s3));
        (d, dd)
    }

    fn hugoniot(&self, rho: Real) -> Hugoniot {
        let GruneisenParams {
            c0, g0, b, rho0, ..
        } = self.p;
        let c02 = c0 * c0;
        if rho < rho0 {
            // expansion: linear reference, constant Gamma
            return Hugoniot {
                gamma: g0,
                dgamma: 0.0,
                press: c02 * (rho - rho0),
                dpress: c02,
                sie: 0.0,
                dsie: 0.0,
            };
        }
        let eta = 1.0 - rho0 / rho;
        let deta = rho0 / (rho * rho);
        let (d, dd) = self.denominator(eta);
        let ph = rho0 * c02 * eta / (d * d);
        let dph = rho0 * c02 * (d - 2.0 * eta * dd) / (d * d * d) * deta;
        let eh = ph * eta / (2.0 * rho0);
        let deh = (dph * eta + ph * deta) / (2.0 * rho0);
        Hugoniot {
            gamma: g0 * (1.0 - eta) + b * eta,
            dgamma: (b - g0) * deta,
            press: ph,
            dpress: dph,
            sie: eh,
            dsie: deh,
        }
    }

    fn sie_of_temp(&self, temp: Real) -> Real {
        self.p.cv * (temp - self.p.t0)
    }

    fn press_and_dpdr(&self, rho: Real, sie: Real) -> (Real, Real, Real) {
        let h = self.hugoniot(rho);
        let press = self.p.p0 + h.press + h.gamma * rho * (sie - h.sie);
        let dpdr = h.dpress + (h.dgamma * rho + h.gamma) * (sie - h.sie) - h.gamma * rho * h.dsie;
        (press, dpdr, h.gamma)
    }
}

impl EosModel for Gruneisen {
    fn temperature_from_density_internal_energy(&self, _rho: Real, sie: Real, _: &mut [Real]) -> Real {
        self.p.t0 + sie / self.p.cv
    }

    fn internal_energy_from_density_temperature(&self, _rho: Real, temp: Real, _: &mut [Real]) -> Real {
        self.sie_of_temp(temp)
    }

    fn pressure_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.pressure_from_density_internal_energy(rho, self.sie_of_temp(temp), l)
    }

    fn pressure_from_density_internal_energy(&self, rho: Real, sie: Real, _: &mut [Real]) -> Real {
        self.press_and_dpdr(rho, sie).0
    }

    fn min_internal_energy_from_density(&self, _rho: Real, _: &mut [Real]) -> Real {
        self.sie_of_temp(0.0)
    }

    fn specific_heat_from_density_temperature(&self, _rho: Real, _temp: Real, _: &mut [Real]) -> Real {
        self.p.cv
    }

    fn specific_heat_from_density_internal_energy(&self, _rho: Real, _sie: Real, _: &mut [Real]) -> Real {
        self.p.cv
    }

    fn bulk_modulus_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.bulk_modulus_from_density_internal_energy(rho, self.sie_of_temp(temp), l)
    }

    /// `B = rho dP/drho|e + Gamma P`, finite at `rho = 0`.
    fn bulk_modulus_from_density_internal_energy(&self, rho: Real, sie: Real, _: &mut [Real]) -> Real {
        let (press, dpdr, gamma) = self.press_and_dpdr(rho, sie);
        rho * dpdr + gamma * press
    }

    fn gruneisen_param_from_density_temperature(&self, rho: Real, _temp: Real, _: &mut [Real]) -> Real {
        self.hugoniot(rho).gamma
    }

    fn gruneisen_param_from_density_internal_energy(&self, rho: Real, _sie: Real, _: &mut [Real]) -> Real {
        self.hugoniot(rho).gamma
    }

    fn reference_state(&self) -> ReferenceState {
        ReferenceState::at(self, self.p.rho0, self.p.t0)
    }

    fn eos_type(&self) -> String {
        "Gruneisen".to_string()
    }

    fn p_t_of_r_e(&self, rho: Real, sie: Real, _: &mut [Real]) -> PtDerivatives {
        let (press, dpdr, gamma) = self.press_and_dpdr(rho, sie);
        PtDerivatives {
            press,
            temp: self.p.t0 + sie / self.p.cv,
            dpdr,
            dpde: gamma * rho,
            dtdr: 0.0,
            dtde: 1.0 / self.p.cv,
        }
    }

    /// Beyond the Hugoniot singularity (`1 - s1 eta - ... <= 0`) the reference curve is
    /// meaningless.
    fn check_domain(&self, rho: Real, sie: Real) -> EosResult<()> {
        domain::finite_positive_density(self.min_density(), rho, sie)?;
        if rho >= self.p.rho0 && self.denominator(1.0 - self.p.rho0 / rho).0 <= 0.0 {
            return Err(EosError::OutOfDomain {
                model: "Gruneisen",
                what: "compression beyond Hugoniot limit",
                rho,
                x: sie,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAX_NUM_LAMBDAS;
    use pte_core::{Tolerances, nearly_equal};

    const REL: Tolerances = Tolerances {
        abs: 0.0,
        rel: 1e-10,
    };

    fn copper() -> Gruneisen {
        Gruneisen::new(GruneisenParams {
            c0: 0.394 / 1e-6,
            s1: 1.489,
            s2: 0.0,
            s3: 0.0,
            g0: 2.02,
            b: 0.47,
            rho0: 8.93,
            t0: 298.0,
            p0: 0.0,
            cv: 0.383e-5 * 1e12,
        })
        .unwrap()
    }

    #[test]
    fn bulk_modulus_matches_derivatives() {
        let eos = copper();
        let mut l = [0.0; MAX_NUM_LAMBDAS];
        for (rho, sie) in [(8.0, 1e9), (9.2, 3e8), (10.5, 2e9)] {
            let d = eos.p_t_of_r_e(rho, sie, &mut l);
            let b = eos.bulk_modulus_from_density_internal_energy(rho, sie, &mut l);
            assert!(nearly_equal(b, rho * d.dpdr + d.press / rho * d.dpde, REL));
        }
    }

    #[test]
    fn analytic_dpdr_matches_difference() {
        let eos = copper();
        let mut l = [0.0; MAX_NUM_LAMBDAS];
        let (rho, sie) = (9.5, 4e8);
        let h = 1e-6 * rho;
        let hi = eos.pressure_from_density_internal_energy(rho + h, sie, &mut l);
        let lo = eos.pressure_from_density_internal_energy(rho - h, sie, &mut l);
        let d = eos.p_t_of_r_e(rho, sie, &mut l);
        let tol = Tolerances {
            abs: 0.0,
            rel: 1e-6,
        };
        assert!(nearly_equal(d.dpdr, (hi - lo) / (2.0 * h), tol));
    }

    #[test]
    fn hugoniot_limit_is_out_of_domain() {
        let eos = copper();
        // eta = 1/s1 -> rho = rho0 / (1 - 1/s1)
        let rho_lim = 8.93 / (1.0 - 1.0 / 1.489);
        assert!(eos.check_domain(rho_lim * 1.01, 0.0).is_err());
        assert!(eos.check_domain(rho_lim * 0.99, 0.0).is_ok());
        assert!(eos.check_domain(0.0, 0.0).is_err());
    }

    #[test]
    fn temperature_round_trip() {
        let eos = copper();
        let mut l = [0.0; MAX_NUM_LAMBDAS];
        let e = eos.internal_energy_from_density_temperature(9.0, 700.0, &mut l);
        assert!(nearly_equal(
            eos.temperature_from_density_internal_energy(9.0, e, &mut l),
            700.0,
            REL
        ));
        assert!(nearly_equal(
            eos.min_internal_energy_from_density(9.0, &mut l),
            -eos.params().cv * 298.0,
            REL
        ));
    }
}
