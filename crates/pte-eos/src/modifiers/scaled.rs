use pte_core::Real;

use super::{Modifier, ModifierKind, mismatch};
use crate::error::{EosError, EosResult};
use crate::model::{EosModel, PtDerivatives, ReferenceState};

/// Density scaling: the wrapped model sees `(scale rho, sie / scale)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scaled<T> {
    t: T,
    scale: Real,
    inv_scale: Real,
}

impl<T: EosModel> Scaled<T> {
    pub fn new(t: T, scale: Real) -> EosResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(EosError::param("Scaled", "scale must be positive"));
        }
        Ok(Self {
            t,
            scale,
            inv_scale: 1.0 / scale,
        })
    }

    pub fn wrap(t: T, m: &Modifier) -> EosResult<Self> {
        match *m {
            Modifier::Scaled { scale } => Self::new(t, scale),
            _ => Err(mismatch(ModifierKind::Scaled, m)),
        }
    }

    pub fn inner(&self) -> &T {
        &self.t
    }
}

impl<T: EosModel> EosModel for Scaled<T> {
    fn temperature_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t
            .temperature_from_density_internal_energy(self.scale * rho, self.inv_scale * sie, l)
    }

    fn internal_energy_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.scale * self.t.internal_energy_from_density_temperature(self.scale * rho, temp, l)
    }

    fn pressure_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.pressure_from_density_temperature(self.scale * rho, temp, l)
    }

    fn pressure_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t
            .pressure_from_density_internal_energy(self.scale * rho, self.inv_scale * sie, l)
    }

    fn min_internal_energy_from_density(&self, rho: Real, l: &mut [Real]) -> Real {
        self.scale * self.t.min_internal_energy_from_density(self.scale * rho, l)
    }

    fn specific_heat_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.scale * self.t.specific_heat_from_density_temperature(self.scale * rho, temp, l)
    }

    fn specific_heat_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.scale
            * self
                .t
                .specific_heat_from_density_internal_energy(self.scale * rho, self.inv_scale * sie, l)
    }

    fn bulk_modulus_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.bulk_modulus_from_density_temperature(self.scale * rho, temp, l)
    }

    fn bulk_modulus_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t
            .bulk_modulus_from_density_internal_energy(self.scale * rho, self.inv_scale * sie, l)
    }

    fn gruneisen_param_from_density_temperature(&self, rho: Real, temp: Real, l: &mut [Real]) -> Real {
        self.t.gruneisen_param_from_density_temperature(self.scale * rho, temp, l)
    }

    fn gruneisen_param_from_density_internal_energy(&self, rho: Real, sie: Real, l: &mut [Real]) -> Real {
        self.t
            .gruneisen_param_from_density_internal_energy(self.scale * rho, self.inv_scale * sie, l)
    }

    fn reference_state(&self) -> ReferenceState {
        let r = self.t.reference_state();
        ReferenceState {
            rho: r.rho * self.inv_scale,
            sie: r.sie * self.scale,
            cv: r.cv * self.scale,
            dpde: r.dpde * self.inv_scale,
            dvdt: r.dvdt * self.scale,
            ..r
        }
    }

    fn eos_type(&self) -> String {
        format!("Scaled<{}>", self.t.eos_type())
    }

    fn p_t_of_r_e(&self, rho: Real, sie: Real, l: &mut [Real]) -> PtDerivatives {
        let d = self.t.p_t_of_r_e(self.scale * rho, self.inv_scale * sie, l);
        PtDerivatives {
            dpdr: d.dpdr * self.scale,
            dpde: d.dpde * self.inv_scale,
            dtdr: d.dtdr * self.scale,
            dtde: d.dtde * self.inv_scale,
            ..d
        }
    }

    fn check_domain(&self, rho: Real, sie: Real) -> EosResult<()> {
        self.t.check_domain(self.scale * rho, self.inv_scale * sie)
    }

    fn check_domain_temperature(&self, rho: Real, temp: Real) -> EosResult<()> {
        self.t.check_domain_temperature(self.scale * rho, temp)
    }

    fn min_density(&self) -> Real {
        self.inv_scale * self.t.min_density()
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
