//! Closed-set EOS handle.
//!
//! `Eos` is generated by `build.rs`: one variant per legal model/modifier
//! composition, each holding the composition inline. `enum_dispatch` turns every
//! [`EosModel`] call into a match on the tag, and provides `From<Composition>` for
//! each member, so an illegal composition has no conversion and does not compile.
//! [`Eos::modify`] is the runtime path; it rejects compositions outside the set.

use enum_dispatch::enum_dispatch;
use pte_core::Real;

use crate::error::{EosError, EosResult};
use crate::model::{EosModel, PtDerivatives, ReferenceState};
use crate::modifiers::{
    BilinearRamp, Modifier, ModifierKind, Relativistic, Scaled, Shifted, UnitSystem,
};
use crate::models::{Gruneisen, IdealGas, Jwl, NobleAbel, StiffGas};

include!(concat!(env!("OUT_DIR"), "/eos_variant.rs"));

impl Eos {
    /// Applies `modifiers` innermost first.
    pub fn modify_all<I>(self, modifiers: I) -> EosResult<Eos>
    where
        I: IntoIterator<Item = Modifier>,
    {
        modifiers.into_iter().try_fold(self, Eos::modify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAX_NUM_LAMBDAS;

    fn air() -> IdealGas {
        IdealGas::new(0.4, 7.18e6).unwrap()
    }

    #[test]
    fn closure_has_56_members() {
        assert_eq!(Eos::NUM_VARIANTS, 56);
        assert_eq!(Eos::VARIANT_NAMES[0], "IdealGas");
        assert!(Eos::VARIANT_NAMES.contains(&"BilinearRampScaledShiftedRelativisticIdealGas"));
        assert!(!Eos::VARIANT_NAMES.contains(&"ScaledScaledIdealGas"));
    }

    #[test]
    fn from_and_tag() {
        let eos = Eos::from(Scaled::new(air(), 2.0).unwrap());
        assert_eq!(eos.variant_name(), "ScaledIdealGas");
        assert_eq!(Eos::VARIANT_NAMES[eos.tag()], "ScaledIdealGas");
        assert_eq!(eos.eos_type(), "Scaled<IdealGas>");
    }

    #[test]
    fn illegal_runtime_compositions() {
        let ramp = Modifier::identity(ModifierKind::BilinearRamp);
        let ramped = Eos::from(air()).modify(ramp).unwrap();
        assert!(matches!(
            ramped.modify(ramp),
            Err(EosError::IllegalComposition { .. })
        ));

        let scaled = Eos::from(air()).modify(Modifier::Scaled { scale: 2.0 }).unwrap();
        assert!(scaled.modify(Modifier::Scaled { scale: 2.0 }).is_err());

        let unit = Modifier::identity(ModifierKind::UnitSystem);
        let copper = Eos::from(
            Gruneisen::new(crate::models::GruneisenParams {
                c0: 3.94e5,
                s1: 1.489,
                s2: 0.0,
                s3: 0.0,
                g0: 2.02,
                b: 0.47,
                rho0: 8.93,
                t0: 298.0,
                p0: 0.0,
                cv: 3.83e6,
            })
            .unwrap(),
        );
        let err = copper.modify(unit).unwrap_err();
        assert_eq!(
            err,
            EosError::IllegalComposition {
                inner: "Gruneisen",
                modifier: "UnitSystem"
            }
        );
    }

    #[test]
    fn modifier_parameters_are_validated() {
        let eos = Eos::from(air());
        assert!(matches!(
            eos.modify(Modifier::Scaled { scale: -1.0 }),
            Err(EosError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn dispatch_matches_concrete_call() {
        let base = StiffGas::new(3.4, 1.6e7, 6e9, 0.0).unwrap();
        let eos = Eos::from(base).modify_all([
            Modifier::Shifted { shift: 1e8 },
            Modifier::Scaled { scale: 1.5 },
        ]);
        let eos = eos.unwrap();
        let concrete = Scaled::new(Shifted::new(base, 1e8).unwrap(), 1.5).unwrap();
        let mut l = [0.0; MAX_NUM_LAMBDAS];
        assert_eq!(eos.variant_name(), "ScaledShiftedStiffGas");
        assert_eq!(
            eos.pressure_from_density_internal_energy(1.1, 2e9, &mut l),
            concrete.pressure_from_density_internal_energy(1.1, 2e9, &mut l)
        );
        assert_eq!(eos.p_t_of_r_e(1.1, 2e9, &mut l), concrete.p_t_of_r_e(1.1, 2e9, &mut l));
        assert!(eos.is_modified());
    }

    #[test]
    fn handle_is_small_and_copy() {
        fn assert_copy<T: Copy + Send + Sync>() {}
        assert_copy::<Eos>();
        // largest payload: ramp around scaled/shifted/unit-system ideal gas
        assert!(std::mem::size_of::<Eos>() <= 32 * std::mem::size_of::<Real>());
    }
}
