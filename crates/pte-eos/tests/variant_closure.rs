//! Every member of the closed set, reached from its base model through identity
//! modifiers, must reproduce the base model.

use std::collections::{BTreeSet, VecDeque};

use pte_core::{Tolerances, nearly_equal};
use pte_eos::{
    Eos, EosModel, Gruneisen, GruneisenParams, IdealGas, Jwl, JwlParams, MAX_NUM_LAMBDAS,
    Modifier, ModifierKind, NobleAbel, StiffGas,
};

const TOL: Tolerances = Tolerances {
    abs: 0.0,
    rel: 1e-14,
};

/// Base models with a state where the pressure is positive, so the ramp is inert.
fn bases() -> Vec<(Eos, f64, f64)> {
    vec![
        (IdealGas::new(0.4, 7.18e6).unwrap().into(), 1e-3, 2e9),
        (
            Gruneisen::new(GruneisenParams {
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
            .unwrap()
            .into(),
            9.0,
            5e8,
        ),
        (
            Jwl::new(JwlParams {
                a: 8.545e12,
                b: 2.05e11,
                r1: 4.6,
                r2: 1.35,
                w: 0.25,
                rho0: 1.895,
                cv: 1e7,
            })
            .unwrap()
            .into(),
            1.2,
            4e10,
        ),
        (StiffGas::new(3.4, 1.6e7, 6e9, 0.0).unwrap().into(), 1.1, 1e10),
        (NobleAbel::new(0.4, 7.18e6, 1.0, 0.0).unwrap().into(), 0.2, 3e9),
    ]
}

fn reachable(base: Eos) -> Vec<Eos> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    let mut queue = VecDeque::from([base]);
    while let Some(eos) = queue.pop_front() {
        if !seen.insert(eos.tag()) {
            continue;
        }
        out.push(eos);
        for kind in ModifierKind::ALL {
            if let Ok(next) = eos.modify(Modifier::identity(kind)) {
                queue.push_back(next);
            }
        }
    }
    out
}

fn assert_same(a: &Eos, b: &Eos, rho: f64, sie: f64) {
    let mut l = [0.0; MAX_NUM_LAMBDAS];
    let name = a.variant_name();
    let pairs = [
        (
            a.pressure_from_density_internal_energy(rho, sie, &mut l),
            b.pressure_from_density_internal_energy(rho, sie, &mut l),
        ),
        (
            a.temperature_from_density_internal_energy(rho, sie, &mut l),
            b.temperature_from_density_internal_energy(rho, sie, &mut l),
        ),
        (
            a.bulk_modulus_from_density_internal_energy(rho, sie, &mut l),
            b.bulk_modulus_from_density_internal_energy(rho, sie, &mut l),
        ),
        (
            a.gruneisen_param_from_density_internal_energy(rho, sie, &mut l),
            b.gruneisen_param_from_density_internal_energy(rho, sie, &mut l),
        ),
        (
            a.pressure_from_density_temperature(rho, 500.0, &mut l),
            b.pressure_from_density_temperature(rho, 500.0, &mut l),
        ),
        (
            a.internal_energy_from_density_temperature(rho, 500.0, &mut l),
            b.internal_energy_from_density_temperature(rho, 500.0, &mut l),
        ),
    ];
    for (x, y) in pairs {
        assert!(nearly_equal(x, y, TOL), "{name}: {x} != {y}");
    }
    let (da, db) = (a.p_t_of_r_e(rho, sie, &mut l), b.p_t_of_r_e(rho, sie, &mut l));
    assert!(nearly_equal(da.dpdr, db.dpdr, TOL), "{name}: dpdr");
    assert!(nearly_equal(da.dpde, db.dpde, TOL), "{name}: dpde");
    assert!(nearly_equal(da.dtde, db.dtde, TOL), "{name}: dtde");
}

#[test]
fn identity_modifiers_cover_the_set_and_reduce_to_base() {
    let mut covered = BTreeSet::new();
    for (base, rho, sie) in bases() {
        for eos in reachable(base) {
            covered.insert(eos.tag());
            assert_same(&eos, &base, rho, sie);
            assert_eq!(eos.is_modified(), eos.tag() != base.tag());
        }
    }
    assert_eq!(covered.len(), Eos::NUM_VARIANTS);
}

#[test]
fn only_ideal_gas_takes_unit_system_or_relativistic() {
    for (base, _, _) in bases() {
        let ideal = base.variant_name() == "IdealGas";
        for kind in [ModifierKind::UnitSystem, ModifierKind::Relativistic] {
            assert_eq!(base.modify(Modifier::identity(kind)).is_ok(), ideal);
        }
    }
}

#[test]
fn ramp_closes_the_set() {
    for (base, _, _) in bases() {
        for eos in reachable(base) {
            if eos.variant_name().starts_with("BilinearRamp") {
                for kind in ModifierKind::ALL {
                    assert!(eos.modify(Modifier::identity(kind)).is_err());
                }
            }
        }
    }
}

#[test]
fn eos_type_names_composition() {
    let air: Eos = IdealGas::new(0.4, 7.18e6).unwrap().into();
    let eos = air
        .modify_all([
            Modifier::identity(ModifierKind::UnitSystem),
            Modifier::identity(ModifierKind::Shifted),
            Modifier::identity(ModifierKind::Scaled),
            Modifier::identity(ModifierKind::BilinearRamp),
        ])
        .unwrap();
    assert_eq!(
        eos.eos_type(),
        "BilinearRamp<Scaled<Shifted<UnitSystem<IdealGas>>>>"
    );
    assert_eq!(eos.variant_name(), "BilinearRampScaledShiftedUnitSystemIdealGas");
}
