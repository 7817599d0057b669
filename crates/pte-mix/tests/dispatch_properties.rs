//! Integration tests for the cell loop: conservation, equilibrium, slot isolation
//! and the zero-fraction and disabled-array boundaries.

use proptest::prelude::*;
use pte_core::Real;
use pte_eos::{Eos, EosModel, IdealGas, MAX_NUM_LAMBDAS, StiffGas};
use pte_mix::{
    CellInputs, CellOutputs, CellStatus, DispatchOptions, DispatchSummary, Fractions, MaterialMap,
    MixError, MixResult, ScratchArena, SlotTokens, get_eos_rho_e,
};

#[derive(Clone, Debug)]
struct Mesh {
    eos: Vec<Eos>,
    eos_offsets: Vec<usize>,
    /// Cells handed to the loop, in loop order.
    cells: Vec<usize>,
    nmat: usize,
    vol: Vec<Real>,
    spvol: Vec<Real>,
    sie: Vec<Real>,
    press: Vec<Real>,
    pmax: Vec<Real>,
    temp: Vec<Real>,
    bmod: Vec<Real>,
    dpde: Vec<Real>,
    cv: Vec<Real>,
    status: Vec<CellStatus>,
    frac_mass: Vec<Real>,
    frac_vol: Vec<Real>,
    frac_ie: Vec<Real>,
    frac_bmod: Vec<Real>,
    frac_dpde: Vec<Real>,
    frac_cv: Vec<Real>,
}

impl Mesh {
    /// Cells are `(volume, density, sie, mass fractions)`.
    fn new<Y: AsRef<[Real]>>(eos: Vec<Eos>, cells: &[(Real, Real, Real, Y)]) -> Self {
        let nmat = eos.len();
        let n = cells.len();
        let mut mesh = Self {
            eos_offsets: (0..nmat).collect(),
            cells: (0..n).collect(),
            eos,
            nmat,
            vol: Vec::with_capacity(n),
            spvol: Vec::with_capacity(n),
            sie: Vec::with_capacity(n),
            press: vec![0.0; n],
            pmax: vec![0.0; n],
            temp: vec![0.0; n],
            bmod: vec![0.0; n],
            dpde: vec![0.0; n],
            cv: vec![0.0; n],
            status: vec![CellStatus::InvalidInput; n],
            frac_mass: Vec::with_capacity(n * nmat),
            frac_vol: Vec::with_capacity(n * nmat),
            frac_ie: vec![0.0; n * nmat],
            frac_bmod: vec![0.0; n * nmat],
            frac_dpde: vec![0.0; n * nmat],
            frac_cv: vec![0.0; n * nmat],
        };
        for (vol, rho, sie, ys) in cells {
            let (vol, rho, sie, ys) = (*vol, *rho, *sie, ys.as_ref());
            assert_eq!(ys.len(), nmat);
            mesh.vol.push(vol);
            mesh.spvol.push(1.0 / rho);
            mesh.sie.push(sie);
            mesh.frac_mass.extend_from_slice(ys);
            // volume guess proportional to mass
            mesh.frac_vol.extend(ys.iter().map(|y| y * vol));
        }
        mesh
    }

    fn ncell(&self) -> usize {
        self.vol.len()
    }

    fn run(
        &mut self,
        arena: &mut ScratchArena,
        tokens: &SlotTokens,
        opts: &DispatchOptions,
    ) -> MixResult<DispatchSummary> {
        get_eos_rho_e(
            MaterialMap::new(&self.eos, &self.eos_offsets),
            CellInputs {
                offsets: &self.cells,
                vol: &self.vol,
                spvol: &self.spvol,
                sie: &self.sie,
            },
            CellOutputs {
                press: &mut self.press,
                pmax: &mut self.pmax,
                temp: &mut self.temp,
                bmod: &mut self.bmod,
                dpde: &mut self.dpde,
                cv: &mut self.cv,
                status: &mut self.status,
            },
            Fractions {
                mass: &mut self.frac_mass,
                vol: &mut self.frac_vol,
                ie: &mut self.frac_ie,
                bmod: &mut self.frac_bmod,
                dpde: &mut self.frac_dpde,
                cv: &mut self.frac_cv,
            },
            arena,
            tokens,
            opts,
        )
    }

    fn run_default(&mut self) -> DispatchSummary {
        let mut arena = ScratchArena::new(4, self.nmat).unwrap();
        let tokens = SlotTokens::new(4).unwrap();
        self.run(&mut arena, &tokens, &DispatchOptions::default())
            .unwrap()
    }

    fn row(&self, data: &[Real], i: usize) -> Vec<Real> {
        data[i * self.nmat..(i + 1) * self.nmat].to_vec()
    }

    /// Every output array as raw bits, NaN-safe.
    fn fingerprint(&self) -> Vec<u64> {
        [
            &self.press,
            &self.pmax,
            &self.temp,
            &self.bmod,
            &self.dpde,
            &self.cv,
            &self.frac_mass,
            &self.frac_vol,
            &self.frac_ie,
            &self.frac_bmod,
            &self.frac_dpde,
            &self.frac_cv,
        ]
        .iter()
        .flat_map(|v| v.iter().map(|x| x.to_bits()))
        .collect()
    }
}

fn air() -> Eos {
    Eos::from(IdealGas::new(0.4, 7.18e6).unwrap())
}

fn helium() -> Eos {
    Eos::from(IdealGas::new(0.66, 3.12e7).unwrap())
}

fn argon() -> Eos {
    Eos::from(IdealGas::new(0.667, 3.12e6).unwrap())
}

fn water() -> Eos {
    Eos::from(StiffGas::new(3.4, 6.0e6, 6.0e9, 0.0).unwrap())
}

fn rel_close(a: Real, b: Real, rel: Real) -> bool {
    (a - b).abs() <= rel * a.abs().max(b.abs())
}

fn gas_mesh() -> Mesh {
    Mesh::new(
        vec![air(), helium(), argon()],
        &[
            (1.0, 1.2e-3, 2.5e9, &[1.0, 0.0, 0.0]),
            (2.0, 2.0e-3, 2.0e9, &[0.5, 0.5, 0.0]),
            (1.0, 1.5e-3, 3.0e9, &[0.2, 0.3, 0.5]),
            (0.5, 5.0e-4, 1.0e9, &[0.0, 0.1, 0.9]),
            (1.0, 3.0e-3, 4.0e9, &[0.7, 0.0, 0.3]),
            (3.0, 1.0e-3, 6.0e9, &[0.25, 0.25, 0.5]),
        ],
    )
}

#[test]
fn ideal_gas_mixtures_match_closed_form() {
    // For ideal gases T = e / sum(y cv) and P = rho T sum(y (gamma-1) cv).
    let gm1_cv = [(0.4, 7.18e6), (0.66, 3.12e7), (0.667, 3.12e6)];
    let mut mesh = gas_mesh();
    let ys: Vec<Vec<Real>> = (0..mesh.ncell()).map(|i| mesh.row(&mesh.frac_mass, i)).collect();
    let summary = mesh.run_default();
    assert!(summary.all_accepted(), "{summary:?}");

    for (i, y) in ys.iter().enumerate() {
        let rho = 1.0 / mesh.spvol[i];
        let ycv: Real = y.iter().zip(gm1_cv).map(|(y, (_, cv))| y * cv).sum();
        let ygcv: Real = y.iter().zip(gm1_cv).map(|(y, (g, cv))| y * g * cv).sum();
        let t = mesh.sie[i] / ycv;
        let p = rho * t * ygcv;
        assert!(rel_close(mesh.temp[i], t, 1e-6), "cell {i}: {} vs {t}", mesh.temp[i]);
        assert!(rel_close(mesh.press[i], p, 1e-6), "cell {i}: {} vs {p}", mesh.press[i]);
        assert!(rel_close(mesh.cv[i], ycv, 1e-12));
    }
}

#[test]
fn conservation_of_volume_mass_and_energy() {
    let mut mesh = gas_mesh();
    mesh.run_default();
    for i in 0..mesh.ncell() {
        let vsum: Real = mesh.row(&mesh.frac_vol, i).iter().sum();
        let msum: Real = mesh.row(&mesh.frac_mass, i).iter().sum();
        let esum: Real = mesh.row(&mesh.frac_ie, i).iter().sum();
        assert!(rel_close(vsum, mesh.vol[i], 1e-10), "cell {i}");
        assert!(rel_close(msum, 1.0, 1e-14), "cell {i}");
        assert!(rel_close(esum, mesh.sie[i], 1e-8), "cell {i}");
    }
}

#[test]
fn converged_materials_share_pressure_and_temperature() {
    // (alpha_air, rho_air, e_air, rho_water, e_water) before equilibration
    let starts = [
        (0.5, 1.2e-3, 2.1e9, 1.0, 7.8e9),
        (0.8, 2.0e-3, 2.2e9, 1.0, 7.8e9),
    ];
    let cells: Vec<_> = starts
        .iter()
        .map(|&(a, ra, ea, rw, ew)| {
            let rho = a * ra + (1.0 - a) * rw;
            let y = [a * ra / rho, (1.0 - a) * rw / rho];
            (1.0, rho, y[0] * ea + y[1] * ew, y)
        })
        .collect();
    let mut mesh = Mesh::new(vec![air(), water()], &cells);
    for (i, &(a, ..)) in starts.iter().enumerate() {
        mesh.frac_vol[2 * i] = a;
        mesh.frac_vol[2 * i + 1] = 1.0 - a;
    }
    mesh.run_default();

    for i in 0..mesh.ncell() {
        assert_eq!(mesh.status[i], CellStatus::Converged, "cell {i}");
        assert!(mesh.press[i] > 0.0);
        let rho = 1.0 / mesh.spvol[i];
        let y = mesh.row(&mesh.frac_mass, i);
        let fv = mesh.row(&mesh.frac_vol, i);
        let fe = mesh.row(&mesh.frac_ie, i);
        let mut lambda = [0.0; MAX_NUM_LAMBDAS];
        for m in 0..mesh.nmat {
            let alpha = fv[m] / mesh.vol[i];
            let rho_m = rho * y[m] / alpha;
            let e_m = fe[m] / y[m];
            let p_m = mesh.eos[m].pressure_from_density_internal_energy(rho_m, e_m, &mut lambda);
            let t_m = mesh.eos[m].temperature_from_density_internal_energy(rho_m, e_m, &mut lambda);
            let pscale = mesh.press[i].abs().max(1e6);
            assert!((p_m - mesh.press[i]).abs() <= 1e-6 * pscale, "cell {i} mat {m}");
            assert!(rel_close(t_m, mesh.temp[i], 1e-6), "cell {i} mat {m}");
        }
    }
}

#[test]
fn slot_assignment_does_not_change_results() {
    let base = gas_mesh();

    let mut serial = base.clone();
    let mut arena = ScratchArena::new(1, 3).unwrap();
    let tokens = SlotTokens::new(1).unwrap();
    let opts = DispatchOptions {
        threads: Some(1),
        ..DispatchOptions::default()
    };
    let s1 = serial.run(&mut arena, &tokens, &opts).unwrap();

    let mut wide = base.clone();
    let mut arena = ScratchArena::new(8, 3).unwrap();
    let tokens = SlotTokens::new(8).unwrap();
    let opts = DispatchOptions {
        threads: Some(4),
        ..DispatchOptions::default()
    };
    let s8 = wide.run(&mut arena, &tokens, &opts).unwrap();

    let mut small = base.clone();
    let mut arena = ScratchArena::new(base.ncell(), 3).unwrap();
    let tokens = SlotTokens::new(1).unwrap();
    let opts = DispatchOptions {
        small_loop: true,
        ..DispatchOptions::default()
    };
    let ss = small.run(&mut arena, &tokens, &opts).unwrap();

    assert_eq!(serial.fingerprint(), wide.fingerprint());
    assert_eq!(serial.fingerprint(), small.fingerprint());
    assert_eq!(serial.status, wide.status);
    assert_eq!(serial.status, small.status);
    assert_eq!(s1, s8);
    assert_eq!(s1, ss);
}

#[test]
fn dirty_arena_gives_same_results() {
    let mut first = gas_mesh();
    let mut second = gas_mesh();
    let mut arena = ScratchArena::new(2, 3).unwrap();
    let tokens = SlotTokens::new(2).unwrap();
    let opts = DispatchOptions::default();
    first.run(&mut arena, &tokens, &opts).unwrap();
    // reuse the scratch left behind by the first call
    second.run(&mut arena, &tokens, &opts).unwrap();
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn absent_materials_get_zero_fractions() {
    let mut mesh = gas_mesh();
    mesh.frac_bmod.fill(Real::NAN);
    mesh.frac_ie.fill(Real::NAN);
    mesh.run_default();
    // cell 1 has no argon, cell 3 no air
    for (i, m) in [(1usize, 2usize), (3, 0)] {
        let k = i * mesh.nmat + m;
        assert_eq!(mesh.frac_mass[k], 0.0);
        assert_eq!(mesh.frac_vol[k], 0.0);
        assert_eq!(mesh.frac_ie[k], 0.0);
        assert_eq!(mesh.frac_bmod[k], 0.0);
        assert_eq!(mesh.frac_dpde[k], 0.0);
        assert_eq!(mesh.frac_cv[k], 0.0);
    }
    assert!(mesh.fingerprint().iter().all(|&b| !Real::from_bits(b).is_nan()));
}

#[test]
fn disabled_fraction_arrays_are_untouched() {
    let mut mesh = gas_mesh();
    mesh.frac_bmod.fill(7.0);
    mesh.frac_cv = Vec::new();
    let opts = DispatchOptions {
        do_frac_bmod: false,
        do_frac_cv: false,
        ..DispatchOptions::default()
    };
    let mut arena = ScratchArena::new(4, 3).unwrap();
    let tokens = SlotTokens::new(4).unwrap();
    mesh.run(&mut arena, &tokens, &opts).unwrap();
    assert!(mesh.frac_bmod.iter().all(|&b| b == 7.0));
    assert!(mesh.frac_cv.is_empty());
    assert!(mesh.frac_dpde.iter().any(|&d| d != 0.0));
}

#[test]
fn invalid_cells_are_flagged_not_fatal() {
    let mut mesh = Mesh::new(
        vec![air(), helium()],
        &[
            (1.0, 1.2e-3, 2.5e9, &[0.5, 0.5]),
            (1.0, 1.2e-3, 2.5e9, &[0.0, 0.0]),
            (1.0, 1.2e-3, 2.5e9, &[1.0, 0.0]),
        ],
    );
    mesh.spvol[2] = -1.0;
    mesh.pmax = vec![1e30, 1e30, 1e30];
    let summary = mesh.run_default();
    assert_eq!(mesh.status[0], CellStatus::Converged);
    assert_eq!(mesh.status[1], CellStatus::InvalidInput);
    assert_eq!(mesh.status[2], CellStatus::InvalidInput);
    assert!(mesh.press[1].is_nan() && mesh.temp[2].is_nan());
    assert_eq!(mesh.pmax, vec![1e30, 1e30, 1e30]);
    assert_eq!(summary.invalid, 2);
    assert_eq!(summary.converged, 1);
    assert!(!summary.all_accepted());
}

#[test]
fn pmax_tracks_running_maximum() {
    let mut mesh = gas_mesh();
    mesh.pmax[0] = 1e30;
    let summary = mesh.run_default();
    assert_eq!(mesh.pmax[0], 1e30);
    for i in 1..mesh.ncell() {
        assert_eq!(mesh.pmax[i], mesh.press[i]);
    }
    let pmax = mesh.press.iter().copied().fold(Real::NEG_INFINITY, Real::max);
    assert_eq!(summary.max_pressure, pmax);
}

#[test]
fn preconditions_are_checked_before_the_loop() {
    let mut mesh = gas_mesh();

    let mut arena = ScratchArena::new(4, 2).unwrap();
    let tokens = SlotTokens::new(4).unwrap();
    let err = mesh
        .run(&mut arena, &tokens, &DispatchOptions::default())
        .unwrap_err();
    assert!(matches!(err, MixError::ArenaTooSmall { needed: 3, .. }));

    let mut arena = ScratchArena::new(2, 3).unwrap();
    let err = mesh
        .run(&mut arena, &tokens, &DispatchOptions::default())
        .unwrap_err();
    assert!(matches!(err, MixError::TokenWidth { width: 4, .. }));

    let small = DispatchOptions {
        small_loop: true,
        ..DispatchOptions::default()
    };
    let err = mesh.run(&mut arena, &tokens, &small).unwrap_err();
    assert!(matches!(err, MixError::ArenaTooSmall { what: "slots", .. }));

    // nothing was written
    assert!(mesh.press.iter().all(|&p| p == 0.0));
}

#[test]
fn permuted_subset_matches_full_run() {
    let mut full = gas_mesh();
    full.run_default();

    let mut subset = gas_mesh();
    subset.press.fill(-1.0);
    subset.frac_ie.fill(-1.0);
    subset.cells = vec![4, 1, 5, 2];
    let summary = subset.run_default();
    assert_eq!(summary.cells, 4);

    for i in 0..full.ncell() {
        if subset.cells.contains(&i) {
            assert_eq!(subset.press[i].to_bits(), full.press[i].to_bits(), "cell {i}");
            assert_eq!(subset.temp[i].to_bits(), full.temp[i].to_bits(), "cell {i}");
            assert_eq!(subset.row(&subset.frac_vol, i), full.row(&full.frac_vol, i));
            assert_eq!(subset.row(&subset.frac_ie, i), full.row(&full.frac_ie, i));
            assert_eq!(subset.status[i], full.status[i]);
        } else {
            assert_eq!(subset.press[i], -1.0, "cell {i}");
            assert!(subset.row(&subset.frac_ie, i).iter().all(|&e| e == -1.0));
            assert_eq!(subset.status[i], CellStatus::InvalidInput);
        }
    }

    // small-loop slots follow the loop index, not the cell index
    let mut small = gas_mesh();
    small.cells = vec![5, 0];
    let mut arena = ScratchArena::new(2, 3).unwrap();
    let tokens = SlotTokens::new(1).unwrap();
    let opts = DispatchOptions {
        small_loop: true,
        ..DispatchOptions::default()
    };
    small.run(&mut arena, &tokens, &opts).unwrap();
    assert_eq!(small.press[5].to_bits(), full.press[5].to_bits());
    assert_eq!(small.press[0].to_bits(), full.press[0].to_bits());
}

#[test]
fn exhausted_iteration_budget_is_unconverged() {
    let (a, ra, ea, rw, ew) = (0.99, 1.2e-3, 2.1e9, 1.0, 7.8e9);
    let rho = a * ra + (1.0 - a) * rw;
    let y = [a * ra / rho, (1.0 - a) * rw / rho];
    let mut mesh = Mesh::new(vec![air(), water()], &[(1.0, rho, y[0] * ea + y[1] * ew, y)]);
    mesh.frac_vol.copy_from_slice(&[a, 1.0 - a]);
    mesh.pmax[0] = -1.0;

    let mut opts = DispatchOptions::default();
    opts.params.max_iter_per_material = 1;
    let mut arena = ScratchArena::new(1, 2).unwrap();
    let tokens = SlotTokens::new(1).unwrap();
    let summary = mesh.run(&mut arena, &tokens, &opts).unwrap();

    assert_eq!(mesh.status, vec![CellStatus::Unconverged]);
    assert_eq!(mesh.pmax, vec![-1.0]);
    assert_eq!(summary.unconverged, 1);
    assert_eq!(summary.max_pressure, Real::NEG_INFINITY);
    assert!(!summary.all_accepted());
}

#[test]
fn zero_volume_guess_for_present_material_falls_back() {
    let mut mesh = Mesh::new(vec![air(), helium()], &[(1.0, 1.5e-3, 3.0e9, [0.5, 0.5])]);
    mesh.frac_vol.copy_from_slice(&[1.0, 0.0]);
    let summary = mesh.run_default();

    assert_eq!(mesh.status, vec![CellStatus::Converged]);
    assert_eq!(summary.converged, 1);
    assert!(mesh.press[0].is_finite() && mesh.press[0] > 0.0);
    assert!(mesh.frac_vol.iter().all(|&v| v.is_finite() && v > 0.0 && v < 1.0));
    let vsum: Real = mesh.frac_vol.iter().sum();
    assert!(rel_close(vsum, 1.0, 1e-10));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn random_gas_mixtures_equilibrate(
        y in prop::collection::vec(0.05f64..1.0, 3),
        rho in 1.0e-4f64..1.0e-2,
        sie in 1.0e9f64..1.0e10,
        vguess in prop::collection::vec(0.1f64..1.0, 3),
    ) {
        let mut mesh = Mesh::new(vec![air(), helium(), argon()], &[(1.0, rho, sie, &y)]);
        mesh.frac_vol.copy_from_slice(&vguess);
        let summary = mesh.run_default();
        prop_assert_eq!(mesh.status[0], CellStatus::Converged);
        prop_assert_eq!(summary.converged, 1);
        let vsum: Real = mesh.frac_vol.iter().sum();
        prop_assert!(rel_close(vsum, 1.0, 1e-10));
        let esum: Real = mesh.frac_ie.iter().sum();
        prop_assert!(rel_close(esum, sie, 1e-8));
    }
}
