//! Cell loop: density and internal energy in, pressure and temperature out.
//!
//! The loop runs over `CellInputs::offsets`, the mesh cells to process in loop
//! order. Every cell borrows one arena slot for its whole computation. With token
//! slots the cell holds a [`SlotToken`] from acquire to release; in small-loop mode
//! the loop index is the slot. Per cell:
//!
//! 1. normalise mass fractions and collect the present materials;
//! 2. volume fraction and density guesses;
//! 3. one `p_t_of_r_e` call (one material) or the PTE solve;
//! 4. mix per-material results into cell and fractional outputs;
//! 5. fold the pressure into `pmax`.
//!
//! Output slices are split per cell by the parallel iterator, so cells never share
//! mutable state besides their slot.

use std::sync::PoisonError;

use pte_core::Real;
use pte_eos::{EosModel, MAX_NUM_LAMBDAS};
use rayon::iter::Either;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::arena::{ScratchArena, SlotScratch};
use crate::error::{MixError, MixResult};
use crate::params::{DispatchOptions, PteParams};
use crate::pte::{PteSolverRhoT, PteStatus};
use crate::single::solve_single;
use crate::tokens::{SlotToken, SlotTokens};

/// Outcome of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    /// One material; no equilibrium solve needed.
    Pure,
    Converged,
    /// Last accepted PTE iterate was written.
    Unconverged,
    /// Inputs outside every usable domain; scalar outputs are NaN.
    InvalidInput,
}

impl CellStatus {
    /// Pure and converged cells contribute to `pmax`.
    pub fn accepted(self) -> bool {
        matches!(self, CellStatus::Pure | CellStatus::Converged)
    }
}

/// Material to EOS handle mapping shared by all cells.
#[derive(Clone, Copy, Debug)]
pub struct MaterialMap<'a, E> {
    pub nmat: usize,
    pub eos: &'a [E],
    /// `eos_offsets[m]` is the index into `eos` used by material `m`.
    pub eos_offsets: &'a [usize],
}

impl<'a, E> MaterialMap<'a, E> {
    pub fn new(eos: &'a [E], eos_offsets: &'a [usize]) -> Self {
        Self {
            nmat: eos_offsets.len(),
            eos,
            eos_offsets,
        }
    }
}

/// Per-cell inputs. The mesh arrays have one entry per mesh cell.
#[derive(Clone, Copy, Debug)]
pub struct CellInputs<'a> {
    /// Mesh cells to process, in loop order. Each must be in range and appear at
    /// most once; cells not listed are left untouched.
    pub offsets: &'a [usize],
    pub vol: &'a [Real],
    /// Specific volume, `1 / rho`.
    pub spvol: &'a [Real],
    pub sie: &'a [Real],
}

/// Per-cell outputs, one entry per mesh cell. `pmax` is read and updated.
#[derive(Debug)]
pub struct CellOutputs<'a> {
    pub press: &'a mut [Real],
    pub pmax: &'a mut [Real],
    pub temp: &'a mut [Real],
    pub bmod: &'a mut [Real],
    pub dpde: &'a mut [Real],
    pub cv: &'a mut [Real],
    pub status: &'a mut [CellStatus],
}

/// Row-major `nmesh x nmat` per-material arrays.
///
/// `mass` is read (mass fractions, normalised in place) and `vol` is read as
/// material volumes before being overwritten. `bmod`, `dpde` and `cv` are only
/// touched when the matching `do_frac_*` option is set and may be empty otherwise.
#[derive(Debug)]
pub struct Fractions<'a> {
    pub mass: &'a mut [Real],
    pub vol: &'a mut [Real],
    pub ie: &'a mut [Real],
    pub bmod: &'a mut [Real],
    pub dpde: &'a mut [Real],
    pub cv: &'a mut [Real],
}

/// Totals over one dispatch call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub cells: usize,
    pub pure: usize,
    pub converged: usize,
    pub unconverged: usize,
    pub invalid: usize,
    /// Largest pressure over pure and converged cells; `-inf` when there are none.
    pub max_pressure: Real,
    /// PTE iterations summed over all cells.
    pub iterations: usize,
}

impl DispatchSummary {
    /// Identity of [`DispatchSummary::merge`]: no cells, `max_pressure = -inf`.
    pub fn empty() -> Self {
        Self {
            cells: 0,
            pure: 0,
            converged: 0,
            unconverged: 0,
            invalid: 0,
            max_pressure: Real::NEG_INFINITY,
            iterations: 0,
        }
    }

    fn of_cell(res: &CellResult) -> Self {
        let mut s = Self::empty();
        s.cells = 1;
        s.iterations = res.iterations;
        match res.status {
            CellStatus::Pure => s.pure = 1,
            CellStatus::Converged => s.converged = 1,
            CellStatus::Unconverged => s.unconverged = 1,
            CellStatus::InvalidInput => s.invalid = 1,
        }
        if res.status.accepted() {
            s.max_pressure = res.press;
        }
        s
    }

    fn merge(self, other: Self) -> Self {
        Self {
            cells: self.cells + other.cells,
            pure: self.pure + other.pure,
            converged: self.converged + other.converged,
            unconverged: self.unconverged + other.unconverged,
            invalid: self.invalid + other.invalid,
            max_pressure: self.max_pressure.max(other.max_pressure),
            iterations: self.iterations + other.iterations,
        }
    }

    /// True when every cell is pure or converged.
    pub fn all_accepted(&self) -> bool {
        self.pure + self.converged == self.cells
    }
}

/// One cell's fractional rows.
struct FracRow<'r> {
    mass: &'r mut [Real],
    vol: &'r mut [Real],
    ie: &'r mut [Real],
    bmod: Option<&'r mut [Real]>,
    dpde: Option<&'r mut [Real]>,
    cv: Option<&'r mut [Real]>,
}

/// Every output element owned by one mesh cell.
struct CellSlots<'r> {
    press: &'r mut Real,
    pmax: &'r mut Real,
    temp: &'r mut Real,
    bmod: &'r mut Real,
    dpde: &'r mut Real,
    cv: &'r mut Real,
    status: &'r mut CellStatus,
    row: FracRow<'r>,
}

struct CellResult {
    status: CellStatus,
    press: Real,
    temp: Real,
    bmod: Real,
    dpde: Real,
    cv: Real,
    iterations: usize,
}

impl CellResult {
    fn invalid() -> Self {
        Self {
            status: CellStatus::InvalidInput,
            press: Real::NAN,
            temp: Real::NAN,
            bmod: Real::NAN,
            dpde: Real::NAN,
            cv: Real::NAN,
            iterations: 0,
        }
    }
}

fn check_len(what: &'static str, expected: usize, got: usize) -> MixResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(MixError::LengthMismatch {
            what,
            expected,
            got,
        })
    }
}

fn check_shapes<E>(
    materials: &MaterialMap<'_, E>,
    inputs: &CellInputs<'_>,
    outputs: &CellOutputs<'_>,
    fractions: &Fractions<'_>,
    options: &DispatchOptions,
) -> MixResult<usize> {
    let nmat = materials.nmat;
    if nmat == 0 {
        return Err(MixError::Config {
            what: "at least one material is required".to_string(),
        });
    }
    check_len("eos_offsets", nmat, materials.eos_offsets.len())?;
    for (material, &index) in materials.eos_offsets.iter().enumerate() {
        if index >= materials.eos.len() {
            return Err(MixError::MaterialIndex {
                material,
                index,
                count: materials.eos.len(),
            });
        }
    }

    let nmesh = inputs.vol.len();
    check_len("spvol", nmesh, inputs.spvol.len())?;
    check_len("sie", nmesh, inputs.sie.len())?;
    for (what, len) in [
        ("press", outputs.press.len()),
        ("pmax", outputs.pmax.len()),
        ("temp", outputs.temp.len()),
        ("bmod", outputs.bmod.len()),
        ("dpde", outputs.dpde.len()),
        ("cv", outputs.cv.len()),
        ("status", outputs.status.len()),
    ] {
        check_len(what, nmesh, len)?;
    }

    let nfrac = nmesh * nmat;
    check_len("frac_mass", nfrac, fractions.mass.len())?;
    check_len("frac_vol", nfrac, fractions.vol.len())?;
    check_len("frac_ie", nfrac, fractions.ie.len())?;
    if options.do_frac_bmod {
        check_len("frac_bmod", nfrac, fractions.bmod.len())?;
    }
    if options.do_frac_dpde {
        check_len("frac_dpde", nfrac, fractions.dpde.len())?;
    }
    if options.do_frac_cv {
        check_len("frac_cv", nfrac, fractions.cv.len())?;
    }

    let mut seen = vec![false; nmesh];
    for (iloop, &cell) in inputs.offsets.iter().enumerate() {
        match seen.get_mut(cell) {
            None => {
                return Err(MixError::CellOffset {
                    iloop,
                    cell,
                    ncell: nmesh,
                });
            }
            Some(true) => return Err(MixError::DuplicateCell { iloop, cell }),
            Some(flag) => *flag = true,
        }
    }
    Ok(inputs.offsets.len())
}

/// Rows of an optional fractional array, or `None` per cell when disabled.
fn optional_rows<'r>(
    enabled: bool,
    data: &'r mut [Real],
    nmat: usize,
    nmesh: usize,
) -> impl IndexedParallelIterator<Item = Option<&'r mut [Real]>> + 'r {
    if enabled {
        Either::Left(data.par_chunks_mut(nmat).map(Some))
    } else {
        Either::Right((0..nmesh).into_par_iter().map(|_| None))
    }
}

/// Computes pressure, temperature, bulk modulus, `dP/de`, `cv` and per-material
/// fractions from `(rho, e)` for every mesh cell listed in `inputs.offsets`.
///
/// Precondition violations are returned before any cell is touched. Per-cell
/// failures are reported in `outputs.status` and counted in the summary.
pub fn get_eos_rho_e<E: EosModel>(
    materials: MaterialMap<'_, E>,
    inputs: CellInputs<'_>,
    outputs: CellOutputs<'_>,
    fractions: Fractions<'_>,
    arena: &mut ScratchArena,
    tokens: &SlotTokens,
    options: &DispatchOptions,
) -> MixResult<DispatchSummary> {
    let ncell = check_shapes(&materials, &inputs, &outputs, &fractions, options)?;
    options.params.validate()?;

    match options.threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| MixError::ThreadPool {
                    what: e.to_string(),
                })?;
            pool.install(|| run(ncell, materials, inputs, outputs, fractions, arena, tokens, options))
        }
        None => run(ncell, materials, inputs, outputs, fractions, arena, tokens, options),
    }
}

#[allow(clippy::too_many_arguments)]
fn run<E: EosModel>(
    ncell: usize,
    materials: MaterialMap<'_, E>,
    inputs: CellInputs<'_>,
    outputs: CellOutputs<'_>,
    fractions: Fractions<'_>,
    arena: &mut ScratchArena,
    tokens: &SlotTokens,
    options: &DispatchOptions,
) -> MixResult<DispatchSummary> {
    let nmat = materials.nmat;
    let offsets = inputs.offsets;
    let max_npte = offsets
        .par_iter()
        .map(|&c| {
            fractions.mass[c * nmat..(c + 1) * nmat]
                .iter()
                .filter(|&&y| y > 0.0)
                .count()
        })
        .max()
        .unwrap_or(0);

    if options.small_loop {
        arena.check_capacity(max_npte, ncell)?;
    } else {
        arena.check_capacity(max_npte, 1)?;
        if tokens.width() > arena.slots() {
            return Err(MixError::TokenWidth {
                width: tokens.width(),
                what: "exceeds the number of arena slots",
            });
        }
    }

    let CellInputs {
        vol, spvol, sie, ..
    } = inputs;
    let nmesh = vol.len();
    debug!(
        ncell,
        nmesh,
        nmat,
        max_npte,
        slots = arena.slots(),
        small_loop = options.small_loop,
        threads = rayon::current_num_threads(),
        "dispatching PTE cells"
    );

    let views = arena.slot_views();
    let params = &options.params;

    let CellOutputs {
        press,
        pmax,
        temp,
        bmod,
        dpde,
        cv,
        status,
    } = outputs;
    let Fractions {
        mass: frac_mass,
        vol: frac_vol,
        ie: frac_ie,
        bmod: frac_bmod,
        dpde: frac_dpde,
        cv: frac_cv,
    } = fractions;

    let outs = (press, pmax, temp, bmod, dpde, cv, status).into_par_iter();
    let rows = (
        frac_mass.par_chunks_mut(nmat),
        frac_vol.par_chunks_mut(nmat),
        frac_ie.par_chunks_mut(nmat),
        optional_rows(options.do_frac_bmod, frac_bmod, nmat, nmesh),
        optional_rows(options.do_frac_dpde, frac_dpde, nmat, nmesh),
        optional_rows(options.do_frac_cv, frac_cv, nmat, nmesh),
    )
        .into_par_iter();
    let mut mesh: Vec<Option<CellSlots<'_>>> = (outs, rows)
        .into_par_iter()
        .map(|(out, row)| {
            let (press, pmax, temp, bmod, dpde, cv, status) = out;
            let (mass, vol, ie, bmod_row, dpde_row, cv_row) = row;
            Some(CellSlots {
                press,
                pmax,
                temp,
                bmod,
                dpde,
                cv,
                status,
                row: FracRow {
                    mass,
                    vol,
                    ie,
                    bmod: bmod_row,
                    dpde: dpde_row,
                    cv: cv_row,
                },
            })
        })
        .collect();
    // offsets are in range and distinct, so every take succeeds
    let work: Vec<(usize, CellSlots<'_>)> = offsets
        .iter()
        .filter_map(|&c| mesh.get_mut(c).and_then(Option::take).map(|s| (c, s)))
        .collect();

    let summary = work
        .into_par_iter()
        .enumerate()
        .map(|(iloop, (c, cell))| {
            let token: Option<SlotToken<'_>> = if options.small_loop {
                None
            } else {
                Some(tokens.acquire())
            };
            let slot = token.as_ref().map_or(iloop, SlotToken::id);
            let res = {
                let mut scratch = views[slot]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                process_cell(
                    &mut scratch,
                    &materials,
                    (vol[c], spvol[c], sie[c]),
                    cell.row,
                    params,
                )
            };
            drop(token);

            *cell.press = res.press;
            *cell.temp = res.temp;
            *cell.bmod = res.bmod;
            *cell.dpde = res.dpde;
            *cell.cv = res.cv;
            *cell.status = res.status;
            if res.status.accepted() {
                *cell.pmax = cell.pmax.max(res.press);
            }
            DispatchSummary::of_cell(&res)
        })
        .reduce(DispatchSummary::empty, DispatchSummary::merge);

    if summary.unconverged > 0 || summary.invalid > 0 {
        warn!(
            unconverged = summary.unconverged,
            invalid = summary.invalid,
            cells = summary.cells,
            "some cells did not reach equilibrium"
        );
    }
    debug!(
        pure = summary.pure,
        converged = summary.converged,
        iterations = summary.iterations,
        max_pressure = summary.max_pressure,
        "PTE dispatch finished"
    );
    Ok(summary)
}

fn process_cell<E: EosModel>(
    slot: &mut SlotScratch<'_>,
    materials: &MaterialMap<'_, E>,
    (vol, spvol, sie): (Real, Real, Real),
    row: FracRow<'_>,
    params: &PteParams,
) -> CellResult {
    let FracRow {
        mass,
        vol: frac_vol,
        ie: frac_ie,
        mut bmod,
        mut dpde,
        mut cv,
    } = row;

    if !(vol.is_finite() && vol > 0.0 && spvol.is_finite() && spvol > 0.0 && sie.is_finite()) {
        return CellResult::invalid();
    }
    let npte = mass.iter().filter(|&&y| y > 0.0).count();
    let msum: Real = mass.iter().filter(|&&y| y > 0.0).sum();
    if npte == 0 || !msum.is_finite() {
        return CellResult::invalid();
    }
    let Ok(mut regions) = slot.split(npte) else {
        return CellResult::invalid();
    };
    regions.cache.fill(0.0);

    let rho_cell = 1.0 / spvol;
    let mut k = 0;
    for (m, y) in mass.iter_mut().enumerate() {
        if *y > 0.0 {
            *y /= msum;
            regions.mats[k] = m;
            regions.eos_idx[k] = materials.eos_offsets[m];
            regions.vfrac[k] = frac_vol[m] / vol;
            k += 1;
        } else {
            *y = 0.0;
        }
    }
    if regions.vfrac.iter().any(|&a| !(a.is_finite() && a > 0.0)) {
        for k in 0..npte {
            regions.vfrac[k] = mass[regions.mats[k]];
        }
    }
    for k in 0..npte {
        regions.rho[k] = rho_cell * mass[regions.mats[k]] / regions.vfrac[k];
    }

    let (status, iterations) = if npte == 1 {
        let eos = &materials.eos[regions.eos_idx[0]];
        match solve_single(eos, rho_cell, sie, &mut regions.cache[..MAX_NUM_LAMBDAS]) {
            Ok(pt) => {
                regions.vfrac[0] = 1.0;
                regions.rho[0] = rho_cell;
                regions.sie[0] = sie;
                regions.temp[0] = pt.temp;
                regions.press[0] = pt.press;
                (CellStatus::Pure, 0)
            }
            Err(_) => return CellResult::invalid(),
        }
    } else {
        let out = PteSolverRhoT::new(materials.eos, &mut regions, sie, params).solve();
        match out.status {
            PteStatus::Converged => (CellStatus::Converged, out.iterations),
            PteStatus::Unconverged => (CellStatus::Unconverged, out.iterations),
            PteStatus::NoValidStart => return CellResult::invalid(),
        }
    };

    frac_vol.fill(0.0);
    frac_ie.fill(0.0);
    for arr in [bmod.as_deref_mut(), dpde.as_deref_mut(), cv.as_deref_mut()]
        .into_iter()
        .flatten()
    {
        arr.fill(0.0);
    }

    let mut res = CellResult {
        status,
        press: 0.0,
        temp: 0.0,
        bmod: 0.0,
        dpde: 0.0,
        cv: 0.0,
        iterations,
    };
    for k in 0..npte {
        let m = regions.mats[k];
        let (a, y) = (regions.vfrac[k], mass[m]);
        let (r, e) = (regions.rho[k], regions.sie[k]);
        let eos = &materials.eos[regions.eos_idx[k]];
        let l = &mut regions.cache[k * MAX_NUM_LAMBDAS..(k + 1) * MAX_NUM_LAMBDAS];
        let dpde_m = eos.p_t_of_r_e(r, e, l).dpde;
        let bmod_m = eos.bulk_modulus_from_density_internal_energy(r, e, l);
        let cv_m = eos.specific_heat_from_density_internal_energy(r, e, l);

        res.press += a * regions.press[k];
        res.temp += a * regions.temp[k];
        res.bmod += a * bmod_m;
        res.dpde += a * dpde_m;
        res.cv += y * cv_m;

        frac_vol[m] = a * vol;
        frac_ie[m] = y * e;
        if let Some(b) = bmod.as_deref_mut() {
            b[m] = a * bmod_m;
        }
        if let Some(d) = dpde.as_deref_mut() {
            d[m] = a * dpde_m;
        }
        if let Some(c) = cv.as_deref_mut() {
            c[m] = y * cv_m;
        }
    }
    res
}
