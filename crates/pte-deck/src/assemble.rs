//! Turns a validated deck into EOS handles and flat cell arrays.

use pte_core::Real;
use pte_eos::{
    Eos, Gruneisen, GruneisenParams, IdealGas, Jwl, JwlParams, Modifier, NobleAbel, StiffGas,
};
use pte_mix::{
    CellInputs, CellOutputs, CellStatus, DispatchOptions, DispatchSummary, Fractions,
    MaterialMap, ScratchArena, SlotTokens, get_eos_rho_e,
};
use serde::Serialize;
use tracing::debug;

use crate::DeckResult;
use crate::schema::{Deck, EosDef};

/// Builds the handle for an EOS tree. Wrapping goes through `Eos::modify`, so
/// compositions outside the closed set are rejected.
pub fn build_eos(def: &EosDef) -> DeckResult<Eos> {
    let eos = match *def {
        EosDef::IdealGas { gm1, cv } => Eos::from(IdealGas::new(gm1, cv)?),
        EosDef::Gruneisen {
            c0,
            s1,
            s2,
            s3,
            g0,
            b,
            rho0,
            t0,
            p0,
            cv,
        } => Eos::from(Gruneisen::new(GruneisenParams {
            c0,
            s1,
            s2,
            s3,
            g0,
            b,
            rho0,
            t0,
            p0,
            cv,
        })?),
        EosDef::Jwl {
            a,
            b,
            r1,
            r2,
            w,
            rho0,
            cv,
        } => Eos::from(Jwl::new(JwlParams {
            a,
            b,
            r1,
            r2,
            w,
            rho0,
            cv,
        })?),
        EosDef::StiffGas { gm1, cv, pinf, qq } => Eos::from(StiffGas::new(gm1, cv, pinf, qq)?),
        EosDef::NobleAbel { gm1, cv, bb, qq } => Eos::from(NobleAbel::new(gm1, cv, bb, qq)?),
        EosDef::Scaled { scale, ref inner } => build_eos(inner)?.modify(Modifier::Scaled { scale })?,
        EosDef::Shifted { shift, ref inner } => build_eos(inner)?.modify(Modifier::Shifted { shift })?,
        EosDef::UnitSystem { factors, ref inner } => {
            build_eos(inner)?.modify(Modifier::UnitSystem(factors))?
        }
        EosDef::Relativistic { cl, ref inner } => {
            build_eos(inner)?.modify(Modifier::Relativistic { cl })?
        }
        EosDef::BilinearRamp {
            r0,
            a,
            b,
            c,
            ref inner,
        } => build_eos(inner)?.modify(Modifier::BilinearRamp { r0, a, b, c })?,
    };
    Ok(eos)
}

/// Flat, row-major inputs for the cell loop.
#[derive(Debug, Clone)]
pub struct Problem {
    pub material_ids: Vec<String>,
    pub eos: Vec<Eos>,
    pub eos_offsets: Vec<usize>,
    /// Cells handed to the loop, in loop order; every cell by default.
    pub offsets: Vec<usize>,
    pub vol: Vec<Real>,
    pub spvol: Vec<Real>,
    pub sie: Vec<Real>,
    pub frac_mass: Vec<Real>,
    pub frac_vol: Vec<Real>,
    pub options: DispatchOptions,
    pub slots: Option<usize>,
}

impl Problem {
    pub fn from_deck(deck: &Deck) -> DeckResult<Self> {
        let nmat = deck.materials.len();
        let ncell = deck.cells.len();
        let eos = deck
            .materials
            .iter()
            .map(|m| build_eos(&m.eos))
            .collect::<DeckResult<Vec<_>>>()?;

        let mut p = Self {
            material_ids: deck.materials.iter().map(|m| m.id.clone()).collect(),
            eos,
            eos_offsets: (0..nmat).collect(),
            offsets: (0..ncell).collect(),
            vol: Vec::with_capacity(ncell),
            spvol: Vec::with_capacity(ncell),
            sie: Vec::with_capacity(ncell),
            frac_mass: vec![0.0; ncell * nmat],
            frac_vol: vec![0.0; ncell * nmat],
            options: deck.dispatch_options(),
            slots: deck.options.slots,
        };

        for (i, cell) in deck.cells.iter().enumerate() {
            p.vol.push(cell.volume);
            p.spvol.push(1.0 / cell.density);
            p.sie.push(cell.sie);
            let row = i * nmat;
            for (m, id) in p.material_ids.iter().enumerate() {
                p.frac_mass[row + m] = cell.mass_fractions.get(id).copied().unwrap_or(0.0);
            }
            let vfrac = cell.volume_fractions.as_ref().unwrap_or(&cell.mass_fractions);
            let vsum: Real = vfrac.values().sum();
            for (m, id) in p.material_ids.iter().enumerate() {
                let f = vfrac.get(id).copied().unwrap_or(0.0);
                p.frac_vol[row + m] = if vsum > 0.0 {
                    f / vsum * cell.volume
                } else {
                    0.0
                };
            }
        }
        debug!(
            ncell,
            nmat,
            variants = ?p.eos.iter().map(Eos::variant_name).collect::<Vec<_>>(),
            "deck assembled"
        );
        Ok(p)
    }

    pub fn ncell(&self) -> usize {
        self.vol.len()
    }

    pub fn nmat(&self) -> usize {
        self.material_ids.len()
    }

    /// Runs the cell loop on copies of the deck arrays.
    pub fn equilibrate(&self) -> DeckResult<Solution> {
        let (ncell, nmat) = (self.ncell(), self.nmat());
        let slots = self
            .slots
            .or(self.options.threads)
            .unwrap_or_else(rayon::current_num_threads);
        let slots = if self.options.small_loop {
            slots.max(self.offsets.len())
        } else {
            slots
        };
        let mut arena = ScratchArena::new(slots.max(1), nmat)?;
        let tokens = SlotTokens::new(slots.max(1))?;

        let mut s = Solution::zeroed(ncell, nmat);
        s.frac_mass.copy_from_slice(&self.frac_mass);
        s.frac_vol.copy_from_slice(&self.frac_vol);
        s.summary = get_eos_rho_e(
            MaterialMap::new(&self.eos, &self.eos_offsets),
            CellInputs {
                offsets: &self.offsets,
                vol: &self.vol,
                spvol: &self.spvol,
                sie: &self.sie,
            },
            CellOutputs {
                press: &mut s.press,
                pmax: &mut s.pmax,
                temp: &mut s.temp,
                bmod: &mut s.bmod,
                dpde: &mut s.dpde,
                cv: &mut s.cv,
                status: &mut s.status,
            },
            Fractions {
                mass: &mut s.frac_mass,
                vol: &mut s.frac_vol,
                ie: &mut s.frac_ie,
                bmod: &mut s.frac_bmod,
                dpde: &mut s.frac_dpde,
                cv: &mut s.frac_cv,
            },
            &mut arena,
            &tokens,
            &self.options,
        )?;
        Ok(s)
    }
}

/// Outputs of one `equilibrate` call, row-major like the inputs.
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub summary: DispatchSummary,
    pub press: Vec<Real>,
    pub pmax: Vec<Real>,
    pub temp: Vec<Real>,
    pub bmod: Vec<Real>,
    pub dpde: Vec<Real>,
    pub cv: Vec<Real>,
    pub status: Vec<CellStatus>,
    pub frac_mass: Vec<Real>,
    pub frac_vol: Vec<Real>,
    pub frac_ie: Vec<Real>,
    pub frac_bmod: Vec<Real>,
    pub frac_dpde: Vec<Real>,
    pub frac_cv: Vec<Real>,
}

impl Solution {
    fn zeroed(ncell: usize, nmat: usize) -> Self {
        let n = ncell * nmat;
        Self {
            summary: DispatchSummary::empty(),
            press: vec![0.0; ncell],
            pmax: vec![0.0; ncell],
            temp: vec![0.0; ncell],
            bmod: vec![0.0; ncell],
            dpde: vec![0.0; ncell],
            cv: vec![0.0; ncell],
            status: vec![CellStatus::InvalidInput; ncell],
            frac_mass: vec![0.0; n],
            frac_vol: vec![0.0; n],
            frac_ie: vec![0.0; n],
            frac_bmod: vec![0.0; n],
            frac_dpde: vec![0.0; n],
            frac_cv: vec![0.0; n],
        }
    }
}
