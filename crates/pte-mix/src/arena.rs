//! Preallocated per-slot scratch for the dispatch loop.
//!
//! One flat buffer of reals and one of indices, both split into `W` equal rows. A
//! row belongs to whichever cell currently holds the matching slot token. Within a
//! row the reals are laid out as
//!
//! ```text
//! [press M][vfrac M][rho M][sie M][temp M][solver scratch(npte) | cache npte*L | unused]
//! ```
//!
//! where `M` is the worst-case materials per cell and the per-material cache starts
//! right after `solver_scratch_len(npte)`, so its position moves with the cell's
//! material count. Nothing is allocated once [`ScratchArena::slot_views`] has
//! returned.

use std::sync::Mutex;

use pte_core::Real;
use pte_eos::MAX_NUM_LAMBDAS;

use crate::error::{MixError, MixResult};

/// Solver-private reals for a cell with `npte` materials: Jacobian `neq^2`, four
/// `neq` vectors and two `npte` vectors, with `neq = npte + 1`.
pub const fn solver_scratch_len(npte: usize) -> usize {
    let neq = npte + 1;
    neq * (neq + 4) + 2 * npte
}

/// Sizes of one arena row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotLayout {
    pub max_materials: usize,
}

impl SlotLayout {
    pub const STATE_ARRAYS: usize = 5;

    pub fn new(max_materials: usize) -> Self {
        Self { max_materials }
    }

    /// Solver scratch plus per-material cache at the worst case.
    pub fn work_len(&self) -> usize {
        solver_scratch_len(self.max_materials) + self.max_materials * MAX_NUM_LAMBDAS
    }

    pub fn reals_per_slot(&self) -> usize {
        Self::STATE_ARRAYS * self.max_materials + self.work_len()
    }

    /// Material ids and EOS ids.
    pub fn indices_per_slot(&self) -> usize {
        2 * self.max_materials
    }

    /// Offset of the cache region inside a row, for a cell with `npte` materials.
    pub fn cache_offset(&self, npte: usize) -> usize {
        Self::STATE_ARRAYS * self.max_materials + solver_scratch_len(npte)
    }
}

/// The whole preallocated buffer.
#[derive(Debug)]
pub struct ScratchArena {
    layout: SlotLayout,
    slots: usize,
    reals: Vec<Real>,
    indices: Vec<usize>,
}

impl ScratchArena {
    pub fn new(slots: usize, max_materials: usize) -> MixResult<Self> {
        if slots == 0 {
            return Err(MixError::Config {
                what: "arena needs at least one slot".to_string(),
            });
        }
        if max_materials == 0 {
            return Err(MixError::Config {
                what: "arena needs room for at least one material".to_string(),
            });
        }
        let layout = SlotLayout::new(max_materials);
        Ok(Self {
            layout,
            slots,
            reals: vec![0.0; slots * layout.reals_per_slot()],
            indices: vec![0; slots * layout.indices_per_slot()],
        })
    }

    /// Arena sized for the current rayon pool.
    pub fn for_current_pool(max_materials: usize) -> MixResult<Self> {
        Self::new(rayon::current_num_threads(), max_materials)
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn layout(&self) -> SlotLayout {
        self.layout
    }

    /// Base offset of `slot` in the real buffer.
    pub fn slot_offset(&self, slot: usize) -> usize {
        slot * self.layout.reals_per_slot()
    }

    /// Precondition check: every cell needs at most `max_npte` materials and at
    /// least `min_slots` rows are required.
    pub fn check_capacity(&self, max_npte: usize, min_slots: usize) -> MixResult<()> {
        if max_npte > self.layout.max_materials {
            return Err(MixError::ArenaTooSmall {
                what: "materials per slot",
                needed: max_npte,
                available: self.layout.max_materials,
            });
        }
        if min_slots > self.slots {
            return Err(MixError::ArenaTooSmall {
                what: "slots",
                needed: min_slots,
                available: self.slots,
            });
        }
        Ok(())
    }

    /// Splits the arena into one independently lockable view per slot.
    ///
    /// The lock is never contended when slots come from a token pool; it turns a
    /// token bookkeeping bug into serialisation instead of aliasing.
    pub fn slot_views(&mut self) -> Vec<Mutex<SlotScratch<'_>>> {
        let max_materials = self.layout.max_materials;
        self.reals
            .chunks_exact_mut(self.layout.reals_per_slot())
            .zip(self.indices.chunks_exact_mut(self.layout.indices_per_slot()))
            .map(|(reals, indices)| {
                Mutex::new(SlotScratch {
                    reals,
                    indices,
                    max_materials,
                })
            })
            .collect()
    }
}

/// One arena row.
#[derive(Debug)]
pub struct SlotScratch<'a> {
    reals: &'a mut [Real],
    indices: &'a mut [usize],
    max_materials: usize,
}

/// Named regions of a row for a cell with `npte` materials.
#[derive(Debug)]
pub struct SlotRegions<'a> {
    /// Column of each present material in the cell's fractional row.
    pub mats: &'a mut [usize],
    /// EOS handle index of each present material.
    pub eos_idx: &'a mut [usize],
    pub press: &'a mut [Real],
    pub vfrac: &'a mut [Real],
    pub rho: &'a mut [Real],
    pub sie: &'a mut [Real],
    pub temp: &'a mut [Real],
    pub solver: &'a mut [Real],
    /// `MAX_NUM_LAMBDAS` reals per material.
    pub cache: &'a mut [Real],
}

impl<'a> SlotScratch<'a> {
    pub fn max_materials(&self) -> usize {
        self.max_materials
    }

    pub fn split(&mut self, npte: usize) -> MixResult<SlotRegions<'_>> {
        let m = self.max_materials;
        if npte > m {
            return Err(MixError::ArenaTooSmall {
                what: "materials per slot",
                needed: npte,
                available: m,
            });
        }
        let (mats, eos_idx) = self.indices.split_at_mut(m);
        let (press, rest) = self.reals.split_at_mut(m);
        let (vfrac, rest) = rest.split_at_mut(m);
        let (rho, rest) = rest.split_at_mut(m);
        let (sie, rest) = rest.split_at_mut(m);
        let (temp, work) = rest.split_at_mut(m);
        let (solver, rest) = work.split_at_mut(solver_scratch_len(npte));
        let cache = &mut rest[..npte * MAX_NUM_LAMBDAS];
        Ok(SlotRegions {
            mats: &mut mats[..npte],
            eos_idx: &mut eos_idx[..npte],
            press: &mut press[..npte],
            vfrac: &mut vfrac[..npte],
            rho: &mut rho[..npte],
            sie: &mut sie[..npte],
            temp: &mut temp[..npte],
            solver,
            cache,
        })
    }
}
