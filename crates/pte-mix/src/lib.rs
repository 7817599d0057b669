//! pte-mix: mixed-cell closure by pressure-temperature equilibrium.
//!
//! Provides:
//! - `ScratchArena` and `SlotTokens`, the preallocated per-slot workspace and the
//!   ids that hand it out to concurrently running cells
//! - `PteSolverRhoT`, the equilibrium solve for one cell
//! - `get_eos_rho_e`, the parallel loop over cells

pub mod arena;
pub mod dispatch;
pub mod error;
pub mod linalg;
pub mod params;
pub mod pte;
pub mod single;
pub mod tokens;

pub use arena::{ScratchArena, SlotLayout, SlotRegions, SlotScratch, solver_scratch_len};
pub use dispatch::{
    CellInputs, CellOutputs, CellStatus, DispatchSummary, Fractions, MaterialMap, get_eos_rho_e,
};
pub use error::{MixError, MixResult};
pub use params::{DispatchOptions, PteParams};
pub use pte::{PteOutcome, PteSolverRhoT, PteStatus};
pub use single::solve_single;
pub use tokens::{SlotToken, SlotTokens};
