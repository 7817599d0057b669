//! Solver tolerances and dispatch switches.

use pte_core::Real;
use serde::{Deserialize, Serialize};

use crate::error::{MixError, MixResult};

/// Tunables of the PTE Newton iteration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PteParams {
    /// Relative perturbation for the finite-difference Jacobian.
    pub derivative_eps: Real,
    /// Pressure spread allowed at convergence, relative to `sum(alpha |P|)`.
    pub rel_tolerance_p: Real,
    pub abs_tolerance_p: Real,
    /// Scaled energy residual allowed at convergence.
    pub rel_tolerance_e: Real,
    /// `|sum(alpha) - 1|` allowed at convergence.
    pub rel_tolerance_v: Real,
    /// Any iterate whose scaled residual max-norm is below this is accepted.
    pub residual_tolerance: Real,
    /// Iteration cap per material in the cell.
    pub max_iter_per_material: usize,
    /// Armijo sufficient-decrease factor.
    pub line_search_alpha: Real,
    pub line_search_max_iter: usize,
    /// Step reduction per backtrack.
    pub line_search_fac: Real,
    /// Largest fraction of a volume fraction or temperature a step may remove.
    pub vfrac_safety_fac: Real,
    /// Temperature guess when no material gives a usable one.
    pub default_tguess: Real,
}

impl Default for PteParams {
    fn default() -> Self {
        Self {
            derivative_eps: 3.0e-8,
            rel_tolerance_p: 1.0e-8,
            abs_tolerance_p: 0.0,
            rel_tolerance_e: 1.0e-10,
            rel_tolerance_v: 1.0e-12,
            residual_tolerance: 1.0e-14,
            max_iter_per_material: 128,
            line_search_alpha: 1.0e-2,
            line_search_max_iter: 6,
            line_search_fac: 0.5,
            vfrac_safety_fac: 0.95,
            default_tguess: 300.0,
        }
    }
}

impl PteParams {
    pub fn validate(&self) -> MixResult<()> {
        let positive = [
            ("derivative_eps", self.derivative_eps),
            ("rel_tolerance_p", self.rel_tolerance_p),
            ("rel_tolerance_e", self.rel_tolerance_e),
            ("rel_tolerance_v", self.rel_tolerance_v),
            ("default_tguess", self.default_tguess),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(MixError::Config {
                    what: format!("{name} must be positive, got {v}"),
                });
            }
        }
        let unit = [
            ("line_search_fac", self.line_search_fac),
            ("vfrac_safety_fac", self.vfrac_safety_fac),
            ("line_search_alpha", self.line_search_alpha),
        ];
        for (name, v) in unit {
            if !(v > 0.0 && v < 1.0) {
                return Err(MixError::Config {
                    what: format!("{name} must lie in (0, 1), got {v}"),
                });
            }
        }
        if self.abs_tolerance_p < 0.0 || self.residual_tolerance < 0.0 {
            return Err(MixError::Config {
                what: "absolute tolerances must be non-negative".to_string(),
            });
        }
        if self.max_iter_per_material == 0 {
            return Err(MixError::Config {
                what: "max_iter_per_material must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Iteration budget for a cell with `npte` materials.
    pub fn max_iterations(&self, npte: usize) -> usize {
        self.max_iter_per_material * npte.max(1)
    }
}

/// Switches of one dispatch call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    /// Use the cell index as slot id instead of acquiring tokens.
    pub small_loop: bool,
    pub do_frac_bmod: bool,
    pub do_frac_dpde: bool,
    pub do_frac_cv: bool,
    /// Run on a dedicated pool with this many threads; `None` uses the global pool.
    pub threads: Option<usize>,
    pub params: PteParams,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            small_loop: false,
            do_frac_bmod: true,
            do_frac_dpde: true,
            do_frac_cv: true,
            threads: None,
            params: PteParams::default(),
        }
    }
}
