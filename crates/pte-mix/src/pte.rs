//! Pressure-temperature equilibrium in volume fractions and temperature.
//!
//! Unknowns are `alpha_m` for each present material and one shared `T`. The scaled
//! residual vector is
//!
//! ```text
//! F[0]     = sum(alpha) - 1
//! F[1]     = (sum(rhobar_m e_m(rho_m, T)) - rho e_cell) / uscale
//! F[2 + k] = (P_k - P_{k+1}) / pscale
//! ```
//!
//! with `rho_m = rhobar_m / alpha_m`. Each Newton step solves a finite-difference
//! Jacobian in the slot's solver scratch, limits the step so no fraction or the
//! temperature collapses, then backtracks until the squared residual drops.

use nalgebra::DMatrixViewMut;
use pte_core::Real;
use pte_eos::{EosModel, MAX_NUM_LAMBDAS};
use tracing::trace;

use crate::arena::SlotRegions;
use crate::linalg::solve_in_place;
use crate::params::PteParams;

/// How a solve ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PteStatus {
    Converged,
    /// Iteration budget exhausted, singular Jacobian, or no admissible step.
    Unconverged,
    /// Neither the temperature guess nor `default_tguess` gave a valid state.
    NoValidStart,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PteOutcome {
    pub status: PteStatus,
    pub iterations: usize,
    /// Max-norm of the scaled residual at the last accepted iterate.
    pub residual: Real,
}

impl PteOutcome {
    pub fn converged(&self) -> bool {
        self.status == PteStatus::Converged
    }
}

/// Column-major index into an `n x n` matrix.
#[inline]
fn at(n: usize, row: usize, col: usize) -> usize {
    col * n + row
}

fn usable_scale(s: Real) -> Real {
    if s.is_finite() && s > 0.0 {
        s
    } else {
        1.0
    }
}

/// Solver over one slot's regions.
///
/// On entry `rho` and `vfrac` hold the initial per-material densities and volume
/// fraction guesses and `eos_idx` the material's EOS handle. On exit the state arrays
/// hold the last accepted iterate, every `temp[m]` set to the common temperature.
pub struct PteSolverRhoT<'s, E> {
    eos: &'s [E],
    eos_idx: &'s [usize],
    params: &'s PteParams,
    npte: usize,
    sie_tot: Real,
    utot: Real,

    vfrac: &'s mut [Real],
    rho: &'s mut [Real],
    sie: &'s mut [Real],
    temp: &'s mut [Real],
    press: &'s mut [Real],
    cache: &'s mut [Real],

    jac: &'s mut [Real],
    residual: &'s mut [Real],
    dx: &'s mut [Real],
    x_old: &'s mut [Real],
    dpdt: &'s mut [Real],
    rhobar: &'s mut [Real],
    u: &'s mut [Real],

    t: Real,
    tnorm: Real,
    uscale: Real,
    pscale: Real,
}

impl<'s, E: EosModel> PteSolverRhoT<'s, E> {
    pub fn new(
        eos: &'s [E],
        regions: &'s mut SlotRegions<'_>,
        sie_tot: Real,
        params: &'s PteParams,
    ) -> Self {
        let npte = regions.vfrac.len();
        let neq = npte + 1;
        let solver: &'s mut [Real] = &mut *regions.solver;
        let (jac, rest) = solver.split_at_mut(neq * neq);
        let (residual, rest) = rest.split_at_mut(neq);
        let (dx, rest) = rest.split_at_mut(neq);
        let (x_old, rest) = rest.split_at_mut(neq);
        let (dpdt, rest) = rest.split_at_mut(neq);
        let (rhobar, u) = rest.split_at_mut(npte);

        Self {
            eos,
            eos_idx: &*regions.eos_idx,
            params,
            npte,
            sie_tot,
            utot: 0.0,
            vfrac: &mut *regions.vfrac,
            rho: &mut *regions.rho,
            sie: &mut *regions.sie,
            temp: &mut *regions.temp,
            press: &mut *regions.press,
            cache: &mut *regions.cache,
            jac,
            residual,
            dx,
            x_old,
            dpdt,
            rhobar,
            u: &mut u[..npte],
            t: 0.0,
            tnorm: 1.0,
            uscale: 1.0,
            pscale: 1.0,
        }
    }

    fn lambda(cache: &mut [Real], m: usize) -> &mut [Real] {
        &mut cache[m * MAX_NUM_LAMBDAS..(m + 1) * MAX_NUM_LAMBDAS]
    }

    /// `(e, P)` of material `m` at `(rho, t)`.
    fn eval_rt(&mut self, m: usize, rho: Real, t: Real) -> (Real, Real) {
        let eos = &self.eos[self.eos_idx[m]];
        let l = Self::lambda(self.cache, m);
        let e = eos.internal_energy_from_density_temperature(rho, t, l);
        let p = eos.pressure_from_density_temperature(rho, t, l);
        (e, p)
    }

    /// Refreshes `rho`, `sie`, `press`, `u` from the current `vfrac` and `t`.
    /// Returns false when the state is not admissible.
    fn evaluate(&mut self) -> bool {
        if !(self.t.is_finite() && self.t > 0.0) {
            return false;
        }
        if self.vfrac.iter().any(|&a| !(a > 0.0)) {
            return false;
        }
        for m in 0..self.npte {
            let r = self.rhobar[m] / self.vfrac[m];
            let (e, p) = self.eval_rt(m, r, self.t);
            let eos = &self.eos[self.eos_idx[m]];
            let emin = eos.min_internal_energy_from_density(r, Self::lambda(self.cache, m));
            if !(e.is_finite() && p.is_finite() && r.is_finite()) || e < emin {
                return false;
            }
            self.rho[m] = r;
            self.sie[m] = e;
            self.press[m] = p;
            self.u[m] = self.rhobar[m] * e;
        }
        true
    }

    fn compute_residual(&mut self) {
        let n = self.npte;
        self.residual[0] = self.vfrac.iter().sum::<Real>() - 1.0;
        self.residual[1] = (self.u.iter().sum::<Real>() - self.utot) / self.uscale;
        for k in 0..n.saturating_sub(1) {
            self.residual[2 + k] = (self.press[k] - self.press[k + 1]) / self.pscale;
        }
    }

    fn residual_sq(&self) -> Real {
        self.residual.iter().map(|f| f * f).sum()
    }

    fn residual_max(&self) -> Real {
        self.residual.iter().fold(0.0, |acc: Real, f| acc.max(f.abs()))
    }

    fn test_converged(&self) -> bool {
        let p = self.params;
        if self.residual_max() <= p.residual_tolerance {
            return true;
        }
        let mut pmean = 0.0;
        let mut pabs = 0.0;
        for (a, pm) in self.vfrac.iter().zip(self.press.iter()) {
            pmean += a * pm;
            pabs += a * pm.abs();
        }
        let spread = self
            .press
            .iter()
            .fold(0.0, |acc: Real, pm| acc.max((pm - pmean).abs()));
        spread <= p.rel_tolerance_p * pabs + p.abs_tolerance_p
            && self.residual[1].abs() <= p.rel_tolerance_e
            && self.residual[0].abs() <= p.rel_tolerance_v
    }

    /// Partial densities, normalised fractions, temperature guess and scales.
    fn init(&mut self) -> bool {
        let n = self.npte;
        for m in 0..n {
            self.rhobar[m] = self.rho[m] * self.vfrac[m];
        }
        let vsum: Real = self.vfrac.iter().sum();
        if !(vsum > 0.0 && vsum.is_finite()) {
            return false;
        }
        for a in self.vfrac.iter_mut() {
            *a /= vsum;
        }
        let rho_tot: Real = self.rhobar.iter().sum();
        self.utot = rho_tot * self.sie_tot;

        let mut tsum = 0.0;
        let mut wsum = 0.0;
        for m in 0..n {
            let r = self.rhobar[m] / self.vfrac[m];
            let eos = &self.eos[self.eos_idx[m]];
            let tm = eos.temperature_from_density_internal_energy(
                r,
                self.sie_tot,
                Self::lambda(self.cache, m),
            );
            if tm.is_finite() && tm > 0.0 {
                tsum += self.rhobar[m] * tm;
                wsum += self.rhobar[m];
            }
        }
        self.t = if wsum > 0.0 {
            tsum / wsum
        } else {
            self.params.default_tguess
        };

        if !self.evaluate() {
            trace!(tguess = self.t, "temperature guess rejected, using default");
            self.t = self.params.default_tguess;
            if !self.evaluate() {
                return false;
            }
        }
        self.tnorm = self.t;

        let mut uscale = 0.0;
        let mut pscale = 0.0;
        for m in 0..n {
            let (r, t) = (self.rho[m], self.t);
            let eos = &self.eos[self.eos_idx[m]];
            let l = Self::lambda(self.cache, m);
            let cv = eos.specific_heat_from_density_temperature(r, t, l);
            let bmod = eos.bulk_modulus_from_density_temperature(r, t, l);
            uscale += self.rhobar[m] * self.sie[m].abs().max(cv * t);
            pscale += self.vfrac[m] * self.press[m].abs().max(bmod);
        }
        self.uscale = usable_scale(uscale.max(self.utot.abs()));
        self.pscale = usable_scale(pscale);
        self.compute_residual();
        true
    }

    fn build_jacobian(&mut self) {
        let n = self.npte;
        let neq = n + 1;
        let eps = self.params.derivative_eps;
        self.jac.fill(0.0);

        let mut dedt = 0.0;
        for m in 0..n {
            self.jac[at(neq, 0, m)] = 1.0;

            let a = self.vfrac[m];
            let dv = if a < 0.5 { a * eps } else { -a * eps };
            let rp = self.rhobar[m] / (a + dv);
            let (ep, pp) = self.eval_rt(m, rp, self.t);
            let dpdv = (pp - self.press[m]) / dv;
            let dedv = self.rhobar[m] * (ep - self.sie[m]) / dv;
            self.jac[at(neq, 1, m)] = dedv / self.uscale;
            if m + 1 < n {
                self.jac[at(neq, 2 + m, m)] += dpdv / self.pscale;
            }
            if m >= 1 {
                self.jac[at(neq, 1 + m, m)] -= dpdv / self.pscale;
            }

            let dt = self.t * eps;
            let (et, pt) = self.eval_rt(m, self.rho[m], self.t + dt);
            self.dpdt[m] = (pt - self.press[m]) / dt;
            dedt += self.rhobar[m] * (et - self.sie[m]) / dt;
        }

        self.jac[at(neq, 1, n)] = dedt * self.tnorm / self.uscale;
        for k in 0..n.saturating_sub(1) {
            self.jac[at(neq, 2 + k, n)] =
                (self.dpdt[k] - self.dpdt[k + 1]) * self.tnorm / self.pscale;
        }
    }

    /// Largest step scale keeping every fraction and the temperature positive.
    fn limit_step(&self) -> Real {
        let n = self.npte;
        let safety = self.params.vfrac_safety_fac;
        let mut scale: Real = 1.0;
        for m in 0..n {
            let d = self.dx[m];
            if scale * d < -safety * self.vfrac[m] {
                scale = -safety * self.vfrac[m] / d;
            }
        }
        let dt = self.dx[n] * self.tnorm;
        if scale * dt < -safety * self.t {
            scale = -safety * self.t / dt;
        }
        scale
    }

    fn set_trial(&mut self, scale: Real) {
        let n = self.npte;
        for m in 0..n {
            self.vfrac[m] = self.x_old[m] + scale * self.dx[m];
        }
        if self.vfrac.iter().all(|&a| a > 0.0) {
            let vsum: Real = self.vfrac.iter().sum();
            for a in self.vfrac.iter_mut() {
                *a /= vsum;
            }
        }
        self.t = self.x_old[n] + scale * self.dx[n] * self.tnorm;
    }

    fn restore(&mut self) {
        let n = self.npte;
        self.vfrac.copy_from_slice(&self.x_old[..n]);
        self.t = self.x_old[n];
        if !self.evaluate() {
            // saved iterate no longer admissible; leave nothing that looks valid
            self.press.fill(Real::NAN);
            self.t = Real::NAN;
        }
        self.compute_residual();
    }

    /// Backtracking search along `dx`. Returns false when no admissible trial
    /// was found and the previous iterate was restored.
    fn line_search(&mut self, scale: Real, err_old: Real) -> bool {
        let n = self.npte;
        self.x_old[..n].copy_from_slice(&*self.vfrac);
        self.x_old[n] = self.t;

        let p = self.params;
        let mut s = scale;
        let mut last_valid = None;
        for _ in 0..=p.line_search_max_iter {
            self.set_trial(s);
            if self.evaluate() {
                self.compute_residual();
                if self.residual_sq() < (1.0 - p.line_search_alpha * s) * err_old {
                    return true;
                }
                last_valid = Some(s);
            }
            s *= p.line_search_fac;
        }

        match last_valid {
            Some(s) => {
                self.set_trial(s);
                if self.evaluate() {
                    self.compute_residual();
                    true
                } else {
                    self.restore();
                    false
                }
            }
            None => {
                self.restore();
                false
            }
        }
    }

    fn finish(&mut self, status: PteStatus, iterations: usize) -> PteOutcome {
        self.temp.fill(self.t);
        PteOutcome {
            status,
            iterations,
            residual: self.residual_max(),
        }
    }

    pub fn solve(mut self) -> PteOutcome {
        let n = self.npte;
        let neq = n + 1;
        if n == 0 {
            return PteOutcome {
                status: PteStatus::NoValidStart,
                iterations: 0,
                residual: Real::INFINITY,
            };
        }
        if !self.init() {
            self.temp.fill(Real::NAN);
            return PteOutcome {
                status: PteStatus::NoValidStart,
                iterations: 0,
                residual: Real::INFINITY,
            };
        }

        let max_iter = self.params.max_iterations(n);
        let mut iterations = 0;
        let mut converged = self.test_converged();
        while !converged && iterations < max_iter {
            let err_old = self.residual_sq();
            self.build_jacobian();
            for (d, f) in self.dx.iter_mut().zip(self.residual.iter()) {
                *d = -f;
            }
            let jac = DMatrixViewMut::from_slice(&mut *self.jac, neq, neq);
            if let Err(singular) = solve_in_place(jac, &mut *self.dx) {
                trace!(iterations, column = singular.column, "singular PTE Jacobian");
                break;
            }

            let scale = self.limit_step();
            let moved = self.line_search(scale, err_old);
            iterations += 1;
            converged = self.test_converged();
            trace!(
                iterations,
                temp = self.t,
                residual = self.residual_max(),
                scale,
                "PTE iteration"
            );
            if !moved && !converged {
                break;
            }
        }

        let status = if converged {
            PteStatus::Converged
        } else {
            PteStatus::Unconverged
        };
        self.finish(status, iterations)
    }
}
