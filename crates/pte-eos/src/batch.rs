//! Batched evaluation over slices of states.
//!
//! Every element is evaluated exactly as the scalar call would be, with its own
//! stack cache, so results are bit-identical to a per-element loop. Elements run in
//! parallel on the rayon pool. An element outside the model's domain is flagged in
//! the status slice and still receives the model's value; the rest of the batch
//! is unaffected.

use pte_core::Real;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{EosError, EosResult};
use crate::model::{EosModel, MAX_NUM_LAMBDAS, PtDerivatives};

/// Per-element outcome of a batched call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvalStatus {
    #[default]
    Ok,
    OutOfDomain,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub evaluated: usize,
    pub out_of_domain: usize,
}

/// Output slices for [`EosBatch::p_t_of_r_e_batch`].
pub struct PtOutputs<'a> {
    pub press: &'a mut [Real],
    pub temp: &'a mut [Real],
    pub dpdr: &'a mut [Real],
    pub dpde: &'a mut [Real],
    pub dtdr: &'a mut [Real],
    pub dtde: &'a mut [Real],
}

#[derive(Clone, Copy)]
enum Input {
    Energy,
    Temperature,
}

fn check_len(what: &'static str, expected: usize, got: usize) -> EosResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(EosError::LengthMismatch {
            what,
            expected,
            got,
        })
    }
}

fn status_of<E: EosModel + ?Sized>(eos: &E, input: Input, rho: Real, x: Real) -> EvalStatus {
    let res = match input {
        Input::Energy => eos.check_domain(rho, x),
        Input::Temperature => eos.check_domain_temperature(rho, x),
    };
    if res.is_ok() {
        EvalStatus::Ok
    } else {
        EvalStatus::OutOfDomain
    }
}

fn eval_pairs<E, F>(
    eos: &E,
    input: Input,
    rhos: &[Real],
    xs: &[Real],
    out: &mut [Real],
    status: &mut [EvalStatus],
    f: F,
) -> EosResult<BatchReport>
where
    E: EosModel + ?Sized,
    F: Fn(&E, Real, Real, &mut [Real]) -> Real + Sync,
{
    let n = rhos.len();
    check_len("second state variable", n, xs.len())?;
    check_len("output", n, out.len())?;
    check_len("status", n, status.len())?;

    let out_of_domain: usize = (rhos, xs, out, status)
        .into_par_iter()
        .map(|(&rho, &x, o, s)| {
            let mut lambda = [0.0; MAX_NUM_LAMBDAS];
            *o = f(eos, rho, x, &mut lambda);
            *s = status_of(eos, input, rho, x);
            usize::from(*s == EvalStatus::OutOfDomain)
        })
        .sum();

    if out_of_domain > 0 {
        debug!(n, out_of_domain, "batched EOS call had out-of-domain elements");
    }
    Ok(BatchReport {
        evaluated: n,
        out_of_domain,
    })
}

/// Batched forms of the [`EosModel`] queries, available on every model.
pub trait EosBatch: EosModel {
    fn pressure_from_density_internal_energy_batch(
        &self,
        rhos: &[Real],
        sies: &[Real],
        press: &mut [Real],
        status: &mut [EvalStatus],
    ) -> EosResult<BatchReport> {
        eval_pairs(self, Input::Energy, rhos, sies, press, status, |e, r, x, l| {
            e.pressure_from_density_internal_energy(r, x, l)
        })
    }

    fn temperature_from_density_internal_energy_batch(
        &self,
        rhos: &[Real],
        sies: &[Real],
        temps: &mut [Real],
        status: &mut [EvalStatus],
    ) -> EosResult<BatchReport> {
        eval_pairs(self, Input::Energy, rhos, sies, temps, status, |e, r, x, l| {
            e.temperature_from_density_internal_energy(r, x, l)
        })
    }

    fn bulk_modulus_from_density_internal_energy_batch(
        &self,
        rhos: &[Real],
        sies: &[Real],
        bmods: &mut [Real],
        status: &mut [EvalStatus],
    ) -> EosResult<BatchReport> {
        eval_pairs(self, Input::Energy, rhos, sies, bmods, status, |e, r, x, l| {
            e.bulk_modulus_from_density_internal_energy(r, x, l)
        })
    }

    fn gruneisen_param_from_density_internal_energy_batch(
        &self,
        rhos: &[Real],
        sies: &[Real],
        gammas: &mut [Real],
        status: &mut [EvalStatus],
    ) -> EosResult<BatchReport> {
        eval_pairs(self, Input::Energy, rhos, sies, gammas, status, |e, r, x, l| {
            e.gruneisen_param_from_density_internal_energy(r, x, l)
        })
    }

    fn specific_heat_from_density_internal_energy_batch(
        &self,
        rhos: &[Real],
        sies: &[Real],
        cvs: &mut [Real],
        status: &mut [EvalStatus],
    ) -> EosResult<BatchReport> {
        eval_pairs(self, Input::Energy, rhos, sies, cvs, status, |e, r, x, l| {
            e.specific_heat_from_density_internal_energy(r, x, l)
        })
    }

    fn pressure_from_density_temperature_batch(
        &self,
        rhos: &[Real],
        temps: &[Real],
        press: &mut [Real],
        status: &mut [EvalStatus],
    ) -> EosResult<BatchReport> {
        eval_pairs(self, Input::Temperature, rhos, temps, press, status, |e, r, x, l| {
            e.pressure_from_density_temperature(r, x, l)
        })
    }

    fn internal_energy_from_density_temperature_batch(
        &self,
        rhos: &[Real],
        temps: &[Real],
        sies: &mut [Real],
        status: &mut [EvalStatus],
    ) -> EosResult<BatchReport> {
        eval_pairs(self, Input::Temperature, rhos, temps, sies, status, |e, r, x, l| {
            e.internal_energy_from_density_temperature(r, x, l)
        })
    }

    fn p_t_of_r_e_batch(
        &self,
        rhos: &[Real],
        sies: &[Real],
        out: PtOutputs<'_>,
        status: &mut [EvalStatus],
    ) -> EosResult<BatchReport> {
        let n = rhos.len();
        check_len("sie", n, sies.len())?;
        for (what, len) in [
            ("press", out.press.len()),
            ("temp", out.temp.len()),
            ("dpdr", out.dpdr.len()),
            ("dpde", out.dpde.len()),
            ("dtdr", out.dtdr.len()),
            ("dtde", out.dtde.len()),
            ("status", status.len()),
        ] {
            check_len(what, n, len)?;
        }

        let PtOutputs {
            press,
            temp,
            dpdr,
            dpde,
            dtdr,
            dtde,
        } = out;
        let out_of_domain: usize = (rhos, sies, press, temp, dpdr, dpde, dtdr, dtde, status)
            .into_par_iter()
            .map(|(&rho, &sie, p, t, pr, pe, tr, te, s)| {
                let mut lambda = [0.0; MAX_NUM_LAMBDAS];
                let PtDerivatives {
                    press,
                    temp,
                    dpdr,
                    dpde,
                    dtdr,
                    dtde,
                } = self.p_t_of_r_e(rho, sie, &mut lambda);
                (*p, *t, *pr, *pe, *tr, *te) = (press, temp, dpdr, dpde, dtdr, dtde);
                *s = status_of(self, Input::Energy, rho, sie);
                usize::from(*s == EvalStatus::OutOfDomain)
            })
            .sum();

        Ok(BatchReport {
            evaluated: n,
            out_of_domain,
        })
    }
}

impl<T: EosModel + ?Sized> EosBatch for T {}
