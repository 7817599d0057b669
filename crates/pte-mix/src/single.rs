//! Cells holding a single material skip the equilibrium solve.

use pte_core::Real;
use pte_eos::{EosModel, EosResult, PtDerivatives};

/// Pressure, temperature and their derivatives at the cell state.
///
/// Fails only when the state is outside the model's domain.
pub fn solve_single<E: EosModel + ?Sized>(
    eos: &E,
    rho: Real,
    sie: Real,
    lambda: &mut [Real],
) -> EosResult<PtDerivatives> {
    eos.check_domain(rho, sie)?;
    Ok(eos.p_t_of_r_e(rho, sie, lambda))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pte_eos::{Eos, IdealGas, MAX_NUM_LAMBDAS};

    #[test]
    fn ideal_gas_point() {
        let eos = Eos::from(IdealGas::new(0.4, 7.18e6).unwrap());
        let mut l = [0.0; MAX_NUM_LAMBDAS];
        let pt = solve_single(&eos, 1.2e-3, 2.5e9, &mut l).unwrap();
        assert_eq!(pt.press, 0.4 * 1.2e-3 * 2.5e9);
        assert_eq!(pt.temp, 2.5e9 / 7.18e6);
        assert!((pt.dpde - 0.4 * 1.2e-3).abs() < 1e-15);
    }

    #[test]
    fn negative_density_rejected() {
        let eos = Eos::from(IdealGas::new(0.4, 7.18e6).unwrap());
        let mut l = [0.0; MAX_NUM_LAMBDAS];
        assert!(solve_single(&eos, -1.0, 2.5e9, &mut l).is_err());
        assert!(solve_single(&eos, 1.0, Real::NAN, &mut l).is_err());
    }
}
