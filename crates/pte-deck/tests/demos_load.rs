use std::path::Path;

use pte_deck::Problem;
use pte_mix::CellStatus;

fn demo(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

#[test]
fn demos_load_and_validate() {
    for name in ["air_water.yaml", "shocked_copper.yaml"] {
        let deck = pte_deck::load(&demo(name))
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        Problem::from_deck(&deck)
            .unwrap_or_else(|e| panic!("Failed to assemble {}: {}", name, e));
    }
}

#[test]
fn air_water_equilibrates() {
    let deck = pte_deck::load(&demo("air_water.yaml")).unwrap();
    let problem = Problem::from_deck(&deck).unwrap();
    assert_eq!(problem.ncell(), 3);
    assert_eq!(problem.eos[1].variant_name(), "StiffGas");

    let solution = problem.equilibrate().unwrap();
    assert_eq!(
        solution.status,
        vec![CellStatus::Pure, CellStatus::Converged, CellStatus::Pure]
    );
    assert!(solution.summary.all_accepted());
    assert!(solution.press.iter().all(|&p| p > 0.0));
    // air-only cell: (gamma - 1) rho e
    let ideal = 0.4 * 1.2e-3 * 2.1e9;
    assert!((solution.press[0] - ideal).abs() < 1e-10 * ideal);
    // absent materials
    assert_eq!(solution.frac_vol[1], 0.0);
    assert_eq!(solution.frac_vol[4], 0.0);
    assert_eq!(solution.frac_ie[4], 0.0);
}

#[test]
fn small_loop_demo_runs() {
    let deck = pte_deck::load(&demo("shocked_copper.yaml")).unwrap();
    assert!(deck.options.small_loop);
    let problem = Problem::from_deck(&deck).unwrap();
    assert_eq!(problem.eos[1].variant_name(), "ShiftedJwl");
    let solution = problem.equilibrate().unwrap();
    assert_eq!(solution.summary.pure, 2);
}
