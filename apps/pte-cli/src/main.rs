use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pte_core::Real;
use pte_deck::{DeckResult, Problem, ValidationError, build_eos};
use pte_eos::{Eos, EosModel, MAX_NUM_LAMBDAS};
use pte_mix::solve_single;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pte-cli")]
#[command(about = "Mixed-cell pressure-temperature equilibrium driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every EOS composition the closed variant accepts
    Variants,
    /// Validate a deck and report its materials
    Validate {
        /// Path to the deck (YAML or JSON)
        deck_path: PathBuf,
    },
    /// Evaluate one material at a density and specific internal energy
    Eval {
        /// Path to the deck (YAML or JSON)
        deck_path: PathBuf,
        /// Material ID
        material: String,
        /// Density
        #[arg(long)]
        rho: Real,
        /// Specific internal energy
        #[arg(long)]
        sie: Real,
    },
    /// Equilibrate every cell of a deck
    Equilibrate {
        /// Path to the deck (YAML or JSON)
        deck_path: PathBuf,
        /// Write the full solution as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the deck's thread count
        #[arg(long)]
        threads: Option<usize>,
        /// Only equilibrate these cells, in this order (e.g. `--cells 3,7`)
        #[arg(long, value_delimiter = ',')]
        cells: Option<Vec<usize>>,
    },
}

fn main() -> DeckResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Variants => cmd_variants(),
        Commands::Validate { deck_path } => cmd_validate(&deck_path),
        Commands::Eval {
            deck_path,
            material,
            rho,
            sie,
        } => cmd_eval(&deck_path, &material, rho, sie),
        Commands::Equilibrate {
            deck_path,
            output,
            threads,
            cells,
        } => cmd_equilibrate(&deck_path, output.as_deref(), threads, cells),
    }
}

fn cmd_variants() -> DeckResult<()> {
    println!("{} EOS variants:", Eos::NUM_VARIANTS);
    for name in Eos::VARIANT_NAMES {
        println!("  {name}");
    }
    Ok(())
}

fn cmd_validate(deck_path: &Path) -> DeckResult<()> {
    println!("Validating deck: {}", deck_path.display());
    let deck = pte_deck::load(deck_path)?;
    let problem = Problem::from_deck(&deck)?;
    println!("✓ Deck is valid: {}", deck.name);
    for (id, eos) in problem.material_ids.iter().zip(&problem.eos) {
        println!("  {} - {}", id, eos.eos_type());
    }
    println!("  Cells: {}", problem.ncell());
    Ok(())
}

fn cmd_eval(deck_path: &Path, material: &str, rho: Real, sie: Real) -> DeckResult<()> {
    let deck = pte_deck::load(deck_path)?;
    let def = deck
        .materials
        .iter()
        .find(|m| m.id == material)
        .ok_or_else(|| ValidationError::MissingReference {
            id: material.to_string(),
            context: "materials".to_string(),
        })?;
    let eos = build_eos(&def.eos)?;
    let mut lambda = [0.0; MAX_NUM_LAMBDAS];
    let pt = solve_single(&eos, rho, sie, &mut lambda)?;
    let bmod = eos.bulk_modulus_from_density_internal_energy(rho, sie, &mut lambda);
    let cv = eos.specific_heat_from_density_internal_energy(rho, sie, &mut lambda);

    println!("{} ({})", material, eos.variant_name());
    println!("  P      = {:.6e}", pt.press);
    println!("  T      = {:.6e}", pt.temp);
    println!("  dP/drho = {:.6e}", pt.dpdr);
    println!("  dP/de  = {:.6e}", pt.dpde);
    println!("  dT/drho = {:.6e}", pt.dtdr);
    println!("  dT/de  = {:.6e}", pt.dtde);
    println!("  B      = {:.6e}", bmod);
    println!("  cv     = {:.6e}", cv);
    Ok(())
}

fn cmd_equilibrate(
    deck_path: &Path,
    output: Option<&Path>,
    threads: Option<usize>,
    cells: Option<Vec<usize>>,
) -> DeckResult<()> {
    let deck = pte_deck::load(deck_path)?;
    let mut problem = Problem::from_deck(&deck)?;
    if threads.is_some() {
        problem.options.threads = threads;
    }
    if let Some(cells) = cells {
        problem.offsets = cells;
    }
    info!(deck = %deck.name, cells = problem.offsets.len(), "equilibrating");

    let solution = problem.equilibrate()?;
    let s = &solution.summary;
    println!(
        "✓ {} cells: {} pure, {} converged, {} unconverged, {} invalid",
        s.cells, s.pure, s.converged, s.unconverged, s.invalid
    );
    println!("  Max pressure: {:.6e}", s.max_pressure);
    for &i in &problem.offsets {
        println!(
            "  cell {:>4}: {:?}  P = {:.6e}  T = {:.6e}",
            i, solution.status[i], solution.press[i], solution.temp[i]
        );
    }

    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&solution)?)?;
        println!("  Solution written to {}", path.display());
    }
    Ok(())
}
