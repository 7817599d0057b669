//! pte-deck: material and cell deck format, validation and assembly.

pub mod assemble;
pub mod schema;
pub mod validate;

pub use assemble::{Problem, Solution, build_eos};
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_deck};

use pte_eos::EosError;
use pte_mix::MixError;

pub type DeckResult<T> = Result<T, DeckError>;

#[derive(thiserror::Error, Debug)]
pub enum DeckError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("EOS error: {0}")]
    Eos(#[from] EosError),

    #[error("Dispatch error: {0}")]
    Mix(#[from] MixError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> DeckResult<Deck> {
    let content = std::fs::read_to_string(path)?;
    let deck: Deck = serde_yaml::from_str(&content)?;
    validate_deck(&deck)?;
    Ok(deck)
}

pub fn save_yaml(path: &std::path::Path, deck: &Deck) -> DeckResult<()> {
    validate_deck(deck)?;
    let content = serde_yaml::to_string(deck)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> DeckResult<Deck> {
    let content = std::fs::read_to_string(path)?;
    let deck: Deck = serde_json::from_str(&content)?;
    validate_deck(&deck)?;
    Ok(deck)
}

pub fn save_json(path: &std::path::Path, deck: &Deck) -> DeckResult<()> {
    validate_deck(deck)?;
    let content = serde_json::to_string_pretty(deck)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Loads a deck, choosing the format from the file extension (`.json` or YAML).
pub fn load(path: &std::path::Path) -> DeckResult<Deck> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}
