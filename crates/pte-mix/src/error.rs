//! Errors detected before the parallel loop starts.
//!
//! Per-cell numeric failures are not errors; they are reported through
//! [`crate::CellStatus`].

use pte_eos::EosError;
use thiserror::Error;

pub type MixResult<T> = Result<T, MixError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MixError {
    #[error("Scratch arena too small: needs {needed} {what}, has {available}")]
    ArenaTooSmall {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Token pool width {width} is invalid: {what}")]
    TokenWidth { width: usize, what: &'static str },

    #[error("Length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Material {material} maps to EOS index {index}, but only {count} EOS handles exist")]
    MaterialIndex {
        material: usize,
        index: usize,
        count: usize,
    },

    #[error("Loop index {iloop} names cell {cell}, but the mesh has {ncell} cells")]
    CellOffset {
        iloop: usize,
        cell: usize,
        ncell: usize,
    },

    #[error("Cell {cell} is listed again at loop index {iloop}")]
    DuplicateCell { iloop: usize, cell: usize },

    #[error("Invalid configuration: {what}")]
    Config { what: String },

    #[error("Thread pool: {what}")]
    ThreadPool { what: String },

    #[error("EOS error: {0}")]
    Eos(#[from] EosError),
}
