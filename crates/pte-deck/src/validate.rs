//! Deck validation logic.
//!
//! Checks structure and references only. Model-specific parameter limits are
//! enforced by the EOS constructors when the deck is assembled.

use std::collections::{BTreeMap, HashSet};

use crate::schema::{CellDef, Deck, EosDef};

pub const LATEST_VERSION: u32 = 1;

/// Modifier nesting deeper than this cannot be in the closed variant set.
const MAX_EOS_DEPTH: usize = 4;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: String, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_deck(deck: &Deck) -> Result<(), ValidationError> {
    if deck.version == 0 || deck.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: deck.version,
        });
    }

    deck.params
        .validate()
        .map_err(|e| invalid("params".to_string(), "..", &e.to_string()))?;
    if deck.options.threads == Some(0) {
        return Err(invalid("options.threads".to_string(), 0, "must be at least 1"));
    }
    if deck.options.slots == Some(0) {
        return Err(invalid("options.slots".to_string(), 0, "must be at least 1"));
    }

    if deck.materials.is_empty() {
        return Err(invalid("materials".to_string(), "[]", "at least one material is required"));
    }
    let mut material_ids = HashSet::new();
    for material in &deck.materials {
        if material.id.trim().is_empty() {
            return Err(invalid("materials.id".to_string(), "\"\"", "must not be empty"));
        }
        if !material_ids.insert(material.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: material.id.clone(),
                context: "materials".to_string(),
            });
        }
        validate_eos(&material.eos, &format!("material '{}' eos", material.id), 0)?;
    }

    for (i, cell) in deck.cells.iter().enumerate() {
        validate_cell(cell, i, &material_ids)?;
    }
    Ok(())
}

fn validate_eos(eos: &EosDef, context: &str, depth: usize) -> Result<(), ValidationError> {
    if depth >= MAX_EOS_DEPTH {
        return Err(invalid(
            context.to_string(),
            eos.kind(),
            "too many nested modifiers",
        ));
    }
    for (name, v) in eos.scalars() {
        if !v.is_finite() {
            return Err(invalid(format!("{context}.{name}"), v, "must be finite"));
        }
    }
    match eos.inner() {
        Some(inner) => validate_eos(inner, &format!("{context}.inner"), depth + 1),
        None => Ok(()),
    }
}

fn validate_fractions(
    fractions: &BTreeMap<String, f64>,
    field: &str,
    material_ids: &HashSet<&str>,
) -> Result<(), ValidationError> {
    for (id, &f) in fractions {
        if !material_ids.contains(id.as_str()) {
            return Err(ValidationError::MissingReference {
                id: id.clone(),
                context: field.to_string(),
            });
        }
        if !(f.is_finite() && f >= 0.0) {
            return Err(invalid(format!("{field}.{id}"), f, "must be finite and non-negative"));
        }
    }
    Ok(())
}

fn validate_cell(
    cell: &CellDef,
    index: usize,
    material_ids: &HashSet<&str>,
) -> Result<(), ValidationError> {
    let field = |name: &str| format!("cells[{index}].{name}");

    if !(cell.volume.is_finite() && cell.volume > 0.0) {
        return Err(invalid(field("volume"), cell.volume, "must be positive"));
    }
    if !(cell.density.is_finite() && cell.density > 0.0) {
        return Err(invalid(field("density"), cell.density, "must be positive"));
    }
    if !cell.sie.is_finite() {
        return Err(invalid(field("sie"), cell.sie, "must be finite"));
    }

    validate_fractions(&cell.mass_fractions, &field("mass_fractions"), material_ids)?;
    let total: f64 = cell.mass_fractions.values().sum();
    if !(total > 0.0) {
        return Err(invalid(field("mass_fractions"), total, "must not sum to zero"));
    }
    if let Some(vf) = &cell.volume_fractions {
        validate_fractions(vf, &field("volume_fractions"), material_ids)?;
    }
    Ok(())
}
