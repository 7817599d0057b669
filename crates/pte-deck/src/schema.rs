//! Deck schema definitions.

use std::collections::BTreeMap;

use pte_core::UnitFactors;
use pte_mix::{DispatchOptions, PteParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deck {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub params: PteParams,
    #[serde(default)]
    pub options: RunOptionsDef,
    pub materials: Vec<MaterialDef>,
    #[serde(default)]
    pub cells: Vec<CellDef>,
}

impl Deck {
    /// Dispatch switches with the deck's solver parameters.
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            small_loop: self.options.small_loop,
            do_frac_bmod: self.options.do_frac_bmod,
            do_frac_dpde: self.options.do_frac_dpde,
            do_frac_cv: self.options.do_frac_cv,
            threads: self.options.threads,
            params: self.params,
        }
    }

    /// Position of material `id` in `materials`.
    pub fn material_index(&self, id: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunOptionsDef {
    pub small_loop: bool,
    pub do_frac_bmod: bool,
    pub do_frac_dpde: bool,
    pub do_frac_cv: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Scratch slots and token width; defaults to the thread count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots: Option<usize>,
}

impl Default for RunOptionsDef {
    fn default() -> Self {
        let d = DispatchOptions::default();
        Self {
            small_loop: d.small_loop,
            do_frac_bmod: d.do_frac_bmod,
            do_frac_dpde: d.do_frac_dpde,
            do_frac_cv: d.do_frac_cv,
            threads: d.threads,
            slots: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub eos: EosDef,
}

/// EOS tree: a base model, optionally wrapped by modifiers (outermost first).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EosDef {
    IdealGas {
        gm1: f64,
        cv: f64,
    },
    Gruneisen {
        c0: f64,
        s1: f64,
        #[serde(default)]
        s2: f64,
        #[serde(default)]
        s3: f64,
        g0: f64,
        b: f64,
        rho0: f64,
        t0: f64,
        #[serde(default)]
        p0: f64,
        cv: f64,
    },
    Jwl {
        a: f64,
        b: f64,
        r1: f64,
        r2: f64,
        w: f64,
        rho0: f64,
        cv: f64,
    },
    StiffGas {
        gm1: f64,
        cv: f64,
        pinf: f64,
        #[serde(default)]
        qq: f64,
    },
    NobleAbel {
        gm1: f64,
        cv: f64,
        bb: f64,
        #[serde(default)]
        qq: f64,
    },
    Scaled {
        scale: f64,
        inner: Box<EosDef>,
    },
    Shifted {
        shift: f64,
        inner: Box<EosDef>,
    },
    UnitSystem {
        factors: UnitFactors,
        inner: Box<EosDef>,
    },
    Relativistic {
        cl: f64,
        inner: Box<EosDef>,
    },
    BilinearRamp {
        r0: f64,
        a: f64,
        b: f64,
        c: f64,
        inner: Box<EosDef>,
    },
}

impl EosDef {
    pub fn inner(&self) -> Option<&EosDef> {
        match self {
            EosDef::Scaled { inner, .. }
            | EosDef::Shifted { inner, .. }
            | EosDef::UnitSystem { inner, .. }
            | EosDef::Relativistic { inner, .. }
            | EosDef::BilinearRamp { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// Tag as written in the deck.
    pub fn kind(&self) -> &'static str {
        match self {
            EosDef::IdealGas { .. } => "ideal_gas",
            EosDef::Gruneisen { .. } => "gruneisen",
            EosDef::Jwl { .. } => "jwl",
            EosDef::StiffGas { .. } => "stiff_gas",
            EosDef::NobleAbel { .. } => "noble_abel",
            EosDef::Scaled { .. } => "scaled",
            EosDef::Shifted { .. } => "shifted",
            EosDef::UnitSystem { .. } => "unit_system",
            EosDef::Relativistic { .. } => "relativistic",
            EosDef::BilinearRamp { .. } => "bilinear_ramp",
        }
    }

    /// Every scalar parameter of this node, by name.
    pub(crate) fn scalars(&self) -> Vec<(&'static str, f64)> {
        match *self {
            EosDef::IdealGas { gm1, cv } => vec![("gm1", gm1), ("cv", cv)],
            EosDef::Gruneisen {
                c0,
                s1,
                s2,
                s3,
                g0,
                b,
                rho0,
                t0,
                p0,
                cv,
            } => vec![
                ("c0", c0),
                ("s1", s1),
                ("s2", s2),
                ("s3", s3),
                ("g0", g0),
                ("b", b),
                ("rho0", rho0),
                ("t0", t0),
                ("p0", p0),
                ("cv", cv),
            ],
            EosDef::Jwl {
                a,
                b,
                r1,
                r2,
                w,
                rho0,
                cv,
            } => vec![
                ("a", a),
                ("b", b),
                ("r1", r1),
                ("r2", r2),
                ("w", w),
                ("rho0", rho0),
                ("cv", cv),
            ],
            EosDef::StiffGas { gm1, cv, pinf, qq } => {
                vec![("gm1", gm1), ("cv", cv), ("pinf", pinf), ("qq", qq)]
            }
            EosDef::NobleAbel { gm1, cv, bb, qq } => {
                vec![("gm1", gm1), ("cv", cv), ("bb", bb), ("qq", qq)]
            }
            EosDef::Scaled { scale, .. } => vec![("scale", scale)],
            EosDef::Shifted { shift, .. } => vec![("shift", shift)],
            EosDef::UnitSystem { factors, .. } => vec![
                ("factors.rho", factors.rho),
                ("factors.sie", factors.sie),
                ("factors.temp", factors.temp),
            ],
            EosDef::Relativistic { cl, .. } => vec![("cl", cl)],
            EosDef::BilinearRamp { r0, a, b, c, .. } => {
                vec![("r0", r0), ("a", a), ("b", b), ("c", c)]
            }
        }
    }
}

/// One cell. Fractions are keyed by material id; missing ids mean zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellDef {
    pub volume: f64,
    pub density: f64,
    pub sie: f64,
    pub mass_fractions: BTreeMap<String, f64>,
    /// Volume-fraction guesses; mass fractions are used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_fractions: Option<BTreeMap<String, f64>>,
}
