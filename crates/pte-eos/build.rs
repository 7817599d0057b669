//! Generates the closed `Eos` variant from the declared model and modifier lists.
//!
//! The closure is
//!   unit_or_rel = UnitSystem<UNIT_SYSTEM_MODELS> ++ Relativistic<RELATIVISTIC_MODELS>
//!   shifted     = Shifted<BASE_MODELS> ++ Shifted<unit_or_rel>
//!   scaled      = Scaled<BASE_MODELS> ++ Scaled<unit_or_rel> ++ Scaled<shifted>
//!   combined    = BASE_MODELS ++ shifted ++ scaled ++ unit_or_rel
//!   final       = combined ++ BilinearRamp<combined>
//! and only compositions in `final` get a variant, a `From` impl and a `modify` arm.

use std::collections::HashSet;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

const BASE_MODELS: &[&str] = &["IdealGas", "Gruneisen", "Jwl", "StiffGas", "NobleAbel"];
const UNIT_SYSTEM_MODELS: &[&str] = &["IdealGas"];
const RELATIVISTIC_MODELS: &[&str] = &["IdealGas"];
const MODIFIERS: &[&str] = &[
    "Scaled",
    "Shifted",
    "UnitSystem",
    "Relativistic",
    "BilinearRamp",
];

#[derive(Clone, Debug)]
struct Composition {
    /// Outermost first.
    wrappers: Vec<&'static str>,
    base: &'static str,
}

impl Composition {
    fn base(base: &'static str) -> Self {
        Self {
            wrappers: Vec::new(),
            base,
        }
    }

    fn wrapped(&self, modifier: &'static str) -> Self {
        let mut wrappers = Vec::with_capacity(self.wrappers.len() + 1);
        wrappers.push(modifier);
        wrappers.extend(self.wrappers.iter().copied());
        Self {
            wrappers,
            base: self.base,
        }
    }

    /// Variant name, e.g. `ScaledShiftedIdealGas`.
    fn name(&self) -> String {
        let mut s: String = self.wrappers.concat();
        s.push_str(self.base);
        s
    }

    /// Rust type, e.g. `Scaled<Shifted<IdealGas>>`.
    fn ty(&self) -> String {
        let mut s = String::new();
        for w in &self.wrappers {
            s.push_str(w);
            s.push('<');
        }
        s.push_str(self.base);
        s.push_str(&">".repeat(self.wrappers.len()));
        s
    }
}

fn wrap_all(modifier: &'static str, list: &[Composition]) -> Vec<Composition> {
    list.iter().map(|c| c.wrapped(modifier)).collect()
}

fn closure() -> Vec<Composition> {
    let base: Vec<_> = BASE_MODELS.iter().map(|&b| Composition::base(b)).collect();
    let unit: Vec<_> = UNIT_SYSTEM_MODELS.iter().map(|&b| Composition::base(b)).collect();
    let rel: Vec<_> = RELATIVISTIC_MODELS.iter().map(|&b| Composition::base(b)).collect();

    let unit_or_rel = [wrap_all("UnitSystem", &unit), wrap_all("Relativistic", &rel)].concat();
    let shifted = [wrap_all("Shifted", &base), wrap_all("Shifted", &unit_or_rel)].concat();
    let scaled = [
        wrap_all("Scaled", &base),
        wrap_all("Scaled", &unit_or_rel),
        wrap_all("Scaled", &shifted),
    ]
    .concat();
    let combined = [base, shifted, scaled, unit_or_rel].concat();
    let ramped = wrap_all("BilinearRamp", &combined);
    [combined, ramped].concat()
}

fn generate(all: &[Composition]) -> String {
    let names: HashSet<String> = all.iter().map(Composition::name).collect();
    assert_eq!(names.len(), all.len(), "duplicate EOS variant names");

    let mut out = String::new();
    out.push_str("// @generated by build.rs; do not edit.\n\n");

    out.push_str("#[enum_dispatch(EosModel)]\n");
    out.push_str("#[derive(Clone, Copy, Debug, PartialEq)]\n");
    out.push_str("pub enum Eos {\n");
    for c in all {
        let _ = writeln!(out, "    {}({}),", c.name(), c.ty());
    }
    out.push_str("}\n\n");

    out.push_str("impl Eos {\n");
    let _ = writeln!(out, "    pub const NUM_VARIANTS: usize = {};\n", all.len());

    out.push_str("    /// Variant names in tag order.\n");
    out.push_str("    pub const VARIANT_NAMES: [&'static str; Self::NUM_VARIANTS] = [\n");
    for c in all {
        let _ = writeln!(out, "        \"{}\",", c.name());
    }
    out.push_str("    ];\n\n");

    out.push_str("    /// Small integer identifying the wrapped composition.\n");
    out.push_str("    pub fn tag(&self) -> usize {\n        match self {\n");
    for (i, c) in all.iter().enumerate() {
        let _ = writeln!(out, "            Eos::{}(_) => {},", c.name(), i);
    }
    out.push_str("        }\n    }\n\n");

    out.push_str("    pub fn variant_name(&self) -> &'static str {\n");
    out.push_str("        Self::VARIANT_NAMES[self.tag()]\n    }\n\n");

    out.push_str("    /// Wraps this handle in one more modifier, if the result is in the set.\n");
    out.push_str("    pub fn modify(self, modifier: Modifier) -> EosResult<Eos> {\n");
    out.push_str("        match (self, modifier.kind()) {\n");
    for c in all {
        for &m in MODIFIERS {
            if names.contains(&c.wrapped(m).name()) {
                let _ = writeln!(
                    out,
                    "            (Eos::{}(t), ModifierKind::{m}) => Ok(Eos::from({m}::wrap(t, &modifier)?)),",
                    c.name()
                );
            }
        }
    }
    out.push_str("            (eos, kind) => Err(EosError::IllegalComposition {\n");
    out.push_str("                inner: eos.variant_name(),\n");
    out.push_str("                modifier: kind.name(),\n");
    out.push_str("            }),\n");
    out.push_str("        }\n    }\n}\n");
    out
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let all = closure();
    let code = generate(&all);
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out_dir.join("eos_variant.rs"), code).expect("failed to write eos_variant.rs");
}
