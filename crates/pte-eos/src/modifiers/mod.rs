//! Wrappers that decorate a base model. Each is generic over the wrapped model and
//! can be built either directly (`Scaled::new`) or from a runtime [`Modifier`].

mod bilinear_ramp;
mod relativistic;
mod scaled;
mod shifted;
mod unit_system;

pub use bilinear_ramp::BilinearRamp;
pub use relativistic::Relativistic;
pub use scaled::Scaled;
pub use shifted::Shifted;
pub use unit_system::UnitSystem;

use pte_core::{Real, UnitFactors};

use crate::error::EosError;

/// Runtime description of one wrapping step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Modifier {
    Scaled { scale: Real },
    Shifted { shift: Real },
    UnitSystem(UnitFactors),
    Relativistic { cl: Real },
    BilinearRamp { r0: Real, a: Real, b: Real, c: Real },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModifierKind {
    Scaled,
    Shifted,
    UnitSystem,
    Relativistic,
    BilinearRamp,
}

impl ModifierKind {
    pub const ALL: [ModifierKind; 5] = [
        ModifierKind::Scaled,
        ModifierKind::Shifted,
        ModifierKind::UnitSystem,
        ModifierKind::Relativistic,
        ModifierKind::BilinearRamp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModifierKind::Scaled => "Scaled",
            ModifierKind::Shifted => "Shifted",
            ModifierKind::UnitSystem => "UnitSystem",
            ModifierKind::Relativistic => "Relativistic",
            ModifierKind::BilinearRamp => "BilinearRamp",
        }
    }
}

impl Modifier {
    pub fn kind(&self) -> ModifierKind {
        match self {
            Modifier::Scaled { .. } => ModifierKind::Scaled,
            Modifier::Shifted { .. } => ModifierKind::Shifted,
            Modifier::UnitSystem(_) => ModifierKind::UnitSystem,
            Modifier::Relativistic { .. } => ModifierKind::Relativistic,
            Modifier::BilinearRamp { .. } => ModifierKind::BilinearRamp,
        }
    }

    /// Parameters that leave the wrapped model unchanged. The ramp is only an
    /// identity while the wrapped pressure stays above zero.
    pub fn identity(kind: ModifierKind) -> Self {
        match kind {
            ModifierKind::Scaled => Modifier::Scaled { scale: 1.0 },
            ModifierKind::Shifted => Modifier::Shifted { shift: 0.0 },
            ModifierKind::UnitSystem => Modifier::UnitSystem(UnitFactors::IDENTITY),
            ModifierKind::Relativistic => Modifier::Relativistic { cl: 1e150 },
            ModifierKind::BilinearRamp => Modifier::BilinearRamp {
                r0: Real::MAX / 4.0,
                a: 1.0,
                b: 0.5,
                c: 0.0,
            },
        }
    }
}

pub(crate) fn mismatch(expected: ModifierKind, got: &Modifier) -> EosError {
    debug_assert_ne!(expected, got.kind());
    EosError::InvalidParameter {
        model: expected.name(),
        what: "modifier parameters of another kind",
    }
}
