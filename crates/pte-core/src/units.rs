// pte-core/src/units.rs
//
// Models work in CGS (g/cm^3, erg/g, K, microbar). The factors below convert a
// value expressed in SI into the CGS value, computed through uom so the numbers
// are not hand-typed.

use uom::si::f64::{
    Energy as UomEnergy, Mass as UomMass, MassDensity as UomMassDensity,
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
    Velocity as UomVelocity,
};

pub type Density = UomMassDensity;
pub type Energy = UomEnergy;
pub type Mass = UomMass;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;
pub type Velocity = UomVelocity;

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn g_per_cc(v: f64) -> Density {
    use uom::si::mass_density::gram_per_cubic_centimeter;
    Density::new::<gram_per_cubic_centimeter>(v)
}

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

/// 1 kg/m^3 in g/cm^3.
pub fn density_si_to_cgs() -> f64 {
    use uom::si::mass_density::gram_per_cubic_centimeter;
    kg_per_m3(1.0).get::<gram_per_cubic_centimeter>()
}

/// 1 Pa in dyn/cm^2.
pub fn pressure_si_to_cgs() -> f64 {
    use uom::si::pressure::dyne_per_square_centimeter;
    pa(1.0).get::<dyne_per_square_centimeter>()
}

/// 1 J/kg in erg/g.
pub fn specific_energy_si_to_cgs() -> f64 {
    use uom::si::energy::{erg, joule};
    use uom::si::mass::{gram, kilogram};
    let e = Energy::new::<joule>(1.0).get::<erg>();
    let m = Mass::new::<kilogram>(1.0).get::<gram>();
    e / m
}

/// Scaling from SI user units into the CGS working units.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitFactors {
    pub rho: f64,
    pub sie: f64,
    pub temp: f64,
}

impl UnitFactors {
    pub const IDENTITY: Self = Self {
        rho: 1.0,
        sie: 1.0,
        temp: 1.0,
    };

    pub fn si_to_cgs() -> Self {
        Self {
            rho: density_si_to_cgs(),
            sie: specific_energy_si_to_cgs(),
            temp: 1.0,
        }
    }

    /// Pressure and energy density scale as `rho * sie`.
    pub fn press(&self) -> f64 {
        self.rho * self.sie
    }

    pub fn cv(&self) -> f64 {
        self.sie / self.temp
    }
}

pub mod constants {
    use super::*;

    /// Room temperature used for reference states, in K.
    pub const ROOM_TEMPERATURE: f64 = 293.0;

    /// Speed of light in vacuum, cm/s.
    pub fn speed_of_light_cgs() -> f64 {
        use uom::si::velocity::{centimeter_per_second, meter_per_second};
        Velocity::new::<meter_per_second>(299_792_458.0).get::<centimeter_per_second>()
    }

    /// Standard atmosphere, microbar.
    pub fn atmosphere_cgs() -> f64 {
        use uom::si::pressure::{atmosphere, dyne_per_square_centimeter};
        Pressure::new::<atmosphere>(1.0).get::<dyne_per_square_centimeter>()
    }
}
