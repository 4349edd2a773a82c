// pn-core/src/units.rs

//! Explicit unit conversion for result tables.
//!
//! Engine results come back in engine-native units with a units row pinned at
//! the top of each table. Conversion only happens when a caller supplies an
//! explicit `variable -> (from, to)` table; otherwise values pass through.

use crate::error::{CoreError, CoreResult};
use crate::table::{Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uom::si::f64::{
    Length as UomLength, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature, Velocity as UomVelocity,
};

pub type Length = UomLength;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;
pub type Velocity = UomVelocity;

/// Standard atmosphere, used to move between absolute and gauge pressure.
pub const ATMOSPHERE_PA: f64 = 101_325.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Dimension {
    Pressure,
    Temperature,
    Length,
    Velocity,
    PressureGradient,
}

#[derive(Clone, Copy, Debug)]
struct ParsedUnit {
    dimension: Dimension,
    gauge: bool,
}

fn parse_unit(unit: &str) -> CoreResult<ParsedUnit> {
    let dim = |dimension| ParsedUnit {
        dimension,
        gauge: false,
    };
    let parsed = match unit.trim() {
        "psia" | "psi" | "bara" | "bar" | "kPa" | "kPaa" | "Pa" | "MPa" => dim(Dimension::Pressure),
        "psig" | "barg" | "kPag" => ParsedUnit {
            dimension: Dimension::Pressure,
            gauge: true,
        },
        "degF" | "degC" | "K" => dim(Dimension::Temperature),
        "ft" | "m" | "km" | "in" | "mm" | "mi" => dim(Dimension::Length),
        "ft/s" | "m/s" => dim(Dimension::Velocity),
        "psi/ft" | "bar/100m" | "bar/m" | "Pa/m" | "kPa/m" => dim(Dimension::PressureGradient),
        other => {
            return Err(CoreError::UnknownUnit {
                unit: other.to_string(),
            });
        }
    };
    Ok(parsed)
}

fn pressure_in(unit: &str, v: f64) -> Pressure {
    use uom::si::pressure::{bar, kilopascal, megapascal, pascal, pound_force_per_square_inch};
    match unit {
        "psia" | "psi" | "psig" => Pressure::new::<pound_force_per_square_inch>(v),
        "bara" | "bar" | "barg" => Pressure::new::<bar>(v),
        "kPa" | "kPaa" | "kPag" => Pressure::new::<kilopascal>(v),
        "MPa" => Pressure::new::<megapascal>(v),
        _ => Pressure::new::<pascal>(v),
    }
}

fn pressure_out(unit: &str, p: Pressure) -> f64 {
    use uom::si::pressure::{bar, kilopascal, megapascal, pascal, pound_force_per_square_inch};
    match unit {
        "psia" | "psi" | "psig" => p.get::<pound_force_per_square_inch>(),
        "bara" | "bar" | "barg" => p.get::<bar>(),
        "kPa" | "kPaa" | "kPag" => p.get::<kilopascal>(),
        "MPa" => p.get::<megapascal>(),
        _ => p.get::<pascal>(),
    }
}

fn length_in(unit: &str, v: f64) -> Length {
    use uom::si::length::{foot, inch, kilometer, meter, mile, millimeter};
    match unit {
        "ft" => Length::new::<foot>(v),
        "km" => Length::new::<kilometer>(v),
        "in" => Length::new::<inch>(v),
        "mm" => Length::new::<millimeter>(v),
        "mi" => Length::new::<mile>(v),
        _ => Length::new::<meter>(v),
    }
}

fn length_out(unit: &str, l: Length) -> f64 {
    use uom::si::length::{foot, inch, kilometer, meter, mile, millimeter};
    match unit {
        "ft" => l.get::<foot>(),
        "km" => l.get::<kilometer>(),
        "in" => l.get::<inch>(),
        "mm" => l.get::<millimeter>(),
        "mi" => l.get::<mile>(),
        _ => l.get::<meter>(),
    }
}

/// Pa per metre represented by one unit of the gradient label.
fn gradient_factor(unit: &str) -> f64 {
    use uom::si::pressure::pascal;
    let (p, l) = match unit {
        "psi/ft" => (pressure_in("psi", 1.0), length_in("ft", 1.0)),
        "bar/100m" => (pressure_in("bar", 1.0), length_in("m", 100.0)),
        "bar/m" => (pressure_in("bar", 1.0), length_in("m", 1.0)),
        "kPa/m" => (pressure_in("kPa", 1.0), length_in("m", 1.0)),
        _ => (pressure_in("Pa", 1.0), length_in("m", 1.0)),
    };
    p.get::<pascal>() / l.get::<uom::si::length::meter>()
}

/// Convert `value` from one unit label to another.
///
/// Gauge labels (`psig`, `barg`, `kPag`) are offset by one standard atmosphere.
pub fn convert(value: f64, from: &str, to: &str) -> CoreResult<f64> {
    let src = parse_unit(from)?;
    let dst = parse_unit(to)?;
    if src.dimension != dst.dimension {
        return Err(CoreError::IncompatibleUnits {
            from: from.trim().to_string(),
            to: to.trim().to_string(),
        });
    }
    let (from, to) = (from.trim(), to.trim());

    let out = match src.dimension {
        Dimension::Pressure => {
            use uom::si::pressure::pascal;
            let mut abs = pressure_in(from, value);
            if src.gauge {
                abs += Pressure::new::<pascal>(ATMOSPHERE_PA);
            }
            if dst.gauge {
                abs -= Pressure::new::<pascal>(ATMOSPHERE_PA);
            }
            pressure_out(to, abs)
        }
        Dimension::Temperature => {
            use uom::si::thermodynamic_temperature::{degree_celsius, degree_fahrenheit, kelvin};
            let t = match from {
                "degF" => Temperature::new::<degree_fahrenheit>(value),
                "degC" => Temperature::new::<degree_celsius>(value),
                _ => Temperature::new::<kelvin>(value),
            };
            match to {
                "degF" => t.get::<degree_fahrenheit>(),
                "degC" => t.get::<degree_celsius>(),
                _ => t.get::<kelvin>(),
            }
        }
        Dimension::Length => length_out(to, length_in(from, value)),
        Dimension::Velocity => {
            use uom::si::velocity::{foot_per_second, meter_per_second};
            let v = match from {
                "ft/s" => Velocity::new::<foot_per_second>(value),
                _ => Velocity::new::<meter_per_second>(value),
            };
            match to {
                "ft/s" => v.get::<foot_per_second>(),
                _ => v.get::<meter_per_second>(),
            }
        }
        Dimension::PressureGradient => value * gradient_factor(from) / gradient_factor(to),
    };
    Ok(out)
}

/// Explicit per-variable conversions: column name -> (from unit, to unit).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitConversions {
    entries: BTreeMap<String, (String, String)>,
}

impl UnitConversions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, variable: &str, from: &str, to: &str) -> Self {
        self.entries
            .insert(variable.to_string(), (from.to_string(), to.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every label up front so a bad table fails before any run.
    pub fn validate(&self) -> CoreResult<()> {
        for (from, to) in self.entries.values() {
            convert(0.0, from, to)?;
        }
        Ok(())
    }

    /// Convert the named columns of a result table in place.
    ///
    /// Row 0 must be the units row. A column whose unit cell does not match
    /// the declared source unit is left alone with a warning.
    pub fn apply(&self, table: &mut Table) -> CoreResult<()> {
        if self.entries.is_empty() || table.is_empty() {
            return Ok(());
        }
        for (variable, (from, to)) in &self.entries {
            let Some(current) = table.cell(0, variable).cloned() else {
                tracing::debug!(variable = %variable, "conversion column not in table");
                continue;
            };
            if let Some(unit) = current.label()
                && unit != from.trim()
            {
                tracing::warn!(
                    variable = %variable,
                    expected = %from,
                    found = %unit,
                    "unit row does not match conversion source; column left unconverted"
                );
                continue;
            }
            for row in 1..table.len() {
                let Some(v) = table.cell(row, variable).and_then(Value::as_f64) else {
                    continue;
                };
                table.set_cell(row, variable, Value::Number(convert(v, from, to)?));
            }
            table.set_cell(0, variable, Value::from(to.trim()));
        }
        Ok(())
    }
}
