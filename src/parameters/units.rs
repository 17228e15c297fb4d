// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Physical units for registry values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Units understood by the parameter registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Nanosecond,
    Microsecond,
    Gigahertz,
    Megahertz,
    Millivolt,
    Volt,
    Dbm,
    Radian,
    Degree,
    Dimensionless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Time,
    Frequency,
    Voltage,
    Power,
    Angle,
    None,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Nanosecond => "ns",
            Unit::Microsecond => "us",
            Unit::Gigahertz => "GHz",
            Unit::Megahertz => "MHz",
            Unit::Millivolt => "mV",
            Unit::Volt => "V",
            Unit::Dbm => "dBm",
            Unit::Radian => "rad",
            Unit::Degree => "deg",
            Unit::Dimensionless => "",
        }
    }

    fn dimension(&self) -> Dimension {
        match self {
            Unit::Nanosecond | Unit::Microsecond => Dimension::Time,
            Unit::Gigahertz | Unit::Megahertz => Dimension::Frequency,
            Unit::Millivolt | Unit::Volt => Dimension::Voltage,
            Unit::Dbm => Dimension::Power,
            Unit::Radian | Unit::Degree => Dimension::Angle,
            Unit::Dimensionless => Dimension::None,
        }
    }

    /// Factor converting a value in this unit to the base unit of its
    /// dimension (ns, GHz, V, dBm, rad).
    fn to_base(&self) -> f64 {
        match self {
            Unit::Nanosecond => 1.0,
            Unit::Microsecond => 1e3,
            Unit::Gigahertz => 1.0,
            Unit::Megahertz => 1e-3,
            Unit::Millivolt => 1e-3,
            Unit::Volt => 1.0,
            Unit::Dbm => 1.0,
            Unit::Radian => 1.0,
            Unit::Degree => std::f64::consts::PI / 180.0,
            Unit::Dimensionless => 1.0,
        }
    }

    /// Whether values in `self` can be expressed in `other`.
    pub fn is_compatible(&self, other: Unit) -> bool {
        self.dimension() == other.dimension()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ns" => Ok(Unit::Nanosecond),
            "us" | "µs" => Ok(Unit::Microsecond),
            "GHz" => Ok(Unit::Gigahertz),
            "MHz" => Ok(Unit::Megahertz),
            "mV" => Ok(Unit::Millivolt),
            "V" => Ok(Unit::Volt),
            "dBm" => Ok(Unit::Dbm),
            "rad" => Ok(Unit::Radian),
            "deg" => Ok(Unit::Degree),
            "" => Ok(Unit::Dimensionless),
            other => Err(format!("unknown unit '{other}'")),
        }
    }
}

/// A value with a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Express this quantity in `unit`, or `None` if the dimensions differ.
    pub fn convert_to(&self, unit: Unit) -> Option<f64> {
        if !self.unit.is_compatible(unit) {
            return None;
        }
        Some(self.value * self.unit.to_base() / unit.to_base())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Unit::Dimensionless => write!(f, "{}", self.value),
            unit => write!(f, "{} {}", self.value, unit),
        }
    }
}

/// Parses `"6.5 GHz"`, `"-150MHz"`, `"1e-3 V"` or a bare number.
impl FromStr for Quantity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut split_points: Vec<usize> = s.char_indices().map(|(i, _)| i).collect();
        split_points.push(s.len());

        for &i in split_points.iter().rev() {
            let (number, unit) = s.split_at(i);
            if let (Ok(value), Ok(unit)) = (number.trim().parse::<f64>(), unit.parse::<Unit>()) {
                return Ok(Quantity { value, unit });
            }
        }
        Err(format!("cannot parse quantity '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_with_space() {
        let q: Quantity = "6.5 GHz".parse().unwrap();
        assert_eq!(q, Quantity::new(6.5, Unit::Gigahertz));
    }

    #[test]
    fn test_parse_without_space() {
        let q: Quantity = "-150MHz".parse().unwrap();
        assert_eq!(q, Quantity::new(-150.0, Unit::Megahertz));
        let q: Quantity = "5ns".parse().unwrap();
        assert_eq!(q, Quantity::new(5.0, Unit::Nanosecond));
    }

    #[test]
    fn test_parse_exponent() {
        let q: Quantity = "1e-3V".parse().unwrap();
        assert_eq!(q, Quantity::new(1e-3, Unit::Volt));
    }

    #[test]
    fn test_parse_bare_number() {
        let q: Quantity = "-0.02".parse().unwrap();
        assert_eq!(q, Quantity::new(-0.02, Unit::Dimensionless));
    }

    #[test]
    fn test_parse_garbage() {
        assert!("fast".parse::<Quantity>().is_err());
        assert!("12 parsecs".parse::<Quantity>().is_err());
    }

    #[test]
    fn test_convert() {
        assert_relative_eq!(
            Quantity::new(-150.0, Unit::Megahertz)
                .convert_to(Unit::Gigahertz)
                .unwrap(),
            -0.15
        );
        assert_relative_eq!(
            Quantity::new(100.0, Unit::Millivolt)
                .convert_to(Unit::Volt)
                .unwrap(),
            0.1
        );
        assert_relative_eq!(
            Quantity::new(2.0, Unit::Microsecond)
                .convert_to(Unit::Nanosecond)
                .unwrap(),
            2000.0
        );
        assert_relative_eq!(
            Quantity::new(180.0, Unit::Degree)
                .convert_to(Unit::Radian)
                .unwrap(),
            std::f64::consts::PI
        );
    }

    #[test]
    fn test_convert_incompatible() {
        assert!(Quantity::new(5.0, Unit::Nanosecond)
            .convert_to(Unit::Gigahertz)
            .is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Quantity::new(6.5, Unit::Gigahertz).to_string(), "6.5 GHz");
        assert_eq!(Quantity::new(0.5, Unit::Dimensionless).to_string(), "0.5");
    }
}
