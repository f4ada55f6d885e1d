use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::KinemaError;

/// Distance unit an actor's data is authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Millimeters,
    Centimeters,
    Decimeters,
    #[default]
    Meters,
    Kilometers,
    Inches,
    Feet,
    Yards,
    Miles,
}

impl UnitType {
    pub const ALL: [UnitType; 9] = [
        UnitType::Millimeters,
        UnitType::Centimeters,
        UnitType::Decimeters,
        UnitType::Meters,
        UnitType::Kilometers,
        UnitType::Inches,
        UnitType::Feet,
        UnitType::Yards,
        UnitType::Miles,
    ];

    /// Length of one unit in meters.
    #[must_use]
    pub fn meters_per_unit(self) -> f64 {
        match self {
            UnitType::Millimeters => 0.001,
            UnitType::Centimeters => 0.01,
            UnitType::Decimeters => 0.1,
            UnitType::Meters => 1.0,
            UnitType::Kilometers => 1000.0,
            UnitType::Inches => 0.0254,
            UnitType::Feet => 0.3048,
            UnitType::Yards => 0.9144,
            UnitType::Miles => 1609.344,
        }
    }

    /// Factor that converts a distance in `from` units into `to` units.
    #[must_use]
    pub fn conversion_factor(from: UnitType, to: UnitType) -> f64 {
        from.meters_per_unit() / to.meters_per_unit()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UnitType::Millimeters => "millimeters",
            UnitType::Centimeters => "centimeters",
            UnitType::Decimeters => "decimeters",
            UnitType::Meters => "meters",
            UnitType::Kilometers => "kilometers",
            UnitType::Inches => "inches",
            UnitType::Feet => "feet",
            UnitType::Yards => "yards",
            UnitType::Miles => "miles",
        }
    }

    #[must_use]
    pub fn abbreviation(self) -> &'static str {
        match self {
            UnitType::Millimeters => "mm",
            UnitType::Centimeters => "cm",
            UnitType::Decimeters => "dm",
            UnitType::Meters => "m",
            UnitType::Kilometers => "km",
            UnitType::Inches => "in",
            UnitType::Feet => "ft",
            UnitType::Yards => "yd",
            UnitType::Miles => "mi",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = KinemaError;

    /// Accepts the full name (singular or plural) or the abbreviation, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        UnitType::ALL
            .into_iter()
            .find(|unit| {
                let name = unit.as_str();
                lower == name || lower == unit.abbreviation() || Some(lower.as_str()) == name.strip_suffix('s')
            })
            .or_else(|| (lower == "foot").then_some(UnitType::Feet))
            .ok_or_else(|| KinemaError::UnknownUnitType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meters_to_centimeters() {
        let f = UnitType::conversion_factor(UnitType::Meters, UnitType::Centimeters);
        assert!((f - 100.0).abs() < 1e-9);
    }

    #[test]
    fn parse_names_and_abbreviations() {
        assert_eq!("cm".parse::<UnitType>().unwrap(), UnitType::Centimeters);
        assert_eq!("Meter".parse::<UnitType>().unwrap(), UnitType::Meters);
        assert_eq!("foot".parse::<UnitType>().unwrap(), UnitType::Feet);
        assert!("parsec".parse::<UnitType>().is_err());
    }
}
