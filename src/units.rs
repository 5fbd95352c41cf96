//! Physical units
//!
//! Quantities are stored internally in mm, ns, MeV, degree and
//! fractions (probabilities in [0, 1]).
use std::collections::HashMap;
use std::f64::consts::PI;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{Error, Result};

pub const MM: f64 = 1.;
pub const CM: f64 = 10. * MM;
pub const NS: f64 = 1.;
pub const MEV: f64 = 1.;
pub const KEV: f64 = 1e-3 * MEV;
pub const DEGREE: f64 = 1.;
pub const PERCENT: f64 = 0.01;

/// Speed of light in mm/ns
pub const C_LIGHT: f64 = 299.792458 * MM / NS;

#[derive(
    Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize,
)]
pub enum Dimension {
    #[strum(to_string = "angle")]
    Angle,
    #[strum(to_string = "length")]
    Length,
    #[strum(to_string = "time")]
    Time,
    #[strum(to_string = "energy")]
    Energy,
    #[strum(to_string = "fraction")]
    Fraction,
}

lazy_static! {
    static ref UNITS: HashMap<&'static str, (Dimension, f64)> = {
        use Dimension::*;
        HashMap::from([
            ("degree", (Angle, DEGREE)),
            ("deg", (Angle, DEGREE)),
            ("rad", (Angle, 180. / PI * DEGREE)),
            ("mrad", (Angle, 0.18 / PI * DEGREE)),
            ("um", (Length, 1e-3 * MM)),
            ("mm", (Length, MM)),
            ("cm", (Length, CM)),
            ("m", (Length, 1e3 * MM)),
            ("ps", (Time, 1e-3 * NS)),
            ("ns", (Time, NS)),
            ("us", (Time, 1e3 * NS)),
            ("ms", (Time, 1e6 * NS)),
            ("s", (Time, 1e9 * NS)),
            ("eV", (Energy, 1e-6 * MEV)),
            ("keV", (Energy, KEV)),
            ("MeV", (Energy, MEV)),
            ("GeV", (Energy, 1e3 * MEV)),
            ("%", (Fraction, PERCENT)),
            ("percent", (Fraction, PERCENT)),
            ("perCent", (Fraction, PERCENT)),
        ])
    };
}

/// Look up the dimension and scale of a unit symbol
pub fn unit(symbol: &str) -> Result<(Dimension, f64)> {
    UNITS
        .get(symbol)
        .copied()
        .ok_or_else(|| Error::UnknownUnit(symbol.to_owned()))
}

/// Split a quantity like "30 degree" or "4%" into value and unit
pub fn parse_quantity(s: &str) -> Result<(f64, Option<&str>)> {
    let s = s.trim();
    let split = s
        .find(|c: char| {
            c.is_whitespace() || c == '%' || (c.is_alphabetic() && c != 'e' && c != 'E')
        })
        .unwrap_or(s.len());
    let (value, unit) = s.split_at(split);
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidQuantity(s.to_owned()))?;
    let unit = unit.trim();
    if unit.is_empty() {
        Ok((value, None))
    } else {
        Ok((value, Some(unit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantities() {
        assert_eq!(parse_quantity("30 degree").unwrap(), (30., Some("degree")));
        assert_eq!(parse_quantity("4%").unwrap(), (4., Some("%")));
        assert_eq!(parse_quantity(" 1e-3 ").unwrap(), (1e-3, None));
        assert_eq!(parse_quantity("2.5 keV").unwrap(), (2.5, Some("keV")));
        assert!(parse_quantity("many").is_err());
    }

    #[test]
    fn unit_table() {
        let (dim, scale) = unit("cm").unwrap();
        assert_eq!(dim, Dimension::Length);
        assert_relative_eq!(scale, 10.);
        let (dim, scale) = unit("rad").unwrap();
        assert_eq!(dim, Dimension::Angle);
        assert_relative_eq!(scale, 57.29577951308232);
        assert!(unit("furlong").is_err());
    }
}
