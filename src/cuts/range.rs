use std::fmt::Display;

use log::debug;
use num_traits::PrimInt;
use strum::{Display, EnumString};

use crate::config::Properties;
use crate::error::{Error, Result};
use crate::units::{Dimension, DEGREE, KEV, MM, NS, PERCENT};

/// Kinds of physical quantities cuts select on
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Quantity {
    Angle,
    Probability,
    Energy,
    /// Non-negative length
    Distance,
    /// Signed length
    Offset,
    Time,
}

impl Quantity {
    pub fn dimension(self) -> Dimension {
        match self {
            Quantity::Angle => Dimension::Angle,
            Quantity::Probability => Dimension::Fraction,
            Quantity::Energy => Dimension::Energy,
            Quantity::Distance | Quantity::Offset => Dimension::Length,
            Quantity::Time => Dimension::Time,
        }
    }

    /// Unit of values written without one
    pub fn default_unit(self) -> f64 {
        match self {
            Quantity::Angle => DEGREE,
            Quantity::Probability => PERCENT,
            Quantity::Energy => KEV,
            Quantity::Distance | Quantity::Offset => MM,
            Quantity::Time => NS,
        }
    }

    pub fn contains(self, value: f64) -> bool {
        match self {
            Quantity::Angle => (0. ..=360. * DEGREE).contains(&value),
            Quantity::Probability => (0. ..=1.).contains(&value),
            Quantity::Energy | Quantity::Distance => value >= 0.,
            Quantity::Offset | Quantity::Time => value.is_finite(),
        }
    }
}

/// How a range is applied to several values
#[derive(Display, EnumString, Copy, Clone, Default, Eq, PartialEq, Debug)]
pub enum RangePolicy {
    /// Stop at the first value out of range
    #[default]
    #[strum(to_string = "strict")]
    Strict,
    /// Check every value
    #[strum(to_string = "all")]
    All,
}

/// Inclusive bounds, each optional
#[derive(Copy, Clone, Default, PartialEq, Debug)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy + Display> Range<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    /// Require at least one bound and ordered bounds
    fn validated(self, name: &str) -> Result<Self> {
        match (self.min, self.max) {
            (None, None) => Err(Error::MissingBound(name.to_owned())),
            (Some(min), Some(max)) if min > max => Err(Error::InvertedRange(name.to_owned())),
            _ => Ok(self),
        }
    }

    /// Whether `value` lies within the bounds; NaN never does
    pub fn contains(&self, value: T) -> bool {
        if value.partial_cmp(&value).is_none() {
            return false;
        }
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }

    pub fn contains_all(&self, values: &[T], policy: RangePolicy) -> bool {
        match policy {
            RangePolicy::Strict => values.iter().all(|v| self.contains(*v)),
            RangePolicy::All => {
                let mut accepted = true;
                for v in values.iter().filter(|v| !self.contains(**v)) {
                    debug!("Value {v} out of range");
                    accepted = false;
                }
                accepted
            }
        }
    }
}

impl Range<f64> {
    /// Read `<name>.min` and `<name>.max`
    pub fn parse(config: &Properties, name: &str, quantity: Quantity) -> Result<Self> {
        let bound = |suffix: &str| -> Result<Option<f64>> {
            let key = format!("{name}.{suffix}");
            if !config.has_key(&key) {
                return Ok(None);
            }
            let value = config.fetch_quantity(&key, quantity.dimension(), quantity.default_unit())?;
            if !quantity.contains(value) {
                return Err(Error::OutOfRange { key, value });
            }
            Ok(Some(value))
        };
        Self::new(bound("min")?, bound("max")?).validated(name)
    }
}

impl<T: PrimInt + Display> Range<T> {
    /// Read integer bounds `<name>.min` and `<name>.max`
    pub fn parse_count(config: &Properties, name: &str) -> Result<Self> {
        let min = fetch_count(config, &format!("{name}.min"))?;
        let max = fetch_count(config, &format!("{name}.max"))?;
        Self::new(min, max).validated(name)
    }

    /// Integer bounds where a missing bound is zero
    pub fn parse_count_or_zero(config: &Properties, name: &str) -> Result<Self> {
        let min = fetch_count(config, &format!("{name}.min"))?.unwrap_or_else(T::zero);
        let max = fetch_count(config, &format!("{name}.max"))?.unwrap_or_else(T::zero);
        Self::new(Some(min), Some(max)).validated(name)
    }
}

fn fetch_count<T: PrimInt>(config: &Properties, key: &str) -> Result<Option<T>> {
    if !config.has_key(key) {
        return Ok(None);
    }
    let value = config.fetch_integer(key)?;
    let out_of_range = || Error::OutOfRange {
        key: key.to_owned(),
        value: value as f64,
    };
    if value < 0 {
        return Err(out_of_range());
    }
    T::from(value).map(Some).ok_or_else(out_of_range)
}

/// Checks requested on one quantity
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Check<T> {
    pub has: bool,
    pub range: Option<Range<T>>,
    pub policy: RangePolicy,
}

impl<T: PartialOrd + Copy + Display> Check<T> {
    pub fn is_active(&self) -> bool {
        self.has || self.range.is_some()
    }

    /// Presence and range checks on the values of the quantity
    ///
    /// The range check is `None` if the quantity is not available.
    pub fn evaluate(&self, name: &str, values: Option<&[T]>) -> Vec<Option<bool>> {
        let values = values.filter(|v| !v.is_empty());
        let mut checks = Vec::new();
        if self.has {
            if values.is_none() {
                debug!("Missing {name}");
            }
            checks.push(Some(values.is_some()));
        }
        if let Some(range) = &self.range {
            let check = values.map(|v| range.contains_all(v, self.policy));
            if check == Some(false) {
                debug!("{name} out of range");
            }
            checks.push(check);
        }
        checks
    }
}

fn read_flags(config: &Properties, name: &str) -> (bool, bool) {
    (
        config.has_flag(&format!("mode.has_{name}")),
        config.has_flag(&format!("mode.range_{name}")),
    )
}

impl Check<f64> {
    pub fn parse(config: &Properties, name: &str, quantity: Quantity) -> Result<Self> {
        let (has, range) = read_flags(config, name);
        let range = if range {
            Some(Range::parse(config, &format!("range_{name}"), quantity)?)
        } else {
            None
        };
        Ok(Self {
            has,
            range,
            policy: RangePolicy::Strict,
        })
    }

    /// Like `parse`, with a mandatory `range_<name>.mode` policy
    pub fn parse_with_policy(config: &Properties, name: &str, quantity: Quantity) -> Result<Self> {
        let mut check = Self::parse(config, name, quantity)?;
        if check.range.is_some() {
            let key = format!("range_{name}.mode");
            let mode = config.fetch_string(&key)?;
            check.policy = mode.parse().map_err(|_| Error::UnknownRangePolicy {
                key,
                mode: mode.to_owned(),
            })?;
        }
        Ok(check)
    }
}

impl<T: PrimInt + Display> Check<T> {
    pub fn parse_count(config: &Properties, name: &str) -> Result<Self> {
        let (has, range) = read_flags(config, name);
        let range = if range {
            Some(Range::parse_count(config, &format!("range_{name}"))?)
        } else {
            None
        };
        Ok(Self {
            has,
            range,
            policy: RangePolicy::Strict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bounds() {
        let range = Range::new(Some(1.), None);
        assert!(range.contains(1.));
        assert!(!range.contains(0.5));
        assert!(!range.contains(f64::NAN));
        assert!(!Range::new(None, Some(1.)).contains_all(&[0.5, f64::NAN], RangePolicy::Strict));
        let range = Range::new(None, Some(3));
        assert!(range.contains(3));
        assert!(!range.contains(4));
        assert!(range.contains_all(&[1, 2], RangePolicy::All));
        assert!(!range.contains_all(&[1, 5, 2], RangePolicy::All));
        assert!(!range.contains_all(&[5, 1], RangePolicy::Strict));
    }

    #[test]
    fn parse_units() {
        let config = Properties::new()
            .with("range_p.min", 4.)
            .with("range_p.max", "0.5")
            .with("range_e.min", "1 MeV")
            .with("range_a.max", 400.);
        let p = Range::parse(&config, "range_p", Quantity::Probability);
        assert!(matches!(p, Err(Error::InvertedRange(_))));
        let e = Range::parse(&config, "range_e", Quantity::Energy).unwrap();
        assert_relative_eq!(e.min.unwrap(), 1.);
        assert_eq!(e.max, None);
        assert!(matches!(
            Range::parse(&config, "range_a", Quantity::Angle),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(
            Range::parse(&config, "range_x", Quantity::Distance),
            Err(Error::MissingBound(name)) if name == "range_x"
        ));
        assert!(Range::parse(&config, "range_e", Quantity::Distance).is_err());
    }

    #[test]
    fn parse_counts() {
        let config = Properties::new()
            .with("range_gamma.min", 1)
            .with("electron_range.max", 2)
            .with("alpha_range.min", -1);
        let gammas = Range::<usize>::parse_count(&config, "range_gamma").unwrap();
        assert_eq!(gammas, Range::new(Some(1), None));
        let electrons = Range::<usize>::parse_count_or_zero(&config, "electron_range").unwrap();
        assert_eq!(electrons, Range::new(Some(0), Some(2)));
        let positrons = Range::<usize>::parse_count_or_zero(&config, "positron_range").unwrap();
        assert_eq!(positrons, Range::new(Some(0), Some(0)));
        assert!(Range::<usize>::parse_count_or_zero(&config, "alpha_range").is_err());
    }

    #[test]
    fn checks() {
        let config = Properties::new()
            .with("mode.has_x", true)
            .with("mode.range_x", true)
            .with("range_x.max", 50.)
            .with("range_x.mode", "all");
        let check = Check::parse_with_policy(&config, "x", Quantity::Probability).unwrap();
        assert!(check.is_active());
        assert_eq!(check.policy, RangePolicy::All);
        assert_eq!(check.evaluate("x", Some(&[0.1, 0.4][..])), [Some(true), Some(true)]);
        assert_eq!(check.evaluate("x", Some(&[0.1, 0.6][..])), [Some(true), Some(false)]);
        assert_eq!(check.evaluate("x", None), [Some(false), None]);
        assert_eq!(check.evaluate("x", Some(&[][..])), [Some(false), None]);

        let config = config.with("range_x.mode", "any");
        assert!(matches!(
            Check::parse_with_policy(&config, "x", Quantity::Probability),
            Err(Error::UnknownRangePolicy { .. })
        ));
        let config = Properties::new().with("mode.range_x", true).with("range_x.min", 1.);
        assert!(matches!(
            Check::parse_with_policy(&config, "x", Quantity::Probability),
            Err(Error::MissingProperty(_))
        ));
        assert!(!Check::<f64>::parse(&Properties::new(), "x", Quantity::Angle).unwrap().is_active());
    }
}
