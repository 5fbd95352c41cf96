//! Selection cuts on events and measurements
//!
//! Every cut is configured with a set of modes, read from boolean
//! properties `mode.has_X` and `mode.range_X`. A `has_X` mode requires
//! the quantity X to be available. A `range_X` mode compares X with the
//! bounds `range_X.min` and `range_X.max`, and makes the cut
//! inapplicable when X is not available.
mod angle;
mod catalog;
mod channel;
mod channel_pattern;
mod energy;
mod pid;
mod range;
mod tof;
mod topology_data;
mod vertices;

pub use angle::AngleMeasurementCut;
pub use catalog::CutCatalog;
pub use channel::ChannelCut;
pub use channel_pattern::ChannelPatternCut;
pub use energy::EnergyMeasurementCut;
pub use pid::PidCut;
pub use range::{Check, Quantity, Range, RangePolicy};
pub use tof::TofMeasurementCut;
pub use topology_data::TopologyDataCut;
pub use vertices::VerticesMeasurementCut;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use crate::config::Properties;
use crate::error::{Error, Result};
use crate::event::EventRecord;
use crate::measurement::Measurement;
use crate::pattern::PatternKind;

#[derive(Display, Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    #[strum(to_string = "accepted")]
    Accepted,
    #[strum(to_string = "rejected")]
    Rejected,
    #[strum(to_string = "inapplicable")]
    Inapplicable,
}

impl Verdict {
    /// Combine the outcomes of individual checks
    ///
    /// `None` marks a check that could not be applied.
    pub fn from_checks(checks: impl IntoIterator<Item = Option<bool>>) -> Self {
        let mut verdict = Verdict::Accepted;
        for check in checks {
            match check {
                None => return Verdict::Inapplicable,
                Some(false) => verdict = Verdict::Rejected,
                Some(true) => {}
            }
        }
        verdict
    }
}

/// What a cut is applied to
#[derive(Copy, Clone, Debug)]
pub enum CutData<'a> {
    Event(&'a EventRecord),
    Measurement(&'a Measurement),
}

impl<'a> CutData<'a> {
    pub fn event(self) -> Result<&'a EventRecord> {
        match self {
            CutData::Event(record) => Ok(record),
            _ => Err(Error::InvalidCutData("an event record")),
        }
    }

    pub fn measurement(self) -> Result<&'a Measurement> {
        match self {
            CutData::Measurement(m) => Ok(m),
            _ => Err(Error::InvalidCutData("a measurement")),
        }
    }
}

impl<'a> From<&'a EventRecord> for CutData<'a> {
    fn from(record: &'a EventRecord) -> Self {
        CutData::Event(record)
    }
}

impl<'a> From<&'a Measurement> for CutData<'a> {
    fn from(m: &'a Measurement) -> Self {
        CutData::Measurement(m)
    }
}

#[derive(
    Display, EnumIter, EnumString, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug,
)]
pub enum CutType {
    #[strum(to_string = "angle_measurement")]
    AngleMeasurement,
    #[strum(to_string = "energy_measurement")]
    EnergyMeasurement,
    #[strum(to_string = "tof_measurement")]
    TofMeasurement,
    #[strum(to_string = "vertices_measurement")]
    VerticesMeasurement,
    #[strum(to_string = "topology_data")]
    TopologyData,
    #[strum(to_string = "pid")]
    Pid,
    #[strum(to_string = "channel")]
    Channel,
    #[strum(to_string = "channel_1e1p")]
    Channel1e1p,
    #[strum(to_string = "channel_1eNg")]
    Channel1eNg,
    #[strum(to_string = "channel_2e")]
    Channel2e,
    #[strum(to_string = "channel_2eNg")]
    Channel2eNg,
    #[strum(to_string = "channel_2p")]
    Channel2p,
}

impl CutType {
    /// Whether the cut is applied to event records rather than measurements
    pub fn is_event_cut(self) -> bool {
        !matches!(
            self,
            CutType::AngleMeasurement
                | CutType::EnergyMeasurement
                | CutType::TofMeasurement
                | CutType::VerticesMeasurement
        )
    }

    /// Topology pattern selected by a channel cut
    pub fn channel_pattern(self) -> Option<PatternKind> {
        match self {
            CutType::Channel1e1p => Some(PatternKind::ElectronPositron),
            CutType::Channel1eNg => Some(PatternKind::ElectronGammas),
            CutType::Channel2e => Some(PatternKind::TwoElectrons),
            CutType::Channel2eNg => Some(PatternKind::TwoElectronsGammas),
            CutType::Channel2p => Some(PatternKind::TwoPositrons),
            _ => None,
        }
    }
}

pub trait Cut {
    fn cut_type(&self) -> CutType;

    fn is_initialized(&self) -> bool;

    fn initialize(&mut self, config: &Properties) -> Result<()>;

    fn reset(&mut self);

    fn accept(&self, data: CutData<'_>) -> Result<Verdict>;

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotInitialized(self.cut_type().to_string()))
        }
    }

    fn ensure_uninitialized(&self) -> Result<()> {
        if self.is_initialized() {
            Err(Error::AlreadyInitialized(self.cut_type().to_string()))
        } else {
            Ok(())
        }
    }
}

pub type SharedCut = Arc<dyn Cut + Send + Sync>;

/// Cuts registered so far, by name
pub type CutRegistry = BTreeMap<String, SharedCut>;

/// Create an uninitialized cut of the given type
pub fn create_cut(cut_type: CutType, registry: &CutRegistry) -> Result<Box<dyn Cut + Send + Sync>> {
    if let Some(kind) = cut_type.channel_pattern() {
        let cut = ChannelPatternCut::new(kind)
            .ok_or_else(|| Error::UnknownCutType(cut_type.to_string()))?;
        return Ok(Box::new(cut));
    }
    let cut: Box<dyn Cut + Send + Sync> = match cut_type {
        CutType::AngleMeasurement => Box::new(AngleMeasurementCut::new()),
        CutType::EnergyMeasurement => Box::new(EnergyMeasurementCut::new()),
        CutType::TofMeasurement => Box::new(TofMeasurementCut::new()),
        CutType::VerticesMeasurement => Box::new(VerticesMeasurementCut::new()),
        CutType::TopologyData => Box::new(TopologyDataCut::new()),
        CutType::Pid => Box::new(PidCut::new()),
        CutType::Channel => Box::new(ChannelCut::new(registry.clone())),
        _ => return Err(Error::UnknownCutType(cut_type.to_string())),
    };
    Ok(cut)
}

/// Fail unless at least one mode is set
pub(crate) fn require_mode(active: &[bool]) -> Result<()> {
    if active.iter().any(|a| *a) {
        Ok(())
    } else {
        Err(Error::MissingMode)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn verdicts() {
        assert_eq!(Verdict::from_checks([]), Verdict::Accepted);
        assert_eq!(Verdict::from_checks([Some(true), Some(true)]), Verdict::Accepted);
        assert_eq!(Verdict::from_checks([Some(false), Some(true)]), Verdict::Rejected);
        assert_eq!(Verdict::from_checks([Some(false), None]), Verdict::Inapplicable);
        assert_eq!(Verdict::Inapplicable.to_string(), "inapplicable");
    }

    #[test]
    fn cut_data() {
        let record = EventRecord::new();
        let m = Measurement::from(crate::measurement::AngleMeasurement::new(66.));
        assert!(CutData::from(&record).event().is_ok());
        assert!(matches!(
            CutData::from(&record).measurement(),
            Err(Error::InvalidCutData(_))
        ));
        assert!(CutData::from(&m).measurement().is_ok());
        assert!(CutData::from(&m).event().is_err());
    }

    #[test]
    fn types() {
        assert_eq!("channel_1eNg".parse::<CutType>().unwrap(), CutType::Channel1eNg);
        assert!(!CutType::TofMeasurement.is_event_cut());
        assert!(CutType::Pid.is_event_cut());
        assert!("topology".parse::<CutType>().is_err());
        assert_eq!(CutType::Channel2e.channel_pattern(), Some(PatternKind::TwoElectrons));
        assert_eq!(CutType::Channel.channel_pattern(), None);
        for cut_type in CutType::iter() {
            let cut = create_cut(cut_type, &CutRegistry::new()).unwrap();
            assert_eq!(cut.cut_type(), cut_type);
        }
    }
}
