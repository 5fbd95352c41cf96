//! Classification of events and construction of their topology pattern
use std::collections::BTreeMap;

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::builders::TopologyBuilder;
use crate::config::Properties;
use crate::drivers::{Locator, MeasurementDrivers};
use crate::error::{Error, Result};
use crate::event::{Bank, EventRecord, PTD_LABEL, TD_LABEL};
use crate::particle::{ParticleKind, ParticleTrack, TrackLabel};
use crate::pattern::{PatternKind, TopologyData};

lazy_static! {
    static ref ELECTRON_GAMMAS: Regex = Regex::new(r"^1e[0-9]+g$").unwrap();
    static ref TWO_ELECTRONS_GAMMAS: Regex = Regex::new(r"^2e[0-9]+g$").unwrap();
}

const NAME: &str = "topology driver";

/// Builds the topology data of events from their particle tracks
pub struct TopologyDriver {
    initialized: bool,
    ptd_label: String,
    td_label: String,
    drivers: MeasurementDrivers,
    locator: Option<Locator>,
}

impl Default for TopologyDriver {
    fn default() -> Self {
        Self {
            initialized: false,
            ptd_label: PTD_LABEL.to_owned(),
            td_label: TD_LABEL.to_owned(),
            drivers: MeasurementDrivers::default(),
            locator: None,
        }
    }
}

impl TopologyDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry lookup handed to the drivers that need it
    pub fn set_locator(&mut self, locator: Locator) {
        self.locator = Some(locator);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn initialize(&mut self, config: &Properties) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized(NAME.to_owned()));
        }
        if config.has_key("PTD_label") {
            self.ptd_label = config.fetch_string("PTD_label")?.to_owned();
        }
        if config.has_key("TD_label") {
            self.td_label = config.fetch_string("TD_label")?.to_owned();
        }
        self.drivers = MeasurementDrivers::from_config(config, self.locator.clone())?;
        self.initialized = true;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.ptd_label = PTD_LABEL.to_owned();
        self.td_label = TD_LABEL.to_owned();
        self.drivers = MeasurementDrivers::default();
        self.initialized = false;
    }

    pub fn drivers(&self) -> &MeasurementDrivers {
        &self.drivers
    }

    /// Add the topology data of an event to its record
    pub fn process(&self, record: &mut EventRecord) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized(NAME.to_owned()));
        }
        let Some(ptd) = record.particle_tracks(&self.ptd_label) else {
            warn!("Event record has no '{}' bank", self.ptd_label);
            return Ok(());
        };
        let data = self.build(&ptd.tracks)?;
        if record.insert(self.td_label.clone(), Bank::Topology(data)).is_some() {
            debug!("Replaced existing '{}' bank", self.td_label);
        }
        Ok(())
    }

    pub fn build(&self, tracks: &[ParticleTrack]) -> Result<TopologyData> {
        let classification = classify(tracks.iter().map(|t| t.kind()));
        debug!("Event classification: '{classification}'");
        let Some(kind) = pattern_kind(&classification) else {
            warn!("No topology pattern for classification '{classification}'");
            return Ok(TopologyData {
                classification,
                pattern: None,
            });
        };
        let builder = TopologyBuilder::new(kind, &self.drivers);
        let mut pattern = builder.create_pattern();
        for (label, track) in label_tracks(tracks) {
            pattern.add_track(label, track.clone());
        }
        builder.build_measurement_dictionary(&mut pattern)?;
        Ok(TopologyData {
            classification,
            pattern: Some(pattern),
        })
    }
}

/// Label tracks per particle kind, in track order
///
/// Tracks of undefined kind are not labelled.
pub fn label_tracks(tracks: &[ParticleTrack]) -> BTreeMap<TrackLabel, &ParticleTrack> {
    let mut counts: BTreeMap<ParticleKind, usize> = BTreeMap::new();
    let mut labelled = BTreeMap::new();
    for track in tracks {
        let kind = track.kind();
        if kind == ParticleKind::Undefined {
            debug!("Skipping track of undefined kind");
            continue;
        }
        let count = counts.entry(kind).or_default();
        *count += 1;
        labelled.insert(TrackLabel::new(kind, *count), track);
    }
    labelled
}

/// Particle counts written as e.g. `2e1g`, with `X` for undefined kinds
pub fn classify(kinds: impl IntoIterator<Item = ParticleKind>) -> String {
    let mut counts: BTreeMap<ParticleKind, usize> = BTreeMap::new();
    for kind in kinds {
        *counts.entry(kind).or_default() += 1;
    }
    let mut classification = String::new();
    for kind in [
        ParticleKind::Electron,
        ParticleKind::Positron,
        ParticleKind::Gamma,
        ParticleKind::Alpha,
        ParticleKind::Undefined,
    ] {
        let Some(n) = counts.get(&kind) else {
            continue;
        };
        let prefix = kind.label_prefix().unwrap_or('X');
        classification.push_str(&format!("{n}{prefix}"));
    }
    classification
}

pub fn pattern_kind(classification: &str) -> Option<PatternKind> {
    use PatternKind::*;
    match classification {
        "1e" => Some(OneElectron),
        "1e1p" => Some(ElectronPositron),
        "1e1a" => Some(ElectronAlpha),
        "2e" => Some(TwoElectrons),
        "2p" => Some(TwoPositrons),
        c if ELECTRON_GAMMAS.is_match(c) => Some(ElectronGammas),
        c if TWO_ELECTRONS_GAMMAS.is_match(c) => Some(TwoElectronsGammas),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ParticleTrackData;
    use crate::measurement::MeasurementKey;

    fn tracks(kinds: &[ParticleKind]) -> Vec<ParticleTrack> {
        kinds.iter().map(|k| ParticleTrack::new(*k)).collect()
    }

    #[test]
    fn classification() {
        use ParticleKind::*;
        let t = tracks(&[Gamma, Electron, Undefined, Gamma, Electron]);
        let labelled = label_tracks(&t);
        assert_eq!(
            labelled.keys().map(|l| l.to_string()).collect::<Vec<_>>(),
            ["e1", "e2", "g1", "g2"]
        );
        assert_eq!(classify(t.iter().map(|t| t.kind())), "2e2g1X");
        assert_eq!(classify([Gamma, Electron, Electron]), "2e1g");
        assert_eq!(classify([Undefined]), "1X");
        assert_eq!(classify([]), "");

        assert_eq!(pattern_kind("1e"), Some(PatternKind::OneElectron));
        assert_eq!(pattern_kind("1e3g"), Some(PatternKind::ElectronGammas));
        assert_eq!(pattern_kind("2e12g"), Some(PatternKind::TwoElectronsGammas));
        assert_eq!(pattern_kind("2e1p"), None);
        assert_eq!(pattern_kind("1eg"), None);
    }

    #[test]
    fn process() {
        let mut driver = TopologyDriver::new();
        let mut record = EventRecord::new();
        assert!(matches!(driver.process(&mut record), Err(Error::NotInitialized(_))));

        let config = Properties::new().with("drivers", vec!["ED"]);
        driver.initialize(&config).unwrap();
        assert!(driver.initialize(&config).is_err());

        driver.process(&mut record).unwrap();
        assert!(!record.has(TD_LABEL));

        let t = tracks(&[ParticleKind::Electron, ParticleKind::Electron]);
        record.insert(PTD_LABEL, ParticleTrackData::new(t));
        driver.process(&mut record).unwrap();
        let td = record.topology(TD_LABEL).unwrap();
        assert_eq!(td.classification, "2e");
        let pattern = td.pattern.as_ref().unwrap();
        assert_eq!(pattern.kind(), PatternKind::TwoElectrons);
        let key: MeasurementKey = "energy_e2".parse().unwrap();
        assert!(pattern.has_measurement(&key));
        assert!(!pattern.measurement(&key).unwrap().is_valid());

        let t = tracks(&[ParticleKind::Alpha, ParticleKind::Alpha]);
        record.insert(PTD_LABEL, ParticleTrackData::new(t));
        driver.process(&mut record).unwrap();
        let td = record.topology(TD_LABEL).unwrap();
        assert_eq!(td.classification, "2a");
        assert!(!td.has_pattern());
    }

    #[test]
    fn undefined_tracks() {
        use ParticleKind::*;
        let mut driver = TopologyDriver::new();
        driver
            .initialize(&Properties::new().with("drivers", vec!["ED"]))
            .unwrap();
        let td = driver.build(&tracks(&[Electron, Electron, Undefined])).unwrap();
        assert_eq!(td.classification, "2e1X");
        assert!(!td.has_pattern());
        let td = driver.build(&tracks(&[Electron, Electron])).unwrap();
        assert_eq!(td.classification, "2e");
        assert!(td.has_pattern());
    }

    #[test]
    fn labels() {
        let mut driver = TopologyDriver::new();
        let config = Properties::new()
            .with("PTD_label", "tracks")
            .with("TD_label", "topology");
        driver.initialize(&config).unwrap();
        let mut record = EventRecord::new();
        record.insert("tracks", ParticleTrackData::new(tracks(&[ParticleKind::Electron])));
        driver.process(&mut record).unwrap();
        assert!(record.topology("topology").unwrap().has_pattern());
        driver.reset();
        assert!(!driver.is_initialized());
    }
}
