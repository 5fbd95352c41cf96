//! Topology patterns and the measurements attached to them
use std::collections::BTreeMap;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{Error, Result};
use crate::measurement::{Measurement, MeasurementKey, MeasurementKind};
use crate::particle::{ParticleKind, ParticleTrack, TrackLabel};

#[derive(
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Serialize,
)]
pub enum PatternKind {
    #[strum(to_string = "1e")]
    #[serde(rename = "1e")]
    OneElectron,
    #[strum(to_string = "1e1p")]
    #[serde(rename = "1e1p")]
    ElectronPositron,
    #[strum(to_string = "1e1a")]
    #[serde(rename = "1e1a")]
    ElectronAlpha,
    #[strum(to_string = "1eNg")]
    #[serde(rename = "1eNg")]
    ElectronGammas,
    #[strum(to_string = "2e")]
    #[serde(rename = "2e")]
    TwoElectrons,
    #[strum(to_string = "2eNg")]
    #[serde(rename = "2eNg")]
    TwoElectronsGammas,
    #[strum(to_string = "2p")]
    #[serde(rename = "2p")]
    TwoPositrons,
}

impl PatternKind {
    pub fn pattern_id(self) -> &'static str {
        self.into()
    }

    /// The two charged tracks the pairwise observables refer to
    pub fn charged_pair(self) -> Option<(TrackLabel, TrackLabel)> {
        use PatternKind::*;
        let e1 = TrackLabel::electron(1);
        match self {
            OneElectron | ElectronGammas => None,
            ElectronPositron => Some((e1, TrackLabel::positron(1))),
            ElectronAlpha => Some((e1, TrackLabel::alpha(1))),
            TwoElectrons | TwoElectronsGammas => Some((e1, TrackLabel::electron(2))),
            TwoPositrons => Some((TrackLabel::positron(1), TrackLabel::positron(2))),
        }
    }

    pub fn has_gammas(self) -> bool {
        matches!(self, PatternKind::ElectronGammas | PatternKind::TwoElectronsGammas)
    }
}

/// Derived quantities channel cuts select on
#[derive(Display, EnumIter, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Observable {
    #[strum(to_string = "internal_probability")]
    InternalProbability,
    #[strum(to_string = "external_probability")]
    ExternalProbability,
    #[strum(to_string = "vertices_probability")]
    VerticesProbability,
    #[strum(to_string = "angle")]
    Angle,
    #[strum(to_string = "minimal_energy")]
    MinimalEnergy,
    #[strum(to_string = "maximal_energy")]
    MaximalEnergy,
    #[strum(to_string = "energy_sum")]
    EnergySum,
    #[strum(to_string = "energy_difference")]
    EnergyDifference,
    #[strum(to_string = "delta_vertices_y")]
    DeltaVerticesY,
    #[strum(to_string = "delta_vertices_z")]
    DeltaVerticesZ,
    #[strum(to_string = "alpha_delayed_time")]
    AlphaDelayedTime,
}

/// The classified shape of an event with its labelled tracks and measurements
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct TopologyPattern {
    kind: PatternKind,
    tracks: BTreeMap<TrackLabel, ParticleTrack>,
    measurements: BTreeMap<MeasurementKey, Measurement>,
    alpha_delayed_time: Option<f64>,
}

impl TopologyPattern {
    pub fn new(kind: PatternKind) -> Self {
        Self {
            kind,
            tracks: BTreeMap::new(),
            measurements: BTreeMap::new(),
            alpha_delayed_time: None,
        }
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn pattern_id(&self) -> &'static str {
        self.kind.pattern_id()
    }

    pub fn add_track(&mut self, label: TrackLabel, track: ParticleTrack) {
        self.tracks.insert(label, track);
    }

    pub fn has_track(&self, label: TrackLabel) -> bool {
        self.tracks.contains_key(&label)
    }

    pub fn track(&self, label: TrackLabel) -> Result<&ParticleTrack> {
        self.tracks.get(&label).ok_or(Error::MissingTrack(label))
    }

    pub fn tracks(&self) -> &BTreeMap<TrackLabel, ParticleTrack> {
        &self.tracks
    }

    pub fn number_of_tracks(&self) -> usize {
        self.tracks.len()
    }

    pub fn number_of_gammas(&self) -> usize {
        self.tracks
            .keys()
            .filter(|l| l.kind == ParticleKind::Gamma)
            .count()
    }

    /// Add a measurement; existing measurements are never replaced
    pub fn insert_measurement(
        &mut self,
        key: MeasurementKey,
        measurement: impl Into<Measurement>,
    ) -> Result<()> {
        if self.measurements.contains_key(&key) {
            return Err(Error::DuplicateMeasurement(key));
        }
        self.measurements.insert(key, measurement.into());
        Ok(())
    }

    pub fn has_measurement(&self, key: &MeasurementKey) -> bool {
        self.measurements.contains_key(key)
    }

    pub fn measurement(&self, key: &MeasurementKey) -> Option<&Measurement> {
        self.measurements.get(key)
    }

    pub fn measurements(&self) -> &BTreeMap<MeasurementKey, Measurement> {
        &self.measurements
    }

    pub fn alpha_delayed_time(&self) -> Option<f64> {
        self.alpha_delayed_time
    }

    pub fn set_alpha_delayed_time(&mut self, time: f64) {
        self.alpha_delayed_time = Some(time);
    }

    fn pair_measurement(&self, kind: MeasurementKind) -> Option<&Measurement> {
        let (l1, l2) = self.kind.charged_pair()?;
        self.measurement(&MeasurementKey::pair(kind, l1, l2))
    }

    fn energy(&self, label: TrackLabel) -> Option<f64> {
        self.measurement(&MeasurementKey::single(MeasurementKind::Energy, label))?
            .as_energy()?
            .energy
    }

    fn pair_energies(&self) -> Option<(f64, f64)> {
        let (l1, l2) = self.kind.charged_pair()?;
        Some((self.energy(l1)?, self.energy(l2)?))
    }

    /// TOF measurements between charged tracks and gammas
    pub fn gamma_tof_measurements(&self) -> impl Iterator<Item = (&MeasurementKey, &Measurement)> + '_ {
        self.measurements.iter().filter(|(k, _)| {
            k.kind == MeasurementKind::Tof
                && k.labels().any(|l| l.kind == ParticleKind::Gamma)
        })
    }

    fn tof_probabilities(&self, internal: bool) -> Vec<f64> {
        let select = |m: &Measurement| {
            m.as_tof()
                .map(|tof| {
                    if internal {
                        tof.internal_probabilities.clone()
                    } else {
                        tof.external_probabilities.clone()
                    }
                })
                .unwrap_or_default()
        };
        if self.kind.has_gammas() {
            self.gamma_tof_measurements()
                .flat_map(|(_, m)| select(m))
                .collect()
        } else {
            self.pair_measurement(MeasurementKind::Tof)
                .map(select)
                .unwrap_or_default()
        }
    }

    /// All values of an observable, `None` if it is not available
    pub fn observable(&self, observable: Observable) -> Option<Vec<f64>> {
        use Observable::*;
        let values = match observable {
            InternalProbability => self.tof_probabilities(true),
            ExternalProbability => self.tof_probabilities(false),
            VerticesProbability => {
                let vertex = self.pair_measurement(MeasurementKind::Vertex)?.as_vertex()?;
                vec![vertex.probability?]
            }
            Angle => {
                let angle = self.pair_measurement(MeasurementKind::Angle)?.as_angle()?;
                vec![angle.angle?]
            }
            MinimalEnergy => {
                let (e1, e2) = self.pair_energies()?;
                vec![e1.min(e2)]
            }
            MaximalEnergy => {
                let (e1, e2) = self.pair_energies()?;
                vec![e1.max(e2)]
            }
            EnergySum => {
                let (e1, e2) = self.pair_energies()?;
                vec![e1 + e2]
            }
            EnergyDifference => {
                let (e1, e2) = self.pair_energies()?;
                vec![(e1 - e2).abs()]
            }
            DeltaVerticesY => {
                let dv = self
                    .pair_measurement(MeasurementKind::DeltaVertices)?
                    .as_delta_vertices()?;
                vec![dv.delta_y?]
            }
            DeltaVerticesZ => {
                let dv = self
                    .pair_measurement(MeasurementKind::DeltaVertices)?
                    .as_delta_vertices()?;
                vec![dv.delta_z?]
            }
            AlphaDelayedTime => vec![self.alpha_delayed_time?],
        };
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    /// First value of an observable
    pub fn value(&self, observable: Observable) -> Option<f64> {
        self.observable(observable)?.first().copied()
    }
}

/// Result of the topology reconstruction of one event
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct TopologyData {
    pub classification: String,
    pub pattern: Option<TopologyPattern>,
}

impl TopologyData {
    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{EnergyMeasurement, TofMeasurement, VertexMeasurement};
    use approx::assert_relative_eq;

    fn key(s: &str) -> MeasurementKey {
        s.parse().unwrap()
    }

    #[test]
    fn ids() {
        assert_eq!(PatternKind::ElectronGammas.pattern_id(), "1eNg");
        assert_eq!("2p".parse::<PatternKind>().unwrap(), PatternKind::TwoPositrons);
        assert!("3e".parse::<PatternKind>().is_err());
    }

    #[test]
    fn append_only() {
        let mut pattern = TopologyPattern::new(PatternKind::OneElectron);
        pattern
            .insert_measurement(key("energy_e1"), EnergyMeasurement::new(1.))
            .unwrap();
        assert!(matches!(
            pattern.insert_measurement(key("energy_e1"), EnergyMeasurement::new(2.)),
            Err(Error::DuplicateMeasurement(_))
        ));
        assert_eq!(
            pattern.measurement(&key("energy_e1")).unwrap().as_energy().unwrap().energy,
            Some(1.)
        );
        assert!(pattern.track(TrackLabel::electron(1)).is_err());
    }

    #[test]
    fn two_positron_observables() {
        let mut pattern = TopologyPattern::new(PatternKind::TwoPositrons);
        pattern
            .insert_measurement(key("energy_p1"), EnergyMeasurement::new(0.7))
            .unwrap();
        assert_eq!(pattern.observable(Observable::EnergySum), None);
        pattern
            .insert_measurement(key("energy_p2"), EnergyMeasurement::new(1.2))
            .unwrap();
        pattern
            .insert_measurement(
                key("tof_p1_p2"),
                TofMeasurement {
                    internal_probabilities: vec![0.4],
                    external_probabilities: vec![0.01],
                },
            )
            .unwrap();
        pattern
            .insert_measurement(
                key("vertex_p1_p2"),
                VertexMeasurement {
                    probability: Some(0.9),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_relative_eq!(pattern.value(Observable::MinimalEnergy).unwrap(), 0.7);
        assert_relative_eq!(pattern.value(Observable::MaximalEnergy).unwrap(), 1.2);
        assert_relative_eq!(pattern.value(Observable::EnergySum).unwrap(), 1.9);
        assert_relative_eq!(pattern.value(Observable::EnergyDifference).unwrap(), 0.5);
        assert_eq!(pattern.value(Observable::InternalProbability), Some(0.4));
        assert_eq!(pattern.value(Observable::ExternalProbability), Some(0.01));
        assert_eq!(pattern.value(Observable::VerticesProbability), Some(0.9));
        assert_eq!(pattern.value(Observable::Angle), None);
    }

    #[test]
    fn gamma_observables() {
        let mut pattern = TopologyPattern::new(PatternKind::ElectronGammas);
        pattern.add_track(TrackLabel::electron(1), ParticleTrack::new(ParticleKind::Electron));
        for n in 1..=2 {
            pattern.add_track(TrackLabel::gamma(n), ParticleTrack::new(ParticleKind::Gamma));
            pattern
                .insert_measurement(
                    key(&format!("tof_e1_g{n}")),
                    TofMeasurement {
                        internal_probabilities: vec![0.1 * n as f64],
                        external_probabilities: vec![0.01 * n as f64],
                    },
                )
                .unwrap();
        }
        assert_eq!(pattern.number_of_gammas(), 2);
        assert_eq!(pattern.number_of_tracks(), 3);
        assert_eq!(
            pattern.observable(Observable::InternalProbability),
            Some(vec![0.1, 0.2])
        );
        assert_eq!(
            pattern.observable(Observable::ExternalProbability),
            Some(vec![0.01, 0.02])
        );
        assert_eq!(pattern.observable(Observable::VerticesProbability), None);
    }
}
