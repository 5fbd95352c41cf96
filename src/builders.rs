//! Assembly of the measurements of each topology pattern
use log::{debug, warn};

use crate::drivers::MeasurementDrivers;
use crate::error::Result;
use crate::measurement::{Measurement, MeasurementKey, MeasurementKind};
use crate::particle::{ParticleTrack, TrackLabel};
use crate::pattern::{PatternKind, TopologyPattern};

/// Fills the measurements of one kind of topology pattern
///
/// Compound patterns first build the measurements of the pattern they
/// extend, e.g. `1e1p` starts from `1e`. A measurement is only created
/// when the driver computing it is configured.
pub struct TopologyBuilder<'a> {
    kind: PatternKind,
    drivers: &'a MeasurementDrivers,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(kind: PatternKind, drivers: &'a MeasurementDrivers) -> Self {
        Self { kind, drivers }
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn create_pattern(&self) -> TopologyPattern {
        TopologyPattern::new(self.kind)
    }

    pub fn build_measurement_dictionary(&self, pattern: &mut TopologyPattern) -> Result<()> {
        use PatternKind::*;
        debug!("Building measurements for topology {}", self.kind);
        match self.kind {
            OneElectron => self.build_1e(pattern),
            ElectronPositron => {
                self.build_1e(pattern)?;
                self.build_1e1p(pattern)
            }
            ElectronAlpha => {
                self.build_1e(pattern)?;
                self.build_1e1a(pattern)
            }
            ElectronGammas => {
                self.build_1e(pattern)?;
                self.build_1e_gammas(pattern)
            }
            TwoElectrons => self.build_2e(pattern),
            TwoElectronsGammas => {
                self.build_2e(pattern)?;
                self.build_2e_gammas(pattern)
            }
            TwoPositrons => self.build_2p(pattern),
        }
    }

    fn build_1e(&self, pattern: &mut TopologyPattern) -> Result<()> {
        let e1 = TrackLabel::electron(1);
        self.angle(pattern, e1)?;
        self.energy(pattern, e1)
    }

    fn build_1e1p(&self, pattern: &mut TopologyPattern) -> Result<()> {
        let (e1, p1) = (TrackLabel::electron(1), TrackLabel::positron(1));
        self.angle(pattern, p1)?;
        self.energy(pattern, p1)?;
        self.tof(pattern, e1, p1)?;
        self.delta_vertices(pattern, e1, p1)?;
        self.angle_pair(pattern, e1, p1)?;
        self.vertex(pattern, e1, p1)
    }

    fn build_1e1a(&self, pattern: &mut TopologyPattern) -> Result<()> {
        let (e1, a1) = (TrackLabel::electron(1), TrackLabel::alpha(1));
        self.angle(pattern, a1)?;
        self.angle_pair(pattern, e1, a1)?;
        self.delta_vertices(pattern, e1, a1)?;
        let delayed_time = pattern
            .track(a1)?
            .calorimeter_hits
            .iter()
            .map(|hit| hit.time)
            .reduce(f64::min);
        match delayed_time {
            Some(time) => pattern.set_alpha_delayed_time(time),
            None => debug!("Alpha track has no calorimeter hit"),
        }
        Ok(())
    }

    fn build_1e_gammas(&self, pattern: &mut TopologyPattern) -> Result<()> {
        let e1 = TrackLabel::electron(1);
        for g in gamma_labels(pattern, 1) {
            self.tof(pattern, e1, g)?;
            self.angle_pair(pattern, e1, g)?;
            self.energy(pattern, g)?;
        }
        Ok(())
    }

    fn build_2e(&self, pattern: &mut TopologyPattern) -> Result<()> {
        let (e1, e2) = (TrackLabel::electron(1), TrackLabel::electron(2));
        self.angle(pattern, e1)?;
        self.angle(pattern, e2)?;
        self.energy(pattern, e1)?;
        self.energy(pattern, e2)?;
        self.tof(pattern, e1, e2)?;
        self.vertex(pattern, e1, e2)?;
        self.angle_pair(pattern, e1, e2)?;
        self.delta_vertices(pattern, e1, e2)
    }

    fn build_2e_gammas(&self, pattern: &mut TopologyPattern) -> Result<()> {
        let (e1, e2) = (TrackLabel::electron(1), TrackLabel::electron(2));
        for g in gamma_labels(pattern, 2) {
            self.tof(pattern, e1, g)?;
            self.tof(pattern, e2, g)?;
            self.angle_pair(pattern, e1, g)?;
            self.angle_pair(pattern, e2, g)?;
            self.energy(pattern, g)?;
        }
        Ok(())
    }

    fn build_2p(&self, pattern: &mut TopologyPattern) -> Result<()> {
        let (p1, p2) = (TrackLabel::positron(1), TrackLabel::positron(2));
        self.energy(pattern, p1)?;
        self.energy(pattern, p2)?;
        self.tof(pattern, p1, p2)?;
        self.vertex(pattern, p1, p2)?;
        self.angle_pair(pattern, p1, p2)
    }

    fn angle(&self, pattern: &mut TopologyPattern, label: TrackLabel) -> Result<()> {
        let Some(ad) = &self.drivers.angle else {
            return Ok(());
        };
        single(pattern, MeasurementKind::Angle, label, |t| ad.process(t))
    }

    fn energy(&self, pattern: &mut TopologyPattern, label: TrackLabel) -> Result<()> {
        let Some(ed) = &self.drivers.energy else {
            return Ok(());
        };
        single(pattern, MeasurementKind::Energy, label, |t| ed.process(t))
    }

    fn angle_pair(&self, pattern: &mut TopologyPattern, l1: TrackLabel, l2: TrackLabel) -> Result<()> {
        let Some(ad) = &self.drivers.angle else {
            return Ok(());
        };
        pair(pattern, MeasurementKind::Angle, l1, l2, |t1, t2| ad.process_pair(t1, t2))
    }

    fn tof(&self, pattern: &mut TopologyPattern, l1: TrackLabel, l2: TrackLabel) -> Result<()> {
        let Some(tofd) = &self.drivers.tof else {
            return Ok(());
        };
        pair(pattern, MeasurementKind::Tof, l1, l2, |t1, t2| tofd.process(t1, t2))
    }

    fn vertex(&self, pattern: &mut TopologyPattern, l1: TrackLabel, l2: TrackLabel) -> Result<()> {
        let Some(vd) = &self.drivers.vertex else {
            return Ok(());
        };
        pair(pattern, MeasurementKind::Vertex, l1, l2, |t1, t2| vd.process_pair(t1, t2))
    }

    fn delta_vertices(&self, pattern: &mut TopologyPattern, l1: TrackLabel, l2: TrackLabel) -> Result<()> {
        let Some(dvd) = &self.drivers.delta_vertices else {
            return Ok(());
        };
        pair(pattern, MeasurementKind::DeltaVertices, l1, l2, |t1, t2| {
            dvd.process_pair(t1, t2)
        })
    }
}

/// Labels `g1`, `g2`, ... of the tracks following the charged ones
fn gamma_labels(pattern: &TopologyPattern, charged: usize) -> Vec<TrackLabel> {
    let ngammas = pattern.number_of_tracks().saturating_sub(charged);
    (1..=ngammas).map(TrackLabel::gamma).collect()
}

fn single<M: Into<Measurement>>(
    pattern: &mut TopologyPattern,
    kind: MeasurementKind,
    label: TrackLabel,
    process: impl FnOnce(&ParticleTrack) -> Result<M>,
) -> Result<()> {
    let measurement = process(pattern.track(label)?);
    store(pattern, MeasurementKey::single(kind, label), measurement)
}

fn pair<M: Into<Measurement>>(
    pattern: &mut TopologyPattern,
    kind: MeasurementKind,
    l1: TrackLabel,
    l2: TrackLabel,
    process: impl FnOnce(&ParticleTrack, &ParticleTrack) -> Result<M>,
) -> Result<()> {
    let measurement = process(pattern.track(l1)?, pattern.track(l2)?);
    store(pattern, MeasurementKey::pair(kind, l1, l2), measurement)
}

fn store<M: Into<Measurement>>(
    pattern: &mut TopologyPattern,
    key: MeasurementKey,
    measurement: Result<M>,
) -> Result<()> {
    match measurement {
        Ok(m) => pattern.insert_measurement(key, m),
        Err(err) if err.is_track_data_error() => {
            warn!("Measurement '{key}' not computed: {err}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
