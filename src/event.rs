//! Event records holding named data banks
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::particle::ParticleTrack;
use crate::pattern::TopologyData;

/// Default label of the particle track bank
pub const PTD_LABEL: &str = "PTD";
/// Default label of the topology bank
pub const TD_LABEL: &str = "TD";

/// Reconstructed and identified particles of one event
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct ParticleTrackData {
    #[serde(default)]
    pub tracks: Vec<ParticleTrack>,
}

impl ParticleTrackData {
    pub fn new(tracks: Vec<ParticleTrack>) -> Self {
        Self { tracks }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bank {
    ParticleTracks(ParticleTrackData),
    Topology(TopologyData),
}

impl From<ParticleTrackData> for Bank {
    fn from(data: ParticleTrackData) -> Self {
        Bank::ParticleTracks(data)
    }
}

impl From<TopologyData> for Bank {
    fn from(data: TopologyData) -> Self {
        Bank::Topology(data)
    }
}

#[derive(Clone, PartialEq, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct EventRecord {
    banks: BTreeMap<String, Bank>,
}

impl EventRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, label: &str) -> bool {
        self.banks.contains_key(label)
    }

    /// Store a bank, returning the one previously stored under `label`
    pub fn insert(&mut self, label: impl Into<String>, bank: impl Into<Bank>) -> Option<Bank> {
        self.banks.insert(label.into(), bank.into())
    }

    pub fn remove(&mut self, label: &str) -> Option<Bank> {
        self.banks.remove(label)
    }

    pub fn get(&self, label: &str) -> Option<&Bank> {
        self.banks.get(label)
    }

    pub fn particle_tracks(&self, label: &str) -> Option<&ParticleTrackData> {
        match self.banks.get(label)? {
            Bank::ParticleTracks(data) => Some(data),
            _ => None,
        }
    }

    pub fn topology(&self, label: &str) -> Option<&TopologyData> {
        match self.banks.get(label)? {
            Bank::Topology(data) => Some(data),
            _ => None,
        }
    }
}
