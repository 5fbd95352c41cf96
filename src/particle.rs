use std::fmt::{self, Display};

use particle_id::ParticleID;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{Error, Result};
use crate::geometry::{BlurSpot, GeomId, Point, Trajectory};
use crate::units::MEV;

pub const ELECTRON_MASS: f64 = 0.51099895 * MEV;
pub const ALPHA_MASS: f64 = 3727.379 * MEV;

const ELECTRON_PDG: i32 = 11;
const PHOTON_PDG: i32 = 22;
const ALPHA_PDG: i32 = 1000020040;

#[derive(
    Display,
    EnumIter,
    EnumString,
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    #[strum(to_string = "electron")]
    Electron,
    #[strum(to_string = "positron")]
    Positron,
    #[strum(to_string = "gamma")]
    Gamma,
    #[strum(to_string = "alpha")]
    Alpha,
    #[default]
    #[strum(to_string = "undefined")]
    Undefined,
}

impl ParticleKind {
    pub fn from_id(id: Option<ParticleID>) -> Self {
        use ParticleKind::*;
        match id.map(|id| id.id()) {
            Some(ELECTRON_PDG) => Electron,
            Some(id) if id == -ELECTRON_PDG => Positron,
            Some(PHOTON_PDG) => Gamma,
            Some(ALPHA_PDG) => Alpha,
            _ => Undefined,
        }
    }

    pub fn id(self) -> Option<ParticleID> {
        use ParticleKind::*;
        let id = match self {
            Electron => ELECTRON_PDG,
            Positron => -ELECTRON_PDG,
            Gamma => PHOTON_PDG,
            Alpha => ALPHA_PDG,
            Undefined => return None,
        };
        Some(ParticleID::new(id))
    }

    /// Rest mass
    pub fn mass(self) -> Result<f64> {
        use ParticleKind::*;
        match self {
            Electron | Positron => Ok(ELECTRON_MASS),
            Gamma => Ok(0.),
            Alpha => Ok(ALPHA_MASS),
            Undefined => Err(Error::UnknownMass(self)),
        }
    }

    /// Prefix used in track labels
    pub fn label_prefix(self) -> Option<char> {
        use ParticleKind::*;
        match self {
            Electron => Some('e'),
            Positron => Some('p'),
            Gamma => Some('g'),
            Alpha => Some('a'),
            Undefined => None,
        }
    }

    pub fn from_label_prefix(c: char) -> Option<Self> {
        use ParticleKind::*;
        match c {
            'e' => Some(Electron),
            'p' => Some(Positron),
            'g' => Some(Gamma),
            'a' => Some(Alpha),
            _ => None,
        }
    }

    pub fn is_gamma(self) -> bool {
        self == ParticleKind::Gamma
    }
}

/// Detector region a vertex is located in
#[derive(
    Display, EnumIter, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VertexRegion {
    #[strum(to_string = "source foil")]
    SourceFoil,
    #[strum(to_string = "wire")]
    Wire,
    #[strum(to_string = "main calorimeter")]
    MainCalorimeter,
    #[strum(to_string = "x calorimeter")]
    XCalorimeter,
    #[strum(to_string = "gamma veto")]
    GammaVeto,
    #[default]
    #[strum(to_string = "none")]
    None,
}

impl VertexRegion {
    pub fn is_calorimeter(self) -> bool {
        matches!(
            self,
            VertexRegion::MainCalorimeter | VertexRegion::XCalorimeter | VertexRegion::GammaVeto
        )
    }
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct Vertex {
    #[serde(flatten)]
    pub spot: BlurSpot,
    #[serde(default)]
    pub region: VertexRegion,
    #[serde(default)]
    pub geom_id: Option<GeomId>,
}

impl Vertex {
    pub fn new(spot: BlurSpot, region: VertexRegion) -> Self {
        Self {
            spot,
            region,
            geom_id: None,
        }
    }

    pub fn with_geom_id(mut self, geom_id: GeomId) -> Self {
        self.geom_id = Some(geom_id);
        self
    }

    pub fn position(&self) -> &Point {
        &self.spot.position
    }
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct CalorimeterHit {
    pub energy: f64,
    #[serde(default)]
    pub sigma_energy: f64,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub sigma_time: f64,
    #[serde(default)]
    pub geom_id: Option<GeomId>,
}

/// A reconstructed and identified particle
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct ParticleTrack {
    #[serde(default)]
    pub id: Option<ParticleID>,
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub calorimeter_hits: Vec<CalorimeterHit>,
    #[serde(default)]
    pub trajectory: Option<Trajectory>,
}

impl ParticleTrack {
    pub fn new(kind: ParticleKind) -> Self {
        Self {
            id: kind.id(),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> ParticleKind {
        ParticleKind::from_id(self.id)
    }

    pub fn first_vertex_in(&self, region: VertexRegion) -> Option<&Vertex> {
        self.vertices.iter().find(|v| v.region == region)
    }

    pub fn source_foil_vertex(&self) -> Option<&Vertex> {
        self.first_vertex_in(VertexRegion::SourceFoil)
    }

    pub fn first_calorimeter_vertex(&self) -> Option<&Vertex> {
        self.vertices.iter().find(|v| v.region.is_calorimeter())
    }

    pub fn has_calorimeter_hits(&self) -> bool {
        !self.calorimeter_hits.is_empty()
    }
}

/// Short canonical name of a track within a topology, e.g. `e1` or `g2`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TrackLabel {
    pub kind: ParticleKind,
    pub index: usize,
}

impl TrackLabel {
    pub fn new(kind: ParticleKind, index: usize) -> Self {
        Self { kind, index }
    }

    pub fn electron(index: usize) -> Self {
        Self::new(ParticleKind::Electron, index)
    }

    pub fn positron(index: usize) -> Self {
        Self::new(ParticleKind::Positron, index)
    }

    pub fn gamma(index: usize) -> Self {
        Self::new(ParticleKind::Gamma, index)
    }

    pub fn alpha(index: usize) -> Self {
        Self::new(ParticleKind::Alpha, index)
    }
}

impl Display for TrackLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.kind.label_prefix().unwrap_or('X');
        write!(f, "{prefix}{}", self.index)
    }
}

impl std::str::FromStr for TrackLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let err = || Error::InvalidMeasurementKey(s.to_owned());
        let mut chars = s.chars();
        let kind = chars
            .next()
            .and_then(ParticleKind::from_label_prefix)
            .ok_or_else(err)?;
        let index = chars.as_str().parse().map_err(|_| err())?;
        Ok(Self { kind, index })
    }
}

impl Serialize for TrackLabel {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}
