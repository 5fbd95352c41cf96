//! Physical quantities derived from particle tracks
use std::fmt::{self, Display};
use std::str::FromStr;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::particle::{TrackLabel, VertexRegion};

/// Angle with respect to the reference axis or between two tracks, in degree
#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct AngleMeasurement {
    pub angle: Option<f64>,
}

impl AngleMeasurement {
    pub fn new(angle: f64) -> Self {
        Self { angle: Some(angle) }
    }

    pub fn has_angle(&self) -> bool {
        self.angle.is_some()
    }
}

/// Deposited energy in MeV
#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct EnergyMeasurement {
    pub energy: Option<f64>,
}

impl EnergyMeasurement {
    pub fn new(energy: f64) -> Self {
        Self { energy: Some(energy) }
    }

    pub fn has_energy(&self) -> bool {
        self.energy.is_some()
    }
}

/// Time-of-flight probabilities, one entry per calorimeter hit considered
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct TofMeasurement {
    pub internal_probabilities: Vec<f64>,
    pub external_probabilities: Vec<f64>,
}

impl TofMeasurement {
    pub fn has_internal_probabilities(&self) -> bool {
        !self.internal_probabilities.is_empty()
    }

    pub fn has_external_probabilities(&self) -> bool {
        !self.external_probabilities.is_empty()
    }
}

/// Common vertex of one or two tracks
///
/// For two tracks `position` is the weighted barycenter and `distance`
/// the per-axis separation of the two contributing vertices.
#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct VertexMeasurement {
    pub position: Option<Point>,
    pub probability: Option<f64>,
    pub region: VertexRegion,
    pub distance: Option<Vector3<f64>>,
}

impl VertexMeasurement {
    pub fn has_vertices_probability(&self) -> bool {
        self.probability.is_some()
    }

    pub fn has_vertices_distance(&self) -> bool {
        self.distance.is_some()
    }

    pub fn is_valid(&self) -> bool {
        self.position.is_some() && self.probability.is_some()
    }
}

/// Separation of the source foil vertices of two tracks
#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct DeltaVerticesMeasurement {
    pub delta_y: Option<f64>,
    pub delta_z: Option<f64>,
}

impl DeltaVerticesMeasurement {
    pub fn has_delta_vertices_y(&self) -> bool {
        self.delta_y.is_some()
    }

    pub fn has_delta_vertices_z(&self) -> bool {
        self.delta_z.is_some()
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measurement {
    Angle(AngleMeasurement),
    Energy(EnergyMeasurement),
    Tof(TofMeasurement),
    Vertex(VertexMeasurement),
    DeltaVertices(DeltaVerticesMeasurement),
}

impl Measurement {
    pub fn kind(&self) -> MeasurementKind {
        match self {
            Measurement::Angle(_) => MeasurementKind::Angle,
            Measurement::Energy(_) => MeasurementKind::Energy,
            Measurement::Tof(_) => MeasurementKind::Tof,
            Measurement::Vertex(_) => MeasurementKind::Vertex,
            Measurement::DeltaVertices(_) => MeasurementKind::DeltaVertices,
        }
    }

    /// Whether any of the measured quantities is available
    pub fn is_valid(&self) -> bool {
        match self {
            Measurement::Angle(m) => m.has_angle(),
            Measurement::Energy(m) => m.has_energy(),
            Measurement::Tof(m) => {
                m.has_internal_probabilities() || m.has_external_probabilities()
            }
            Measurement::Vertex(m) => m.is_valid(),
            Measurement::DeltaVertices(m) => {
                m.has_delta_vertices_y() || m.has_delta_vertices_z()
            }
        }
    }

    pub fn as_angle(&self) -> Option<&AngleMeasurement> {
        match self {
            Measurement::Angle(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_energy(&self) -> Option<&EnergyMeasurement> {
        match self {
            Measurement::Energy(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_tof(&self) -> Option<&TofMeasurement> {
        match self {
            Measurement::Tof(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_vertex(&self) -> Option<&VertexMeasurement> {
        match self {
            Measurement::Vertex(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_delta_vertices(&self) -> Option<&DeltaVerticesMeasurement> {
        match self {
            Measurement::DeltaVertices(m) => Some(m),
            _ => None,
        }
    }
}

impl From<AngleMeasurement> for Measurement {
    fn from(m: AngleMeasurement) -> Self {
        Measurement::Angle(m)
    }
}

impl From<EnergyMeasurement> for Measurement {
    fn from(m: EnergyMeasurement) -> Self {
        Measurement::Energy(m)
    }
}

impl From<TofMeasurement> for Measurement {
    fn from(m: TofMeasurement) -> Self {
        Measurement::Tof(m)
    }
}

impl From<VertexMeasurement> for Measurement {
    fn from(m: VertexMeasurement) -> Self {
        Measurement::Vertex(m)
    }
}

impl From<DeltaVerticesMeasurement> for Measurement {
    fn from(m: DeltaVerticesMeasurement) -> Self {
        Measurement::DeltaVertices(m)
    }
}

#[derive(
    Display,
    EnumIter,
    EnumString,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Deserialize,
    Serialize,
)]
pub enum MeasurementKind {
    #[strum(to_string = "angle")]
    Angle,
    #[strum(to_string = "energy")]
    Energy,
    #[strum(to_string = "tof")]
    Tof,
    #[strum(to_string = "vertex")]
    Vertex,
    #[strum(to_string = "delta_vertices_source")]
    DeltaVertices,
}

/// Name of a measurement within a topology pattern
///
/// Printed as `<kind>_<label>[_<label>]`, e.g. `tof_e1_g2`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct MeasurementKey {
    pub kind: MeasurementKind,
    pub first: TrackLabel,
    pub second: Option<TrackLabel>,
}

impl MeasurementKey {
    pub fn single(kind: MeasurementKind, label: TrackLabel) -> Self {
        Self {
            kind,
            first: label,
            second: None,
        }
    }

    pub fn pair(kind: MeasurementKind, first: TrackLabel, second: TrackLabel) -> Self {
        Self {
            kind,
            first,
            second: Some(second),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = TrackLabel> {
        std::iter::once(self.first).chain(self.second)
    }
}

impl Display for MeasurementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.first)?;
        if let Some(second) = self.second {
            write!(f, "_{second}")?;
        }
        Ok(())
    }
}

impl FromStr for MeasurementKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let err = || Error::InvalidMeasurementKey(s.to_owned());
        let (rest, last) = s.rsplit_once('_').ok_or_else(err)?;
        let last: TrackLabel = last.parse().map_err(|_| err())?;
        let pair = rest
            .rsplit_once('_')
            .and_then(|(kind, first)| Some((kind, first.parse::<TrackLabel>().ok()?)));
        let key = match pair {
            Some((kind, first)) => {
                let kind = kind.parse().map_err(|_| err())?;
                Self::pair(kind, first, last)
            }
            None => Self::single(rest.parse().map_err(|_| err())?, last),
        };
        Ok(key)
    }
}

impl Serialize for MeasurementKey {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}
