use log::debug;

use super::{chi2_probability, DriverId, MeasurementDriver};
use crate::config::Properties;
use crate::error::{Error, Result};
use crate::geometry::{BlurDimension, BlurSpot, Point};
use crate::measurement::VertexMeasurement;
use crate::particle::{ParticleTrack, Vertex, VertexRegion};

/// Common origin of tracks
#[derive(Clone, Debug, Default)]
pub struct VertexDriver {
    initialized: bool,
}

impl VertexDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The vertex a single track was emitted from
    pub fn process(&self, track: &ParticleTrack) -> Result<VertexMeasurement> {
        self.ensure_initialized()?;
        let origin = track
            .vertices
            .iter()
            .find(|v| matches!(v.region, VertexRegion::SourceFoil | VertexRegion::Wire));
        let Some(origin) = origin else {
            debug!("Particle track has no vertex on the source foil or a wire");
            return Ok(VertexMeasurement::default());
        };
        Ok(VertexMeasurement {
            position: Some(*origin.position()),
            probability: Some(1.),
            region: origin.region,
            distance: None,
        })
    }

    /// Most probable common vertex of two charged tracks
    ///
    /// All pairs of vertices located in the same region are compared,
    /// and the pair with the highest probability is kept.
    pub fn process_pair(
        &self,
        track1: &ParticleTrack,
        track2: &ParticleTrack,
    ) -> Result<VertexMeasurement> {
        self.ensure_initialized()?;
        let (kind1, kind2) = (track1.kind(), track2.kind());
        if kind1.is_gamma() || kind2.is_gamma() {
            return Err(Error::UnsupportedPair(kind1, kind2));
        }
        let mut best = VertexMeasurement::default();
        for v1 in track1.vertices.iter().filter(|v| is_comparable(v)) {
            for v2 in track2.vertices.iter().filter(|v| v.region == v1.region) {
                let candidate = common_vertex(v1, v2)?;
                if candidate.probability > best.probability {
                    best = candidate;
                }
            }
        }
        if !best.is_valid() {
            debug!("No vertices in a common region");
        }
        Ok(best)
    }
}

impl MeasurementDriver for VertexDriver {
    fn id(&self) -> DriverId {
        DriverId::Vertex
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, _config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.initialized = false;
    }
}

fn is_comparable(vertex: &Vertex) -> bool {
    vertex.region == VertexRegion::SourceFoil || vertex.region.is_calorimeter()
}

fn common_vertex(v1: &Vertex, v2: &Vertex) -> Result<VertexMeasurement> {
    let (spot1, spot2) = (&v1.spot, &v2.spot);
    if spot1.dimension != spot2.dimension {
        return Err(Error::BlurDimensionMismatch(
            spot1.dimension.rank(),
            spot2.dimension.rank(),
        ));
    }
    let (position, chi2) = barycenter(spot1, spot2);
    debug!("Vertices chi2 in {}: {chi2}", v1.region);
    Ok(VertexMeasurement {
        position: Some(position),
        probability: Some(chi2_probability(chi2)?),
        region: v1.region,
        distance: Some((spot1.position - spot2.position).abs()),
    })
}

/// Inverse-variance weighted barycenter and its chi-square
///
/// Axes beyond the blur dimension carry no uncertainty and are set
/// to the midpoint. Spots of dimension zero are exact points on all
/// three axes.
fn barycenter(spot1: &BlurSpot, spot2: &BlurSpot) -> (Point, f64) {
    let exact = spot1.dimension == BlurDimension::Zero;
    let axes = if exact { 0..3 } else { spot1.dimension.axes() };
    let mut position = (spot1.position + spot2.position) / 2.;
    let mut chi2 = 0.;
    for axis in axes {
        let (p1, p2) = (spot1.position[axis], spot2.position[axis]);
        let (s1, s2) = if exact {
            (0., 0.)
        } else {
            (spot1.errors[axis].powi(2), spot2.errors[axis].powi(2))
        };
        let (b, c) = axis_barycenter(p1, s1, p2, s2);
        position[axis] = b;
        chi2 += c;
    }
    (position, chi2)
}

fn axis_barycenter(p1: f64, s1: f64, p2: f64, s2: f64) -> (f64, f64) {
    if s1 == 0. && s2 == 0. {
        let chi2 = if p1 == p2 { 0. } else { f64::INFINITY };
        return ((p1 + p2) / 2., chi2);
    }
    let b = if s1 == 0. {
        p1
    } else if s2 == 0. {
        p2
    } else {
        (p1 / s1 + p2 / s2) / (1. / s1 + 1. / s2)
    };
    let chi2 = ((b - p1).powi(2) + (b - p2).powi(2)) / (s1 + s2);
    (b, chi2)
}
