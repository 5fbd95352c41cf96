use log::{debug, warn};

use super::{DriverId, MeasurementDriver};
use crate::config::Properties;
use crate::error::Result;
use crate::measurement::DeltaVerticesMeasurement;
use crate::particle::ParticleTrack;

/// Separation of the source foil vertices of two tracks in the foil plane
#[derive(Clone, Debug, Default)]
pub struct DeltaVerticesDriver {
    initialized: bool,
}

impl DeltaVerticesDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_pair(
        &self,
        track1: &ParticleTrack,
        track2: &ParticleTrack,
    ) -> Result<DeltaVerticesMeasurement> {
        self.ensure_initialized()?;
        if track1.kind().is_gamma() && track2.kind().is_gamma() {
            warn!("Vertices separation of two gammas is not supported");
            return Ok(DeltaVerticesMeasurement::default());
        }
        let (Some(v1), Some(v2)) = (track1.source_foil_vertex(), track2.source_foil_vertex()) else {
            debug!("Particle tracks must both have a vertex on the source foil");
            return Ok(DeltaVerticesMeasurement::default());
        };
        let delta = v1.position() - v2.position();
        Ok(DeltaVerticesMeasurement {
            delta_y: Some(delta.y),
            delta_z: Some(delta.z),
        })
    }
}

impl MeasurementDriver for DeltaVerticesDriver {
    fn id(&self) -> DriverId {
        DriverId::DeltaVertices
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BlurSpot, Point};
    use crate::particle::{ParticleKind, Vertex, VertexRegion};

    fn track(kind: ParticleKind, position: Point) -> ParticleTrack {
        let mut t = ParticleTrack::new(kind);
        t.vertices.push(Vertex::new(BlurSpot::at(position), VertexRegion::SourceFoil));
        t
    }

    #[test]
    fn separation() {
        let mut dvd = DeltaVerticesDriver::new();
        dvd.initialize(&Properties::new()).unwrap();

        let e1 = track(ParticleKind::Electron, Point::new(0., 10., -5.));
        let a1 = track(ParticleKind::Alpha, Point::new(0., 4., 3.));
        let delta = dvd.process_pair(&e1, &a1).unwrap();
        assert_eq!(delta.delta_y, Some(6.));
        assert_eq!(delta.delta_z, Some(-8.));

        let g1 = track(ParticleKind::Gamma, Point::zeros());
        assert!(dvd.process_pair(&e1, &g1).unwrap().has_delta_vertices_y());
        assert!(!dvd.process_pair(&g1, &g1).unwrap().has_delta_vertices_y());

        let mut no_foil = e1.clone();
        no_foil.vertices[0].region = VertexRegion::Wire;
        let delta = dvd.process_pair(&no_foil, &a1).unwrap();
        assert!(!delta.has_delta_vertices_y());
        assert!(!delta.has_delta_vertices_z());
    }
}
