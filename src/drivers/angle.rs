use log::{debug, warn};

use super::{DriverId, MeasurementDriver};
use crate::config::Properties;
use crate::error::Result;
use crate::geometry::{Point, Shape};
use crate::measurement::AngleMeasurement;
use crate::particle::ParticleTrack;

/// Computes emission angles of tracks
///
/// The single track angle is taken with respect to the x axis, normal
/// to the source foil.
#[derive(Clone, Debug, Default)]
pub struct AngleDriver {
    initialized: bool,
}

impl AngleDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&self, track: &ParticleTrack) -> Result<AngleMeasurement> {
        self.ensure_initialized()?;
        let Some(dir) = direction(track) else {
            return Ok(AngleMeasurement::default());
        };
        Ok(AngleMeasurement::new(angle_between(&dir, &Point::x())))
    }

    pub fn process_pair(
        &self,
        track1: &ParticleTrack,
        track2: &ParticleTrack,
    ) -> Result<AngleMeasurement> {
        self.ensure_initialized()?;
        if track1.kind().is_gamma() && track2.kind().is_gamma() {
            warn!("Angle between two gammas is not supported");
            return Ok(AngleMeasurement::default());
        }
        let (Some(dir1), Some(dir2)) = (direction(track1), direction(track2)) else {
            return Ok(AngleMeasurement::default());
        };
        Ok(AngleMeasurement::new(angle_between(&dir1, &dir2)))
    }
}

impl MeasurementDriver for AngleDriver {
    fn id(&self) -> DriverId {
        DriverId::Angle
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

/// Unit direction of a track at its source foil vertex
///
/// Gammas have no trajectory: their direction is the line from the
/// source foil vertex to the first calorimeter vertex.
fn direction(track: &ParticleTrack) -> Option<Point> {
    let Some(foil) = track.source_foil_vertex() else {
        warn!("Particle track has no vertex on the source foil");
        return None;
    };
    let dir = if track.kind().is_gamma() {
        let Some(calo) = track.first_calorimeter_vertex() else {
            warn!("Gamma has no calorimeter vertex");
            return None;
        };
        calo.position() - foil.position()
    } else {
        let Some(trajectory) = &track.trajectory else {
            warn!("Particle track has no trajectory");
            return None;
        };
        trajectory.direction_at(foil.position())
    };
    let norm = dir.norm();
    if norm == 0. || !norm.is_finite() {
        debug!("Degenerate track direction {dir:?}");
        return None;
    }
    Some(dir / norm)
}

fn angle_between(dir1: &Point, dir2: &Point) -> f64 {
    dir1.dot(dir2).clamp(-1., 1.).acos().to_degrees()
}
